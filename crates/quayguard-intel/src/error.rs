//! Error types for the scanning-service subsystem.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("scanning service returned status {status} for {url}")]
    Api { status: u16, url: String },

    #[error("unexpected payload from scanning service: {0}")]
    UnexpectedPayload(String),

    #[error("component version view has no vulnerabilities link")]
    MissingVulnerabilitiesLink,
}

pub type Result<T> = std::result::Result<T, IntelError>;
