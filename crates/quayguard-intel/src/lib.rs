//! # quayguard-intel
//!
//! The background half of quayguard: the scanning-service client, the
//! notification correlate-and-project cycle, and the identification sweep.
//!
//! Nothing here runs on the download request path. The host's scheduler
//! triggers [`sweep::IdentificationSweep`] and [`update::MetadataUpdateService`]
//! periodically; both communicate with the request path exclusively through
//! the property store from `quayguard-core`.

pub mod client;
pub mod error;
pub mod notifications;
pub mod projection;
pub mod sweep;
pub mod types;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{HttpScanServiceClient, ScanServiceClient};
pub use error::{IntelError, Result};
