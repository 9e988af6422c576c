//! Async client for the component-scanning service.
//!
//! [`ScanServiceClient`] is the seam the notification processors depend on;
//! [`HttpScanServiceClient`] is the production implementation. Transient
//! failures are retried with bounded exponential backoff; a request that
//! exhausts its retries surfaces as an [`IntelError`] and is isolated per
//! notification by the callers.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use quayguard_core::config::IntelConfig;
use quayguard_core::properties::ComponentPolicyStatus;

use crate::error::{IntelError, Result};
use crate::types::{
    ComponentVersionView, ItemPage, PolicyNotifications, PolicyOverrideNotification,
    RuleViolationNotification, VulnerabilityNotification, VulnerabilityView,
};

/// The scanning-service operations the gate consumes.
#[async_trait]
pub trait ScanServiceClient: Send + Sync {
    /// Policy-kind notifications created inside the window, grouped by kind.
    async fn fetch_policy_notifications(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<PolicyNotifications>;

    /// Vulnerability notifications created inside the window.
    async fn fetch_vulnerability_notifications(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<VulnerabilityNotification>>;

    /// The authoritative policy status behind a notification's status URL.
    /// Idempotent read.
    async fn fetch_approval_status(&self, status_url: &str) -> Result<ComponentPolicyStatus>;

    /// The component version view behind a notification's component URL.
    async fn fetch_component_version(&self, url: &str) -> Result<ComponentVersionView>;

    /// All vulnerabilities of a component version.
    async fn fetch_vulnerabilities(
        &self,
        view: &ComponentVersionView,
    ) -> Result<Vec<VulnerabilityView>>;
}

#[derive(serde::Deserialize)]
struct ApprovalStatusView {
    #[serde(rename = "approvalStatus")]
    approval_status: String,
}

/// Production `reqwest`-based client.
pub struct HttpScanServiceClient {
    http: Client,
    config: IntelConfig,
}

impl HttpScanServiceClient {
    pub fn new(config: IntelConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent("quayguard/0.4")
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { http, config })
    }

    /// Create a client with a custom HTTP client (for tests).
    pub fn with_http_client(config: IntelConfig, http: Client) -> Self {
        Self { http, config }
    }

    fn notifications_url(
        &self,
        kind: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> String {
        format!(
            "{}/api/notifications?type={kind}&startDate={}&endDate={}",
            self.config.base_url.trim_end_matches('/'),
            window_start.to_rfc3339_opts(SecondsFormat::Millis, true),
            window_end.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    /// GET `url` as JSON with bounded retry. Connection errors, timeouts,
    /// 429 and 5xx responses are retried; other failures are terminal.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut backoff = Duration::from_millis(self.config.retry_backoff_ms.max(1));
        let attempts = self.config.fetch_retries.saturating_add(1);

        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.get_json_once(url).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < attempts && is_transient(&error) => {
                    warn!(%url, attempt, %error, "transient fetch failure, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or(IntelError::UnexpectedPayload(
            "retry loop ended without a result".to_string(),
        )))
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "fetching from scanning service");
        let mut request = self.http.get(url);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IntelError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

fn is_transient(error: &IntelError) -> bool {
    match error {
        IntelError::Http(inner) => inner.is_timeout() || inner.is_connect() || inner.is_request(),
        IntelError::Api { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        _ => false,
    }
}

#[async_trait]
impl ScanServiceClient for HttpScanServiceClient {
    async fn fetch_policy_notifications(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<PolicyNotifications> {
        let overrides: ItemPage<PolicyOverrideNotification> = self
            .get_json(&self.notifications_url("POLICY_OVERRIDE", window_start, window_end))
            .await?;
        let violations: ItemPage<RuleViolationNotification> = self
            .get_json(&self.notifications_url("RULE_VIOLATION", window_start, window_end))
            .await?;
        let cleared: ItemPage<RuleViolationNotification> = self
            .get_json(&self.notifications_url("RULE_VIOLATION_CLEARED", window_start, window_end))
            .await?;

        Ok(PolicyNotifications {
            overrides: overrides.items,
            violations: violations.items,
            cleared: cleared.items,
        })
    }

    async fn fetch_vulnerability_notifications(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<VulnerabilityNotification>> {
        let page: ItemPage<VulnerabilityNotification> = self
            .get_json(&self.notifications_url("VULNERABILITY", window_start, window_end))
            .await?;
        Ok(page.items)
    }

    async fn fetch_approval_status(&self, status_url: &str) -> Result<ComponentPolicyStatus> {
        let view: ApprovalStatusView = self.get_json(status_url).await?;
        ComponentPolicyStatus::parse(&view.approval_status).ok_or_else(|| {
            IntelError::UnexpectedPayload(format!(
                "unrecognized approval status '{}'",
                view.approval_status
            ))
        })
    }

    async fn fetch_component_version(&self, url: &str) -> Result<ComponentVersionView> {
        self.get_json(url).await
    }

    async fn fetch_vulnerabilities(
        &self,
        view: &ComponentVersionView,
    ) -> Result<Vec<VulnerabilityView>> {
        let url = view
            .vulnerabilities_link()
            .ok_or(IntelError::MissingVulnerabilitiesLink)?;
        let page: ItemPage<VulnerabilityView> = self.get_json(url).await?;
        Ok(page.items)
    }
}
