//! In-memory scanning-service fake and fixture helpers shared by the
//! crate's tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use quayguard_core::properties::ComponentPolicyStatus;
use quayguard_core::repo::ArtifactPath;

use crate::client::ScanServiceClient;
use crate::error::{IntelError, Result};
use crate::notifications::RepositoryProjectLookup;
use crate::types::{
    ComponentVersionView, PolicyNotifications, ViewLink, ViewMeta, VulnerabilityNotification,
    VulnerabilityView, VULNERABILITIES_LINK,
};

pub const STATUS_URL: &str = "https://scan.example.com/api/status";

/// A deterministic component version URL carrying a well-formed UUID pair so
/// id extraction succeeds in tests.
pub fn component_version_url(component_name: &str) -> String {
    format!(
        "https://scan.example.com/api/components/00000000-0000-0000-0000-000000000000/versions/{}",
        fake_uuid(component_name)
    )
}

fn fake_uuid(seed: &str) -> String {
    let mut hex = String::with_capacity(32);
    for byte in seed.bytes().cycle().take(16) {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Build a lookup directly from `(project, version, repo_key)` triples.
pub fn lookup_for(entries: &[(&str, &str, &str)]) -> RepositoryProjectLookup {
    let projects = entries
        .iter()
        .map(|(project, version, repo_key)| {
            (
                ((*project).to_string(), (*version).to_string()),
                ArtifactPath::repo_root(*repo_key),
            )
        })
        .collect();
    RepositoryProjectLookup::new(projects)
}

#[derive(Default)]
struct FakeState {
    policy_notifications: PolicyNotifications,
    vulnerability_notifications: Vec<VulnerabilityNotification>,
    fail_notifications: bool,
    approval_statuses: HashMap<String, ComponentPolicyStatus>,
    failing_approval_urls: HashSet<String>,
    component_versions: HashMap<String, ComponentVersionView>,
    vulnerabilities: HashMap<String, Vec<VulnerabilityView>>,
    windows_seen: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

/// Scriptable in-memory [`ScanServiceClient`].
#[derive(Default)]
pub struct FakeScanServiceClient {
    state: Mutex<FakeState>,
}

impl FakeScanServiceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy_notifications(&self, notifications: PolicyNotifications) {
        self.state.lock().unwrap().policy_notifications = notifications;
    }

    pub fn set_vulnerability_notifications(&self, notifications: Vec<VulnerabilityNotification>) {
        self.state.lock().unwrap().vulnerability_notifications = notifications;
    }

    /// Make every notification fetch fail (to exercise cycle-level error
    /// handling).
    pub fn fail_notification_fetches(&self) {
        self.state.lock().unwrap().fail_notifications = true;
    }

    pub fn set_approval_status(&self, status_url: &str, status: ComponentPolicyStatus) {
        self.state
            .lock()
            .unwrap()
            .approval_statuses
            .insert(status_url.to_string(), status);
    }

    pub fn fail_approval_status(&self, status_url: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_approval_urls
            .insert(status_url.to_string());
    }

    /// Register a component version (addressed by [`component_version_url`])
    /// with the given vulnerability severities.
    pub fn set_component_version(
        &self,
        component_name: &str,
        version_name: &str,
        severities: &[&str],
    ) {
        let url = component_version_url(component_name);
        let vulnerabilities_url = format!("{url}/vulnerabilities");
        let view = ComponentVersionView {
            version_name: version_name.to_string(),
            meta: ViewMeta {
                href: Some(url.clone()),
                links: vec![ViewLink {
                    rel: VULNERABILITIES_LINK.to_string(),
                    href: vulnerabilities_url.clone(),
                }],
            },
        };
        let views = severities
            .iter()
            .enumerate()
            .map(|(index, severity)| VulnerabilityView {
                name: format!("CVE-2026-{index:04}"),
                severity: (*severity).to_string(),
            })
            .collect();

        let mut state = self.state.lock().unwrap();
        state.component_versions.insert(url, view);
        state.vulnerabilities.insert(vulnerabilities_url, views);
    }

    /// The fetch windows the client was asked for.
    pub fn windows_seen(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.state.lock().unwrap().windows_seen.clone()
    }
}

#[async_trait]
impl ScanServiceClient for FakeScanServiceClient {
    async fn fetch_policy_notifications(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<PolicyNotifications> {
        let mut state = self.state.lock().unwrap();
        state.windows_seen.push((window_start, window_end));
        if state.fail_notifications {
            return Err(IntelError::Api {
                status: 503,
                url: "fake://notifications".to_string(),
            });
        }
        Ok(state.policy_notifications.clone())
    }

    async fn fetch_vulnerability_notifications(
        &self,
        _window_start: DateTime<Utc>,
        _window_end: DateTime<Utc>,
    ) -> Result<Vec<VulnerabilityNotification>> {
        let state = self.state.lock().unwrap();
        if state.fail_notifications {
            return Err(IntelError::Api {
                status: 503,
                url: "fake://notifications".to_string(),
            });
        }
        Ok(state.vulnerability_notifications.clone())
    }

    async fn fetch_approval_status(&self, status_url: &str) -> Result<ComponentPolicyStatus> {
        let state = self.state.lock().unwrap();
        if state.failing_approval_urls.contains(status_url) {
            return Err(IntelError::Api {
                status: 500,
                url: status_url.to_string(),
            });
        }
        state.approval_statuses.get(status_url).copied().ok_or(
            IntelError::Api {
                status: 404,
                url: status_url.to_string(),
            },
        )
    }

    async fn fetch_component_version(&self, url: &str) -> Result<ComponentVersionView> {
        self.state
            .lock()
            .unwrap()
            .component_versions
            .get(url)
            .cloned()
            .ok_or(IntelError::Api {
                status: 404,
                url: url.to_string(),
            })
    }

    async fn fetch_vulnerabilities(
        &self,
        view: &ComponentVersionView,
    ) -> Result<Vec<VulnerabilityView>> {
        let url = view
            .vulnerabilities_link()
            .ok_or(IntelError::MissingVulnerabilitiesLink)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .vulnerabilities
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}
