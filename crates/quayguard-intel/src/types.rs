//! Scanning-service wire formats.
//!
//! Only the fields the gate consumes are modeled; unknown fields are
//! ignored on deserialization so service-side additions stay non-breaking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Link relation under which a component version exposes its vulnerabilities.
pub const VULNERABILITIES_LINK: &str = "vulnerabilities";

/// One evaluated policy attached to a notification. A missing or blank
/// severity is meaningful: it maps to `UNSPECIFIED` downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfo {
    pub policy_name: String,
    #[serde(default)]
    pub severity: Option<String>,
}

/// A project version the scanning service reports as affected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedProjectVersion {
    pub project_name: String,
    pub project_version_name: String,
}

/// Per-component-version payload of rule violation notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVersionStatus {
    pub component_name: String,
    pub component_version_name: String,
    /// URL of the component version view.
    pub component_version: String,
    /// URL of the authoritative bom-component policy status.
    pub bom_component_version_policy_status: String,
}

/// A policy override event: one component in one project had its violation
/// overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverrideNotification {
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    pub project_name: String,
    pub project_version_name: String,
    pub component_name: String,
    pub component_version_name: String,
    pub bom_component_version_policy_status: String,
    #[serde(default)]
    pub policy_infos: Vec<PolicyInfo>,
}

/// A rule violation (or violation-cleared) event covering one or more
/// component versions of a project. The two kinds share a payload; which
/// processor handles a batch determines its meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolationNotification {
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    pub project_name: String,
    pub project_version_name: String,
    #[serde(default)]
    pub policy_infos: Vec<PolicyInfo>,
    #[serde(default)]
    pub component_version_statuses: Vec<ComponentVersionStatus>,
}

/// A vulnerability event for a component version, listing the project
/// versions it affects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityNotification {
    #[serde(default = "epoch")]
    pub created_at: DateTime<Utc>,
    pub component_name: String,
    /// URL of the component version view.
    pub component_version: String,
    #[serde(default)]
    pub affected_project_versions: Vec<AffectedProjectVersion>,
}

/// The policy-kind notifications of one pull window, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct PolicyNotifications {
    pub overrides: Vec<PolicyOverrideNotification>,
    pub violations: Vec<RuleViolationNotification>,
    pub cleared: Vec<RuleViolationNotification>,
}

impl PolicyNotifications {
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty() && self.violations.is_empty() && self.cleared.is_empty()
    }

    /// Latest creation timestamp across all contained notifications.
    pub fn latest_created_at(&self) -> Option<DateTime<Utc>> {
        self.overrides
            .iter()
            .map(|n| n.created_at)
            .chain(self.violations.iter().map(|n| n.created_at))
            .chain(self.cleared.iter().map(|n| n.created_at))
            .max()
    }
}

/// The component version view, as far as the gate reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVersionView {
    #[serde(default)]
    pub version_name: String,
    #[serde(rename = "_meta", default)]
    pub meta: ViewMeta,
}

impl ComponentVersionView {
    pub fn href(&self) -> Option<&str> {
        self.meta.href.as_deref()
    }

    pub fn vulnerabilities_link(&self) -> Option<&str> {
        self.meta
            .links
            .iter()
            .find(|link| link.rel == VULNERABILITIES_LINK)
            .map(|link| link.href.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewMeta {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub links: Vec<ViewLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewLink {
    pub rel: String,
    pub href: String,
}

/// One vulnerability of a component version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityView {
    #[serde(default)]
    pub name: String,
    pub severity: String,
}

/// Paged list envelope used by the scanning service's collection endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ItemPage<T> {
    #[serde(default)]
    pub items: Vec<T>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_violation_parses_with_unknown_fields() {
        let raw = json!({
            "createdAt": "2026-03-01T12:00:00Z",
            "projectName": "frontend",
            "projectVersionName": "2024.1",
            "somethingNew": true,
            "policyInfos": [
                {"policyName": "No GPL", "severity": "MAJOR"},
                {"policyName": "No unknowns"}
            ],
            "componentVersionStatuses": [{
                "componentName": "left-pad",
                "componentVersionName": "1.3.0",
                "componentVersion": "https://scan.example.com/api/components/1/versions/2",
                "bomComponentVersionPolicyStatus": "https://scan.example.com/api/status/3"
            }]
        });

        let parsed: RuleViolationNotification = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.policy_infos.len(), 2);
        assert_eq!(parsed.policy_infos[1].severity, None);
        assert_eq!(parsed.component_version_statuses[0].component_name, "left-pad");
    }

    #[test]
    fn component_version_view_finds_vulnerabilities_link() {
        let raw = json!({
            "versionName": "1.3.0",
            "_meta": {
                "href": "https://scan.example.com/api/components/1/versions/2",
                "links": [
                    {"rel": "component", "href": "https://scan.example.com/api/components/1"},
                    {"rel": "vulnerabilities", "href": "https://scan.example.com/api/components/1/versions/2/vulnerabilities"}
                ]
            }
        });

        let view: ComponentVersionView = serde_json::from_value(raw).unwrap();
        assert_eq!(
            view.vulnerabilities_link(),
            Some("https://scan.example.com/api/components/1/versions/2/vulnerabilities")
        );
    }

    #[test]
    fn latest_created_at_spans_all_kinds() {
        let notifications = PolicyNotifications {
            overrides: vec![],
            violations: vec![RuleViolationNotification {
                created_at: "2026-03-01T10:00:00Z".parse().unwrap(),
                project_name: "p".into(),
                project_version_name: "v".into(),
                policy_infos: vec![],
                component_version_statuses: vec![],
            }],
            cleared: vec![RuleViolationNotification {
                created_at: "2026-03-01T11:00:00Z".parse().unwrap(),
                project_name: "p".into(),
                project_version_name: "v".into(),
                policy_infos: vec![],
                component_version_statuses: vec![],
            }],
        };
        assert_eq!(
            notifications.latest_created_at(),
            Some("2026-03-01T11:00:00Z".parse().unwrap())
        );
    }
}
