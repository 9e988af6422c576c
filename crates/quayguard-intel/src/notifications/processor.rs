//! One processor per notification kind, and the composite that runs them.
//!
//! Processors never fail a batch: a notification naming a project the lookup
//! cannot resolve is dropped with a debug note, and an upstream fetch failure
//! skips only that notification's contribution.

use std::sync::Arc;

use tracing::{debug, warn};

use quayguard_core::properties::PolicyStatusReport;

use super::lookup::RepositoryProjectLookup;
use super::model::{
    aggregate_vulnerabilities, extract_component_version_id, severities_from_policy_infos,
    ResolvedPolicyNotification, ResolvedVulnerabilityNotification,
};
use crate::client::ScanServiceClient;
use crate::types::{
    PolicyNotifications, PolicyOverrideNotification, RuleViolationNotification,
    VulnerabilityNotification,
};

pub struct PolicyOverrideProcessor {
    client: Arc<dyn ScanServiceClient>,
}

impl PolicyOverrideProcessor {
    pub fn new(client: Arc<dyn ScanServiceClient>) -> Self {
        Self { client }
    }

    pub async fn process(
        &self,
        notifications: &[PolicyOverrideNotification],
        lookup: &RepositoryProjectLookup,
    ) -> Vec<ResolvedPolicyNotification> {
        let mut resolved = Vec::new();
        for notification in notifications {
            let Some(repo_root) = lookup.repo_root(
                &notification.project_name,
                &notification.project_version_name,
            ) else {
                debug!(
                    project = %notification.project_name,
                    version = %notification.project_version_name,
                    "dropping override notification for untracked project"
                );
                continue;
            };

            let status = match self
                .client
                .fetch_approval_status(&notification.bom_component_version_policy_status)
                .await
            {
                Ok(status) => status,
                Err(error) => {
                    warn!(
                        component = %notification.component_name,
                        %error,
                        "skipping override notification, approval status fetch failed"
                    );
                    continue;
                }
            };

            let severities = severities_from_policy_infos(&notification.policy_infos);
            resolved.push(ResolvedPolicyNotification {
                component_name: notification.component_name.clone(),
                component_version_name: notification.component_version_name.clone(),
                component_version_id: None,
                status_report: PolicyStatusReport::new(status, severities),
                affected_repo_roots: vec![repo_root.clone()],
            });
        }
        resolved
    }
}

/// Handles both rule-violation and violation-cleared batches; the payloads
/// are identical and the projection is driven by the fetched authoritative
/// status either way.
pub struct RuleViolationProcessor {
    client: Arc<dyn ScanServiceClient>,
}

impl RuleViolationProcessor {
    pub fn new(client: Arc<dyn ScanServiceClient>) -> Self {
        Self { client }
    }

    pub async fn process(
        &self,
        notifications: &[RuleViolationNotification],
        lookup: &RepositoryProjectLookup,
    ) -> Vec<ResolvedPolicyNotification> {
        let mut resolved = Vec::new();
        for notification in notifications {
            let Some(repo_root) = lookup.repo_root(
                &notification.project_name,
                &notification.project_version_name,
            ) else {
                debug!(
                    project = %notification.project_name,
                    version = %notification.project_version_name,
                    "dropping rule notification for untracked project"
                );
                continue;
            };

            let severities = severities_from_policy_infos(&notification.policy_infos);

            // One resolved record per component version named by the
            // notification; a failed fetch skips only that component.
            for status_ref in &notification.component_version_statuses {
                let status = match self
                    .client
                    .fetch_approval_status(&status_ref.bom_component_version_policy_status)
                    .await
                {
                    Ok(status) => status,
                    Err(error) => {
                        warn!(
                            component = %status_ref.component_name,
                            %error,
                            "skipping component status, approval status fetch failed"
                        );
                        continue;
                    }
                };

                let component_version_id =
                    extract_component_version_id(&status_ref.component_version);
                if component_version_id.is_none() {
                    debug!(
                        url = %status_ref.component_version,
                        "component version URL has no extractable id"
                    );
                }

                resolved.push(ResolvedPolicyNotification {
                    component_name: status_ref.component_name.clone(),
                    component_version_name: status_ref.component_version_name.clone(),
                    component_version_id,
                    status_report: PolicyStatusReport::new(status, severities.clone()),
                    affected_repo_roots: vec![repo_root.clone()],
                });
            }
        }
        resolved
    }
}

pub struct VulnerabilityProcessor {
    client: Arc<dyn ScanServiceClient>,
}

impl VulnerabilityProcessor {
    pub fn new(client: Arc<dyn ScanServiceClient>) -> Self {
        Self { client }
    }

    pub async fn process(
        &self,
        notifications: &[VulnerabilityNotification],
        lookup: &RepositoryProjectLookup,
    ) -> Vec<ResolvedVulnerabilityNotification> {
        let mut resolved = Vec::new();
        for notification in notifications {
            let affected_repo_roots: Vec<_> = notification
                .affected_project_versions
                .iter()
                .filter_map(|affected| {
                    lookup.repo_root(&affected.project_name, &affected.project_version_name)
                })
                .cloned()
                .collect();
            if affected_repo_roots.is_empty() {
                debug!(
                    component = %notification.component_name,
                    "dropping vulnerability notification, no tracked project affected"
                );
                continue;
            }

            let (component_version_name, aggregate) =
                match self.fetch_aggregate(&notification.component_version).await {
                    Ok(fetched) => fetched,
                    Err(error) => {
                        warn!(
                            component = %notification.component_name,
                            %error,
                            "skipping vulnerability notification, component fetch failed"
                        );
                        continue;
                    }
                };

            resolved.push(ResolvedVulnerabilityNotification {
                component_name: notification.component_name.clone(),
                component_version_name,
                component_version_id: extract_component_version_id(&notification.component_version),
                aggregate,
                affected_repo_roots,
            });
        }
        resolved
    }

    async fn fetch_aggregate(
        &self,
        component_version_url: &str,
    ) -> crate::error::Result<(String, quayguard_core::properties::VulnerabilityAggregate)> {
        let view = self
            .client
            .fetch_component_version(component_version_url)
            .await?;
        let vulnerabilities = self.client.fetch_vulnerabilities(&view).await?;
        Ok((view.version_name, aggregate_vulnerabilities(&vulnerabilities)))
    }
}

/// The per-cycle entry point over all notification kinds.
pub struct NotificationProcessor {
    override_processor: PolicyOverrideProcessor,
    violation_processor: RuleViolationProcessor,
    vulnerability_processor: VulnerabilityProcessor,
}

impl NotificationProcessor {
    pub fn new(client: Arc<dyn ScanServiceClient>) -> Self {
        Self {
            override_processor: PolicyOverrideProcessor::new(client.clone()),
            violation_processor: RuleViolationProcessor::new(client.clone()),
            vulnerability_processor: VulnerabilityProcessor::new(client),
        }
    }

    pub async fn process_policy_notifications(
        &self,
        notifications: &PolicyNotifications,
        lookup: &RepositoryProjectLookup,
    ) -> Vec<ResolvedPolicyNotification> {
        let mut resolved = self
            .override_processor
            .process(&notifications.overrides, lookup)
            .await;
        resolved.extend(
            self.violation_processor
                .process(&notifications.cleared, lookup)
                .await,
        );
        resolved.extend(
            self.violation_processor
                .process(&notifications.violations, lookup)
                .await,
        );
        resolved
    }

    pub async fn process_vulnerability_notifications(
        &self,
        notifications: &[VulnerabilityNotification],
        lookup: &RepositoryProjectLookup,
    ) -> Vec<ResolvedVulnerabilityNotification> {
        self.vulnerability_processor
            .process(notifications, lookup)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        component_version_url, lookup_for, FakeScanServiceClient, STATUS_URL,
    };
    use crate::types::{AffectedProjectVersion, ComponentVersionStatus, PolicyInfo};
    use chrono::Utc;
    use quayguard_core::properties::{ComponentPolicyStatus, PolicySeverity};
    use quayguard_core::repo::ArtifactPath;

    fn violation(
        project: &str,
        components: &[(&str, &str)],
        status_suffix: &str,
    ) -> RuleViolationNotification {
        RuleViolationNotification {
            created_at: Utc::now(),
            project_name: project.to_string(),
            project_version_name: "1.0".to_string(),
            policy_infos: vec![PolicyInfo {
                policy_name: "No GPL".to_string(),
                severity: Some("MAJOR".to_string()),
            }],
            component_version_statuses: components
                .iter()
                .map(|(name, version)| ComponentVersionStatus {
                    component_name: (*name).to_string(),
                    component_version_name: (*version).to_string(),
                    component_version: component_version_url(name),
                    bom_component_version_policy_status: format!("{STATUS_URL}/{status_suffix}"),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn violation_fans_out_per_component_version() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_approval_status(
            &format!("{STATUS_URL}/ok"),
            ComponentPolicyStatus::InViolation,
        );
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = RuleViolationProcessor::new(client);
        let resolved = processor
            .process(
                &[violation("frontend", &[("a", "1.0"), ("b", "2.0")], "ok")],
                &lookup,
            )
            .await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].component_name, "a");
        assert_eq!(resolved[1].component_name, "b");
        assert_eq!(
            resolved[0].status_report.severities,
            vec![PolicySeverity::Major]
        );
        assert!(resolved[0].component_version_id.is_some());
        assert_eq!(
            resolved[0].affected_repo_roots,
            vec![ArtifactPath::repo_root("npm-local")]
        );
    }

    #[tokio::test]
    async fn untracked_project_is_dropped() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_approval_status(
            &format!("{STATUS_URL}/ok"),
            ComponentPolicyStatus::InViolation,
        );
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = RuleViolationProcessor::new(client);
        let resolved = processor
            .process(&[violation("unknown-project", &[("a", "1.0")], "ok")], &lookup)
            .await;
        assert!(resolved.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_isolated_per_notification() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_approval_status(
            &format!("{STATUS_URL}/ok"),
            ComponentPolicyStatus::InViolation,
        );
        client.fail_approval_status(&format!("{STATUS_URL}/broken"));
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = RuleViolationProcessor::new(client);
        let batch = [
            violation("frontend", &[("first", "1.0")], "ok"),
            violation("frontend", &[("second", "1.0")], "broken"),
            violation("frontend", &[("third", "1.0")], "ok"),
        ];
        let resolved = processor.process(&batch, &lookup).await;

        let names: Vec<&str> = resolved
            .iter()
            .map(|record| record.component_name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn override_resolves_single_component() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_approval_status(
            &format!("{STATUS_URL}/ok"),
            ComponentPolicyStatus::InViolationOverridden,
        );
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = PolicyOverrideProcessor::new(client);
        let resolved = processor
            .process(
                &[PolicyOverrideNotification {
                    created_at: Utc::now(),
                    project_name: "frontend".to_string(),
                    project_version_name: "1.0".to_string(),
                    component_name: "left-pad".to_string(),
                    component_version_name: "1.3.0".to_string(),
                    bom_component_version_policy_status: format!("{STATUS_URL}/ok"),
                    policy_infos: vec![PolicyInfo {
                        policy_name: "Blank severity".to_string(),
                        severity: None,
                    }],
                }],
                &lookup,
            )
            .await;

        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved[0].status_report.status,
            ComponentPolicyStatus::InViolationOverridden
        );
        assert_eq!(
            resolved[0].status_report.severities,
            vec![PolicySeverity::Unspecified]
        );
    }

    #[tokio::test]
    async fn vulnerability_aggregates_severity_buckets() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_component_version("left-pad", "1.3.0", &["HIGH", "MEDIUM", "LOW", "HIGH"]);
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = VulnerabilityProcessor::new(client);
        let resolved = processor
            .process(
                &[VulnerabilityNotification {
                    created_at: Utc::now(),
                    component_name: "left-pad".to_string(),
                    component_version: component_version_url("left-pad"),
                    affected_project_versions: vec![
                        AffectedProjectVersion {
                            project_name: "frontend".to_string(),
                            project_version_name: "1.0".to_string(),
                        },
                        AffectedProjectVersion {
                            project_name: "untracked".to_string(),
                            project_version_name: "9.9".to_string(),
                        },
                    ],
                }],
                &lookup,
            )
            .await;

        assert_eq!(resolved.len(), 1);
        let record = &resolved[0];
        assert_eq!(record.component_version_name, "1.3.0");
        assert_eq!(record.aggregate.high, 2);
        assert_eq!(record.aggregate.medium, 1);
        assert_eq!(record.aggregate.low, 1);
        assert_eq!(record.aggregate.critical, 0);
        assert_eq!(record.affected_repo_roots.len(), 1);
    }

    #[tokio::test]
    async fn vulnerability_with_no_tracked_project_is_dropped() {
        let client = Arc::new(FakeScanServiceClient::new());
        client.set_component_version("left-pad", "1.3.0", &["HIGH"]);
        let lookup = lookup_for(&[("frontend", "1.0", "npm-local")]);

        let processor = VulnerabilityProcessor::new(client);
        let resolved = processor
            .process(
                &[VulnerabilityNotification {
                    created_at: Utc::now(),
                    component_name: "left-pad".to_string(),
                    component_version: component_version_url("left-pad"),
                    affected_project_versions: vec![AffectedProjectVersion {
                        project_name: "untracked".to_string(),
                        project_version_name: "9.9".to_string(),
                    }],
                }],
                &lookup,
            )
            .await;
        assert!(resolved.is_empty());
    }
}
