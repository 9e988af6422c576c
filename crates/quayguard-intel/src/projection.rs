//! Projection of resolved notifications onto artifact properties.
//!
//! Artifacts are located by the searchable `componentNameVersion` property
//! the identification sweep wrote; every match gets its policy or
//! vulnerability fields overwritten. Writes are idempotent, so replaying a
//! notification batch converges to the same state.

use tracing::{debug, info};

use quayguard_core::properties::{GateProperty, GatePropertyService};

use crate::notifications::{ResolvedPolicyNotification, ResolvedVulnerabilityNotification};

pub struct NotificationProjection {
    service: GatePropertyService,
    tracked_repos: Vec<String>,
}

impl NotificationProjection {
    pub fn new(service: GatePropertyService, tracked_repos: Vec<String>) -> Self {
        Self {
            service,
            tracked_repos,
        }
    }

    /// Write one resolved policy notification onto every matching artifact.
    /// Returns the number of artifacts updated.
    pub fn apply_policy(&self, resolved: &ResolvedPolicyNotification) -> usize {
        let artifacts = self.find_artifacts(&resolved.component_name, &resolved.component_version_name);
        for artifact in &artifacts {
            self.service
                .set_policy_properties(artifact, &resolved.status_report);
        }
        if artifacts.is_empty() {
            debug!(
                component = %resolved.component_name,
                version = %resolved.component_version_name,
                "no artifact matches resolved policy notification"
            );
        } else {
            info!(
                component = %resolved.component_name,
                version = %resolved.component_version_name,
                artifacts = artifacts.len(),
                status = %resolved.status_report.status,
                "projected policy notification"
            );
        }
        artifacts.len()
    }

    /// Write one resolved vulnerability notification onto every matching
    /// artifact. Returns the number of artifacts updated.
    pub fn apply_vulnerability(&self, resolved: &ResolvedVulnerabilityNotification) -> usize {
        let artifacts = self.find_artifacts(&resolved.component_name, &resolved.component_version_name);
        for artifact in &artifacts {
            self.service
                .set_vulnerability_properties(artifact, &resolved.aggregate);
        }
        if artifacts.is_empty() {
            debug!(
                component = %resolved.component_name,
                version = %resolved.component_version_name,
                "no artifact matches resolved vulnerability notification"
            );
        }
        artifacts.len()
    }

    fn find_artifacts(
        &self,
        component_name: &str,
        component_version_name: &str,
    ) -> Vec<quayguard_core::repo::ArtifactPath> {
        let value =
            GatePropertyService::component_name_version_value(component_name, component_version_name);
        self.service.store().find_by_property(
            GateProperty::ComponentNameVersion.key(),
            &value,
            &self.tracked_repos,
        )
    }
}
