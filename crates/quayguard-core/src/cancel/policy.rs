//! Policy-violation gating.

use tracing::debug;

use super::{CancelDecider, CancelDecision};
use crate::config::PolicyConfig;
use crate::properties::{ComponentPolicyStatus, GatePropertyService, PolicySeverity};
use crate::repo::ArtifactPath;

/// Cancels downloads of artifacts whose overall policy status is
/// `IN_VIOLATION` with at least one severity from the configured blocked
/// set. Overridden violations never cancel.
pub struct PolicyCancelDecider {
    service: GatePropertyService,
    config: PolicyConfig,
}

impl PolicyCancelDecider {
    pub fn new(service: GatePropertyService, config: PolicyConfig) -> Self {
        Self { service, config }
    }

    fn severity_verdict(&self, path: &ArtifactPath) -> CancelDecision {
        let Some(severities) = self.service.policy_severities(path) else {
            return self
                .config
                .absent_state
                .verdict("This artifact is in policy violation but carries no severity record.");
        };

        let matching: Vec<PolicySeverity> = severities
            .into_iter()
            .filter(|severity| self.config.blocked_severities.contains(severity))
            .collect();

        if matching.is_empty() {
            return CancelDecision::allow();
        }

        let joined = matching
            .iter()
            .map(|severity| severity.as_str())
            .collect::<Vec<_>>()
            .join(",");
        CancelDecision::cancel(format!(
            "The artifact has policy severities ({joined}) that are blocked by the gate."
        ))
    }
}

impl CancelDecider for PolicyCancelDecider {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn decide(&self, path: &ArtifactPath) -> CancelDecision {
        if !self.config.enabled {
            return CancelDecision::allow();
        }
        if !self.config.repos.iter().any(|repo| repo == path.repo_key()) {
            return CancelDecision::allow();
        }

        if !self.service.has_scan_time(path) {
            debug!(artifact = %path, "no scan time recorded, policy state is absent");
            return self
                .config
                .absent_state
                .verdict("This artifact has not been scanned for policy evaluation yet.");
        }

        let Some(status) = self.service.overall_policy_status(path) else {
            debug!(artifact = %path, "no overall policy status recorded");
            return self
                .config
                .absent_state
                .verdict("This artifact has no overall policy status yet.");
        };

        match status {
            ComponentPolicyStatus::InViolation => self.severity_verdict(path),
            ComponentPolicyStatus::NotInViolation
            | ComponentPolicyStatus::InViolationOverridden => CancelDecision::allow(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::AbsentStatePolicy;
    use crate::properties::{InMemoryPropertyStore, PolicyStatusReport};
    use chrono::Utc;
    use std::sync::Arc;

    fn decider(config: PolicyConfig) -> (GatePropertyService, PolicyCancelDecider) {
        let service = GatePropertyService::new(Arc::new(InMemoryPropertyStore::new()));
        (service.clone(), PolicyCancelDecider::new(service, config))
    }

    fn config() -> PolicyConfig {
        PolicyConfig {
            enabled: true,
            repos: vec!["libs-release".to_string()],
            blocked_severities: vec![PolicySeverity::Major, PolicySeverity::Critical],
            absent_state: AbsentStatePolicy::FailOpen,
        }
    }

    fn violating_artifact(
        service: &GatePropertyService,
        severities: Vec<PolicySeverity>,
    ) -> ArtifactPath {
        let path = ArtifactPath::new("libs-release", "com/foo/bar/1.0/bar-1.0.jar");
        service.set_scan_time(&path, Utc::now());
        service.set_overall_policy_status(&path, ComponentPolicyStatus::InViolation);
        service.set_policy_properties(
            &path,
            &PolicyStatusReport::new(ComponentPolicyStatus::InViolation, severities),
        );
        path
    }

    #[test]
    fn severity_outside_blocked_set_allows() {
        let (service, decider) = decider(config());
        let path = violating_artifact(&service, vec![PolicySeverity::Trivial]);
        assert!(!decider.decide(&path).should_cancel());
    }

    #[test]
    fn severity_inside_blocked_set_cancels() {
        let (service, decider) = decider(config());
        let path = violating_artifact(&service, vec![PolicySeverity::Major]);
        let decision = decider.decide(&path);
        assert!(decision.should_cancel());
        assert!(decision.reason().unwrap().contains("MAJOR"));
    }

    #[test]
    fn overridden_violation_never_cancels() {
        let (service, decider) = decider(config());
        let path = violating_artifact(
            &service,
            vec![PolicySeverity::Blocker, PolicySeverity::Critical],
        );
        service.set_overall_policy_status(&path, ComponentPolicyStatus::InViolationOverridden);
        assert!(!decider.decide(&path).should_cancel());
    }

    #[test]
    fn unconfigured_repo_is_out_of_scope() {
        let (service, decider) = decider(config());
        let path = ArtifactPath::new("other-repo", "a.jar");
        service.set_scan_time(&path, Utc::now());
        service.set_overall_policy_status(&path, ComponentPolicyStatus::InViolation);
        assert!(!decider.decide(&path).should_cancel());
    }

    #[test]
    fn absent_state_follows_configured_policy() {
        let (_service, open_decider) = decider(config());
        let unevaluated = ArtifactPath::new("libs-release", "new.jar");
        assert!(!open_decider.decide(&unevaluated).should_cancel());

        let mut closed = config();
        closed.absent_state = AbsentStatePolicy::FailClosed;
        let (_service, closed_decider) = decider(closed);
        let decision = closed_decider.decide(&unevaluated);
        assert!(decision.should_cancel());
        assert!(decision.reason().unwrap().contains("not been scanned"));
    }

    #[test]
    fn disabled_gate_allows_everything() {
        let mut config = config();
        config.enabled = false;
        let (service, decider) = decider(config);
        let path = violating_artifact(&service, vec![PolicySeverity::Blocker]);
        assert!(!decider.decide(&path).should_cancel());
    }
}
