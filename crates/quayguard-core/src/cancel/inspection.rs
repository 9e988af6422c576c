//! Inspection gating.

use std::collections::HashMap;
use std::sync::Arc;

use glob::Pattern;

use super::scan::compile_patterns;
use super::{CancelDecider, CancelDecision};
use crate::config::InspectionConfig;
use crate::identity::package_type::SupportedPackageType;
use crate::properties::{GatePropertyService, InspectionStatus};
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// Cancels downloads of inspectable artifacts that have not reached a
/// `SUCCESS` inspection status. Artifacts the sweep would decline to inspect
/// (unsupported package type, non-matching name, folders) are always allowed.
pub struct InspectionCancelDecider {
    service: GatePropertyService,
    browser: Arc<dyn RepositoryBrowser>,
    config: InspectionConfig,
    patterns: HashMap<SupportedPackageType, Vec<Pattern>>,
}

impl InspectionCancelDecider {
    pub fn new(
        service: GatePropertyService,
        browser: Arc<dyn RepositoryBrowser>,
        config: InspectionConfig,
    ) -> Self {
        let patterns = SupportedPackageType::ALL
            .into_iter()
            .map(|package_type| {
                (
                    package_type,
                    compile_patterns(config.patterns.for_package_type(package_type)),
                )
            })
            .collect();
        Self {
            service,
            browser,
            config,
            patterns,
        }
    }

    /// Whether the identification sweep would inspect this artifact at all.
    pub fn should_inspect(&self, path: &ArtifactPath) -> bool {
        if !self.config.repos.iter().any(|repo| repo == path.repo_key()) {
            return false;
        }

        let Some(package_type) = self
            .browser
            .package_type(path.repo_key())
            .and_then(|tag| SupportedPackageType::from_tag(&tag))
        else {
            return false;
        };

        let Some(item) = self.browser.item_info(path) else {
            return false;
        };
        if item.is_folder {
            return false;
        }

        self.patterns
            .get(&package_type)
            .is_some_and(|patterns| patterns.iter().any(|pattern| pattern.matches(&item.name)))
    }
}

impl CancelDecider for InspectionCancelDecider {
    fn name(&self) -> &'static str {
        "inspection"
    }

    fn decide(&self, path: &ArtifactPath) -> CancelDecision {
        if !self.config.metadata_block_enabled {
            return CancelDecision::allow();
        }

        let succeeded = self
            .service
            .assert_inspection_status(path, InspectionStatus::Success);
        if !succeeded && self.should_inspect(path) {
            return self
                .config
                .absent_state
                .verdict("Missing SUCCESS inspection status on an artifact that should be inspected.");
        }

        CancelDecision::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::AbsentStatePolicy;
    use crate::properties::InMemoryPropertyStore;
    use crate::repo::InMemoryRepository;

    fn setup(
        config: InspectionConfig,
    ) -> (
        GatePropertyService,
        Arc<InMemoryRepository>,
        InspectionCancelDecider,
    ) {
        let service = GatePropertyService::new(Arc::new(InMemoryPropertyStore::new()));
        let repo = Arc::new(InMemoryRepository::new());
        repo.set_package_type("npm-local", "npm");
        let decider = InspectionCancelDecider::new(service.clone(), repo.clone(), config);
        (service, repo, decider)
    }

    fn config() -> InspectionConfig {
        InspectionConfig {
            metadata_block_enabled: true,
            repos: vec!["npm-local".to_string()],
            absent_state: AbsentStatePolicy::FailClosed,
            ..InspectionConfig::default()
        }
    }

    #[test]
    fn uninspected_eligible_artifact_cancels() {
        let (_service, repo, decider) = setup(config());
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        repo.add_file(path.clone(), "");
        let decision = decider.decide(&path);
        assert!(decision.should_cancel());
        assert!(decision.reason().unwrap().contains("inspection status"));
    }

    #[test]
    fn successful_inspection_allows() {
        let (service, repo, decider) = setup(config());
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        repo.add_file(path.clone(), "");
        service.set_inspection_status(&path, InspectionStatus::Success, None, None);
        assert!(!decider.decide(&path).should_cancel());
    }

    #[test]
    fn pending_inspection_still_cancels() {
        let (service, repo, decider) = setup(config());
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        repo.add_file(path.clone(), "");
        service.set_inspection_status(&path, InspectionStatus::Pending, None, None);
        assert!(decider.decide(&path).should_cancel());
    }

    #[test]
    fn ineligible_artifact_is_always_allowed() {
        let (_service, repo, decider) = setup(config());
        // Name does not match the npm patterns, so the sweep would skip it.
        let path = ArtifactPath::new("npm-local", "left-pad/readme.md");
        repo.add_file(path.clone(), "");
        assert!(!decider.decide(&path).should_cancel());
        assert!(!decider.should_inspect(&path));
    }

    #[test]
    fn unsupported_package_type_is_not_inspectable() {
        let (_service, repo, decider) = setup(config());
        repo.set_package_type("npm-local", "docker");
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        repo.add_file(path.clone(), "");
        assert!(!decider.decide(&path).should_cancel());
    }

    #[test]
    fn absent_state_fail_open_allows_uninspected() {
        let mut config = config();
        config.absent_state = AbsentStatePolicy::FailOpen;
        let (_service, repo, decider) = setup(config);
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        repo.add_file(path.clone(), "");
        assert!(!decider.decide(&path).should_cancel());
    }
}
