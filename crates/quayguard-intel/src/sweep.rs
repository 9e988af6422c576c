//! The periodic identification sweep.
//!
//! Walks a repository, assigns an external identity to every newly seen
//! artifact the package type's patterns select, and keeps the per-artifact
//! inspection bookkeeping. Identification misses are logged and retried on
//! later sweeps up to the configured cap, never synchronously.

use std::sync::Arc;

use glob::Pattern;
use tracing::{debug, info, warn};

use quayguard_core::config::InspectionConfig;
use quayguard_core::identity::package_type::SupportedPackageType;
use quayguard_core::identity::resolver::IdentityResolver;
use quayguard_core::properties::{GatePropertyService, InspectionStatus, PropertyStore};
use quayguard_core::repo::{ArtifactPath, RepositoryBrowser};

/// Counters for one repository sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub identified: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct IdentificationSweep {
    resolver: IdentityResolver,
    service: GatePropertyService,
    browser: Arc<dyn RepositoryBrowser>,
    config: InspectionConfig,
}

impl IdentificationSweep {
    pub fn new(
        store: Arc<dyn PropertyStore>,
        browser: Arc<dyn RepositoryBrowser>,
        config: InspectionConfig,
    ) -> Self {
        let service = GatePropertyService::new(store.clone())
            .with_inspection_retries(config.max_retries)
            .with_default_project_version(&config.default_project_version);
        Self {
            resolver: IdentityResolver::new(store, browser.clone()),
            service,
            browser,
            config,
        }
    }

    /// Sweep every configured repository.
    pub fn sweep_all(&self) -> SweepSummary {
        let mut total = SweepSummary::default();
        for repo_key in &self.config.repos {
            let summary = self.sweep_repository(repo_key);
            total.identified += summary.identified;
            total.skipped += summary.skipped;
            total.failed += summary.failed;
        }
        total
    }

    /// Sweep one repository, identifying newly seen artifacts.
    pub fn sweep_repository(&self, repo_key: &str) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let Some(tag) = self.browser.package_type(repo_key) else {
            warn!(repo = %repo_key, "repository has no package type, skipping sweep");
            return summary;
        };
        let Some(package_type) = SupportedPackageType::from_tag(&tag) else {
            warn!(repo = %repo_key, package_type = %tag, "package type not supported, skipping sweep");
            return summary;
        };

        self.initialize_repo_root(repo_key);

        let patterns = compile_patterns(self.config.patterns.for_package_type(package_type));
        for path in self.browser.list_artifacts(repo_key) {
            let Some(item) = self.browser.item_info(&path) else {
                continue;
            };
            if item.is_folder {
                continue;
            }
            if !patterns.iter().any(|pattern| pattern.matches(&item.name)) {
                summary.skipped += 1;
                continue;
            }
            if self.service.has_external_id_properties(&path) {
                summary.skipped += 1;
                continue;
            }
            if !self.service.should_retry_inspection(&path) {
                debug!(artifact = %path, "identification retries exhausted");
                summary.skipped += 1;
                continue;
            }

            match self.resolver.resolve_as(package_type, &path) {
                Some(id) => {
                    debug!(artifact = %path, id = %id, "identified artifact");
                    self.service.set_external_id_properties(&path, &id);
                    self.service
                        .set_inspection_status(&path, InspectionStatus::Pending, None, None);
                    summary.identified += 1;
                }
                None => {
                    self.service
                        .fail_inspection(&path, "no identity could be extracted");
                    summary.failed += 1;
                }
            }
        }

        // The repository-level inspection is current once a sweep completes.
        self.service
            .set_inspection_status(&ArtifactPath::repo_root(repo_key), InspectionStatus::Success, None, None);

        info!(
            repo = %repo_key,
            identified = summary.identified,
            skipped = summary.skipped,
            failed = summary.failed,
            "identification sweep complete"
        );
        summary
    }

    /// First-time setup of a repository root: project coordinates and a
    /// pending inspection status.
    fn initialize_repo_root(&self, repo_key: &str) {
        let root = ArtifactPath::repo_root(repo_key);
        if self.service.has_inspection_status(&root) {
            return;
        }
        let project_name = self.service.repo_project_name(repo_key);
        let project_version = self.service.repo_project_version_name(repo_key);
        self.service
            .set_repo_project_name_properties(repo_key, &project_name, &project_version);
        self.service
            .set_inspection_status(&root, InspectionStatus::Pending, None, None);
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(error) => {
                warn!(pattern = %raw, %error, "ignoring invalid sweep pattern");
                None
            }
        })
        .collect()
}
