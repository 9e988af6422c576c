//! Repository-side scan gating.

use std::sync::Arc;

use glob::Pattern;
use tracing::warn;

use super::{CancelDecider, CancelDecision};
use crate::config::ScanConfig;
use crate::properties::{GatePropertyService, ScanResult};
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// Cancels downloads of scannable artifacts whose scan failed or has not
/// produced a result yet. Whether a missing result blocks is the configured
/// absent-state choice; a recorded `FAILURE` always blocks.
pub struct ScanCancelDecider {
    service: GatePropertyService,
    browser: Arc<dyn RepositoryBrowser>,
    config: ScanConfig,
    name_patterns: Vec<Pattern>,
}

impl ScanCancelDecider {
    pub fn new(
        service: GatePropertyService,
        browser: Arc<dyn RepositoryBrowser>,
        config: ScanConfig,
    ) -> Self {
        let name_patterns = compile_patterns(&config.name_patterns);
        Self {
            service,
            browser,
            config,
            name_patterns,
        }
    }

    fn name_matches(&self, file_name: &str) -> bool {
        self.name_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
    }
}

impl CancelDecider for ScanCancelDecider {
    fn name(&self) -> &'static str {
        "scan"
    }

    fn decide(&self, path: &ArtifactPath) -> CancelDecision {
        if !self.config.metadata_block_enabled {
            return CancelDecision::allow();
        }
        if !self.config.repos.iter().any(|repo| repo == path.repo_key()) {
            return CancelDecision::allow();
        }

        // Folder metadata never gates; an item the host no longer knows
        // about cannot be downloaded anyway.
        let Some(item) = self.browser.item_info(path) else {
            return CancelDecision::allow();
        };
        if item.is_folder {
            return CancelDecision::allow();
        }

        match self.service.scan_result(path) {
            Some(ScanResult::Failure) => CancelDecision::cancel(
                "The artifact was not successfully scanned. Found result FAILURE.",
            ),
            Some(ScanResult::Success) => CancelDecision::allow(),
            None if self.name_matches(&item.name) => self
                .config
                .absent_state
                .verdict("Missing the SUCCESS scan result on an artifact that should be scanned."),
            None => CancelDecision::allow(),
        }
    }
}

/// Compile name patterns, dropping invalid ones with a warning so one bad
/// pattern cannot disable the gate.
pub(crate) fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(error) => {
                warn!(pattern = %raw, %error, "ignoring invalid name pattern");
                None
            }
        })
        .collect()
}
