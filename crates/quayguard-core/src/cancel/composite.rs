//! The composite decider the host's before-download hook calls.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    CancelDecider, CancelDecision, InspectionCancelDecider, PolicyCancelDecider, ScanCancelDecider,
    ScanServiceCancelDecider,
};
use crate::config::GateConfig;
use crate::properties::{GatePropertyService, PropertyStore};
use crate::repo::RepositoryBrowser;

/// Runs every configured decider in a fixed order; the first cancellation
/// wins and short-circuits the rest. Deciders are independent, so the order
/// only determines which reason the user sees when several would cancel.
pub struct CompositeCancelDecider {
    deciders: Vec<Box<dyn CancelDecider>>,
}

impl CompositeCancelDecider {
    pub fn new(deciders: Vec<Box<dyn CancelDecider>>) -> Self {
        Self { deciders }
    }

    /// Wire up the standard decider set (policy, scan, inspection,
    /// scan-as-a-service) from configuration.
    pub fn from_config(
        config: &GateConfig,
        store: Arc<dyn PropertyStore>,
        browser: Arc<dyn RepositoryBrowser>,
    ) -> Self {
        let service = GatePropertyService::new(store)
            .with_inspection_retries(config.inspection.max_retries)
            .with_default_project_version(&config.inspection.default_project_version);

        Self::new(vec![
            Box::new(PolicyCancelDecider::new(
                service.clone(),
                config.policy.clone(),
            )),
            Box::new(ScanCancelDecider::new(
                service.clone(),
                browser.clone(),
                config.scan.clone(),
            )),
            Box::new(InspectionCancelDecider::new(
                service.clone(),
                browser.clone(),
                config.inspection.clone(),
            )),
            Box::new(ScanServiceCancelDecider::new(
                service,
                browser,
                config.scan_service.clone(),
            )),
        ])
    }

    /// Evaluate one download request. Never panics; never performs I/O
    /// beyond property reads.
    pub fn evaluate(&self, path: &crate::repo::ArtifactPath) -> CancelDecision {
        for decider in &self.deciders {
            let decision = decider.decide(path);
            if decision.should_cancel() {
                info!(
                    artifact = %path,
                    decider = decider.name(),
                    reason = decision.reason().unwrap_or_default(),
                    "download cancelled"
                );
                return decision;
            }
            debug!(artifact = %path, decider = decider.name(), "no cancellation");
        }
        CancelDecision::allow()
    }
}

impl CancelDecider for CompositeCancelDecider {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn decide(&self, path: &crate::repo::ArtifactPath) -> CancelDecision {
        self.evaluate(path)
    }
}
