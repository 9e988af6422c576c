//! Scan-as-a-service gating.

use std::sync::Arc;

use super::{BlockingStrategy, CancelDecider, CancelDecision};
use crate::config::ScanServiceConfig;
use crate::properties::{GatePropertyService, ScanServiceStatus};
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// Gates on the status written by the external scan-as-a-service flow.
///
/// Definitively bad terminal statuses (`FAILED`, a policy-violating success,
/// or a status the gate does not recognize) always cancel; whether an
/// in-progress or never-scheduled scan cancels depends on the configured
/// [`BlockingStrategy`].
pub struct ScanServiceCancelDecider {
    service: GatePropertyService,
    browser: Arc<dyn RepositoryBrowser>,
    config: ScanServiceConfig,
}

impl ScanServiceCancelDecider {
    pub fn new(
        service: GatePropertyService,
        browser: Arc<dyn RepositoryBrowser>,
        config: ScanServiceConfig,
    ) -> Self {
        Self {
            service,
            browser,
            config,
        }
    }

    fn blocked(&self, path: &ArtifactPath, detail: &str) -> CancelDecision {
        CancelDecision::cancel(format!("Download blocked; {detail}; artifact: {path}"))
    }
}

impl CancelDecider for ScanServiceCancelDecider {
    fn name(&self) -> &'static str {
        "scan-service"
    }

    fn decide(&self, path: &ArtifactPath) -> CancelDecision {
        if !self.config.enabled {
            return CancelDecision::allow();
        }
        if self
            .browser
            .item_info(path)
            .is_none_or(|item| item.is_folder)
        {
            return CancelDecision::allow();
        }

        match self.service.scan_service_status(path) {
            Some(status) => match status {
                ScanServiceStatus::SuccessNoPolicyViolation => CancelDecision::allow(),
                ScanServiceStatus::Failed | ScanServiceStatus::SuccessPolicyViolation => {
                    self.blocked(path, status.message().unwrap_or("scan did not succeed"))
                }
                ScanServiceStatus::ScanInProgress => match self.config.blocking_strategy {
                    BlockingStrategy::BlockAll => {
                        self.blocked(path, status.message().unwrap_or("scan in progress"))
                    }
                    BlockingStrategy::BlockNone => CancelDecision::allow(),
                },
                ScanServiceStatus::Unknown => self.blocked(path, "unrecognized scan status"),
            },
            None => match self.config.blocking_strategy {
                BlockingStrategy::BlockAll => self.blocked(path, "scan has not been scheduled"),
                BlockingStrategy::BlockNone => CancelDecision::allow(),
            },
        }
    }
}
