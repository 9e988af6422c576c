//! The download-gate decision engine.
//!
//! Each decider reads already-persisted artifact properties and renders a
//! [`CancelDecision`]; none of them performs network I/O, so the composite
//! is safe to call on every download request concurrently. The deciders are
//! independent: the [`CompositeCancelDecider`] runs them in a fixed order and
//! the first cancellation wins.

pub mod composite;
pub mod inspection;
pub mod policy;
pub mod scan;
pub mod scan_service;


pub use composite::CompositeCancelDecider;
pub use inspection::InspectionCancelDecider;
pub use policy::PolicyCancelDecider;
pub use scan::ScanCancelDecider;
pub use scan_service::ScanServiceCancelDecider;

use serde::{Deserialize, Serialize};

use crate::repo::ArtifactPath;

/// Verdict for one download request. The reason is present exactly when the
/// download should be cancelled; the host is expected to surface it to the
/// user (typically as an HTTP 403 body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelDecision {
    should_cancel: bool,
    reason: Option<String>,
}

impl CancelDecision {
    pub fn cancel(reason: impl Into<String>) -> CancelDecision {
        CancelDecision {
            should_cancel: true,
            reason: Some(reason.into()),
        }
    }

    pub fn allow() -> CancelDecision {
        CancelDecision {
            should_cancel: false,
            reason: None,
        }
    }

    pub fn should_cancel(&self) -> bool {
        self.should_cancel
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// A single gate strategy. Implementations must be pure with respect to
/// persisted state and must never panic on the request path.
pub trait CancelDecider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn decide(&self, path: &ArtifactPath) -> CancelDecision;
}

/// What a decider does when state it requires has not been written yet. An
/// unevaluated artifact cannot be proven unsafe, so this is a deliberate,
/// per-decider configuration choice rather than a global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentStatePolicy {
    FailOpen,
    FailClosed,
}

impl AbsentStatePolicy {
    /// Render the absent-state verdict, using `reason` when failing closed.
    pub fn verdict(self, reason: impl Into<String>) -> CancelDecision {
        match self {
            AbsentStatePolicy::FailOpen => CancelDecision::allow(),
            AbsentStatePolicy::FailClosed => CancelDecision::cancel(reason),
        }
    }
}

/// How the scan-as-a-service gate treats artifacts whose scan has not
/// reached a definitive good status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingStrategy {
    /// Cancel on anything other than a success without policy violations.
    BlockAll,
    /// Cancel only on definitively bad terminal statuses.
    #[default]
    BlockNone,
}
