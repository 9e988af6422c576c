//! Notification correlation.
//!
//! Inbound scanning-service events name projects and components; this module
//! resolves them against the locally-tracked repositories and produces
//! [`model::ResolvedPolicyNotification`]s and
//! [`model::ResolvedVulnerabilityNotification`]s for projection onto
//! artifact properties. A notification that cannot be resolved, or whose
//! upstream fetch fails, is skipped with a log; the batch always continues.

pub mod lookup;
pub mod model;
pub mod processor;

pub use lookup::RepositoryProjectLookup;
pub use model::{ResolvedPolicyNotification, ResolvedVulnerabilityNotification};
pub use processor::NotificationProcessor;
