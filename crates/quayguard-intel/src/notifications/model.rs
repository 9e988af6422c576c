//! Resolved notification records and the conversions that build them.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use quayguard_core::properties::{PolicySeverity, PolicyStatusReport, VulnerabilityAggregate};
use quayguard_core::repo::ArtifactPath;

use crate::types::{PolicyInfo, VulnerabilityView};

/// A policy-kind notification after correlation: the component it concerns,
/// its authoritative status report, and the repository roots it affects.
/// Ephemeral -- only its projection onto artifact properties survives the
/// cycle.
#[derive(Debug, Clone)]
pub struct ResolvedPolicyNotification {
    pub component_name: String,
    pub component_version_name: String,
    pub component_version_id: Option<String>,
    pub status_report: PolicyStatusReport,
    pub affected_repo_roots: Vec<ArtifactPath>,
}

/// A vulnerability notification after correlation and severity aggregation.
#[derive(Debug, Clone)]
pub struct ResolvedVulnerabilityNotification {
    pub component_name: String,
    pub component_version_name: String,
    pub component_version_id: Option<String>,
    pub aggregate: VulnerabilityAggregate,
    pub affected_repo_roots: Vec<ArtifactPath>,
}

/// Convert a notification's policy-info list into severities, one entry per
/// policy. Blank and unrecognized severities become `UNSPECIFIED`, so the
/// output length always equals the input length.
pub fn severities_from_policy_infos(policy_infos: &[PolicyInfo]) -> Vec<PolicySeverity> {
    policy_infos
        .iter()
        .map(|info| match info.severity.as_deref() {
            None => PolicySeverity::Unspecified,
            Some(raw) if raw.trim().is_empty() => PolicySeverity::Unspecified,
            Some(raw) => PolicySeverity::parse(raw).unwrap_or_else(|| {
                debug!(policy = %info.policy_name, severity = raw, "unrecognized policy severity");
                PolicySeverity::Unspecified
            }),
        })
        .collect()
}

/// Count vulnerabilities into severity buckets. Each view is counted once by
/// its primary severity; unrecognized severities are dropped with a log.
pub fn aggregate_vulnerabilities(views: &[VulnerabilityView]) -> VulnerabilityAggregate {
    let mut aggregate = VulnerabilityAggregate::default();
    for view in views {
        match view.severity.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => aggregate.critical += 1,
            "HIGH" => aggregate.high += 1,
            "MEDIUM" => aggregate.medium += 1,
            "LOW" => aggregate.low += 1,
            other => {
                debug!(vulnerability = %view.name, severity = other, "unrecognized vulnerability severity");
            }
        }
    }
    aggregate
}

const UUID_PATTERN: &str = "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Extract the component-version id from a component version URL of the form
/// `.../components/{uuid}/versions/{uuid}`. Soft-fails on any other shape.
pub fn extract_component_version_id(component_version_url: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(&format!(
            ".*/components/{UUID_PATTERN}/versions/({UUID_PATTERN}).*"
        ))
        .expect("component version id pattern is valid")
    });

    pattern
        .captures(component_version_url)
        .map(|captures| captures[1].to_string())
}
