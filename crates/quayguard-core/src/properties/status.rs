//! The status vocabulary persisted in artifact properties, and the two
//! report types projected from resolved notifications.

use std::fmt;

/// Policy standing of a component version as reported by the scanning
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentPolicyStatus {
    NotInViolation,
    InViolation,
    InViolationOverridden,
}

impl ComponentPolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentPolicyStatus::NotInViolation => "NOT_IN_VIOLATION",
            ComponentPolicyStatus::InViolation => "IN_VIOLATION",
            ComponentPolicyStatus::InViolationOverridden => "IN_VIOLATION_OVERRIDDEN",
        }
    }

    pub fn parse(value: &str) -> Option<ComponentPolicyStatus> {
        match value.trim() {
            "NOT_IN_VIOLATION" => Some(ComponentPolicyStatus::NotInViolation),
            "IN_VIOLATION" => Some(ComponentPolicyStatus::InViolation),
            "IN_VIOLATION_OVERRIDDEN" => Some(ComponentPolicyStatus::InViolationOverridden),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentPolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranked severity of a violated policy rule. A blank upstream severity is
/// always materialized as [`PolicySeverity::Unspecified`], never omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicySeverity {
    Unspecified,
    Trivial,
    Minor,
    Major,
    Critical,
    Blocker,
}

impl PolicySeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicySeverity::Unspecified => "UNSPECIFIED",
            PolicySeverity::Trivial => "TRIVIAL",
            PolicySeverity::Minor => "MINOR",
            PolicySeverity::Major => "MAJOR",
            PolicySeverity::Critical => "CRITICAL",
            PolicySeverity::Blocker => "BLOCKER",
        }
    }

    pub fn parse(value: &str) -> Option<PolicySeverity> {
        match value.trim() {
            "UNSPECIFIED" => Some(PolicySeverity::Unspecified),
            "TRIVIAL" => Some(PolicySeverity::Trivial),
            "MINOR" => Some(PolicySeverity::Minor),
            "MAJOR" => Some(PolicySeverity::Major),
            "CRITICAL" => Some(PolicySeverity::Critical),
            "BLOCKER" => Some(PolicySeverity::Blocker),
            _ => None,
        }
    }
}

impl fmt::Display for PolicySeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inspection standing of an artifact or repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionStatus {
    Pending,
    Success,
    Failure,
}

impl InspectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InspectionStatus::Pending => "PENDING",
            InspectionStatus::Success => "SUCCESS",
            InspectionStatus::Failure => "FAILURE",
        }
    }

    pub fn parse(value: &str) -> Option<InspectionStatus> {
        match value.trim() {
            "PENDING" => Some(InspectionStatus::Pending),
            "SUCCESS" => Some(InspectionStatus::Success),
            "FAILURE" => Some(InspectionStatus::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a repository's metadata is current with respect to the
/// notification stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    OutOfDate,
}

impl UpdateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateStatus::UpToDate => "UP_TO_DATE",
            UpdateStatus::OutOfDate => "OUT_OF_DATE",
        }
    }

    pub fn parse(value: &str) -> Option<UpdateStatus> {
        match value.trim() {
            "UP_TO_DATE" => Some(UpdateStatus::UpToDate),
            "OUT_OF_DATE" => Some(UpdateStatus::OutOfDate),
            _ => None,
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a repository-side scan of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResult {
    Success,
    Failure,
}

impl ScanResult {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanResult::Success => "SUCCESS",
            ScanResult::Failure => "FAILURE",
        }
    }

    pub fn parse(value: &str) -> Option<ScanResult> {
        match value.trim() {
            "SUCCESS" => Some(ScanResult::Success),
            "FAILURE" => Some(ScanResult::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status written by the external scan-as-a-service flow. An unrecognized
/// value parses to [`ScanServiceStatus::Unknown`] rather than disappearing:
/// the decider must be able to block on statuses it does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanServiceStatus {
    ScanInProgress,
    SuccessNoPolicyViolation,
    SuccessPolicyViolation,
    Failed,
    Unknown,
}

impl ScanServiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanServiceStatus::ScanInProgress => "SCAN_IN_PROGRESS",
            ScanServiceStatus::SuccessNoPolicyViolation => "SUCCESS_NO_POLICY_VIOLATION",
            ScanServiceStatus::SuccessPolicyViolation => "SUCCESS_POLICY_VIOLATION",
            ScanServiceStatus::Failed => "FAILED",
            ScanServiceStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(value: &str) -> ScanServiceStatus {
        match value.trim() {
            "SCAN_IN_PROGRESS" => ScanServiceStatus::ScanInProgress,
            "SUCCESS_NO_POLICY_VIOLATION" => ScanServiceStatus::SuccessNoPolicyViolation,
            "SUCCESS_POLICY_VIOLATION" => ScanServiceStatus::SuccessPolicyViolation,
            "FAILED" => ScanServiceStatus::Failed,
            _ => ScanServiceStatus::Unknown,
        }
    }

    /// Human-readable detail for block messages, where the status carries one.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ScanServiceStatus::ScanInProgress => Some("Scanning currently in progress."),
            ScanServiceStatus::SuccessPolicyViolation => {
                Some("Scan completed, but policy violations were detected.")
            }
            ScanServiceStatus::Failed => Some("Scan failed."),
            ScanServiceStatus::SuccessNoPolicyViolation | ScanServiceStatus::Unknown => None,
        }
    }
}

impl fmt::Display for ScanServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy outcome of one resolved notification: authoritative status plus
/// the severity of every policy evaluated. The severities list length always
/// equals the number of policies (blanks become `Unspecified`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatusReport {
    pub status: ComponentPolicyStatus,
    pub severities: Vec<PolicySeverity>,
}

impl PolicyStatusReport {
    pub fn new(status: ComponentPolicyStatus, severities: Vec<PolicySeverity>) -> Self {
        Self { status, severities }
    }
}

/// Vulnerability counts for a component version, bucketed by severity. Each
/// vulnerability is counted exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VulnerabilityAggregate {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl VulnerabilityAggregate {
    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_status_round_trip() {
        for status in [
            ComponentPolicyStatus::NotInViolation,
            ComponentPolicyStatus::InViolation,
            ComponentPolicyStatus::InViolationOverridden,
        ] {
            assert_eq!(ComponentPolicyStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ComponentPolicyStatus::parse("nonsense"), None);
    }

    #[test]
    fn severity_round_trip() {
        for severity in [
            PolicySeverity::Unspecified,
            PolicySeverity::Trivial,
            PolicySeverity::Minor,
            PolicySeverity::Major,
            PolicySeverity::Critical,
            PolicySeverity::Blocker,
        ] {
            assert_eq!(PolicySeverity::parse(severity.as_str()), Some(severity));
        }
    }

    #[test]
    fn scan_service_status_never_fails_to_parse() {
        assert_eq!(
            ScanServiceStatus::parse("SCAN_IN_PROGRESS"),
            ScanServiceStatus::ScanInProgress
        );
        assert_eq!(
            ScanServiceStatus::parse("SOMETHING_NEW"),
            ScanServiceStatus::Unknown
        );
    }

    #[test]
    fn aggregate_total() {
        let aggregate = VulnerabilityAggregate {
            critical: 1,
            high: 2,
            medium: 3,
            low: 4,
        };
        assert_eq!(aggregate.total(), 10);
    }
}
