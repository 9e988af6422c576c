//! Typed accessors over the raw [`PropertyStore`].
//!
//! All writes the background pipeline performs go through this service so
//! the property layout stays in one place. Parsing is lenient: a property
//! that fails to parse is treated as absent and logged, never an error on
//! the request path.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use super::status::{
    ComponentPolicyStatus, InspectionStatus, PolicySeverity, PolicyStatusReport, ScanResult,
    ScanServiceStatus, UpdateStatus, VulnerabilityAggregate,
};
use super::{GateProperty, PropertyStore};
use crate::identity::ExternalId;
use crate::repo::ArtifactPath;

const DEFAULT_MAX_INSPECTION_RETRIES: u32 = 5;
const DEFAULT_PROJECT_VERSION: &str = "UNKNOWN_VERSION";

/// Typed view of the gate's property state.
#[derive(Clone)]
pub struct GatePropertyService {
    store: Arc<dyn PropertyStore>,
    max_inspection_retries: u32,
    default_project_version: String,
}

impl GatePropertyService {
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self {
            store,
            max_inspection_retries: DEFAULT_MAX_INSPECTION_RETRIES,
            default_project_version: DEFAULT_PROJECT_VERSION.to_string(),
        }
    }

    pub fn with_inspection_retries(mut self, max: u32) -> Self {
        self.max_inspection_retries = max;
        self
    }

    pub fn with_default_project_version(mut self, version: impl Into<String>) -> Self {
        self.default_project_version = version.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn PropertyStore> {
        &self.store
    }

    fn get(&self, path: &ArtifactPath, property: GateProperty) -> Option<String> {
        self.store.get(path, property.key())
    }

    fn set(&self, path: &ArtifactPath, property: GateProperty, value: &str) {
        debug!(artifact = %path, key = property.key(), value, "setting property");
        self.store.set(path, property.key(), value);
    }

    fn has(&self, path: &ArtifactPath, property: GateProperty) -> bool {
        self.store.has(path, property.key())
    }

    fn delete(&self, path: &ArtifactPath, property: GateProperty) {
        self.store.delete(path, property.key());
    }

    // --- identity ---------------------------------------------------------

    /// The searchable `name-version` value stored alongside an identity.
    pub fn component_name_version_value(name: &str, version: &str) -> String {
        format!("{name}-{version}")
    }

    pub fn has_external_id_properties(&self, path: &ArtifactPath) -> bool {
        self.has(path, GateProperty::Forge)
            && self.has(path, GateProperty::OriginId)
            && self.has(path, GateProperty::ComponentNameVersion)
    }

    pub fn set_external_id_properties(&self, path: &ArtifactPath, id: &ExternalId) {
        self.set(path, GateProperty::Forge, id.forge().as_str());
        self.set(path, GateProperty::OriginId, &id.origin_id());
        self.set(
            path,
            GateProperty::ComponentNameVersion,
            &Self::component_name_version_value(id.name(), id.version()),
        );
    }

    // --- policy -----------------------------------------------------------

    pub fn set_policy_properties(&self, path: &ArtifactPath, report: &PolicyStatusReport) {
        if report.severities.is_empty() {
            self.delete(path, GateProperty::PolicySeverityTypes);
        } else {
            let joined = report
                .severities
                .iter()
                .map(|severity| severity.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.set(path, GateProperty::PolicySeverityTypes, &joined);
        }
        self.set(path, GateProperty::PolicyStatus, report.status.as_str());
    }

    pub fn policy_status(&self, path: &ArtifactPath) -> Option<ComponentPolicyStatus> {
        self.parse_with(path, GateProperty::PolicyStatus, ComponentPolicyStatus::parse)
    }

    pub fn overall_policy_status(&self, path: &ArtifactPath) -> Option<ComponentPolicyStatus> {
        self.parse_with(
            path,
            GateProperty::OverallPolicyStatus,
            ComponentPolicyStatus::parse,
        )
    }

    pub fn set_overall_policy_status(&self, path: &ArtifactPath, status: ComponentPolicyStatus) {
        self.set(path, GateProperty::OverallPolicyStatus, status.as_str());
    }

    /// The recorded severities, or `None` when the property is absent. An
    /// unparsable entry is dropped with a log rather than poisoning the list.
    pub fn policy_severities(&self, path: &ArtifactPath) -> Option<Vec<PolicySeverity>> {
        let raw = self.get(path, GateProperty::PolicySeverityTypes)?;
        let severities = raw
            .split(',')
            .filter(|piece| !piece.trim().is_empty())
            .filter_map(|piece| {
                let parsed = PolicySeverity::parse(piece);
                if parsed.is_none() {
                    warn!(artifact = %path, severity = piece, "unrecognized policy severity");
                }
                parsed
            })
            .collect();
        Some(severities)
    }

    // --- vulnerabilities --------------------------------------------------

    pub fn set_vulnerability_properties(
        &self,
        path: &ArtifactPath,
        aggregate: &VulnerabilityAggregate,
    ) {
        self.set(
            path,
            GateProperty::CriticalVulnerabilities,
            &aggregate.critical.to_string(),
        );
        self.set(
            path,
            GateProperty::HighVulnerabilities,
            &aggregate.high.to_string(),
        );
        self.set(
            path,
            GateProperty::MediumVulnerabilities,
            &aggregate.medium.to_string(),
        );
        self.set(
            path,
            GateProperty::LowVulnerabilities,
            &aggregate.low.to_string(),
        );
    }

    pub fn vulnerability_counts(&self, path: &ArtifactPath) -> Option<VulnerabilityAggregate> {
        let count = |property| {
            self.get(path, property)
                .and_then(|raw| raw.trim().parse::<u32>().ok())
        };
        let critical = count(GateProperty::CriticalVulnerabilities)?;
        Some(VulnerabilityAggregate {
            critical,
            high: count(GateProperty::HighVulnerabilities).unwrap_or(0),
            medium: count(GateProperty::MediumVulnerabilities).unwrap_or(0),
            low: count(GateProperty::LowVulnerabilities).unwrap_or(0),
        })
    }

    // --- inspection -------------------------------------------------------

    pub fn inspection_status(&self, path: &ArtifactPath) -> Option<InspectionStatus> {
        self.parse_with(path, GateProperty::InspectionStatus, InspectionStatus::parse)
    }

    pub fn has_inspection_status(&self, path: &ArtifactPath) -> bool {
        self.has(path, GateProperty::InspectionStatus)
    }

    pub fn assert_inspection_status(&self, path: &ArtifactPath, status: InspectionStatus) -> bool {
        self.inspection_status(path) == Some(status)
    }

    pub fn set_inspection_status(
        &self,
        path: &ArtifactPath,
        status: InspectionStatus,
        message: Option<&str>,
        retry_count: Option<u32>,
    ) {
        self.set_timestamp(path, GateProperty::LastInspection, Utc::now());
        self.set(path, GateProperty::InspectionStatus, status.as_str());

        match message.filter(|message| !message.trim().is_empty()) {
            Some(message) => self.set(path, GateProperty::InspectionStatusMessage, message),
            None => self.delete(path, GateProperty::InspectionStatusMessage),
        }

        match retry_count {
            Some(count) => self.set(
                path,
                GateProperty::InspectionRetryCount,
                &count.to_string(),
            ),
            None => self.delete(path, GateProperty::InspectionRetryCount),
        }
    }

    fn failed_inspection_count(&self, path: &ArtifactPath) -> u32 {
        self.get(path, GateProperty::InspectionRetryCount)
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Record an inspection failure, bounded by the retry cap.
    pub fn fail_inspection(&self, path: &ArtifactPath, message: &str) {
        let retry_count = self.failed_inspection_count(path) + 1;
        debug!(artifact = %path, message, retry_count, "failing inspection");
        if retry_count > self.max_inspection_retries {
            debug!(artifact = %path, "inspection already failed the maximum number of times");
        } else {
            self.set_inspection_status(
                path,
                InspectionStatus::Failure,
                Some(message),
                Some(retry_count),
            );
        }
    }

    /// An artifact is re-inspected while it has no status, or while it has
    /// failed fewer times than the retry cap allows.
    pub fn should_retry_inspection(&self, path: &ArtifactPath) -> bool {
        !self.has_inspection_status(path)
            || (self.assert_inspection_status(path, InspectionStatus::Failure)
                && self.failed_inspection_count(path) < self.max_inspection_retries)
    }

    // --- repository-level bookkeeping ------------------------------------

    pub fn repo_project_name(&self, repo_key: &str) -> String {
        self.get(&ArtifactPath::repo_root(repo_key), GateProperty::ProjectName)
            .unwrap_or_else(|| repo_key.to_string())
    }

    pub fn repo_project_version_name(&self, repo_key: &str) -> String {
        self.get(
            &ArtifactPath::repo_root(repo_key),
            GateProperty::ProjectVersionName,
        )
        .unwrap_or_else(|| self.default_project_version.clone())
    }

    pub fn set_repo_project_name_properties(
        &self,
        repo_key: &str,
        project_name: &str,
        project_version_name: &str,
    ) {
        let root = ArtifactPath::repo_root(repo_key);
        self.set(&root, GateProperty::ProjectName, project_name);
        self.set(&root, GateProperty::ProjectVersionName, project_version_name);
    }

    pub fn set_update_status(&self, path: &ArtifactPath, status: UpdateStatus) {
        self.set(path, GateProperty::UpdateStatus, status.as_str());
    }

    pub fn update_status(&self, path: &ArtifactPath) -> Option<UpdateStatus> {
        self.parse_with(path, GateProperty::UpdateStatus, UpdateStatus::parse)
    }

    pub fn set_last_update(&self, path: &ArtifactPath, at: DateTime<Utc>) {
        self.set_timestamp(path, GateProperty::LastUpdate, at);
    }

    pub fn last_update(&self, path: &ArtifactPath) -> Option<DateTime<Utc>> {
        self.timestamp(path, GateProperty::LastUpdate)
    }

    pub fn last_inspection(&self, path: &ArtifactPath) -> Option<DateTime<Utc>> {
        self.timestamp(path, GateProperty::LastInspection)
    }

    // --- scan -------------------------------------------------------------

    pub fn scan_result(&self, path: &ArtifactPath) -> Option<ScanResult> {
        self.parse_with(path, GateProperty::ScanResult, ScanResult::parse)
    }

    pub fn set_scan_result(&self, path: &ArtifactPath, result: ScanResult) {
        self.set(path, GateProperty::ScanResult, result.as_str());
    }

    pub fn has_scan_time(&self, path: &ArtifactPath) -> bool {
        self.has(path, GateProperty::ScanTime)
    }

    pub fn set_scan_time(&self, path: &ArtifactPath, at: DateTime<Utc>) {
        self.set_timestamp(path, GateProperty::ScanTime, at);
    }

    /// Scan-as-a-service status: `None` when never scheduled, `Unknown` when
    /// present but unrecognized.
    pub fn scan_service_status(&self, path: &ArtifactPath) -> Option<ScanServiceStatus> {
        self.get(path, GateProperty::ScanServiceStatus)
            .map(|raw| ScanServiceStatus::parse(&raw))
    }

    pub fn set_scan_service_status(&self, path: &ArtifactPath, status: ScanServiceStatus) {
        self.set(path, GateProperty::ScanServiceStatus, status.as_str());
    }

    // --- helpers ----------------------------------------------------------

    fn parse_with<T>(
        &self,
        path: &ArtifactPath,
        property: GateProperty,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let raw = self.get(path, property)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            warn!(artifact = %path, key = property.key(), value = %raw, "unparsable property value");
        }
        parsed
    }

    fn set_timestamp(&self, path: &ArtifactPath, property: GateProperty, at: DateTime<Utc>) {
        self.set(
            path,
            property,
            &at.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }

    fn timestamp(&self, path: &ArtifactPath, property: GateProperty) -> Option<DateTime<Utc>> {
        let raw = self.get(path, property)?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(error) => {
                warn!(artifact = %path, key = property.key(), %error, "unparsable timestamp property");
                None
            }
        }
    }
}
