//! Gate configuration, loaded from a TOML file.
//!
//! Every section has serde defaults so a host can start from an empty file
//! and enable pieces incrementally. The decider sections each carry an
//! explicit absent-state policy; there is deliberately no global default for
//! that choice.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cancel::{AbsentStatePolicy, BlockingStrategy};
use crate::identity::package_type::SupportedPackageType;
use crate::properties::PolicySeverity;

/// Top-level quayguard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Identification sweep / inspection gating.
    #[serde(default)]
    pub inspection: InspectionConfig,

    /// Repository-side scan gating.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Policy-violation gating.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Scan-as-a-service gating.
    #[serde(default)]
    pub scan_service: ScanServiceConfig,

    /// Scanning-service connection settings.
    #[serde(default)]
    pub intel: IntelConfig,
}

impl GateConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<GateConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

/// Inspection sweep and inspection-gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Whether missing inspection metadata blocks downloads.
    #[serde(default)]
    pub metadata_block_enabled: bool,

    /// Repositories the inspection sweep covers.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Verdict when required inspection state is absent.
    #[serde(default = "default_fail_closed")]
    pub absent_state: AbsentStatePolicy,

    /// How many times a failed inspection is retried before sticking.
    #[serde(default = "default_inspection_retries")]
    pub max_retries: u32,

    /// Project version reported for repositories without an explicit one.
    #[serde(default = "default_project_version")]
    pub default_project_version: String,

    /// File-name patterns selecting inspectable artifacts, per package type.
    #[serde(default)]
    pub patterns: PatternsConfig,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            metadata_block_enabled: false,
            repos: Vec::new(),
            absent_state: default_fail_closed(),
            max_retries: default_inspection_retries(),
            default_project_version: default_project_version(),
            patterns: PatternsConfig::default(),
        }
    }
}

/// File-name patterns per package type. The defaults match the artifact
/// extensions each ecosystem distributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default = "default_patterns_tar_gz")]
    pub bower: Vec<String>,
    #[serde(default = "default_patterns_tar_gz")]
    pub cocoapods: Vec<String>,
    #[serde(default = "default_patterns_composer")]
    pub composer: Vec<String>,
    #[serde(default = "default_patterns_conda")]
    pub conda: Vec<String>,
    #[serde(default = "default_patterns_tar_gz")]
    pub cran: Vec<String>,
    #[serde(default = "default_patterns_gems")]
    pub gems: Vec<String>,
    #[serde(default = "default_patterns_go")]
    pub go: Vec<String>,
    #[serde(default = "default_patterns_jar")]
    pub gradle: Vec<String>,
    #[serde(default = "default_patterns_jar")]
    pub maven: Vec<String>,
    #[serde(default = "default_patterns_npm")]
    pub npm: Vec<String>,
    #[serde(default = "default_patterns_nuget")]
    pub nuget: Vec<String>,
    #[serde(default = "default_patterns_pypi")]
    pub pypi: Vec<String>,
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            bower: default_patterns_tar_gz(),
            cocoapods: default_patterns_tar_gz(),
            composer: default_patterns_composer(),
            conda: default_patterns_conda(),
            cran: default_patterns_tar_gz(),
            gems: default_patterns_gems(),
            go: default_patterns_go(),
            gradle: default_patterns_jar(),
            maven: default_patterns_jar(),
            npm: default_patterns_npm(),
            nuget: default_patterns_nuget(),
            pypi: default_patterns_pypi(),
        }
    }
}

impl PatternsConfig {
    pub fn for_package_type(&self, package_type: SupportedPackageType) -> &[String] {
        match package_type {
            SupportedPackageType::Bower => &self.bower,
            SupportedPackageType::Cocoapods => &self.cocoapods,
            SupportedPackageType::Composer => &self.composer,
            SupportedPackageType::Conda => &self.conda,
            SupportedPackageType::Cran => &self.cran,
            SupportedPackageType::Gems => &self.gems,
            SupportedPackageType::Go => &self.go,
            SupportedPackageType::Gradle => &self.gradle,
            SupportedPackageType::Maven => &self.maven,
            SupportedPackageType::Npm => &self.npm,
            SupportedPackageType::Nuget => &self.nuget,
            SupportedPackageType::Pypi => &self.pypi,
        }
    }
}

/// Repository-side scan gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Whether missing scan metadata blocks downloads.
    #[serde(default)]
    pub metadata_block_enabled: bool,

    /// Repositories the scan gate covers.
    #[serde(default)]
    pub repos: Vec<String>,

    /// File-name patterns selecting scannable artifacts.
    #[serde(default = "default_scan_name_patterns")]
    pub name_patterns: Vec<String>,

    /// Verdict when required scan state is absent.
    #[serde(default = "default_fail_closed")]
    pub absent_state: AbsentStatePolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            metadata_block_enabled: false,
            repos: Vec::new(),
            name_patterns: default_scan_name_patterns(),
            absent_state: default_fail_closed(),
        }
    }
}

/// Policy-violation gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Whether policy violations block downloads at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Repositories the policy gate covers.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Severities that block when a component is in violation.
    #[serde(default = "default_blocked_severities")]
    pub blocked_severities: Vec<PolicySeverity>,

    /// Verdict when required policy state is absent.
    #[serde(default = "default_fail_open")]
    pub absent_state: AbsentStatePolicy,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repos: Vec::new(),
            blocked_severities: default_blocked_severities(),
            absent_state: default_fail_open(),
        }
    }
}

/// Scan-as-a-service gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanServiceConfig {
    /// Whether the scan-as-a-service gate is active.
    #[serde(default)]
    pub enabled: bool,

    /// How aggressively non-terminal statuses block.
    #[serde(default)]
    pub blocking_strategy: BlockingStrategy,
}

impl Default for ScanServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            blocking_strategy: BlockingStrategy::default(),
        }
    }
}

/// Scanning-service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelConfig {
    /// Base URL of the scanning service API.
    #[serde(default)]
    pub base_url: String,

    /// Bearer token for the scanning service, if it requires one.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Bounded retry count for transient fetch failures.
    #[serde(default = "default_fetch_retries")]
    pub fetch_retries: u32,

    /// Base backoff between retries; doubled per attempt.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            timeout_seconds: default_timeout_seconds(),
            fetch_retries: default_fetch_retries(),
            retry_backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fail_open() -> AbsentStatePolicy {
    AbsentStatePolicy::FailOpen
}

fn default_fail_closed() -> AbsentStatePolicy {
    AbsentStatePolicy::FailClosed
}

fn default_inspection_retries() -> u32 {
    5
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_fetch_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

fn default_project_version() -> String {
    "UNKNOWN_VERSION".to_string()
}

fn default_blocked_severities() -> Vec<PolicySeverity> {
    vec![
        PolicySeverity::Major,
        PolicySeverity::Critical,
        PolicySeverity::Blocker,
    ]
}

fn default_scan_name_patterns() -> Vec<String> {
    ["*.war", "*.zip", "*.tar.gz", "*.hpi"]
        .map(String::from)
        .to_vec()
}

fn default_patterns_tar_gz() -> Vec<String> {
    vec!["*.tar.gz".to_string()]
}

fn default_patterns_composer() -> Vec<String> {
    vec!["*.zip".to_string()]
}

fn default_patterns_conda() -> Vec<String> {
    vec!["*.tar.bz2".to_string(), "*.conda".to_string()]
}

fn default_patterns_gems() -> Vec<String> {
    vec!["*.gem".to_string()]
}

fn default_patterns_go() -> Vec<String> {
    vec!["*.zip".to_string()]
}

fn default_patterns_jar() -> Vec<String> {
    vec!["*.jar".to_string()]
}

fn default_patterns_npm() -> Vec<String> {
    vec!["*.tgz".to_string()]
}

fn default_patterns_nuget() -> Vec<String> {
    vec!["*.nupkg".to_string()]
}

fn default_patterns_pypi() -> Vec<String> {
    vec!["*.whl".to_string(), "*.tar.gz".to_string()]
}
