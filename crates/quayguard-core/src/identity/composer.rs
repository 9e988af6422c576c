//! Composer (packagist) identity extraction.
//!
//! Composer artifacts are named `{component}-{hash}.{ext}`, where the hash is
//! the source reference of the packaged commit. The repository also holds
//! catalog documents (`{component}.json`) mapping package names to version
//! entries with their source references; matching the artifact's hash against
//! those entries recovers the component name and version.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::identity::package_type::SupportedPackageType;
use crate::identity::ExternalId;
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// One version entry from a composer catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogVersion {
    pub name: String,
    pub version: String,
    #[serde(default)]
    source: Option<VersionSource>,
}

impl CatalogVersion {
    pub fn source_reference(&self) -> &str {
        self.source.as_ref().map(|s| s.reference.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct VersionSource {
    #[serde(default)]
    reference: String,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    packages: BTreeMap<String, BTreeMap<String, CatalogVersion>>,
}

/// The `{component}-{hash}` pieces of a composer artifact file name.
#[derive(Debug, PartialEq, Eq)]
struct FileNamePieces {
    component_name: String,
    hash: String,
}

pub struct ComposerExternalIdExtractor {
    browser: Arc<dyn RepositoryBrowser>,
}

impl ComposerExternalIdExtractor {
    pub fn new(browser: Arc<dyn RepositoryBrowser>) -> Self {
        Self { browser }
    }

    pub fn extract(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        let pieces = match split_file_name(path.name()) {
            Some(pieces) => pieces,
            None => {
                debug!(artifact = %path, "composer file name has no component-hash form");
                return None;
            }
        };

        let catalog_name = format!("{}.json", pieces.component_name);
        for catalog_path in self.browser.items_by_name(&catalog_name, path.repo_key()) {
            let versions = match self.parse_catalog(&catalog_path) {
                Ok(versions) => versions,
                Err(error) => {
                    debug!(catalog = %catalog_path, %error, "skipping unreadable composer catalog");
                    continue;
                }
            };

            let matching: Vec<&CatalogVersion> = versions
                .iter()
                .filter(|version| version.source_reference() == pieces.hash)
                .collect();

            if let Some(chosen) = select_matching_version(&matching) {
                return ExternalId::name_version(
                    package_type.forge(),
                    &chosen.name,
                    &chosen.version,
                );
            }
        }

        None
    }

    fn parse_catalog(&self, path: &ArtifactPath) -> anyhow::Result<Vec<CatalogVersion>> {
        let content = self.browser.artifact_content(path)?;
        let document: CatalogDocument = serde_json::from_slice(&content)?;
        Ok(document
            .packages
            .into_values()
            .flat_map(BTreeMap::into_values)
            .collect())
    }
}

/// Pick the version entry to report among those sharing the artifact's hash.
///
/// Dev pre-release tags frequently share a source hash with the real release,
/// so a version containing a digit and not containing `"dev"` is preferred;
/// when no entry qualifies, the first match is used.
pub fn select_matching_version<'a>(candidates: &[&'a CatalogVersion]) -> Option<&'a CatalogVersion> {
    candidates
        .iter()
        .find(|candidate| {
            let version = candidate.version.as_str();
            version.chars().any(|c| c.is_ascii_digit()) && !version.contains("dev")
        })
        .or_else(|| candidates.first())
        .copied()
}

/// Split `{component}-{hash}.{ext}` into its pieces. The hash is the last
/// `-`-delimited token before the extension; everything before it, lower
/// cased, is the component name.
fn split_file_name(file_name: &str) -> Option<FileNamePieces> {
    let (stem, _extension) = file_name.rsplit_once('.')?;
    let (component_name, hash) = stem.rsplit_once('-')?;
    if component_name.is_empty() || hash.is_empty() {
        return None;
    }
    Some(FileNamePieces {
        component_name: component_name.to_ascii_lowercase(),
        hash: hash.to_string(),
    })
}
