//! Conda identity extraction.
//!
//! Conda artifacts are named `{name}-{version}-{buildstring}.{ext}` and live
//! under a folder named for the platform/architecture (`linux-64`, `noarch`,
//! ...). The reported version is `{version}-{buildstring}-{architecture}` so
//! that builds of the same release for different platforms stay distinct.

use tracing::{debug, info};

use crate::identity::package_type::SupportedPackageType;
use crate::identity::ExternalId;
use crate::repo::ArtifactPath;

/// Archive extensions conda packages are distributed with.
const SUPPORTED_EXTENSIONS: [&str; 2] = [".tar.bz2", ".conda"];

pub struct CondaExternalIdExtractor;

impl CondaExternalIdExtractor {
    /// Extract from the file name and parent folder. Every failure here is
    /// soft: the artifact stays unidentified and the sweep continues.
    pub fn extract(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        match self.try_extract(package_type, path) {
            Ok(id) => Some(id),
            Err(reason) => {
                info!(artifact = %path, "failed to extract conda component details from file name");
                debug!(artifact = %path, %reason, "conda extraction failure detail");
                None
            }
        }
    }

    fn try_extract(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Result<ExternalId, String> {
        let (name, version) = split_file_name(path.name())?;

        let parent = path
            .parent()
            .filter(|parent| !parent.is_repo_root())
            .ok_or_else(|| "artifact has no parent folder to supply the architecture".to_string())?;
        let architecture = parent.name().trim().to_string();

        let full_version = format!("{version}-{architecture}");
        ExternalId::name_version(package_type.forge(), &name, &full_version)
            .ok_or_else(|| "blank name or version after parsing".to_string())
    }
}

/// Split `{name}-{version}-{buildstring}.{ext}` into name and
/// `{version}-{buildstring}`.
fn split_file_name(file_name: &str) -> Result<(String, String), String> {
    let stem = SUPPORTED_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .ok_or_else(|| format!("unsupported conda extension on '{file_name}'"))?;

    let pieces: Vec<&str> = stem.split('-').collect();
    if pieces.len() != 3 {
        return Err(format!("expected name-version-buildstring, got '{stem}'"));
    }

    let name = pieces[0].trim().to_string();
    let version = format!("{}-{}", pieces[1].trim(), pieces[2]);
    Ok((name, version))
}
