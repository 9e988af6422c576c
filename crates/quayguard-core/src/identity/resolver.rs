//! The identity resolver: package-type dispatch over the extraction
//! strategies, with scanning-service-origin properties taking precedence.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::identity::composer::ComposerExternalIdExtractor;
use crate::identity::conda::CondaExternalIdExtractor;
use crate::identity::info::InfoExternalIdExtractor;
use crate::identity::package_type::{ExtractionStrategy, SupportedPackageType};
use crate::identity::{ExternalId, Forge};
use crate::properties::{GateProperty, PropertyStore};
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// Resolves a stored artifact to its [`ExternalId`].
///
/// The extractors are built once at construction; they are pure values, so
/// the closed strategy table doubles as the per-package-type cache.
pub struct IdentityResolver {
    browser: Arc<dyn RepositoryBrowser>,
    store: Arc<dyn PropertyStore>,
    info: InfoExternalIdExtractor,
    composer: ComposerExternalIdExtractor,
    conda: CondaExternalIdExtractor,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn PropertyStore>, browser: Arc<dyn RepositoryBrowser>) -> Self {
        Self {
            info: InfoExternalIdExtractor::new(store.clone(), browser.clone()),
            composer: ComposerExternalIdExtractor::new(browser.clone()),
            conda: CondaExternalIdExtractor,
            browser,
            store,
        }
    }

    /// Resolve an artifact's identity, or `None` when the repository's
    /// package type is unsupported or no strategy produced a candidate.
    pub fn resolve(&self, path: &ArtifactPath) -> Option<ExternalId> {
        let tag = self.browser.package_type(path.repo_key())?;
        let Some(package_type) = SupportedPackageType::from_tag(&tag) else {
            warn!(package_type = %tag, repo = path.repo_key(), "package type not supported");
            return None;
        };
        self.resolve_as(package_type, path)
    }

    /// Resolve with a known package type (used by the sweep, which has
    /// already resolved the repository's tag).
    pub fn resolve_as(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        if let Some(id) = self.from_scan_properties(path) {
            return Some(id);
        }

        match package_type.strategy() {
            ExtractionStrategy::Composer => self
                .composer
                .extract(package_type, path)
                .or_else(|| self.info.extract(package_type, path)),
            ExtractionStrategy::Conda => self
                .conda
                .extract(package_type, path)
                .or_else(|| self.info.extract(package_type, path)),
            ExtractionStrategy::PropertyThenLayout => self.info.extract(package_type, path),
        }
    }

    /// Parse the forge/origin-id property pair written by a previous
    /// identification or by the scanning service itself.
    fn from_scan_properties(&self, path: &ArtifactPath) -> Option<ExternalId> {
        let forge_name = self.store.get(path, GateProperty::Forge.key())?;
        let origin_id = self.store.get(path, GateProperty::OriginId.key())?;

        let Some(forge) = Forge::from_name(&forge_name) else {
            debug!(artifact = %path, forge = %forge_name, "unknown forge property");
            return None;
        };

        parse_origin_id(forge, &origin_id)
    }
}

/// Split an origin id on the forge separator: two parts are name/version,
/// three parts are group/name/version for maven. Anything else keeps the
/// separator inside the name (scoped packages such as `@babel/core/7.4.3`)
/// and splits on the last separator only.
pub fn parse_origin_id(forge: Forge, origin_id: &str) -> Option<ExternalId> {
    let sep = forge.separator();
    let pieces: Vec<&str> = origin_id.split(sep).collect();
    match pieces.as_slice() {
        [name, version] => ExternalId::name_version(forge, name, version),
        [group, name, version] if forge == Forge::Maven => ExternalId::maven(group, name, version),
        _ => {
            let (name, version) = origin_id.rsplit_once(sep)?;
            ExternalId::name_version(forge, name, version)
        }
    }
}
