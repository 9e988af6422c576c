//! Identity extraction from host metadata: named identity properties first,
//! file-layout coordinates as the fallback.

use std::sync::Arc;

use crate::identity::package_type::SupportedPackageType;
use crate::identity::ExternalId;
use crate::properties::PropertyStore;
use crate::repo::{ArtifactPath, RepositoryBrowser};

/// Extracts an [`ExternalId`] from the properties the host already stores on
/// an artifact, falling back to the repository layout when the properties are
/// missing or blank. Property-based identity always wins when both exist.
pub struct InfoExternalIdExtractor {
    store: Arc<dyn PropertyStore>,
    browser: Arc<dyn RepositoryBrowser>,
}

impl InfoExternalIdExtractor {
    pub fn new(store: Arc<dyn PropertyStore>, browser: Arc<dyn RepositoryBrowser>) -> Self {
        Self { store, browser }
    }

    pub fn extract(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        self.from_properties(package_type, path)
            .or_else(|| self.from_layout(package_type, path))
    }

    fn from_properties(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        let (name_key, version_key) = package_type.property_keys()?;
        let name = self.store.get(path, name_key)?;
        let version = self.store.get(path, version_key)?;
        ExternalId::name_version(package_type.forge(), &name, &version)
    }

    fn from_layout(
        &self,
        package_type: SupportedPackageType,
        path: &ArtifactPath,
    ) -> Option<ExternalId> {
        let layout = self.browser.layout_info(path);
        let module = layout.module.as_deref().unwrap_or_default();
        let revision = layout.base_revision.as_deref().unwrap_or_default();

        if package_type.property_keys().is_some() {
            ExternalId::name_version(package_type.forge(), module, revision)
        } else {
            // Layout-driven maven-style coordinates: group, name, and version
            // must all be present.
            let organization = layout.organization.as_deref().unwrap_or_default();
            ExternalId::maven(organization, module, revision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Forge;
    use crate::properties::InMemoryPropertyStore;
    use crate::repo::{FileLayoutInfo, InMemoryRepository};

    fn extractor() -> (
        Arc<InMemoryPropertyStore>,
        Arc<InMemoryRepository>,
        InfoExternalIdExtractor,
    ) {
        let store = Arc::new(InMemoryPropertyStore::new());
        let repo = Arc::new(InMemoryRepository::new());
        let extractor = InfoExternalIdExtractor::new(store.clone(), repo.clone());
        (store, repo, extractor)
    }

    #[test]
    fn properties_win_over_layout() {
        let (store, repo, extractor) = extractor();
        let path = ArtifactPath::new("npm-local", "left-pad/-/left-pad-1.3.0.tgz");
        store.set(&path, "npm.name", "left-pad");
        store.set(&path, "npm.version", "1.3.0");
        repo.set_layout(
            path.clone(),
            FileLayoutInfo {
                organization: None,
                module: Some("other-module".to_string()),
                base_revision: Some("9.9.9".to_string()),
            },
        );

        let id = extractor.extract(SupportedPackageType::Npm, &path).unwrap();
        assert_eq!(id.name(), "left-pad");
        assert_eq!(id.version(), "1.3.0");
        assert_eq!(id.forge(), Forge::Npmjs);
    }

    #[test]
    fn layout_fallback_for_name_version_types() {
        let (_store, repo, extractor) = extractor();
        let path = ArtifactPath::new("gems-local", "rails/rails-7.0.0.gem");
        repo.set_layout(
            path.clone(),
            FileLayoutInfo {
                organization: None,
                module: Some("rails".to_string()),
                base_revision: Some("7.0.0".to_string()),
            },
        );

        let id = extractor.extract(SupportedPackageType::Gems, &path).unwrap();
        assert_eq!(id.origin_id(), "rails/7.0.0");
    }

    #[test]
    fn maven_layout_requires_all_coordinates() {
        let (_store, repo, extractor) = extractor();
        let path = ArtifactPath::new("libs-release", "com/foo/bar/1.0/bar-1.0.jar");
        repo.set_layout(
            path.clone(),
            FileLayoutInfo {
                organization: Some("com.foo".to_string()),
                module: Some("bar".to_string()),
                base_revision: Some("1.0".to_string()),
            },
        );

        let id = extractor.extract(SupportedPackageType::Maven, &path).unwrap();
        assert_eq!(id.to_string(), "maven:com.foo:bar:1.0");

        // Drop the organization: the maven strategy must fail, not invent one.
        let partial = ArtifactPath::new("libs-release", "bar/2.0/bar-2.0.jar");
        repo.set_layout(
            partial.clone(),
            FileLayoutInfo {
                organization: None,
                module: Some("bar".to_string()),
                base_revision: Some("2.0".to_string()),
            },
        );
        assert!(extractor.extract(SupportedPackageType::Maven, &partial).is_none());
    }

    #[test]
    fn blank_properties_fall_through_to_layout() {
        let (store, repo, extractor) = extractor();
        let path = ArtifactPath::new("pypi-local", "requests/requests-2.31.0.tar.gz");
        store.set(&path, "pypi.name", "  ");
        store.set(&path, "pypi.version", "2.31.0");
        repo.set_layout(
            path.clone(),
            FileLayoutInfo {
                organization: None,
                module: Some("requests".to_string()),
                base_revision: Some("2.31.0".to_string()),
            },
        );

        let id = extractor.extract(SupportedPackageType::Pypi, &path).unwrap();
        assert_eq!(id.name(), "requests");
    }
}
