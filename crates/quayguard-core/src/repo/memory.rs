//! In-memory [`RepositoryBrowser`] used by tests and embedding hosts that
//! stage artifacts outside a real repository manager.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::anyhow;

use super::{ArtifactPath, FileLayoutInfo, ItemInfo, RepositoryBrowser};

#[derive(Default)]
struct Inner {
    package_types: HashMap<String, String>,
    files: HashMap<ArtifactPath, Vec<u8>>,
    folders: Vec<ArtifactPath>,
    layouts: HashMap<ArtifactPath, FileLayoutInfo>,
}

/// A small in-memory repository: files with optional content, folders, and
/// per-artifact layout coordinates.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the package-format tag for a repository.
    pub fn set_package_type(&self, repo_key: &str, package_type: &str) {
        let mut inner = self.inner.lock().expect("repository lock");
        inner
            .package_types
            .insert(repo_key.to_string(), package_type.to_string());
    }

    /// Add a file artifact with content.
    pub fn add_file(&self, path: ArtifactPath, content: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().expect("repository lock");
        inner.files.insert(path, content.into());
    }

    /// Add a folder entry (folders have no content and are skipped by
    /// deciders and sweeps).
    pub fn add_folder(&self, path: ArtifactPath) {
        let mut inner = self.inner.lock().expect("repository lock");
        inner.folders.push(path);
    }

    /// Attach layout coordinates to an artifact.
    pub fn set_layout(&self, path: ArtifactPath, layout: FileLayoutInfo) {
        let mut inner = self.inner.lock().expect("repository lock");
        inner.layouts.insert(path, layout);
    }
}

impl RepositoryBrowser for InMemoryRepository {
    fn package_type(&self, repo_key: &str) -> Option<String> {
        let inner = self.inner.lock().expect("repository lock");
        inner.package_types.get(repo_key).cloned()
    }

    fn item_info(&self, path: &ArtifactPath) -> Option<ItemInfo> {
        let inner = self.inner.lock().expect("repository lock");
        if inner.files.contains_key(path) {
            return Some(ItemInfo {
                name: path.name().to_string(),
                is_folder: false,
            });
        }
        if path.is_repo_root() || inner.folders.contains(path) {
            return Some(ItemInfo {
                name: path.name().to_string(),
                is_folder: true,
            });
        }
        None
    }

    fn layout_info(&self, path: &ArtifactPath) -> FileLayoutInfo {
        let inner = self.inner.lock().expect("repository lock");
        inner.layouts.get(path).cloned().unwrap_or_default()
    }

    fn items_by_name(&self, file_name: &str, repo_key: &str) -> Vec<ArtifactPath> {
        let inner = self.inner.lock().expect("repository lock");
        let mut found: Vec<ArtifactPath> = inner
            .files
            .keys()
            .filter(|p| p.repo_key() == repo_key && p.name() == file_name)
            .cloned()
            .collect();
        found.sort();
        found
    }

    fn artifact_content(&self, path: &ArtifactPath) -> anyhow::Result<Vec<u8>> {
        let inner = self.inner.lock().expect("repository lock");
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such artifact: {path}"))
    }

    fn list_artifacts(&self, repo_key: &str) -> Vec<ArtifactPath> {
        let inner = self.inner.lock().expect("repository lock");
        let mut found: Vec<ArtifactPath> = inner
            .files
            .keys()
            .filter(|p| p.repo_key() == repo_key)
            .cloned()
            .collect();
        found.sort();
        found
    }
}
