//! Repository addressing and browsing.
//!
//! An [`ArtifactPath`] names a stored artifact by its repository key and
//! repository-relative path. The [`RepositoryBrowser`] trait is the gate's
//! window into the host repository manager: package types, item metadata,
//! layout information, name searches, and raw content. The gate never walks
//! the filesystem itself.

mod memory;

pub use memory::InMemoryRepository;

use std::fmt;

/// Address of an artifact (or folder, or repository root) in the host
/// repository manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactPath {
    repo_key: String,
    path: String,
}

impl ArtifactPath {
    /// Address an artifact by repository key and repository-relative path.
    ///
    /// Leading and trailing slashes in `path` are stripped so that equal
    /// addresses compare equal regardless of how the host rendered them.
    pub fn new(repo_key: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            repo_key: repo_key.into(),
            path: path.trim_matches('/').to_string(),
        }
    }

    /// Address the root of a repository (where repo-level properties live).
    pub fn repo_root(repo_key: impl Into<String>) -> Self {
        Self {
            repo_key: repo_key.into(),
            path: String::new(),
        }
    }

    pub fn repo_key(&self) -> &str {
        &self.repo_key
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The last path segment; the repository key for a repo root.
    pub fn name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, name)) => name,
            None if self.path.is_empty() => &self.repo_key,
            None => &self.path,
        }
    }

    /// The containing folder, or `None` for a repo root.
    pub fn parent(&self) -> Option<ArtifactPath> {
        if self.is_repo_root() {
            return None;
        }
        match self.path.rsplit_once('/') {
            Some((parent, _)) => Some(ArtifactPath::new(&self.repo_key, parent)),
            None => Some(ArtifactPath::repo_root(&self.repo_key)),
        }
    }

    pub fn is_repo_root(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.repo_key)
        } else {
            write!(f, "{}:{}", self.repo_key, self.path)
        }
    }
}

/// Basic item metadata as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInfo {
    pub name: String,
    pub is_folder: bool,
}

/// Layout-derived coordinates for repositories with a structured layout
/// (e.g. `org/module/version/module-version.ext`). Fields the layout does
/// not define are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLayoutInfo {
    pub organization: Option<String>,
    pub module: Option<String>,
    pub base_revision: Option<String>,
}

/// Read-only view of the host repository manager.
///
/// Implementations must be cheap to call on the request path (`item_info` is
/// consulted by deciders); the content and search operations are only used by
/// the background identification sweep.
pub trait RepositoryBrowser: Send + Sync {
    /// The package-format tag the host records for a repository (`"npm"`,
    /// `"maven"`, ...), if any.
    fn package_type(&self, repo_key: &str) -> Option<String>;

    /// Item metadata, or `None` if the path no longer exists.
    fn item_info(&self, path: &ArtifactPath) -> Option<ItemInfo>;

    /// Layout coordinates for an artifact. Hosts without a layout for the
    /// repository return the empty default.
    fn layout_info(&self, path: &ArtifactPath) -> FileLayoutInfo;

    /// All artifacts in `repo_key` whose file name equals `file_name`.
    fn items_by_name(&self, file_name: &str, repo_key: &str) -> Vec<ArtifactPath>;

    /// Raw artifact bytes (used to read composer catalog documents).
    fn artifact_content(&self, path: &ArtifactPath) -> anyhow::Result<Vec<u8>>;

    /// Every file artifact in the repository, for sweep enumeration.
    fn list_artifacts(&self, repo_key: &str) -> Vec<ArtifactPath>;
}
