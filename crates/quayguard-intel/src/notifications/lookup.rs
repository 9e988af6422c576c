//! Project-name to repository resolution.

use std::collections::HashMap;

use quayguard_core::properties::GatePropertyService;
use quayguard_core::repo::ArtifactPath;

/// Maps the `(projectName, projectVersionName)` pairs the scanning service
/// reports back to local repository roots. Built once per notification
/// cycle from current repository properties.
pub struct RepositoryProjectLookup {
    projects: HashMap<(String, String), ArtifactPath>,
}

impl RepositoryProjectLookup {
    pub fn new(projects: HashMap<(String, String), ArtifactPath>) -> Self {
        Self { projects }
    }

    /// Build the lookup from the tracked repositories' project properties
    /// (repo key and the configured default version act as fallbacks).
    pub fn from_properties(service: &GatePropertyService, repo_keys: &[String]) -> Self {
        let projects = repo_keys
            .iter()
            .map(|repo_key| {
                let key = (
                    service.repo_project_name(repo_key),
                    service.repo_project_version_name(repo_key),
                );
                (key, ArtifactPath::repo_root(repo_key))
            })
            .collect();
        Self { projects }
    }

    /// The repository root tracked under this project name/version, if any.
    pub fn repo_root(&self, project_name: &str, project_version_name: &str) -> Option<&ArtifactPath> {
        self.projects
            .get(&(project_name.to_string(), project_version_name.to_string()))
    }
}
