//! In-memory [`PropertyStore`] used by tests and by embedding hosts before a
//! real store is wired in.

use std::collections::HashMap;
use std::sync::Mutex;

use super::PropertyStore;
use crate::repo::ArtifactPath;

/// A `HashMap`-backed property store with per-call locking, matching the
/// per-key atomicity the gate assumes of real stores.
#[derive(Default)]
pub struct InMemoryPropertyStore {
    entries: Mutex<HashMap<ArtifactPath, HashMap<String, String>>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn get(&self, path: &ArtifactPath, key: &str) -> Option<String> {
        let entries = self.entries.lock().expect("property lock");
        entries.get(path).and_then(|props| props.get(key)).cloned()
    }

    fn set(&self, path: &ArtifactPath, key: &str, value: &str) {
        let mut entries = self.entries.lock().expect("property lock");
        entries
            .entry(path.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    fn delete(&self, path: &ArtifactPath, key: &str) {
        let mut entries = self.entries.lock().expect("property lock");
        if let Some(props) = entries.get_mut(path) {
            props.remove(key);
        }
    }

    fn find_by_property(&self, key: &str, value: &str, repo_keys: &[String]) -> Vec<ArtifactPath> {
        let entries = self.entries.lock().expect("property lock");
        let mut found: Vec<ArtifactPath> = entries
            .iter()
            .filter(|(path, _)| repo_keys.iter().any(|repo| repo == path.repo_key()))
            .filter(|(_, props)| props.get(key).map(String::as_str) == Some(value))
            .map(|(path, _)| path.clone())
            .collect();
        found.sort();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store = InMemoryPropertyStore::new();
        let path = ArtifactPath::new("repo", "a.jar");

        assert_eq!(store.get(&path, "k"), None);
        store.set(&path, "k", "v");
        assert_eq!(store.get(&path, "k"), Some("v".to_string()));
        assert!(store.has(&path, "k"));

        store.delete(&path, "k");
        assert_eq!(store.get(&path, "k"), None);
    }

    #[test]
    fn find_by_property_scopes_to_repos() {
        let store = InMemoryPropertyStore::new();
        let a = ArtifactPath::new("repo-a", "x.jar");
        let b = ArtifactPath::new("repo-b", "y.jar");
        store.set(&a, "k", "v");
        store.set(&b, "k", "v");

        let found = store.find_by_property("k", "v", &["repo-a".to_string()]);
        assert_eq!(found, vec![a]);
    }
}
