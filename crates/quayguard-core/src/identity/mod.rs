//! Component identity: forges, external ids, and the per-ecosystem
//! extraction strategies that assign an identity to a stored artifact.
//!
//! Extraction is layered. The [`resolver::IdentityResolver`] first honors
//! identity properties written by an earlier scan, then dispatches to the
//! strategy selected by the repository's [`package_type::SupportedPackageType`]:
//! the property/file-layout composite for most ecosystems, or the dedicated
//! composer and conda extractors. "Not identifiable" is an [`Option::None`],
//! never an error.

pub mod composer;
pub mod conda;
pub mod info;
pub mod package_type;
pub mod resolver;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A package ecosystem / registry namespace recognized by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Forge {
    Anaconda,
    Cocoapods,
    Cran,
    Golang,
    Maven,
    Npmjs,
    Nuget,
    Packagist,
    Pypi,
    Rubygems,
}

impl Forge {
    /// The wire name the scanning service uses for this forge.
    pub fn as_str(self) -> &'static str {
        match self {
            Forge::Anaconda => "anaconda",
            Forge::Cocoapods => "cocoapods",
            Forge::Cran => "cran",
            Forge::Golang => "golang",
            Forge::Maven => "maven",
            Forge::Npmjs => "npmjs",
            Forge::Nuget => "nuget",
            Forge::Packagist => "packagist",
            Forge::Pypi => "pypi",
            Forge::Rubygems => "rubygems",
        }
    }

    /// Case-insensitive parse of a forge wire name.
    pub fn from_name(name: &str) -> Option<Forge> {
        let name = name.trim();
        [
            Forge::Anaconda,
            Forge::Cocoapods,
            Forge::Cran,
            Forge::Golang,
            Forge::Maven,
            Forge::Npmjs,
            Forge::Nuget,
            Forge::Packagist,
            Forge::Pypi,
            Forge::Rubygems,
        ]
        .into_iter()
        .find(|forge| forge.as_str().eq_ignore_ascii_case(name))
    }

    /// The separator this forge uses inside origin ids.
    pub fn separator(self) -> char {
        match self {
            Forge::Maven => ':',
            _ => '/',
        }
    }
}

impl fmt::Display for Forge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical identity of an open-source component: forge plus
/// `namespace?:name:version` coordinates. Immutable once constructed; the
/// constructors reject blank coordinates so an `ExternalId` always denotes a
/// real component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId {
    forge: Forge,
    namespace: Option<String>,
    name: String,
    version: String,
}

impl ExternalId {
    /// A name/version identity, for ecosystems without a namespace axis.
    /// Returns `None` when either coordinate is blank.
    pub fn name_version(forge: Forge, name: &str, version: &str) -> Option<ExternalId> {
        let name = name.trim();
        let version = version.trim();
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(ExternalId {
            forge,
            namespace: None,
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// A maven-style group/name/version identity. Returns `None` when any
    /// coordinate is blank.
    pub fn maven(group: &str, name: &str, version: &str) -> Option<ExternalId> {
        let group = group.trim();
        let mut id = Self::name_version(Forge::Maven, name, version)?;
        if group.is_empty() {
            return None;
        }
        id.namespace = Some(group.to_string());
        Some(id)
    }

    pub fn forge(&self) -> Forge {
        self.forge
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The origin id the scanning service associates with this component:
    /// coordinates joined by the forge separator.
    pub fn origin_id(&self) -> String {
        let sep = self.forge.separator();
        match &self.namespace {
            Some(ns) => format!("{ns}{sep}{}{sep}{}", self.name, self.version),
            None => format!("{}{sep}{}", self.name, self.version),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.forge, self.forge.separator(), self.origin_id())
    }
}
