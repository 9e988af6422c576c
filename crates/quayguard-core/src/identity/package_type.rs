//! The closed set of package formats the gate can identify.

use super::Forge;

/// How an artifact of a given package type is turned into an [`super::ExternalId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Host identity properties first, file layout second.
    PropertyThenLayout,
    /// Composer catalog-document hash matching.
    Composer,
    /// Conda filename + parent-architecture parsing.
    Conda,
}

/// A repository package-format tag the gate supports, with everything needed
/// to pick and parameterize an extraction strategy. The set is closed: the
/// table below is the single source of truth and is matched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedPackageType {
    Bower,
    Cocoapods,
    Composer,
    Conda,
    Cran,
    Gems,
    Go,
    Gradle,
    Maven,
    Npm,
    Nuget,
    Pypi,
}

impl SupportedPackageType {
    pub const ALL: [SupportedPackageType; 12] = [
        SupportedPackageType::Bower,
        SupportedPackageType::Cocoapods,
        SupportedPackageType::Composer,
        SupportedPackageType::Conda,
        SupportedPackageType::Cran,
        SupportedPackageType::Gems,
        SupportedPackageType::Go,
        SupportedPackageType::Gradle,
        SupportedPackageType::Maven,
        SupportedPackageType::Npm,
        SupportedPackageType::Nuget,
        SupportedPackageType::Pypi,
    ];

    /// The package-format tag the host repository manager records.
    pub fn tag(self) -> &'static str {
        match self {
            SupportedPackageType::Bower => "bower",
            SupportedPackageType::Cocoapods => "cocoapods",
            SupportedPackageType::Composer => "composer",
            SupportedPackageType::Conda => "conda",
            SupportedPackageType::Cran => "cran",
            SupportedPackageType::Gems => "gems",
            SupportedPackageType::Go => "go",
            SupportedPackageType::Gradle => "gradle",
            SupportedPackageType::Maven => "maven",
            SupportedPackageType::Npm => "npm",
            SupportedPackageType::Nuget => "nuget",
            SupportedPackageType::Pypi => "pypi",
        }
    }

    /// Case-insensitive resolution of a raw package-type tag.
    pub fn from_tag(tag: &str) -> Option<SupportedPackageType> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|pt| pt.tag().eq_ignore_ascii_case(tag))
    }

    pub fn forge(self) -> Forge {
        match self {
            SupportedPackageType::Bower | SupportedPackageType::Npm => Forge::Npmjs,
            SupportedPackageType::Cocoapods => Forge::Cocoapods,
            SupportedPackageType::Composer => Forge::Packagist,
            SupportedPackageType::Conda => Forge::Anaconda,
            SupportedPackageType::Cran => Forge::Cran,
            SupportedPackageType::Gems => Forge::Rubygems,
            SupportedPackageType::Go => Forge::Golang,
            SupportedPackageType::Gradle | SupportedPackageType::Maven => Forge::Maven,
            SupportedPackageType::Nuget => Forge::Nuget,
            SupportedPackageType::Pypi => Forge::Pypi,
        }
    }

    /// The pair of host metadata properties carrying name and version, for
    /// package types where the host records identity directly.
    pub fn property_keys(self) -> Option<(&'static str, &'static str)> {
        match self {
            SupportedPackageType::Bower => Some(("bower.name", "bower.version")),
            SupportedPackageType::Cocoapods => Some(("pods.name", "pods.version")),
            SupportedPackageType::Cran => Some(("cran.name", "cran.version")),
            SupportedPackageType::Gems => Some(("gem.name", "gem.version")),
            SupportedPackageType::Go => Some(("go.name", "go.version")),
            SupportedPackageType::Npm => Some(("npm.name", "npm.version")),
            SupportedPackageType::Nuget => Some(("nuget.id", "nuget.version")),
            SupportedPackageType::Pypi => Some(("pypi.name", "pypi.version")),
            SupportedPackageType::Composer
            | SupportedPackageType::Conda
            | SupportedPackageType::Gradle
            | SupportedPackageType::Maven => None,
        }
    }

    pub fn strategy(self) -> ExtractionStrategy {
        match self {
            SupportedPackageType::Composer => ExtractionStrategy::Composer,
            SupportedPackageType::Conda => ExtractionStrategy::Conda,
            _ => ExtractionStrategy::PropertyThenLayout,
        }
    }
}
