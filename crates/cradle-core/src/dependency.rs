use std::fmt;

use serde::Serialize;

/// A `group:artifact` pair, the unit version resolution is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId {
    pub group: String,
    pub artifact: String,
}

impl ModuleId {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Parse `"group:artifact"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => {
                Some(Self::new(*group, *artifact))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// A requested dependency. `version == None` defers to platform constraints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyCoordinate {
    pub module: ModuleId,
    pub version: Option<String>,
}

impl DependencyCoordinate {
    pub fn new(group: &str, artifact: &str, version: Option<&str>) -> Self {
        Self {
            module: ModuleId::new(group, artifact),
            version: version.map(str::to_string),
        }
    }

    /// Parse `"group:artifact"` or `"group:artifact:version"`.
    pub fn parse(notation: &str) -> Option<Self> {
        let parts: Vec<&str> = notation.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [group, artifact] => Some(Self::new(group, artifact, None)),
            [group, artifact, version] => Some(Self::new(group, artifact, Some(version))),
            _ => None,
        }
    }
}

impl fmt::Display for DependencyCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{v}", self.module),
            None => write!(f, "{}", self.module),
        }
    }
}

/// Where a resolved version came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "platform", rename_all = "kebab-case")]
pub enum VersionSource {
    Explicit,
    Platform(String),
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Explicit => f.write_str("explicit"),
            VersionSource::Platform(name) => write!(f, "platform {name}"),
        }
    }
}

/// A dependency of one variant with its concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub module: ModuleId,
    pub version: String,
    pub source: VersionSource,
    /// The declaring configuration, e.g. `implementation` or `releaseImplementation`.
    pub configuration: String,
}

impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}
