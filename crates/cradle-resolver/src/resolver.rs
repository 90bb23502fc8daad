//! Version resolution: one concrete version per `group:artifact`, from
//! explicit requests first and platform pins second.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use cradle_core::dependency::{DependencyCoordinate, ModuleId, VersionSource};
use miette::Diagnostic;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::platform::PlatformConstraint;
use crate::precedence::{PrecedenceDecision, PrecedenceReport};
use crate::version::ArtifactVersion;

/// A resolution failure for one module or one platform.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolveError {
    #[error("`{module}` has no version: it is not given explicitly and no imported platform pins it")]
    #[diagnostic(
        code(cradle::resolve::unresolved),
        help("Add a version to the declaration or import a platform(...) that manages it")
    )]
    UnresolvedVersion { module: ModuleId },

    #[error("`{module}` is requested at conflicting versions: {}", .versions.join(", "))]
    #[diagnostic(
        code(cradle::resolve::conflict),
        help("Declare a single version, or drop the explicit versions and let a platform pin it")
    )]
    VersionConflict {
        module: ModuleId,
        versions: Vec<String>,
    },

    #[error("platform `{platform}` is imported but not defined")]
    #[diagnostic(
        code(cradle::resolve::platform),
        help("Add a [platforms.\"{platform}\"] table to cradle.toml")
    )]
    UnknownPlatform { platform: String },

    #[error("platform `{platform}` pins `{key}`, which is not `group:artifact`")]
    #[diagnostic(code(cradle::resolve::pin))]
    InvalidPin { platform: String, key: String },
}

impl ResolveError {
    /// The module the error is about, if it concerns a single module.
    pub fn module(&self) -> Option<&ModuleId> {
        match self {
            ResolveError::UnresolvedVersion { module } | ResolveError::VersionConflict { module, .. } => {
                Some(module)
            }
            ResolveError::UnknownPlatform { .. } | ResolveError::InvalidPin { .. } => None,
        }
    }
}

/// The version chosen for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub module: ModuleId,
    pub version: String,
    pub source: VersionSource,
}

/// The outcome of one successful resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    #[serde(serialize_with = "serialize_values")]
    versions: BTreeMap<ModuleId, ResolvedVersion>,
    report: PrecedenceReport,
}

impl Resolution {
    pub fn get(&self, module: &ModuleId) -> Option<&ResolvedVersion> {
        self.versions.get(module)
    }

    /// Resolved versions in module order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedVersion> {
        self.versions.values()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn report(&self) -> &PrecedenceReport {
        &self.report
    }
}

fn serialize_values<S: Serializer>(
    versions: &BTreeMap<ModuleId, ResolvedVersion>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(versions.values())
}

/// Resolve one version per requested module.
///
/// - an explicit version always wins; Maven-equal spellings (`1.0`, `1.0.0`)
///   are one version and the smallest spelling is kept;
/// - otherwise the first platform in `platforms` order that pins the module wins;
/// - every failure of the pass is returned, sorted by module.
///
/// The result depends only on the set of requests, not their order.
pub fn resolve<P: Borrow<PlatformConstraint>>(
    requested: &[DependencyCoordinate],
    platforms: &[P],
) -> Result<Resolution, Vec<ResolveError>> {
    let mut explicit: BTreeMap<&ModuleId, Vec<&str>> = BTreeMap::new();
    for request in requested {
        let versions = explicit.entry(&request.module).or_default();
        if let Some(version) = request.version.as_deref() {
            versions.push(version);
        }
    }

    let mut resolution = Resolution::default();
    let mut errors = Vec::new();

    for (module, versions) in explicit {
        let pins: Vec<(&str, &str)> = platforms
            .iter()
            .filter_map(|p| {
                let p: &PlatformConstraint = p.borrow();
                p.get(module).map(|v| (p.name.as_str(), v))
            })
            .collect();

        let chosen = if versions.is_empty() {
            match pins.split_first() {
                Some((&(platform, version), later)) => {
                    record_shadowed(&mut resolution.report, module, platform, version, later);
                    tracing::debug!(%module, version, platform, "version from platform");
                    ResolvedVersion {
                        module: module.clone(),
                        version: version.to_string(),
                        source: VersionSource::Platform(platform.to_string()),
                    }
                }
                None => {
                    errors.push(ResolveError::UnresolvedVersion { module: module.clone() });
                    continue;
                }
            }
        } else {
            let distinct = distinct_versions(&versions);
            if distinct.len() > 1 {
                errors.push(ResolveError::VersionConflict {
                    module: module.clone(),
                    versions: distinct,
                });
                continue;
            }
            let version = distinct.into_iter().next().unwrap_or_default();
            if let Some(&(platform, pinned)) = pins.first() {
                if ArtifactVersion::parse(pinned) != ArtifactVersion::parse(&version) {
                    resolution.report.add(PrecedenceDecision::ExplicitOverride {
                        module: module.clone(),
                        version: version.clone(),
                        platform: platform.to_string(),
                        pinned: pinned.to_string(),
                    });
                }
            }
            tracing::debug!(%module, version = %version, "explicit version");
            ResolvedVersion {
                module: module.clone(),
                version,
                source: VersionSource::Explicit,
            }
        };
        resolution.versions.insert(module.clone(), chosen);
    }

    if errors.is_empty() {
        Ok(resolution)
    } else {
        errors.sort_by(|a, b| a.module().cmp(&b.module()));
        Err(errors)
    }
}

fn record_shadowed(
    report: &mut PrecedenceReport,
    module: &ModuleId,
    platform: &str,
    version: &str,
    later: &[(&str, &str)],
) {
    let winner = ArtifactVersion::parse(version);
    for &(shadowed_platform, shadowed_version) in later {
        if ArtifactVersion::parse(shadowed_version) == winner {
            continue;
        }
        tracing::debug!(%module, platform, shadowed_platform, "earlier platform wins");
        report.add(PrecedenceDecision::PlatformShadowed {
            module: module.clone(),
            version: version.to_string(),
            platform: platform.to_string(),
            shadowed_platform: shadowed_platform.to_string(),
            shadowed_version: shadowed_version.to_string(),
        });
    }
}

/// Versions that differ under artifact ordering, each as its smallest
/// spelling, in ascending version order.
fn distinct_versions(versions: &[&str]) -> Vec<String> {
    let mut classes: Vec<(ArtifactVersion, &str)> = Vec::new();
    for &raw in versions {
        let parsed = ArtifactVersion::parse(raw);
        match classes.iter_mut().find(|(v, _)| *v == parsed) {
            Some((_, spelling)) => {
                if raw < *spelling {
                    *spelling = raw;
                }
            }
            None => classes.push((parsed, raw)),
        }
    }
    classes.sort_by(|a, b| a.0.cmp(&b.0));
    classes.into_iter().map(|(_, s)| s.to_string()).collect()
}
