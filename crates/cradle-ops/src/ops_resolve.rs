//! Operation: one full resolution pass.
//!
//! Plugin order is validated once for the whole descriptor; a failure there
//! aborts the pass. Every variant is then resolved on its own: version and
//! signing failures are collected per variant while the other variants still
//! resolve.

use std::fmt::Write as _;

use cradle_core::descriptor::{Descriptor, DescriptorError, DependencyNotation};
use cradle_core::dependency::{DependencyCoordinate, ResolvedDependency};
use cradle_core::signing::{self, SigningError};
use cradle_core::variant::{self, BuildVariant, VariantPlan};
use cradle_plugin::catalog::PluginCatalog;
use cradle_plugin::ordering;
use cradle_resolver::platform::PlatformCatalog;
use cradle_resolver::precedence::PrecedenceReport;
use cradle_resolver::resolver::{self, Resolution, ResolveError};
use cradle_util::errors::CradleError;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::ops_project::Project;

/// Options for `cradle resolve`.
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
    /// Resolve only the variant with this name.
    pub variant: Option<String>,
}

/// One cause of a variant failure.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum VariantError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Signing(#[from] SigningError),
}

/// Every failure of one variant.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("variant `{variant}` failed with {} error(s)", .causes.len())]
#[diagnostic(code(cradle::variant))]
pub struct VariantFailure {
    pub variant: String,
    #[related]
    pub causes: Vec<VariantError>,
}

/// The variants of a pass that did not resolve.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{} of {total} variant(s) failed to resolve", .failures.len())]
#[diagnostic(
    code(cradle::pass),
    help("Each failing variant is listed below; variants not listed resolved normally")
)]
pub struct PassFailed {
    pub total: usize,
    #[related]
    pub failures: Vec<VariantFailure>,
}

/// `[platforms]` tables that cannot be used.
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("cradle.toml declares invalid platform pins")]
#[diagnostic(code(cradle::platforms))]
pub struct InvalidPlatforms {
    #[related]
    pub errors: Vec<ResolveError>,
}

/// A variant with its dependencies resolved and its signing identity bound.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVariant<'p> {
    #[serde(flatten)]
    pub variant: BuildVariant<'p>,
    pub precedence: PrecedenceReport,
}

/// The outcome of a pass: resolved variants followed by failed ones, each in
/// variant order.
#[derive(Debug)]
pub struct PassOutcome<'p> {
    pub variants: Vec<ResolvedVariant<'p>>,
    pub failures: Vec<VariantFailure>,
}

impl<'p> PassOutcome<'p> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.variants.len() + self.failures.len()
    }

    /// The failures as a single diagnostic, if any variant failed.
    pub fn error(&self) -> Option<PassFailed> {
        if self.failures.is_empty() {
            return None;
        }
        Some(PassFailed {
            total: self.total(),
            failures: self.failures.clone(),
        })
    }
}

/// Validate the descriptor's plugins against the configured catalog.
pub fn validate_plugins(project: &Project) -> Result<(), ordering::PluginOrderError> {
    let catalog = PluginCatalog::builtin().with_overrides(&project.inputs.plugins);
    ordering::validate(&catalog.plugins_for(&project.descriptor.plugins))
}

/// Variant plans of the project, narrowed to `only` when given.
pub fn select_plans(project: &Project, only: Option<&str>) -> miette::Result<Vec<VariantPlan>> {
    let plans = variant::plan_variants(&project.descriptor)?;
    let Some(name) = only else {
        return Ok(plans);
    };
    let available: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
    if !available.contains(&name) {
        return Err(CradleError::Generic {
            message: format!(
                "No variant named `{name}`; available: {}",
                available.join(", ")
            ),
        }
        .into());
    }
    Ok(plans.into_iter().filter(|p| p.name == name).collect())
}

/// Resolve every selected variant of `project`.
///
/// Returns `Err` only for failures that abort the whole pass. Variant
/// failures are reported in [`PassOutcome::failures`].
pub fn resolve<'p>(project: &'p Project, opts: &ResolveOptions) -> miette::Result<PassOutcome<'p>> {
    validate_plugins(project)?;
    let platforms = PlatformCatalog::from_tables(&project.inputs.platforms)
        .map_err(|errors| InvalidPlatforms { errors })?;
    let plans = select_plans(project, opts.variant.as_deref())?;

    cradle_util::progress::status(
        "Resolving",
        &format!("{} ({} variant(s))", project.display_name(), plans.len()),
    );

    let mut outcome = PassOutcome {
        variants: Vec::with_capacity(plans.len()),
        failures: Vec::new(),
    };
    let platforms = &platforms;
    for chunk in plans.chunks(project.jobs.max(1)) {
        let results: Vec<Result<ResolvedVariant<'p>, VariantFailure>> = std::thread::scope(|scope| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|plan| scope.spawn(move || resolve_variant(project, plan, platforms)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });
        for result in results {
            match result {
                Ok(resolved) => outcome.variants.push(resolved),
                Err(failure) => outcome.failures.push(failure),
            }
        }
    }

    tracing::info!(
        resolved = outcome.variants.len(),
        failed = outcome.failures.len(),
        "resolution pass finished"
    );
    Ok(outcome)
}

/// Dependency declarations that contribute to one variant, split by kind.
#[derive(Debug, Clone)]
pub struct VariantRequests<'d> {
    /// `platform(..)` imports in declaration order.
    pub platforms: Vec<&'d DependencyCoordinate>,
    /// Module requests with the configuration that declared them.
    pub modules: Vec<(&'d str, &'d DependencyCoordinate)>,
}

impl<'d> VariantRequests<'d> {
    pub fn collect(descriptor: &'d Descriptor, plan: &VariantPlan) -> Self {
        let configurations = plan.configurations();
        let mut requests = Self {
            platforms: Vec::new(),
            modules: Vec::new(),
        };
        for declaration in descriptor
            .dependencies
            .iter()
            .filter(|d| configurations.contains(&d.configuration))
        {
            match &declaration.notation {
                DependencyNotation::Platform(coordinate) => requests.platforms.push(coordinate),
                DependencyNotation::Module(coordinate) => requests
                    .modules
                    .push((declaration.configuration.as_str(), coordinate)),
                DependencyNotation::Project(_) | DependencyNotation::Local(_) => {
                    tracing::debug!(
                        variant = %plan.name,
                        configuration = %declaration.configuration,
                        "skipping unversioned dependency"
                    );
                }
            }
        }
        requests
    }

    /// Select the imported platforms from `catalog` and resolve the module
    /// requests against them. Unknown platforms and version failures are
    /// reported together.
    pub fn resolve(&self, catalog: &PlatformCatalog) -> Result<Resolution, Vec<ResolveError>> {
        let (selected, mut errors) = match catalog.select(self.platforms.iter().copied()) {
            Ok(selected) => (selected, Vec::new()),
            Err(errors) => (Vec::new(), errors),
        };
        let requested: Vec<DependencyCoordinate> =
            self.modules.iter().map(|&(_, c)| c.clone()).collect();
        match resolver::resolve(&requested, &selected) {
            Ok(resolution) if errors.is_empty() => Ok(resolution),
            Ok(_) => Err(errors),
            Err(mut more) => {
                errors.append(&mut more);
                Err(errors)
            }
        }
    }
}

/// Resolve one variant, collecting every failure instead of stopping at the first.
pub fn resolve_variant<'p>(
    project: &'p Project,
    plan: &VariantPlan,
    platforms: &PlatformCatalog,
) -> Result<ResolvedVariant<'p>, VariantFailure> {
    let descriptor = &project.descriptor;
    let requests = VariantRequests::collect(descriptor, plan);
    let mut causes: Vec<VariantError> = Vec::new();

    let resolution = match requests.resolve(platforms) {
        Ok(resolution) => Some(resolution),
        Err(errors) => {
            causes.extend(errors.into_iter().map(VariantError::from));
            None
        }
    };

    let bound = match BuildVariant::from_plan(plan, descriptor) {
        Ok(mut variant) => {
            variant.resolve_settings(&project.inputs.properties);
            match signing::bind(variant, &project.identities) {
                Ok(variant) => Some(variant),
                Err(e) => {
                    causes.push(e.into());
                    None
                }
            }
        }
        Err(e) => {
            causes.push(e.into());
            None
        }
    };

    match (bound, resolution) {
        (Some(mut variant), Some(resolution)) if causes.is_empty() => {
            for &(configuration, coordinate) in &requests.modules {
                let Some(resolved) = resolution.get(&coordinate.module) else {
                    continue;
                };
                let dependency = ResolvedDependency {
                    module: resolved.module.clone(),
                    version: resolved.version.clone(),
                    source: resolved.source.clone(),
                    configuration: configuration.to_string(),
                };
                if !variant.dependencies.contains(&dependency) {
                    variant.dependencies.push(dependency);
                }
            }
            tracing::debug!(
                variant = %variant.name,
                dependencies = variant.dependencies.len(),
                signed = variant.is_bound(),
                "variant resolved"
            );
            Ok(ResolvedVariant {
                variant,
                precedence: resolution.report().clone(),
            })
        }
        _ => {
            tracing::debug!(variant = %plan.name, errors = causes.len(), "variant failed");
            Err(VariantFailure {
                variant: plan.name.clone(),
                causes,
            })
        }
    }
}

/// Human-readable summary of one resolved variant.
pub fn render(resolved: &ResolvedVariant<'_>) -> String {
    let v = &resolved.variant;
    let mut out = String::new();
    let _ = writeln!(out, "{}", v.name);
    if let Some(id) = &v.application_id {
        let _ = writeln!(out, "  application id: {id}");
    }
    let flavors = if v.flavors.is_empty() {
        "-".to_string()
    } else {
        v.flavors.join(", ")
    };
    let _ = writeln!(out, "  build type: {}  flavors: {flavors}", v.build_type);
    let show = |s: &Option<variant::Setting>| s.as_ref().map_or("-".to_string(), ToString::to_string);
    let _ = writeln!(
        out,
        "  sdk: min {}  target {}  compile {}",
        show(&v.min_sdk),
        show(&v.target_sdk),
        show(&v.compile_sdk)
    );
    let _ = writeln!(out, "  version: {} ({})", show(&v.version_code), show(&v.version_name));
    match &v.signing {
        Some(handle) => {
            let _ = writeln!(out, "  signing: {} [{}]", handle.identity_name(), handle.fingerprint());
        }
        None => {
            let _ = writeln!(out, "  signing: unsigned");
        }
    }
    if v.dependencies.is_empty() {
        let _ = writeln!(out, "  dependencies: none");
    } else {
        let _ = writeln!(out, "  dependencies:");
        for dependency in &v.dependencies {
            let _ = writeln!(
                out,
                "    {} {dependency} ({})",
                dependency.configuration, dependency.source
            );
        }
    }
    out
}
