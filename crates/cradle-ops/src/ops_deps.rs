//! Operation: resolved dependency versions and the precedence decisions behind them.
//!
//! Signing is not consulted, so an unsigned or misconfigured release variant
//! still shows its versions.

use std::fmt::Write as _;

use cradle_resolver::platform::PlatformCatalog;
use cradle_resolver::resolver::Resolution;

use crate::ops_project::Project;
use crate::ops_resolve::{self, InvalidPlatforms, PassFailed, VariantError, VariantFailure, VariantRequests};

/// The version resolution of one variant.
#[derive(Debug, Clone)]
pub struct VariantDeps {
    pub variant: String,
    pub resolution: Resolution,
}

/// Resolve dependency versions for every variant, or only `variant`.
pub fn deps(project: &Project, variant: Option<&str>) -> miette::Result<Vec<VariantDeps>> {
    let catalog = PlatformCatalog::from_tables(&project.inputs.platforms)
        .map_err(|errors| InvalidPlatforms { errors })?;
    let plans = ops_resolve::select_plans(project, variant)?;

    let mut resolved = Vec::new();
    let mut failures = Vec::new();
    for plan in &plans {
        match VariantRequests::collect(&project.descriptor, plan).resolve(&catalog) {
            Ok(resolution) => resolved.push(VariantDeps {
                variant: plan.name.clone(),
                resolution,
            }),
            Err(errors) => failures.push(VariantFailure {
                variant: plan.name.clone(),
                causes: errors.into_iter().map(VariantError::from).collect(),
            }),
        }
    }

    if !failures.is_empty() {
        return Err(PassFailed {
            total: plans.len(),
            failures,
        }
        .into());
    }
    Ok(resolved)
}

pub fn render(deps: &VariantDeps) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", deps.variant);
    if deps.resolution.is_empty() {
        let _ = writeln!(out, "  (no dependencies)");
    }
    for resolved in deps.resolution.iter() {
        let _ = writeln!(
            out,
            "  {}:{} ({})",
            resolved.module, resolved.version, resolved.source
        );
    }
    let report = deps.resolution.report();
    if !report.is_empty() {
        for line in report.to_string().lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cradle_core::dependency::{DependencyCoordinate, ModuleId};
    use cradle_resolver::platform::PlatformConstraint;
    use cradle_resolver::resolver;

    #[test]
    fn render_lists_versions_and_decisions() {
        let bom = PlatformConstraint::new("g:bom:1").with_pin(ModuleId::new("g", "a"), "2.0");
        let resolution = resolver::resolve(
            &[
                DependencyCoordinate::new("g", "a", Some("1.0")),
                DependencyCoordinate::new("g", "b", Some("3.1")),
            ],
            &[bom],
        )
        .unwrap();
        let text = render(&VariantDeps {
            variant: "release".into(),
            resolution,
        });
        assert!(text.starts_with("release\n"));
        assert!(text.contains("  g:a:1.0 (explicit)"));
        assert!(text.contains("  g:b:3.1 (explicit)"));
        assert!(text.contains("explicit 1.0 overrides 2.0 pinned by g:bom:1"));
    }
}
