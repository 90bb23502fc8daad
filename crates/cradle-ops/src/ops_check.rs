//! Operation: check a descriptor without resolving dependency versions.

use cradle_core::signing;
use cradle_core::variant::BuildVariant;

use crate::ops_project::Project;
use crate::ops_resolve::{self, PassFailed, VariantError, VariantFailure};

/// What a successful check covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub plugins: usize,
    pub variants: usize,
    /// Variants bound to a signing identity.
    pub signed: usize,
}

/// Validate plugin order and the signing binding of every variant.
pub fn check(project: &Project) -> miette::Result<CheckSummary> {
    cradle_util::progress::status("Checking", &project.display_name());

    ops_resolve::validate_plugins(project)?;
    let plans = ops_resolve::select_plans(project, None)?;

    let mut signed = 0;
    let mut failures = Vec::new();
    for plan in &plans {
        let bound = BuildVariant::from_plan(plan, &project.descriptor)
            .map_err(VariantError::from)
            .and_then(|v| signing::bind(v, &project.identities).map_err(VariantError::from));
        match bound {
            Ok(variant) => {
                if variant.is_bound() {
                    signed += 1;
                }
            }
            Err(cause) => failures.push(VariantFailure {
                variant: plan.name.clone(),
                causes: vec![cause],
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

    let summary = CheckSummary {
        plugins: project.descriptor.plugins.len(),
        variants: plans.len(),
        signed,
    };
    cradle_util::progress::status(
        "Finished",
        &format!(
            "{} plugin(s), {} variant(s), {} signed",
            summary.plugins, summary.variants, summary.signed
        ),
    );
    Ok(summary)
}
