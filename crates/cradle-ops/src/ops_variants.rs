//! Operation: list the build variants a descriptor defines.

use cradle_core::variant::BuildVariant;
use serde::Serialize;

use crate::ops_project::Project;
use crate::ops_resolve;

/// One line of `cradle variants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VariantSummary {
    pub name: String,
    pub flavors: Vec<String>,
    pub build_type: String,
    pub application_id: Option<String>,
    pub signing_config: Option<String>,
}

impl std::fmt::Display for VariantSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(id) = &self.application_id {
            write!(f, "  {id}")?;
        }
        if let Some(signing) = &self.signing_config {
            write!(f, "  signed by {signing}")?;
        }
        Ok(())
    }
}

/// Variants in declaration order: flavor combinations first, build types last.
pub fn variants(project: &Project) -> miette::Result<Vec<VariantSummary>> {
    let plans = ops_resolve::select_plans(project, None)?;
    plans
        .iter()
        .map(|plan| -> miette::Result<VariantSummary> {
            let variant = BuildVariant::from_plan(plan, &project.descriptor)?;
            Ok(VariantSummary {
                name: variant.name,
                flavors: variant.flavors,
                build_type: variant.build_type,
                application_id: variant.application_id,
                signing_config: variant.signing_config,
            })
        })
        .collect()
}
