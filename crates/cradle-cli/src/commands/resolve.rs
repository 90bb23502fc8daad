//! Handler for `cradle resolve`.

use std::path::Path;

use miette::Result;

use cradle_ops::ops_resolve::{self, ResolveOptions};
use cradle_util::errors::CradleError;

pub fn exec(descriptor: Option<&Path>, variant: Option<String>, json: bool) -> Result<()> {
    let project = super::load_project(descriptor)?;
    let outcome = ops_resolve::resolve(&project, &ResolveOptions { variant })?;

    if json {
        let text = serde_json::to_string_pretty(&outcome.variants).map_err(|e| CradleError::Generic {
            message: format!("Failed to serialize variants: {e}"),
        })?;
        println!("{text}");
    } else {
        for resolved in &outcome.variants {
            print!("{}", ops_resolve::render(resolved));
        }
    }

    if let Some(failed) = outcome.error() {
        for failure in &failed.failures {
            cradle_util::progress::status_error("Failed", &failure.variant);
        }
        return Err(failed.into());
    }
    cradle_util::progress::status(
        "Finished",
        &format!("{} variant(s) resolved", outcome.variants.len()),
    );
    Ok(())
}
