//! Check command implementation.

use std::path::Path;

use miette::Result;

pub fn exec(descriptor: Option<&Path>) -> Result<()> {
    let project = super::load_project(descriptor)?;
    cradle_ops::ops_check::check(&project)?;
    Ok(())
}
