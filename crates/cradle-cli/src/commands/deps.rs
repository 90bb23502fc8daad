//! Handler for `cradle deps`.

use std::path::Path;

use miette::Result;

use cradle_ops::ops_deps;

pub fn exec(descriptor: Option<&Path>, variant: Option<&str>) -> Result<()> {
    let project = super::load_project(descriptor)?;
    for deps in ops_deps::deps(&project, variant)? {
        print!("{}", ops_deps::render(&deps));
    }
    Ok(())
}
