use std::path::Path;

use miette::Result;

pub fn exec(descriptor: Option<&Path>) -> Result<()> {
    let project = super::load_project(descriptor)?;
    let variants = cradle_ops::ops_variants::variants(&project)?;
    println!("{} variant(s):", variants.len());
    for variant in &variants {
        println!("  {variant}");
    }
    Ok(())
}
