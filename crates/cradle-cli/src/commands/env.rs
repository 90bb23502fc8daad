use std::path::Path;

use miette::Result;

use cradle_core::config::GlobalConfig;
use cradle_core::properties::{load_env_file, ENV_FILE};
use cradle_ops::ops_project::find_descriptor;
use cradle_util::errors::CradleError;

pub fn exec(descriptor: Option<&Path>, reveal: bool) -> Result<()> {
    let cwd = std::env::current_dir().map_err(CradleError::Io)?;
    let descriptor = find_descriptor(&cwd, descriptor, &GlobalConfig::load()?)?;
    let path = descriptor
        .parent()
        .map(|root| root.join(ENV_FILE))
        .unwrap_or_else(|| ENV_FILE.into());
    let env_vars = load_env_file(&path)?;

    if env_vars.is_empty() {
        println!("No environment variables configured.");
        println!("  {ENV_FILE}: {}", path.display());
        return Ok(());
    }

    println!("{ENV_FILE} ({} entries):", env_vars.len());
    for (key, value) in &env_vars {
        let display_value = if reveal { value.as_str() } else { "********" };
        println!("  {key} = {display_value}");
    }

    Ok(())
}
