//! Command dispatch and handler modules.

mod check;
mod deps;
mod env;
mod resolve;
mod variants;

use std::path::Path;

use miette::Result;

use cradle_ops::ops_project::Project;
use cradle_util::errors::CradleError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    tracing::debug!(command = ?cli.command, descriptor = ?cli.descriptor, "dispatching");
    let descriptor = cli.descriptor.as_deref();
    match cli.command {
        Command::Resolve { variant, json } => resolve::exec(descriptor, variant, json),
        Command::Check => check::exec(descriptor),
        Command::Deps { variant } => deps::exec(descriptor, variant.as_deref()),
        Command::Variants => variants::exec(descriptor),
        Command::Env { reveal } => env::exec(descriptor, reveal),
    }
}

/// Load the project from the current directory.
fn load_project(descriptor: Option<&Path>) -> Result<Project> {
    let cwd = std::env::current_dir().map_err(CradleError::Io)?;
    Project::load(&cwd, descriptor)
}
