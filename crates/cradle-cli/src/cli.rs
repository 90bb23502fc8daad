//! CLI argument definitions for Cradle.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "cradle",
    version,
    about = "Resolve Gradle-style build descriptors into build variants",
    long_about = "Cradle reads a build.gradle.kts-style descriptor, merges its configuration \
                  layers into build variants, resolves dependency versions against platform \
                  pins, validates plugin prerequisites and binds signing identities."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Descriptor to load instead of searching for build.gradle.kts
    #[arg(short, long, global = true, env = "CRADLE_DESCRIPTOR")]
    pub descriptor: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every build variant
    Resolve {
        /// Resolve a single variant
        #[arg(long)]
        variant: Option<String>,
        /// Print the resolved variants as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate plugins and signing without resolving versions
    Check,

    /// Show resolved dependency versions and precedence decisions
    Deps {
        /// Show a single variant
        #[arg(long)]
        variant: Option<String>,
    },

    /// List the build variants the descriptor defines
    Variants,

    /// List .cradle.env entries with values masked
    Env {
        /// Show the values
        #[arg(long)]
        reveal: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
