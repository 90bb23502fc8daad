use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for cross-cutting Cradle failures.
///
/// Component failures (syntax, resolution, signing, plugin order) carry their
/// own typed errors; this enum covers everything around them.
#[derive(Debug, Error, Diagnostic)]
pub enum CradleError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The build descriptor could not be located or read.
    #[error("Descriptor error: {message}")]
    #[diagnostic(help("Pass --descriptor or run from the directory holding build.gradle.kts"))]
    Descriptor { message: String },

    /// A configuration file (`cradle.toml`, `~/.cradle/config.toml`) is malformed.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check the TOML syntax of your Cradle configuration"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
