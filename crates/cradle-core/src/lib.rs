//! Core data types for the Cradle build-descriptor engine.
//!
//! This crate defines the descriptor tree produced by the parser, the
//! descriptor model read from it, variant merging and assembly, signing
//! identities and their binding, and the configuration files that feed a
//! resolution pass.
//!
//! Everything here is synchronous and free of network I/O.

/// Descriptor file looked up when none is given.
pub const DEFAULT_DESCRIPTOR: &str = "build.gradle.kts";

pub mod config;
pub mod dependency;
pub mod descriptor;
pub mod merge;
pub mod node;
pub mod parser;
pub mod properties;
pub mod signing;
pub mod value;
pub mod variant;
