//! Shared utilities for the Cradle resolution engine.
//!
//! This crate provides cross-cutting concerns used by all other Cradle crates:
//! error types, filesystem helpers, fingerprint hashing, and terminal
//! status lines.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod progress;
