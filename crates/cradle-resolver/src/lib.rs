//! Version resolution for Cradle: explicit versions first, platform (BOM)
//! pins in import order second, with Maven-compatible version ordering and
//! a report of every silent precedence decision.

pub mod platform;
pub mod precedence;
pub mod resolver;
pub mod version;
