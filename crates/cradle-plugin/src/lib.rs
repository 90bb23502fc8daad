//! Plugin handling for Cradle: which plugins a plugin needs applied before
//! it, and validation of a descriptor's `plugins { }` block against that.

pub mod catalog;
pub mod ordering;
pub mod plugin;
