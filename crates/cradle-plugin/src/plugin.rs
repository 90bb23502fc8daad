use std::fmt;

use serde::Serialize;

/// A declared plugin and the plugin ids that must be applied before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub id: String,
    /// Prerequisite ids without duplicates, in catalog order.
    pub prerequisites: Vec<String>,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prerequisites: Vec::new(),
        }
    }

    pub fn requires(mut self, prerequisite: impl Into<String>) -> Self {
        let prerequisite = prerequisite.into();
        if !self.prerequisites.contains(&prerequisite) {
            self.prerequisites.push(prerequisite);
        }
        self
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        if !self.prerequisites.is_empty() {
            write!(f, " (after {})", self.prerequisites.join(", "))?;
        }
        Ok(())
    }
}
