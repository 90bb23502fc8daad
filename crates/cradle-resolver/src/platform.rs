//! Platform (BOM) constraints and the catalog they are selected from.

use std::collections::BTreeMap;

use cradle_core::dependency::{DependencyCoordinate, ModuleId};

use crate::resolver::ResolveError;

/// A named BOM: module → pinned version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConstraint {
    pub name: String,
    pins: BTreeMap<ModuleId, String>,
}

impl PlatformConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pins: BTreeMap::new(),
        }
    }

    pub fn with_pin(mut self, module: ModuleId, version: impl Into<String>) -> Self {
        self.pins.insert(module, version.into());
        self
    }

    /// Build a constraint from a `[platforms."<name>"]` table of
    /// `"group:artifact" = "version"` entries.
    pub fn from_table(name: &str, table: &BTreeMap<String, String>) -> Result<Self, Vec<ResolveError>> {
        let mut constraint = Self::new(name);
        let mut errors = Vec::new();
        for (key, version) in table {
            match ModuleId::parse(key) {
                Some(module) if !version.is_empty() => {
                    constraint.pins.insert(module, version.clone());
                }
                _ => errors.push(ResolveError::InvalidPin {
                    platform: name.to_string(),
                    key: key.clone(),
                }),
            }
        }
        if errors.is_empty() {
            Ok(constraint)
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, module: &ModuleId) -> Option<&str> {
        self.pins.get(module).map(String::as_str)
    }

    pub fn pins(&self) -> impl Iterator<Item = (&ModuleId, &str)> {
        self.pins.iter().map(|(m, v)| (m, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Every platform constraint known to one resolution pass, keyed by the
/// coordinate it is imported as (`group:artifact:version`).
#[derive(Debug, Clone, Default)]
pub struct PlatformCatalog {
    by_name: BTreeMap<String, PlatformConstraint>,
}

impl PlatformCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: &BTreeMap<String, BTreeMap<String, String>>) -> Result<Self, Vec<ResolveError>> {
        let mut catalog = Self::new();
        let mut errors = Vec::new();
        for (name, table) in tables {
            match PlatformConstraint::from_table(name, table) {
                Ok(constraint) => catalog.insert(constraint),
                Err(mut invalid) => errors.append(&mut invalid),
            }
        }
        if errors.is_empty() {
            Ok(catalog)
        } else {
            Err(errors)
        }
    }

    pub fn insert(&mut self, constraint: PlatformConstraint) {
        self.by_name.insert(constraint.name.clone(), constraint);
    }

    pub fn get(&self, name: &str) -> Option<&PlatformConstraint> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The constraints for `imports`, in import order. A repeated import
    /// keeps its first position.
    pub fn select<'c, 'i>(
        &'c self,
        imports: impl IntoIterator<Item = &'i DependencyCoordinate>,
    ) -> Result<Vec<&'c PlatformConstraint>, Vec<ResolveError>> {
        let mut selected: Vec<&PlatformConstraint> = Vec::new();
        let mut errors = Vec::new();
        for import in imports {
            let name = import.to_string();
            match self.get(&name) {
                Some(constraint) => {
                    if !selected.iter().any(|c| c.name == constraint.name) {
                        selected.push(constraint);
                    }
                }
                None => {
                    let error = ResolveError::UnknownPlatform { platform: name };
                    if !errors.contains(&error) {
                        errors.push(error);
                    }
                }
            }
        }
        if errors.is_empty() {
            Ok(selected)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_table_rejects_malformed_keys() {
        let mut table = BTreeMap::new();
        table.insert("g:a".to_string(), "1.0".to_string());
        table.insert("not-a-module".to_string(), "1.0".to_string());
        let errors = PlatformConstraint::from_table("g:bom:1", &table).unwrap_err();
        assert_eq!(
            errors,
            [ResolveError::InvalidPin {
                platform: "g:bom:1".into(),
                key: "not-a-module".into(),
            }]
        );
    }

    #[test]
    fn select_keeps_import_order_and_dedups() {
        let mut catalog = PlatformCatalog::new();
        catalog.insert(PlatformConstraint::new("a:bom:1"));
        catalog.insert(PlatformConstraint::new("b:bom:1"));
        let imports = [
            DependencyCoordinate::new("b", "bom", Some("1")),
            DependencyCoordinate::new("a", "bom", Some("1")),
            DependencyCoordinate::new("b", "bom", Some("1")),
        ];
        let names: Vec<&str> = catalog
            .select(&imports)
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["b:bom:1", "a:bom:1"]);
    }

    #[test]
    fn select_reports_unknown_platforms_once() {
        let catalog = PlatformCatalog::new();
        let missing = DependencyCoordinate::new("g", "bom", Some("2"));
        let errors = catalog.select([&missing, &missing]).unwrap_err();
        assert_eq!(
            errors,
            [ResolveError::UnknownPlatform {
                platform: "g:bom:2".into()
            }]
        );
    }
}
