//! The in-memory configuration tree produced by the descriptor parser.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::value::{Invocation, Value};

/// Placeholder written in place of secret values.
pub const REDACTED: &str = "********";

/// A named block of ordered `(key, value)` entries and ordered invocations.
///
/// Entry keys are unique within one node. A nested block is stored as a
/// [`Value::Block`] entry keyed by its label (`create("release")`) or, when
/// it has none, by its name (`release { }`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    pub name: String,
    pub label: Option<String>,
    entries: Vec<(String, Value)>,
    invocations: Vec<Invocation>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            entries: Vec::new(),
            invocations: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The key this node is stored under in its parent.
    pub fn key(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.invocations.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn block(&self, key: &str) -> Option<&ConfigNode> {
        self.get(key).and_then(Value::as_block)
    }

    pub fn block_mut(&mut self, key: &str) -> Option<&mut ConfigNode> {
        match self.get_mut(key) {
            Some(Value::Block(node)) => Some(node),
            _ => None,
        }
    }

    /// Child blocks in declaration order.
    pub fn blocks(&self) -> impl Iterator<Item = &ConfigNode> {
        self.entries.iter().filter_map(|(_, v)| v.as_block())
    }

    /// Walk a dotted path of block keys, e.g. `"android.defaultConfig"`.
    pub fn path(&self, dotted: &str) -> Option<&ConfigNode> {
        dotted
            .split('.')
            .try_fold(self, |node, key| node.block(key))
    }

    /// Set `key` to `value`, replacing in place (keeping its position) or
    /// appending. Returns the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Store `node` under its [`key`](Self::key).
    pub fn insert_block(&mut self, node: ConfigNode) -> Option<Value> {
        let key = node.key().to_string();
        self.set(key, Value::Block(node))
    }

    pub fn push_invocation(&mut self, invocation: Invocation) {
        self.invocations.push(invocation);
    }

    pub fn set_invocations(&mut self, invocations: Vec<Invocation>) {
        self.invocations = invocations;
    }

    /// Visit every string literal in entries and invocation arguments, nested
    /// blocks included.
    pub fn for_each_string_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        for (_, value) in &mut self.entries {
            value.for_each_string_mut(f);
        }
        for invocation in &mut self.invocations {
            for arg in &mut invocation.args {
                arg.for_each_string_mut(f);
            }
        }
    }

    /// A copy with every value under a secret-looking key replaced by [`REDACTED`].
    pub fn redacted(&self) -> ConfigNode {
        let entries = self
            .entries
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Block(node) => Value::Block(node.redacted()),
                    _ if is_secret_key(key) => Value::String(REDACTED.to_string()),
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect();
        ConfigNode {
            name: self.name.clone(),
            label: self.label.clone(),
            entries,
            invocations: self.invocations.clone(),
        }
    }
}

/// Keys whose values are credentials: `storePassword`, `keyPassword`, `apiToken`, ...
pub fn is_secret_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    ["password", "secret", "token"]
        .iter()
        .any(|needle| lower.contains(needle))
}

struct Entries<'a>(&'a [(String, Value)]);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConfigNode", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("label", &self.label)?;
        state.serialize_field("entries", &Entries(&self.entries))?;
        state.serialize_field("invocations", &self.invocations)?;
        state.end()
    }
}
