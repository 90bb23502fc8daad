//! Variant merging: layering an override block onto a default block.

use crate::node::ConfigNode;
use crate::value::Value;

/// Keys holding a signing-configuration reference. Replaced wholesale, never
/// merged field by field.
const SIGNING_KEYS: &[&str] = &["signingConfig"];

/// Merge `overlay` onto `default`, producing the effective configuration.
///
/// - a key present in both takes the overlay's value, keeping the default's position;
/// - keys only in the overlay are appended in overlay order;
/// - blocks present in both merge recursively, except signing references;
/// - lists and invocation sequences are replaced, never concatenated.
///
/// The result keeps the default's name and label.
pub fn merge(default: &ConfigNode, overlay: &ConfigNode) -> ConfigNode {
    let mut effective = default.clone();

    for (key, value) in overlay.entries() {
        let merged = match (effective.get(key), value) {
            (Some(Value::Block(base)), Value::Block(over)) if !SIGNING_KEYS.contains(&key.as_str()) => {
                Value::Block(merge(base, over))
            }
            _ => value.clone(),
        };
        effective.set(key.clone(), merged);
    }

    if !overlay.invocations().is_empty() {
        effective.set_invocations(overlay.invocations().to_vec());
    }

    effective
}

/// Fold a chain of layers left to right: `layers[0] ← layers[1] ← ...`.
pub fn merge_chain<'a>(base: &ConfigNode, layers: impl IntoIterator<Item = &'a ConfigNode>) -> ConfigNode {
    layers
        .into_iter()
        .fold(base.clone(), |acc, layer| merge(&acc, layer))
}
