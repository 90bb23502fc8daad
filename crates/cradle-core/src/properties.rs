use std::collections::BTreeMap;
use std::path::Path;

use crate::node::ConfigNode;

/// File holding local build secrets, next to the descriptor.
pub const ENV_FILE: &str = ".cradle.env";

/// Loads a `.cradle.env` file (shell-style `KEY=value` format).
///
/// `.cradle.env` holds signing passwords and CI tokens that should stay out of
/// the descriptor. Values are available via `${env:VAR}` interpolation in the
/// descriptor and `cradle.toml`, and to `System.getenv("VAR")` in
/// `signingConfigs`. A missing file yields an empty map.
pub fn load_env_file(path: &Path) -> miette::Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    if !path.is_file() {
        return Ok(map);
    }
    let content = std::fs::read_to_string(path).map_err(cradle_util::errors::CradleError::Io)?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        if let Some((key, value)) = trimmed.split_once('=') {
            map.insert(key.trim().to_string(), unquote(value.trim()).to_string());
        }
    }
    Ok(map)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Interpolate `${env:VAR}` references in a string.
///
/// Looks up values first in `env_overrides` (populated from `.cradle.env`),
/// then in the process environment. Unknown variables become empty strings.
/// Substituted text is not rescanned, so callers apply this to parsed values
/// and never to source text.
pub fn interpolate(input: &str, env_overrides: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${env:") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let key = &rest[start + 6..start + len];
        result.push_str(&rest[..start]);
        match env_overrides
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
        {
            Some(value) => result.push_str(&value),
            None => tracing::debug!(variable = key, "unset variable interpolated as empty"),
        }
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

/// Interpolate `${env:VAR}` in every string literal of a parsed tree.
pub fn interpolate_node(node: &mut ConfigNode, env_overrides: &BTreeMap<String, String>) {
    node.for_each_string_mut(&mut |s| {
        if s.contains("${env:") {
            *s = interpolate(s, env_overrides);
        }
    });
}

/// `.cradle.env` merged over the process environment, for `System.getenv` lookups.
pub fn environment(env_file: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut env: BTreeMap<String, String> = std::env::vars().collect();
    env.extend(env_file.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}
