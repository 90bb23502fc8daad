use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cradle_util::errors::CradleError;

use crate::properties;
use crate::signing::SigningEntry;

/// Project inputs file, next to the descriptor.
pub const PROJECT_CONFIG: &str = "cradle.toml";

/// Global user configuration loaded from `~/.cradle/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub build: BuildConfig,

    /// Global `[plugins]`, `[platforms]`, `[properties]` and `[signing]`,
    /// overridden by the project's `cradle.toml`.
    #[serde(flatten)]
    pub inputs: ResolutionInputs,
}

/// Build settings from `[build]` in global config.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Upper bound on variants resolved concurrently.
    #[serde(default = "default_jobs")]
    pub jobs: u32,
    #[serde(default, rename = "default-descriptor")]
    pub default_descriptor: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            default_descriptor: None,
        }
    }
}

fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
}

/// `[plugins."<id>"]`: prerequisites of one plugin, replacing the built-in entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginEntry {
    #[serde(default)]
    pub requires: Vec<String>,
}

/// Caller-supplied inputs to a resolution pass.
///
/// ```toml
/// [platforms."com.google.firebase:firebase-bom:32.7.0"]
/// "com.google.firebase:firebase-analytics" = "21.5.0"
///
/// [plugins."com.google.gms.google-services"]
/// requires = ["com.android.application"]
///
/// [properties]
/// "flutter.targetSdkVersion" = "34"
///
/// [signing.release]
/// store-file = "release.jks"
/// store-password = "${env:STORE_PASSWORD}"
/// key-alias = "upload"
/// key-password = "${env:KEY_PASSWORD}"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolutionInputs {
    /// Platform coordinate → `group:artifact` → pinned version. Precedence
    /// follows the descriptor's `platform(..)` order, not this table's.
    #[serde(default)]
    pub platforms: BTreeMap<String, BTreeMap<String, String>>,

    #[serde(default)]
    pub plugins: BTreeMap<String, PluginEntry>,

    /// Values for symbolic settings such as `flutter.minSdkVersion`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub signing: BTreeMap<String, SigningEntry>,
}

impl ResolutionInputs {
    /// Load `cradle.toml`, then interpolate `${env:VAR}` from `env` in its
    /// string values. A missing file yields empty inputs.
    pub fn from_path(path: &Path, env: &BTreeMap<String, String>) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| CradleError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let mut inputs = Self::from_str(&content)?;
        inputs.interpolate(env);
        Ok(inputs)
    }

    /// Interpolate `${env:VAR}` in every value. Table keys are left alone.
    pub fn interpolate(&mut self, env: &BTreeMap<String, String>) {
        let apply = |s: &mut String| {
            if s.contains("${env:") {
                *s = properties::interpolate(s, env);
            }
        };
        self.platforms
            .values_mut()
            .flat_map(BTreeMap::values_mut)
            .for_each(apply);
        self.plugins
            .values_mut()
            .flat_map(|entry| entry.requires.iter_mut())
            .for_each(apply);
        self.properties.values_mut().for_each(apply);
        for entry in self.signing.values_mut() {
            entry.interpolate(env);
        }
    }

    /// Parse `cradle.toml` content (no interpolation).
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            CradleError::Config {
                message: format!("Failed to parse cradle.toml: {e}"),
            }
            .into()
        })
    }

    /// `top` over `base`, table entry by table entry.
    pub fn layered(mut base: Self, top: Self) -> Self {
        base.platforms.extend(top.platforms);
        base.plugins.extend(top.plugins);
        base.properties.extend(top.properties);
        base.signing.extend(top.signing);
        base
    }
}

impl GlobalConfig {
    /// Load the global configuration from `~/.cradle/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::from_path(&Self::default_path())
    }

    pub fn from_path(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| CradleError::Config {
            message: format!("Failed to read global config: {e}"),
        })?;
        toml::from_str(&content).map_err(|e| {
            CradleError::Config {
                message: format!("Failed to parse global config: {e}"),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// Returns the path to the Cradle data directory (`~/.cradle/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".cradle")
}
