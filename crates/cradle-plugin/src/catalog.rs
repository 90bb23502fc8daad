//! The plugin prerequisite catalog.

use std::collections::BTreeMap;

use cradle_core::config::PluginEntry;

use crate::plugin::Plugin;

/// The Android Gradle application plugin.
pub const ANDROID_APPLICATION: &str = "com.android.application";

/// The Google services plugin.
pub const GOOGLE_SERVICES: &str = "com.google.gms.google-services";

const BUILTIN: &[(&str, &[&str])] = &[
    ("dev.flutter.flutter-gradle-plugin", &[ANDROID_APPLICATION]),
    (GOOGLE_SERVICES, &[ANDROID_APPLICATION]),
    (
        "com.google.firebase.crashlytics",
        &[ANDROID_APPLICATION, GOOGLE_SERVICES],
    ),
    ("com.google.firebase.firebase-perf", &[ANDROID_APPLICATION]),
    ("com.google.firebase.appdistribution", &[ANDROID_APPLICATION]),
];

/// Plugin id → prerequisite ids.
#[derive(Debug, Clone)]
pub struct PluginCatalog {
    requires: BTreeMap<String, Vec<String>>,
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PluginCatalog {
    /// A catalog without any entries.
    pub fn empty() -> Self {
        Self {
            requires: BTreeMap::new(),
        }
    }

    /// The entries Cradle knows for common Android and Firebase plugins.
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for (id, prerequisites) in BUILTIN {
            catalog.set(id, prerequisites.iter().map(|p| p.to_string()).collect());
        }
        catalog
    }

    /// Replace the entry for `id`.
    pub fn set(&mut self, id: &str, prerequisites: Vec<String>) {
        self.requires.insert(id.to_string(), prerequisites);
    }

    /// Apply `[plugins."<id>"]` configuration; each entry replaces the built-in one.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, PluginEntry>) -> Self {
        for (id, entry) in overrides {
            tracing::debug!(plugin = %id, requires = ?entry.requires, "plugin catalog override");
            self.set(id, entry.requires.clone());
        }
        self
    }

    pub fn prerequisites(&self, id: &str) -> &[String] {
        self.requires.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Plugins for the declared ids, in declaration order.
    pub fn plugins_for<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Plugin> {
        ids.iter()
            .map(|id| {
                self.prerequisites(id.as_ref())
                    .iter()
                    .fold(Plugin::new(id.as_ref()), |plugin, p| plugin.requires(p.as_str()))
            })
            .collect()
    }
}
