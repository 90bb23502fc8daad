use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::dependency::ResolvedDependency;
use crate::descriptor::{Descriptor, DescriptorError};
use crate::merge::merge_chain;
use crate::node::ConfigNode;
use crate::signing::SigningHandle;
use crate::value::Value;

/// Dependency configurations every variant sees.
pub const BASE_CONFIGURATIONS: &[&str] = &[
    "api",
    "implementation",
    "compileOnly",
    "runtimeOnly",
    "annotationProcessor",
    "kapt",
    "ksp",
];

/// Configurations that may be prefixed with a flavor, build type or variant name.
const PREFIXABLE_CONFIGURATIONS: &[&str] = &["api", "implementation", "compileOnly", "runtimeOnly"];

/// A scalar build setting, possibly a symbolic reference such as
/// `flutter.targetSdkVersion` that only the caller can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Setting {
    Int(i64),
    Text(String),
    Symbolic { reference: String },
}

impl Setting {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(n) => Some(Setting::Int(*n)),
            Value::String(s) => Some(Setting::Text(s.clone())),
            Value::VersionRef(r) => Some(Setting::Symbolic {
                reference: r.clone(),
            }),
            _ => None,
        }
    }

    /// Substitute a symbolic reference from `properties`; unknown references stay symbolic.
    pub fn resolve(&self, properties: &BTreeMap<String, String>) -> Setting {
        match self {
            Setting::Symbolic { reference } => match properties.get(reference) {
                Some(raw) => raw
                    .parse::<i64>()
                    .map(Setting::Int)
                    .unwrap_or_else(|_| Setting::Text(raw.clone())),
                None => self.clone(),
            },
            other => other.clone(),
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Setting::Symbolic { .. })
    }
}

impl std::fmt::Display for Setting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Int(n) => write!(f, "{n}"),
            Setting::Text(s) => f.write_str(s),
            Setting::Symbolic { reference } => write!(f, "<{reference}>"),
        }
    }
}

/// One flavor combination plus one build type, merged into a single block.
#[derive(Debug, Clone)]
pub struct VariantPlan {
    pub name: String,
    /// Flavor names in dimension order.
    pub flavors: Vec<String>,
    pub build_type: String,
    pub effective: ConfigNode,
    /// `applicationIdSuffix` of every layer, concatenated in merge order.
    pub application_id_suffix: String,
    pub version_name_suffix: String,
}

impl VariantPlan {
    /// Dependency configurations that contribute to this variant.
    pub fn configurations(&self) -> Vec<String> {
        let mut configurations: Vec<String> =
            BASE_CONFIGURATIONS.iter().map(|c| c.to_string()).collect();
        let mut prefixes: Vec<&str> = self.flavors.iter().map(String::as_str).collect();
        prefixes.push(&self.build_type);
        if !self.flavors.is_empty() {
            prefixes.push(&self.name);
        }
        for prefix in prefixes {
            for base in PREFIXABLE_CONFIGURATIONS {
                configurations.push(format!("{prefix}{}", capitalize(base)));
            }
        }
        configurations
    }
}

/// Build the variant plans of a descriptor: flavor combinations × build types.
///
/// Each plan merges `defaultConfig ← flavor₁ ← … ← buildType`.
pub fn plan_variants(descriptor: &Descriptor) -> Result<Vec<VariantPlan>, DescriptorError> {
    let default = descriptor.default_config();
    let build_types = descriptor.build_types();
    let groups = descriptor.flavor_groups()?;

    let mut combinations: Vec<Vec<&ConfigNode>> = vec![Vec::new()];
    for (_, members) in &groups {
        combinations = combinations
            .into_iter()
            .flat_map(|combo| {
                members.iter().map(move |flavor| {
                    let mut next = combo.clone();
                    next.push(*flavor);
                    next
                })
            })
            .collect();
    }

    let mut plans = Vec::new();
    for combo in &combinations {
        for build_type in &build_types {
            let layers: Vec<&ConfigNode> = combo
                .iter()
                .copied()
                .chain(std::iter::once(build_type))
                .collect();
            let flavors: Vec<String> = combo.iter().map(|f| f.key().to_string()).collect();
            let suffix = |key: &str| -> String {
                std::iter::once(&default)
                    .chain(layers.iter().copied())
                    .filter_map(|layer| layer.string(key))
                    .collect()
            };
            plans.push(VariantPlan {
                name: camel_case_name(&flavors, build_type.key()),
                build_type: build_type.key().to_string(),
                effective: merge_chain(&default, layers.iter().copied()),
                application_id_suffix: suffix("applicationIdSuffix"),
                version_name_suffix: suffix("versionNameSuffix"),
                flavors,
            });
        }
    }
    Ok(plans)
}

/// `["free", "staging"]` + `"release"` → `freeStagingRelease`.
pub fn camel_case_name(flavors: &[String], build_type: &str) -> String {
    let mut result = String::new();
    for (i, part) in flavors
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(build_type))
        .enumerate()
    {
        if i == 0 {
            result.push_str(part);
        } else {
            result.push_str(&capitalize(part));
        }
    }
    result
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The effective, fully-resolved configuration of one variant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildVariant<'a> {
    pub name: String,
    pub flavors: Vec<String>,
    pub build_type: String,
    pub application_id: Option<String>,
    pub min_sdk: Option<Setting>,
    pub target_sdk: Option<Setting>,
    pub compile_sdk: Option<Setting>,
    pub version_code: Option<Setting>,
    pub version_name: Option<Setting>,
    /// `versionNameSuffix` still waiting for a symbolic `versionName` to resolve.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version_name_suffix: String,
    /// Name of the signing configuration this variant asks for.
    pub signing_config: Option<String>,
    pub signing: Option<SigningHandle<'a>>,
    pub dependencies: Vec<ResolvedDependency>,
    #[serde(serialize_with = "serialize_redacted")]
    pub effective: ConfigNode,
}

impl<'a> BuildVariant<'a> {
    /// Read the variant's settings from its plan. Dependencies start empty
    /// and the variant starts unsigned.
    pub fn from_plan(plan: &VariantPlan, descriptor: &Descriptor) -> Result<Self, DescriptorError> {
        let effective = &plan.effective;
        let setting = |node: &ConfigNode, keys: &[&str]| -> Option<Setting> {
            keys.iter()
                .find_map(|k| node.get(k))
                .and_then(Setting::from_value)
        };

        let application_id = effective
            .string("applicationId")
            .or_else(|| descriptor.namespace())
            .map(|id| format!("{id}{}", plan.application_id_suffix));

        let signing_config = match effective.get("signingConfig") {
            None => None,
            Some(Value::SigningRef(name)) | Some(Value::String(name)) => Some(name.clone()),
            Some(other) => {
                return Err(DescriptorError::InvalidSigningReference {
                    variant: plan.name.clone(),
                    found: other.kind().to_string(),
                })
            }
        };

        let compile_sdk = descriptor
            .android()
            .and_then(|android| setting(android, &["compileSdk", "compileSdkVersion"]));

        let mut variant = Self {
            name: plan.name.clone(),
            flavors: plan.flavors.clone(),
            build_type: plan.build_type.clone(),
            application_id,
            min_sdk: setting(effective, &["minSdk", "minSdkVersion"]),
            target_sdk: setting(effective, &["targetSdk", "targetSdkVersion"]),
            compile_sdk,
            version_code: setting(effective, &["versionCode"]),
            version_name: setting(effective, &["versionName"]),
            version_name_suffix: plan.version_name_suffix.clone(),
            signing_config,
            signing: None,
            dependencies: Vec::new(),
            effective: plan.effective.clone(),
        };
        variant.apply_version_name_suffix();
        Ok(variant)
    }

    /// Append the pending suffix once `versionName` is concrete.
    fn apply_version_name_suffix(&mut self) {
        if self.version_name_suffix.is_empty() {
            return;
        }
        let name = match &self.version_name {
            Some(Setting::Text(name)) => name.clone(),
            Some(Setting::Int(n)) => n.to_string(),
            _ => return,
        };
        let suffix = std::mem::take(&mut self.version_name_suffix);
        self.version_name = Some(Setting::Text(format!("{name}{suffix}")));
    }

    /// Whether a signing identity has been bound.
    pub fn is_bound(&self) -> bool {
        self.signing.is_some()
    }

    /// Substitute symbolic settings from caller-supplied properties.
    pub fn resolve_settings(&mut self, properties: &BTreeMap<String, String>) {
        for slot in [
            &mut self.min_sdk,
            &mut self.target_sdk,
            &mut self.compile_sdk,
            &mut self.version_code,
            &mut self.version_name,
        ] {
            if let Some(setting) = slot.as_mut() {
                *setting = setting.resolve(properties);
            }
        }
        self.apply_version_name_suffix();
    }
}

fn serialize_redacted<S: Serializer>(node: &ConfigNode, serializer: S) -> Result<S::Ok, S::Error> {
    node.redacted().serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("release"), "Release");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn configurations_include_prefixed_names() {
        let plan = VariantPlan {
            name: "freeRelease".into(),
            flavors: vec!["free".into()],
            build_type: "release".into(),
            effective: ConfigNode::new("defaultConfig"),
            application_id_suffix: String::new(),
            version_name_suffix: String::new(),
        };
        let configurations = plan.configurations();
        assert!(configurations.contains(&"implementation".to_string()));
        assert!(configurations.contains(&"freeImplementation".to_string()));
        assert!(configurations.contains(&"releaseImplementation".to_string()));
        assert!(configurations.contains(&"freeReleaseImplementation".to_string()));
        assert!(!configurations.contains(&"testImplementation".to_string()));
    }

    #[test]
    fn setting_resolution_parses_integers() {
        let mut props = BTreeMap::new();
        props.insert("flutter.targetSdkVersion".to_string(), "34".to_string());
        props.insert("flutter.versionName".to_string(), "1.2.0".to_string());

        let target = Setting::Symbolic {
            reference: "flutter.targetSdkVersion".into(),
        };
        assert_eq!(target.resolve(&props), Setting::Int(34));

        let name = Setting::Symbolic {
            reference: "flutter.versionName".into(),
        };
        assert_eq!(name.resolve(&props), Setting::Text("1.2.0".into()));

        let unknown = Setting::Symbolic {
            reference: "flutter.minSdkVersion".into(),
        };
        assert!(unknown.resolve(&props).is_symbolic());
    }
}
