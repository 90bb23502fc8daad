//! The build descriptor model extracted from a parsed [`ConfigNode`] tree.

use std::collections::BTreeMap;

use miette::Diagnostic;
use thiserror::Error;

use crate::dependency::DependencyCoordinate;
use crate::node::ConfigNode;
use crate::parser::{self, SyntaxError};
use crate::properties;
use crate::value::{Invocation, Value};

/// The block holding Android configuration.
pub const ANDROID: &str = "android";

/// Build types every Android module has, declared or not.
pub const IMPLICIT_BUILD_TYPES: &[&str] = &["debug", "release"];

/// Descriptor shapes the parser accepts but the model cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DescriptorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("unsupported plugin declaration `{declaration}`")]
    #[diagnostic(
        code(cradle::descriptor::plugin),
        help("Declare plugins as id(\"...\") or kotlin(\"...\") inside plugins {{ }}")
    )]
    InvalidPlugin { declaration: String },

    #[error("invalid `{configuration}` dependency `{notation}`")]
    #[diagnostic(
        code(cradle::descriptor::dependency),
        help("Use \"group:artifact[:version]\", platform(\"group:artifact:version\") or project(\":path\")")
    )]
    InvalidDependency {
        configuration: String,
        notation: String,
    },

    #[error("flavor `{flavor}` names dimension `{dimension}`, which is not in flavorDimensions")]
    #[diagnostic(code(cradle::descriptor::dimension))]
    UnknownFlavorDimension { flavor: String, dimension: String },

    #[error("flavor `{flavor}` must set `dimension` when several flavor dimensions exist")]
    #[diagnostic(code(cradle::descriptor::dimension))]
    MissingFlavorDimension { flavor: String },

    #[error("variant `{variant}` has an unsupported signingConfig value: {found}")]
    #[diagnostic(
        code(cradle::descriptor::signing),
        help("Use signingConfig = signingConfigs.getByName(\"<name>\")")
    )]
    InvalidSigningReference { variant: String, found: String },
}

/// How a dependency is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyNotation {
    /// `"group:artifact[:version]"`
    Module(DependencyCoordinate),
    /// `platform("group:artifact:version")` or `enforcedPlatform(...)`
    Platform(DependencyCoordinate),
    /// `project(":lib")`
    Project(String),
    /// `files(...)` / `fileTree(...)`
    Local(String),
}

/// One line of the `dependencies { }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    pub configuration: String,
    pub notation: DependencyNotation,
}

/// A parsed build descriptor.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub root: ConfigNode,
    /// Plugin ids in application order.
    pub plugins: Vec<String>,
    pub dependencies: Vec<DependencyDeclaration>,
}

impl Descriptor {
    /// Parse descriptor text and extract its model.
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        Self::from_root(parser::parse(text)?)
    }

    /// Parse descriptor text, then interpolate `${env:VAR}` inside its string
    /// literals. Substituted values never pass through the lexer.
    pub fn parse_with_env(
        text: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Self, DescriptorError> {
        let mut root = parser::parse(text)?;
        properties::interpolate_node(&mut root, env);
        Self::from_root(root)
    }

    pub fn from_root(root: ConfigNode) -> Result<Self, DescriptorError> {
        let plugins = match root.block("plugins") {
            Some(block) => block
                .invocations()
                .iter()
                .map(plugin_id)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let dependencies = match root.block("dependencies") {
            Some(block) => dependency_declarations(block)?,
            None => Vec::new(),
        };
        Ok(Self {
            root,
            plugins,
            dependencies,
        })
    }

    pub fn android(&self) -> Option<&ConfigNode> {
        self.root.block(ANDROID)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.android().and_then(|a| a.string("namespace"))
    }

    /// `android.defaultConfig`, or an empty block.
    pub fn default_config(&self) -> ConfigNode {
        self.root
            .path("android.defaultConfig")
            .cloned()
            .unwrap_or_else(|| ConfigNode::new("defaultConfig"))
    }

    /// Declared build types in order, followed by any implicit ones not declared.
    pub fn build_types(&self) -> Vec<ConfigNode> {
        let mut types: Vec<ConfigNode> = self
            .root
            .path("android.buildTypes")
            .map(|b| b.blocks().cloned().collect())
            .unwrap_or_default();
        for implicit in IMPLICIT_BUILD_TYPES {
            if !types.iter().any(|t| t.key() == *implicit) {
                types.push(ConfigNode::new(*implicit));
            }
        }
        types
    }

    /// `android.signingConfigs` children.
    pub fn signing_configs(&self) -> Vec<&ConfigNode> {
        self.root
            .path("android.signingConfigs")
            .map(|b| b.blocks().collect())
            .unwrap_or_default()
    }

    /// Product flavors grouped by dimension, in dimension order.
    ///
    /// A dimension without flavors is dropped. With no flavors at all the
    /// result is empty.
    pub fn flavor_groups(&self) -> Result<Vec<(String, Vec<&ConfigNode>)>, DescriptorError> {
        let flavors: Vec<&ConfigNode> = self
            .root
            .path("android.productFlavors")
            .map(|b| b.blocks().collect())
            .unwrap_or_default();
        if flavors.is_empty() {
            return Ok(Vec::new());
        }

        let dimensions = self.flavor_dimensions();
        let declared = !dimensions.is_empty();
        let mut groups: Vec<(String, Vec<&ConfigNode>)> =
            dimensions.into_iter().map(|d| (d, Vec::new())).collect();

        for flavor in flavors {
            let dimension = match flavor.string("dimension") {
                Some(d) => d.to_string(),
                None if declared && groups.len() == 1 => groups[0].0.clone(),
                None if declared => {
                    return Err(DescriptorError::MissingFlavorDimension {
                        flavor: flavor.key().to_string(),
                    })
                }
                None => "default".to_string(),
            };
            match groups.iter_mut().find(|(d, _)| *d == dimension) {
                Some((_, members)) => members.push(flavor),
                None if declared => {
                    return Err(DescriptorError::UnknownFlavorDimension {
                        flavor: flavor.key().to_string(),
                        dimension,
                    })
                }
                None => groups.push((dimension, vec![flavor])),
            }
        }

        groups.retain(|(_, members)| !members.is_empty());
        Ok(groups)
    }

    /// `flavorDimensions += listOf(..)`, `flavorDimensions = ..` or `flavorDimensions(..)`.
    pub fn flavor_dimensions(&self) -> Vec<String> {
        let Some(android) = self.android() else {
            return Vec::new();
        };
        let strings = |values: &[Value]| -> Vec<String> {
            values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        };
        match android.get("flavorDimensions") {
            Some(Value::List(items)) => strings(items),
            Some(Value::String(single)) => vec![single.clone()],
            _ => android
                .invocations()
                .iter()
                .find(|i| i.name == "flavorDimensions")
                .map(|i| strings(&i.args))
                .unwrap_or_default(),
        }
    }

    /// Declarations whose configuration is one of `configurations`, in declaration order.
    pub fn declarations_for<'a>(
        &'a self,
        configurations: &'a [String],
    ) -> impl Iterator<Item = &'a DependencyDeclaration> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| configurations.contains(&d.configuration))
    }
}

fn plugin_id(invocation: &Invocation) -> Result<String, DescriptorError> {
    let invalid = || DescriptorError::InvalidPlugin {
        declaration: invocation.to_string(),
    };
    match (invocation.name.as_str(), invocation.args.as_slice()) {
        ("id", [Value::String(id)]) => Ok(id.clone()),
        ("kotlin", [Value::String(module)]) => Ok(format!("org.jetbrains.kotlin.{module}")),
        ("alias", [Value::VersionRef(reference)]) => Ok(reference.clone()),
        _ => Err(invalid()),
    }
}

fn dependency_declarations(block: &ConfigNode) -> Result<Vec<DependencyDeclaration>, DescriptorError> {
    let mut declarations = Vec::new();

    for invocation in block.invocations() {
        let invalid = || DescriptorError::InvalidDependency {
            configuration: invocation.name.clone(),
            notation: invocation.to_string(),
        };
        let notation = match invocation.args.as_slice() {
            [Value::String(s)] => DependencyNotation::Module(DependencyCoordinate::parse(s).ok_or_else(invalid)?),
            [Value::Call(inner)] => match (inner.name.as_str(), inner.single_string()) {
                ("platform" | "enforcedPlatform", Some(s)) => {
                    let coordinate = DependencyCoordinate::parse(s)
                        .filter(|c| c.version.is_some())
                        .ok_or_else(invalid)?;
                    DependencyNotation::Platform(coordinate)
                }
                ("project", Some(path)) => DependencyNotation::Project(path.to_string()),
                ("files" | "fileTree", _) => DependencyNotation::Local(inner.to_string()),
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };
        declarations.push(DependencyDeclaration {
            configuration: invocation.name.clone(),
            notation,
        });
    }

    // implementation("g:a:v") { exclude(...) } parses as a labelled block.
    for child in block.blocks() {
        let Some(label) = child.label.as_deref() else {
            continue;
        };
        let coordinate = DependencyCoordinate::parse(label).ok_or_else(|| DescriptorError::InvalidDependency {
            configuration: child.name.clone(),
            notation: label.to_string(),
        })?;
        declarations.push(DependencyDeclaration {
            configuration: child.name.clone(),
            notation: DependencyNotation::Module(coordinate),
        });
    }

    Ok(declarations)
}
