//! Locating and loading a project: descriptor, `.cradle.env`, `cradle.toml`
//! and the signing identities they declare.

use std::path::{Path, PathBuf};

use cradle_core::config::{GlobalConfig, ResolutionInputs, PROJECT_CONFIG};
use cradle_core::descriptor::Descriptor;
use cradle_core::properties::{self, ENV_FILE};
use cradle_core::signing::{SigningIdentities, SigningIdentity};
use cradle_util::errors::CradleError;

/// Everything one resolution pass reads. Immutable once loaded.
#[derive(Debug)]
pub struct Project {
    pub descriptor_path: PathBuf,
    /// Directory holding the descriptor, `cradle.toml` and `.cradle.env`.
    pub root: PathBuf,
    pub descriptor: Descriptor,
    /// Global configuration with the project's `cradle.toml` layered on top.
    pub inputs: ResolutionInputs,
    pub identities: SigningIdentities,
    /// Maximum number of variants resolved concurrently.
    pub jobs: usize,
}

/// Find the descriptor to load.
///
/// An explicit path is taken relative to `cwd`. Otherwise `default_name` is
/// looked up in `cwd` and its ancestors.
pub fn locate_descriptor(
    cwd: &Path,
    explicit: Option<&Path>,
    default_name: &str,
) -> miette::Result<PathBuf> {
    if let Some(path) = explicit {
        let path = cwd.join(path);
        if !path.is_file() {
            return Err(CradleError::Descriptor {
                message: format!("No descriptor at {}", path.display()),
            }
            .into());
        }
        return Ok(path);
    }
    let dir = cradle_util::fs::find_ancestor_with(cwd, default_name).ok_or_else(|| {
        CradleError::Descriptor {
            message: format!("Could not find {default_name} in this directory or any parent"),
        }
    })?;
    Ok(dir.join(default_name))
}

/// [`locate_descriptor`] with the default name taken from `[build]
/// default-descriptor`, falling back to `build.gradle.kts`.
pub fn find_descriptor(
    cwd: &Path,
    explicit: Option<&Path>,
    global: &GlobalConfig,
) -> miette::Result<PathBuf> {
    let default_name = global
        .build
        .default_descriptor
        .as_deref()
        .unwrap_or(cradle_core::DEFAULT_DESCRIPTOR);
    locate_descriptor(cwd, explicit, default_name)
}

impl Project {
    /// Locate and load the project from `cwd`, using `~/.cradle/config.toml`.
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> miette::Result<Self> {
        let global = GlobalConfig::load()?;
        let path = find_descriptor(cwd, explicit, &global)?;
        Self::from_descriptor(&path, &global)
    }

    /// Load the project whose descriptor is at `path`.
    pub fn from_descriptor(path: &Path, global: &GlobalConfig) -> miette::Result<Self> {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let env_file = properties::load_env_file(&root.join(ENV_FILE))?;
        let text = cradle_util::fs::read_descriptor(path)?;
        let descriptor = Descriptor::parse_with_env(&text, &env_file)
            .map_err(|e| miette::Report::new(e).wrap_err(format!("Failed to parse {}", path.display())))?;

        let project_inputs = ResolutionInputs::from_path(&root.join(PROJECT_CONFIG), &env_file)?;
        let inputs = ResolutionInputs::layered(global.inputs.clone(), project_inputs);

        let environment = properties::environment(&env_file);
        let mut identities =
            SigningIdentities::from_blocks(descriptor.signing_configs(), &environment);
        for (name, entry) in &inputs.signing {
            if identities
                .insert(SigningIdentity::from_entry(name, entry))
                .is_some()
            {
                tracing::debug!(identity = %name, "signing identity replaced by configuration");
            }
        }

        tracing::info!(
            descriptor = %path.display(),
            plugins = descriptor.plugins.len(),
            dependencies = descriptor.dependencies.len(),
            identities = identities.len(),
            platforms = inputs.platforms.len(),
            "loaded project"
        );

        Ok(Self {
            descriptor_path: path.to_path_buf(),
            root,
            descriptor,
            inputs,
            identities,
            jobs: global.build.jobs.max(1) as usize,
        })
    }

    /// The descriptor's directory name, for status lines.
    pub fn display_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.descriptor_path.display().to_string())
    }
}
