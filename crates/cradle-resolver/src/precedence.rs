//! Record of the precedence decisions a resolution pass made silently.

use std::fmt;

use cradle_core::dependency::ModuleId;
use serde::Serialize;

/// One decision where a candidate version lost without an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PrecedenceDecision {
    /// An earlier platform pinned the module, so a later platform's pin was ignored.
    PlatformShadowed {
        module: ModuleId,
        version: String,
        platform: String,
        shadowed_platform: String,
        shadowed_version: String,
    },
    /// An explicit version won over a platform pin.
    ExplicitOverride {
        module: ModuleId,
        version: String,
        platform: String,
        pinned: String,
    },
}

impl PrecedenceDecision {
    pub fn module(&self) -> &ModuleId {
        match self {
            PrecedenceDecision::PlatformShadowed { module, .. }
            | PrecedenceDecision::ExplicitOverride { module, .. } => module,
        }
    }
}

impl fmt::Display for PrecedenceDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrecedenceDecision::PlatformShadowed {
                module,
                version,
                platform,
                shadowed_platform,
                shadowed_version,
            } => write!(
                f,
                "{module}: {version} from {platform} shadows {shadowed_version} from {shadowed_platform}"
            ),
            PrecedenceDecision::ExplicitOverride {
                module,
                version,
                platform,
                pinned,
            } => write!(f, "{module}: explicit {version} overrides {pinned} pinned by {platform}"),
        }
    }
}

/// All precedence decisions of one pass, in module order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrecedenceReport {
    pub decisions: Vec<PrecedenceDecision>,
}

impl PrecedenceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decision: PrecedenceDecision) {
        self.decisions.push(decision);
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn for_module<'a>(&'a self, module: &'a ModuleId) -> impl Iterator<Item = &'a PrecedenceDecision> + 'a {
        self.decisions.iter().filter(move |d| d.module() == module)
    }
}

impl fmt::Display for PrecedenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decisions.is_empty() {
            return write!(f, "No precedence decisions.");
        }
        writeln!(f, "Precedence decisions ({}):", self.decisions.len())?;
        for decision in &self.decisions {
            writeln!(f, "  {decision}")?;
        }
        Ok(())
    }
}
