use std::fmt;

use serde::{Deserialize, Serialize};

/// An optional, independently toggleable capability of the host.
///
/// A feature never owns its requirements: `requires` holds indices of earlier
/// entries in the catalog, so the catalog can be reset or serialized without
/// chasing references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feature {
    /// Stable lowercase identifier, used for CLI flags and preference keys.
    pub id: String,
    pub description: String,
    /// Catalog indices of required features. Always smaller than this
    /// feature's own index.
    pub requires: Vec<usize>,
    /// Resolved desired state. Only the validator mutates this.
    pub want_enabled: bool,
    /// Why `want_enabled` was forced off by a disabled requirement.
    /// Empty for explicit disablement.
    pub reason: String,
}

impl Feature {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            requires: Vec::new(),
            want_enabled: true,
            reason: String::new(),
        }
    }

    /// Restore the baseline desired state.
    pub fn reset(&mut self) {
        self.want_enabled = true;
        self.reason.clear();
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Feature{{ID:{}}}", self.id)
    }
}

/// Direction of a feature transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureAction {
    Enable,
    Disable,
}

impl FeatureAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// The action that moves a feature into the given desired state.
    pub fn towards(enabled: bool) -> Self {
        if enabled {
            Self::Enable
        } else {
            Self::Disable
        }
    }
}

impl fmt::Display for FeatureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consolidated desired state, split into enabled and disabled IDs.
///
/// Order within each list carries no meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}
