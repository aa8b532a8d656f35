//! Error types for feature reconciliation.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::FeatureAction;

/// Errors raised while loading preferences, validating a selection, or
/// transitioning a feature.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("cannot access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot {action} feature \"{id}\": no such feature exists ({known})")]
    UnknownFeature {
        action: FeatureAction,
        id: String,
        known: String,
    },

    #[error("cannot enable feature \"{id}\": feature \"{id}\" explicitly disabled")]
    Conflict { id: String },

    #[error("cannot enable feature \"{id}\": required feature \"{required}\" explicitly disabled")]
    Dependency { id: String, required: String },

    #[error("failed to consolidate selected features: {0}")]
    Config(String),

    #[error("failed to {action} {id}: {source}")]
    Transition {
        id: String,
        action: FeatureAction,
        #[source]
        source: SubsystemError,
    },

    #[error("invalid feature catalog: {0}")]
    Catalog(String),
}

impl FeatureError {
    /// True for errors caused by the user's feature selection.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownFeature { .. } | Self::Conflict { .. } | Self::Dependency { .. }
        )
    }
}

/// Failures reported by the subsystems a feature delegates to.
#[derive(Debug, Error)]
pub enum SubsystemError {
    #[error("cannot execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = FeatureError> = std::result::Result<T, E>;
