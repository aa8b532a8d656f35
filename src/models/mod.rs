//! Domain models for feature reconciliation.
//!
//! # Core Concepts
//!
//! - [`Feature`]: One optional capability of the host, with its requirements
//!   expressed as indices into the catalog it belongs to.
//! - [`FeaturePreferences`]: Tri-state (unset/true/false) preference per known
//!   feature, as stored in the preference file.
//! - [`Selection`]: The enabled/disabled ID lists produced by consolidating
//!   preferences with command-line overrides.

mod feature;
mod preferences;

pub use feature::*;
pub use preferences::*;
