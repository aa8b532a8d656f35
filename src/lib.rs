//! Feature-dependency reconciliation for host connection tooling.
//!
//! Decides which optional features of a host end up enabled from stored
//! preferences, command-line overrides and the live state of the system,
//! then drives each feature's transition once:
//!
//! preferences + overrides → consolidate → validate/cascade → reconcile

pub mod catalog;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod models;
pub mod prefs;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod system;
pub mod validate;

pub use catalog::{Catalog, FeatureCapability, SharedCatalog, TransitionTarget};
pub use consolidate::consolidate;
pub use error::{FeatureError, SubsystemError};
pub use reconcile::{reconcile, ReconcileReport};
pub use session::Session;
pub use validate::validate;
