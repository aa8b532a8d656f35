//! Text rendering for feature listings and reconciliation reports.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::models::FeaturePreferences;
use crate::reconcile::{current_state, FeatureChange, ReconcileReport};
use crate::system::HostSystem;

const ENABLED: char = '●';
const DISABLED: char = '○';
const UNKNOWN: char = '-';

/// Observed state of one feature.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureStatus {
    pub id: String,
    pub description: String,
    /// Live state when registered, stored preference otherwise.
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureListing {
    pub registered: bool,
    pub features: Vec<FeatureStatus>,
}

impl FeatureListing {
    /// Probe every feature in the catalog.
    pub fn collect(catalog: &Catalog, host: &dyn HostSystem, prefs: &FeaturePreferences) -> Self {
        let registered = host.is_registered();
        let features = catalog
            .iter()
            .enumerate()
            .map(|(index, feature)| FeatureStatus {
                id: feature.id.clone(),
                description: feature.description.clone(),
                enabled: current_state(catalog, index, registered, host, prefs),
            })
            .collect();
        Self {
            registered,
            features,
        }
    }
}

fn state_symbol(enabled: Option<bool>) -> char {
    match enabled {
        Some(true) => ENABLED,
        Some(false) => DISABLED,
        None => UNKNOWN,
    }
}

/// Render a listing as an aligned table.
///
/// Example output for an unregistered host:
/// ```text
/// FEATURE            PREFERENCE  DESCRIPTION
/// content            ●           Get access to RHEL content
/// analytics          ○           Enable data collection for Red Hat Lightspeed
/// remote-management  -           Remote management
/// ```
pub fn render_features(listing: &FeatureListing) -> String {
    let state_header = if listing.registered { "STATE" } else { "PREFERENCE" };
    let id_width = listing
        .features
        .iter()
        .map(|status| status.id.len())
        .chain(std::iter::once("FEATURE".len()))
        .max()
        .unwrap_or_default();

    let mut output = format!(
        "{:<id_width$}  {:<state_width$}  DESCRIPTION\n",
        "FEATURE",
        state_header,
        state_width = state_header.len()
    );
    for status in &listing.features {
        output.push_str(&format!(
            "{:<id_width$}  {:<state_width$}  {}\n",
            status.id,
            state_symbol(status.enabled),
            status.description,
            state_width = state_header.len()
        ));
    }
    output
}

/// One line per feature describing what reconciliation did.
pub fn render_report(report: &ReconcileReport) -> String {
    let mut output = String::new();
    for outcome in &report.features {
        let (mark, text) = match (&outcome.error, outcome.change) {
            (Some(error), _) => ('✗', error.clone()),
            (None, FeatureChange::Enabled) => ('✓', "enabled".to_string()),
            (None, FeatureChange::Disabled) => (' ', "disabled".to_string()),
            (None, FeatureChange::Unchanged) if outcome.desired => ('✓', "already enabled".to_string()),
            (None, FeatureChange::Unchanged) => (' ', "already disabled".to_string()),
        };
        output.push_str(&format!("[{}] {} ... {}", mark, outcome.id, text));
        if !outcome.reason.is_empty() {
            output.push_str(&format!(" ({})", outcome.reason));
        }
        output.push('\n');
    }
    if !report.registered {
        output.push_str("System not registered: changes recorded as preferences\n");
    }
    output
}
