//! Bringing the host in line with the validated catalog.

use serde::Serialize;

use crate::catalog::{Catalog, TransitionTarget};
use crate::error::FeatureError;
use crate::models::{FeatureAction, FeaturePreferences};
use crate::system::HostSystem;

/// What reconciliation did to one feature.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureChange {
    Enabled,
    Disabled,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureOutcome {
    pub id: String,
    pub desired: bool,
    pub change: FeatureChange,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FeatureOutcome {
    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-feature results of one reconciliation, in catalog order.
#[derive(Debug, Default, Serialize)]
pub struct ReconcileReport {
    /// Whether transitions acted on the live system.
    pub registered: bool,
    pub features: Vec<FeatureOutcome>,
    #[serde(skip)]
    pub(crate) failures: Vec<FeatureError>,
}

impl ReconcileReport {
    /// Transition errors, in the order they happened.
    pub fn failures(&self) -> &[FeatureError] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FeatureOutcome> {
        self.features.iter().find(|outcome| outcome.id == id)
    }
}

/// Run the enable/disable action of every feature whose desired state
/// differs from its current one.
///
/// A registered host is probed and changed live. Otherwise the preference
/// record stands in for the current state and receives the transitions; the
/// caller is responsible for saving it. Features with no known current state
/// have their desired state asserted.
///
/// Disables run first, most dependent feature first, then enables in catalog
/// order. Each feature transitions at most once and a failure never stops
/// the remaining features.
pub fn reconcile(
    catalog: &Catalog,
    host: &dyn HostSystem,
    prefs: &mut FeaturePreferences,
) -> ReconcileReport {
    let registered = host.is_registered();
    tracing::debug!("reconciling features (registered: {})", registered);

    let mut report = ReconcileReport {
        registered,
        features: catalog
            .iter()
            .map(|feature| FeatureOutcome {
                id: feature.id.clone(),
                desired: feature.want_enabled,
                change: FeatureChange::Unchanged,
                reason: feature.reason.clone(),
                error: None,
            })
            .collect(),
        failures: Vec::new(),
    };

    let pending: Vec<Option<FeatureAction>> = (0..catalog.len())
        .map(|index| {
            let feature = catalog.feature(index);
            let current = current_state(catalog, index, registered, host, prefs);
            if current == Some(feature.want_enabled) {
                tracing::debug!(
                    "feature '{}' is already {}",
                    feature.id,
                    if feature.want_enabled { "enabled" } else { "disabled" }
                );
                None
            } else {
                Some(FeatureAction::towards(feature.want_enabled))
            }
        })
        .collect();

    let disables = (0..catalog.len())
        .rev()
        .filter(|&index| pending[index] == Some(FeatureAction::Disable));
    let enables = (0..catalog.len()).filter(|&index| pending[index] == Some(FeatureAction::Enable));

    for (index, action) in disables
        .map(|index| (index, FeatureAction::Disable))
        .chain(enables.map(|index| (index, FeatureAction::Enable)))
    {
        let outcome = &mut report.features[index];
        match transition(catalog, index, action, registered, host, prefs) {
            Ok(()) => {
                outcome.change = match action {
                    FeatureAction::Enable => FeatureChange::Enabled,
                    FeatureAction::Disable => FeatureChange::Disabled,
                };
            }
            Err(err) => {
                tracing::error!("{}", err);
                outcome.error = Some(err.to_string());
                report.failures.push(err);
            }
        }
    }

    report
}

pub(crate) fn current_state(
    catalog: &Catalog,
    index: usize,
    registered: bool,
    host: &dyn HostSystem,
    prefs: &FeaturePreferences,
) -> Option<bool> {
    let capability = catalog.capability(index);
    if !registered {
        return capability.probe_preference(prefs);
    }
    match capability.probe_live(host) {
        Ok(enabled) => Some(enabled),
        Err(err) => {
            tracing::warn!(
                "failed to check if '{}' feature is enabled: {}",
                catalog.feature(index).id,
                err
            );
            None
        }
    }
}

fn transition(
    catalog: &Catalog,
    index: usize,
    action: FeatureAction,
    registered: bool,
    host: &dyn HostSystem,
    prefs: &mut FeaturePreferences,
) -> Result<(), FeatureError> {
    let id = &catalog.feature(index).id;
    tracing::debug!("feature '{}' will be {}d", id, action);

    let target = if registered {
        TransitionTarget::Live(host)
    } else {
        TransitionTarget::Preferences(prefs)
    };
    let capability = catalog.capability(index);
    let result = match action {
        FeatureAction::Enable => capability.enable(target),
        FeatureAction::Disable => capability.disable(target),
    };

    result.map_err(|source| FeatureError::Transition {
        id: id.clone(),
        action,
        source,
    })
}
