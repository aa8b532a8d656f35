//! The feature catalog: an ordered list of features and their capabilities.
//!
//! Entries are stored in topological order. A feature may only require
//! features that were added before it, which rules out self-dependencies and
//! cycles at construction time. The validator relies on this order to cascade
//! disablement in a single pass.

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{FeatureError, Result, SubsystemError};
use crate::models::{Feature, FeatureAction, FeaturePreferences, ANALYTICS, CONTENT, REMOTE_MANAGEMENT};
use crate::system::HostSystem;

/// Where a transition takes effect.
pub enum TransitionTarget<'a> {
    /// The host is registered: change the live subsystem.
    Live(&'a dyn HostSystem),
    /// The host is not registered: record the preference only.
    Preferences(&'a mut FeaturePreferences),
}

/// Per-feature behavior: how to observe it and how to toggle it.
pub trait FeatureCapability: Send + Sync {
    /// Is the feature active on the host right now?
    fn probe_live(&self, host: &dyn HostSystem) -> Result<bool, SubsystemError>;

    /// Stored preference for the feature, `None` when unset.
    fn probe_preference(&self, prefs: &FeaturePreferences) -> Option<bool>;

    fn enable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError>;

    fn disable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError>;
}

/// Access to package repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFeature;

impl FeatureCapability for ContentFeature {
    fn probe_live(&self, host: &dyn HostSystem) -> Result<bool, SubsystemError> {
        host.content_enabled()
    }

    fn probe_preference(&self, prefs: &FeaturePreferences) -> Option<bool> {
        prefs.content
    }

    fn enable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.set_content_enabled(true),
            TransitionTarget::Preferences(prefs) => {
                prefs.content = Some(true);
                Ok(())
            }
        }
    }

    fn disable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.set_content_enabled(false),
            TransitionTarget::Preferences(prefs) => {
                prefs.content = Some(false);
                Ok(())
            }
        }
    }
}

/// Data collection through the analytics client.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsFeature;

impl FeatureCapability for AnalyticsFeature {
    fn probe_live(&self, host: &dyn HostSystem) -> Result<bool, SubsystemError> {
        host.analytics_registered()
    }

    fn probe_preference(&self, prefs: &FeaturePreferences) -> Option<bool> {
        prefs.analytics
    }

    fn enable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.register_analytics(),
            TransitionTarget::Preferences(prefs) => {
                prefs.analytics = Some(true);
                Ok(())
            }
        }
    }

    fn disable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.unregister_analytics(),
            TransitionTarget::Preferences(prefs) => {
                prefs.analytics = Some(false);
                Ok(())
            }
        }
    }
}

/// Remote management through the yggdrasil service and its workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteManagementFeature;

impl FeatureCapability for RemoteManagementFeature {
    fn probe_live(&self, host: &dyn HostSystem) -> Result<bool, SubsystemError> {
        host.remote_management_active()
    }

    fn probe_preference(&self, prefs: &FeaturePreferences) -> Option<bool> {
        prefs.remote_management
    }

    fn enable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.activate_remote_management(),
            TransitionTarget::Preferences(prefs) => {
                prefs.remote_management = Some(true);
                Ok(())
            }
        }
    }

    fn disable(&self, target: TransitionTarget<'_>) -> Result<(), SubsystemError> {
        match target {
            TransitionTarget::Live(host) => host.deactivate_remote_management(),
            TransitionTarget::Preferences(prefs) => {
                prefs.remote_management = Some(false);
                Ok(())
            }
        }
    }
}

struct Entry {
    feature: Feature,
    capability: Box<dyn FeatureCapability>,
}

/// Ordered set of features, from least to most dependent.
#[derive(Default)]
pub struct Catalog {
    entries: Vec<Entry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of features this tool manages.
    pub fn standard() -> Result<Self> {
        let mut catalog = Self::new();
        catalog
            .push(CONTENT, "Get access to RHEL content", &[], ContentFeature)?
            .push(
                ANALYTICS,
                "Enable data collection for Red Hat Lightspeed",
                &[CONTENT],
                AnalyticsFeature,
            )?
            .push(
                REMOTE_MANAGEMENT,
                "Remote management",
                &[CONTENT, ANALYTICS],
                RemoteManagementFeature,
            )?;
        Ok(catalog)
    }

    /// Append a feature. Every ID in `requires` must already be in the
    /// catalog.
    pub fn push(
        &mut self,
        id: &str,
        description: &str,
        requires: &[&str],
        capability: impl FeatureCapability + 'static,
    ) -> Result<&mut Self> {
        if self.find(id).is_some() {
            return Err(FeatureError::Catalog(format!("duplicate feature \"{id}\"")));
        }

        let mut feature = Feature::new(id, description);
        for required in requires {
            let Some(index) = self.find(required) else {
                return Err(FeatureError::Catalog(format!(
                    "feature \"{id}\" requires \"{required}\", which is not listed before it"
                )));
            };
            if !feature.requires.contains(&index) {
                feature.requires.push(index);
            }
        }

        self.entries.push(Entry {
            feature,
            capability: Box::new(capability),
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Features in catalog (topological) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Feature> + '_ {
        self.entries.iter().map(|entry| &entry.feature)
    }

    pub fn find(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.feature.id == id)
    }

    /// Index of `id`, or an error listing every known ID.
    pub fn resolve(&self, id: &str, action: FeatureAction) -> Result<usize> {
        self.find(id).ok_or_else(|| FeatureError::UnknownFeature {
            action,
            id: id.to_string(),
            known: self.known_ids_hint(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.find(id).map(|index| &self.entries[index].feature)
    }

    pub fn feature(&self, index: usize) -> &Feature {
        &self.entries[index].feature
    }

    pub(crate) fn feature_mut(&mut self, index: usize) -> &mut Feature {
        &mut self.entries[index].feature
    }

    pub fn capability(&self, index: usize) -> &dyn FeatureCapability {
        self.entries[index].capability.as_ref()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|feature| feature.id.as_str()).collect()
    }

    /// Comma-separated list of known IDs, used in error hints.
    pub fn known_ids_hint(&self) -> String {
        self.ids().join(",")
    }

    /// IDs of the features required by the feature at `index`.
    pub fn requirement_ids(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.entries[index]
            .feature
            .requires
            .iter()
            .map(|&required| self.entries[required].feature.id.as_str())
    }

    /// Indices of features that directly require the feature at `index`.
    pub fn dependents(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(move |(_, entry)| entry.feature.requires.contains(&index))
            .map(|(dependent, _)| dependent)
    }

    /// Return every feature to its baseline: wanted, with no reason.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.feature.reset();
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A catalog shared between callers in a long-lived process.
///
/// Each [`SharedCatalog::run`] call holds the lock for a whole pass, so no
/// caller can observe a partially cascaded catalog.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<Mutex<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Mutex::new(catalog)),
        }
    }

    /// Reset the catalog to its baseline, then run `pass` on it under the
    /// lock.
    pub fn run<R>(&self, pass: impl FnOnce(&mut Catalog) -> R) -> R {
        // The reset below discards whatever a panicking pass left behind.
        let mut catalog = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        catalog.reset();
        pass(&mut catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_is_ordered_by_dependency() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.ids(), vec!["content", "analytics", "remote-management"]);
        for (index, feature) in catalog.iter().enumerate() {
            assert!(feature.requires.iter().all(|&required| required < index));
            assert!(feature.want_enabled);
            assert!(feature.reason.is_empty());
        }
    }

    #[test]
    fn forward_requirement_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.push("a", "A", &[], ContentFeature).unwrap();
        let err = catalog.push("b", "B", &["c"], ContentFeature).unwrap_err();
        assert!(matches!(err, FeatureError::Catalog(_)));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn self_requirement_is_rejected() {
        let mut catalog = Catalog::new();
        let err = catalog.push("a", "A", &["a"], ContentFeature).unwrap_err();
        assert!(err.to_string().contains("not listed before it"));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut catalog = Catalog::new();
        catalog.push("a", "A", &[], ContentFeature).unwrap();
        assert!(catalog.push("a", "again", &[], ContentFeature).is_err());
    }

    #[test]
    fn dependents_follow_requirements() {
        let catalog = Catalog::standard().unwrap();
        let content = catalog.find("content").unwrap();
        let dependents: Vec<_> = catalog
            .dependents(content)
            .map(|index| catalog.feature(index).id.as_str())
            .collect();
        assert_eq!(dependents, vec!["analytics", "remote-management"]);

        let management = catalog.find("remote-management").unwrap();
        let required: Vec<_> = catalog.requirement_ids(management).collect();
        assert_eq!(required, vec!["content", "analytics"]);
    }

    #[test]
    fn preference_transitions_write_the_record() {
        let mut prefs = FeaturePreferences::default();
        RemoteManagementFeature
            .disable(TransitionTarget::Preferences(&mut prefs))
            .unwrap();
        AnalyticsFeature
            .enable(TransitionTarget::Preferences(&mut prefs))
            .unwrap();

        assert_eq!(RemoteManagementFeature.probe_preference(&prefs), Some(false));
        assert_eq!(AnalyticsFeature.probe_preference(&prefs), Some(true));
        assert_eq!(ContentFeature.probe_preference(&prefs), None);
    }

    #[test]
    fn shared_catalog_resets_between_passes() {
        let shared = SharedCatalog::new(Catalog::standard().unwrap());
        shared.run(|catalog| {
            let index = catalog.find("content").unwrap();
            catalog.feature_mut(index).want_enabled = false;
        });
        let wanted = shared.run(|catalog| catalog.iter().all(|feature| feature.want_enabled));
        assert!(wanted);
    }
}
