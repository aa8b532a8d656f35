//! One CLI invocation's worth of state: a fresh catalog, the merged
//! preferences, and the host they are reconciled against.

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::consolidate::{consolidate, with_dependents, with_requirements};
use crate::error::Result;
use crate::models::FeaturePreferences;
use crate::prefs;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::render::FeatureListing;
use crate::system::HostSystem;
use crate::validate::{check_selection, settle};

pub struct Session<'h> {
    catalog: Catalog,
    host: &'h dyn HostSystem,
    prefs: FeaturePreferences,
    prefs_path: PathBuf,
}

impl<'h> Session<'h> {
    /// Build the catalog and load preferences: the configuration file's
    /// `features` table first, then the preference file on top.
    pub fn open(config: &Config, prefs_path: &Path, host: &'h dyn HostSystem) -> Result<Self> {
        let catalog = Catalog::standard()?;

        let mut merged = config.features;
        if let Some(stored) = prefs::load(prefs_path)? {
            merged.overlay(&stored);
        }

        Ok(Self {
            catalog,
            host,
            prefs: merged,
            prefs_path: prefs_path.to_path_buf(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn preferences(&self) -> &FeaturePreferences {
        &self.prefs
    }

    pub fn listing(&self) -> FeatureListing {
        FeatureListing::collect(&self.catalog, self.host, &self.prefs)
    }

    /// Run the whole pipeline with explicit overrides.
    ///
    /// Only the overrides are held to the strict checks. States that come
    /// from stored preferences are settled leniently, so a preference-enabled
    /// feature whose requirement is off gets cascaded off instead of failing
    /// the run. When the host is not registered the resulting preferences are
    /// saved.
    pub fn apply(&mut self, enabled_ids: &[String], disabled_ids: &[String]) -> Result<ReconcileReport> {
        check_selection(&self.catalog, enabled_ids, disabled_ids)?;
        let selection = consolidate(Some(&self.prefs), enabled_ids, disabled_ids)?;

        self.catalog.reset();
        settle(&mut self.catalog, &selection)?;

        let report = reconcile(&self.catalog, self.host, &mut self.prefs);
        if !report.registered {
            prefs::save(&self.prefs_path, &self.prefs)?;
        }
        Ok(report)
    }

    /// Enable features together with everything they require.
    pub fn enable(&mut self, ids: &[String]) -> Result<ReconcileReport> {
        let enabled = with_requirements(&self.catalog, ids)?;
        self.apply(&enabled, &[])
    }

    /// Disable features together with everything that depends on them.
    pub fn disable(&mut self, ids: &[String]) -> Result<ReconcileReport> {
        let disabled = with_dependents(&self.catalog, ids)?;
        self.apply(&[], &disabled)
    }

    /// Forget stored preferences.
    pub fn reset(&mut self) -> Result<()> {
        prefs::delete(&self.prefs_path)?;
        self.prefs = FeaturePreferences::default();
        Ok(())
    }
}
