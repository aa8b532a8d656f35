//! Merging stored preferences with command-line overrides.

use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::error::{FeatureError, Result};
use crate::models::{FeatureAction, FeaturePreferences, Selection};

/// Combine preferences with the IDs enabled and disabled on the command line.
///
/// Unset preferences count as enabled. Command-line IDs are applied after the
/// preferences, disabled ones last, so they always win. IDs are not checked
/// against the catalog here; validation rejects unknown ones.
pub fn consolidate(
    prefs: Option<&FeaturePreferences>,
    enabled_ids: &[String],
    disabled_ids: &[String],
) -> Result<Selection> {
    let Some(prefs) = prefs else {
        return Err(FeatureError::Config("config is nil".to_string()));
    };

    let mut states: BTreeMap<&str, bool> = prefs
        .entries()
        .into_iter()
        .map(|(id, value)| (id, value.unwrap_or(true)))
        .collect();

    for id in enabled_ids {
        states.insert(id, true);
    }
    for id in disabled_ids {
        states.insert(id, false);
    }

    let mut selection = Selection::default();
    for (id, enabled) in states {
        if enabled {
            selection.enabled.push(id.to_string());
        } else {
            selection.disabled.push(id.to_string());
        }
    }

    tracing::debug!(
        "features enabled using configuration & CLI: {:?}, disabled: {:?}",
        selection.enabled,
        selection.disabled
    );
    Ok(selection)
}

/// `ids` plus everything they transitively require, in catalog order.
pub fn with_requirements(catalog: &Catalog, ids: &[String]) -> Result<Vec<String>> {
    let mut marked = vec![false; catalog.len()];
    for id in ids {
        marked[catalog.resolve(id, FeatureAction::Enable)?] = true;
    }

    // Requirements always sit before their dependents, so walking backwards
    // visits every dependent before the features it pulls in.
    for index in (0..catalog.len()).rev() {
        if !marked[index] {
            continue;
        }
        for &required in &catalog.feature(index).requires {
            if !marked[required] {
                tracing::info!(
                    "Enabling '{}' (required by '{}')",
                    catalog.feature(required).id,
                    catalog.feature(index).id
                );
                marked[required] = true;
            }
        }
    }

    Ok(collect_marked(catalog, &marked))
}

/// `ids` plus every feature that transitively depends on them, in catalog
/// order.
pub fn with_dependents(catalog: &Catalog, ids: &[String]) -> Result<Vec<String>> {
    let mut marked = vec![false; catalog.len()];
    for id in ids {
        marked[catalog.resolve(id, FeatureAction::Disable)?] = true;
    }

    for index in 0..catalog.len() {
        if marked[index] {
            continue;
        }
        if let Some(&required) = catalog
            .feature(index)
            .requires
            .iter()
            .find(|&&required| marked[required])
        {
            tracing::info!(
                "Disabling '{}' (depends on '{}')",
                catalog.feature(index).id,
                catalog.feature(required).id
            );
            marked[index] = true;
        }
    }

    Ok(collect_marked(catalog, &marked))
}

fn collect_marked(catalog: &Catalog, marked: &[bool]) -> Vec<String> {
    catalog
        .iter()
        .zip(marked)
        .filter(|(_, marked)| **marked)
        .map(|(feature, _)| feature.id.clone())
        .collect()
}
