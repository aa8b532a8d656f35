//! Validation of a feature selection and cascade of forced disablement.

use crate::catalog::Catalog;
use crate::error::{FeatureError, Result};
use crate::models::{FeatureAction, Selection};

/// Check the selection against the catalog and resolve every feature's
/// desired state in place.
///
/// Explicit requests are validated strictly and fail fast:
/// 1. every disabled ID must exist, and is marked unwanted;
/// 2. every enabled ID must exist, must not also be disabled, and must not
///    require an explicitly disabled feature.
///
/// Then, walking the catalog once in order, any feature with an unwanted
/// requirement is forced off and given a reason. This never fails.
pub fn validate(catalog: &mut Catalog, enabled_ids: &[String], disabled_ids: &[String]) -> Result<()> {
    check_selection(catalog, enabled_ids, disabled_ids)?;
    settle(
        catalog,
        &Selection {
            enabled: enabled_ids.to_vec(),
            disabled: disabled_ids.to_vec(),
        },
    )
}

/// The strict half of [`validate`]: reject unknown, conflicting and
/// dependency-violating requests without touching the catalog.
pub fn check_selection(catalog: &Catalog, enabled_ids: &[String], disabled_ids: &[String]) -> Result<()> {
    for id in disabled_ids {
        catalog.resolve(id, FeatureAction::Disable)?;
    }

    for id in enabled_ids {
        let index = catalog.resolve(id, FeatureAction::Enable)?;

        if disabled_ids.contains(id) {
            return Err(FeatureError::Conflict { id: id.clone() });
        }
        if let Some(required) = catalog
            .requirement_ids(index)
            .find(|required| disabled_ids.iter().any(|disabled| disabled == required))
        {
            return Err(FeatureError::Dependency {
                id: id.clone(),
                required: required.to_string(),
            });
        }
    }
    Ok(())
}

/// Mark the selection on the catalog and cascade, without judging it.
///
/// Used for states that come from stored preferences: a wanted feature whose
/// requirement is unwanted is forced off rather than rejected. IDs must
/// still exist.
pub fn settle(catalog: &mut Catalog, selection: &Selection) -> Result<()> {
    for feature_index in 0..catalog.len() {
        catalog.feature_mut(feature_index).reason.clear();
    }

    for id in &selection.disabled {
        let index = catalog.resolve(id, FeatureAction::Disable)?;
        catalog.feature_mut(index).want_enabled = false;
    }
    for id in &selection.enabled {
        if selection.disabled.contains(id) {
            continue;
        }
        let index = catalog.resolve(id, FeatureAction::Enable)?;
        catalog.feature_mut(index).want_enabled = true;
    }

    cascade(catalog);
    Ok(())
}

/// Force off every feature whose requirements are not all wanted.
///
/// Catalog order puts requirements first, so one pass settles the whole
/// graph.
fn cascade(catalog: &mut Catalog) {
    for index in 0..catalog.len() {
        let unmet = catalog
            .feature(index)
            .requires
            .iter()
            .find(|&&required| !catalog.feature(required).want_enabled)
            .map(|&required| catalog.feature(required).id.clone());

        if let Some(required) = unmet {
            let feature = catalog.feature_mut(index);
            tracing::debug!(
                "feature '{}' disabled: required feature '{}' is disabled",
                feature.id,
                required
            );
            feature.want_enabled = false;
            feature.reason = format!("required feature \"{required}\" is disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContentFeature;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    /// a <- b, and c <- d with no link between the two chains.
    fn forest() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .push("a", "A", &[], ContentFeature)
            .unwrap()
            .push("c", "C", &[], ContentFeature)
            .unwrap()
            .push("b", "B", &["a"], ContentFeature)
            .unwrap()
            .push("d", "D", &["c"], ContentFeature)
            .unwrap();
        catalog
    }

    #[test]
    fn cascade_does_not_assume_a_chain() {
        let mut catalog = forest();
        validate(&mut catalog, &[], &ids(&["a"])).unwrap();

        assert!(!catalog.get("b").unwrap().want_enabled);
        assert_eq!(catalog.get("b").unwrap().reason, "required feature \"a\" is disabled");
        assert!(catalog.get("c").unwrap().want_enabled);
        assert!(catalog.get("d").unwrap().want_enabled);
    }

    #[test]
    fn reason_names_first_unmet_requirement() {
        let mut catalog = Catalog::standard().unwrap();
        validate(&mut catalog, &[], &ids(&["content", "analytics"])).unwrap();

        let management = catalog.get("remote-management").unwrap();
        assert_eq!(management.reason, "required feature \"content\" is disabled");
    }

    #[test]
    fn reasons_from_a_previous_pass_are_cleared() {
        let mut catalog = Catalog::standard().unwrap();
        validate(&mut catalog, &[], &ids(&["content"])).unwrap();
        catalog.reset();
        validate(&mut catalog, &ids(&["content"]), &[]).unwrap();

        assert!(catalog.iter().all(|feature| feature.reason.is_empty()));
        assert!(catalog.iter().all(|feature| feature.want_enabled));
    }

    #[test]
    fn conflict_is_reported_before_dependency() {
        let mut catalog = Catalog::standard().unwrap();
        let err = validate(
            &mut catalog,
            &ids(&["remote-management"]),
            &ids(&["content", "remote-management"]),
        )
        .unwrap_err();
        assert!(matches!(err, FeatureError::Conflict { ref id } if id == "remote-management"));
    }

    #[test]
    fn rejected_selection_leaves_catalog_untouched() {
        let mut catalog = Catalog::standard().unwrap();
        validate(&mut catalog, &ids(&["analytics"]), &ids(&["content"])).unwrap_err();

        assert!(catalog.iter().all(|feature| feature.want_enabled));
    }

    #[test]
    fn settle_cascades_instead_of_rejecting() {
        let mut catalog = Catalog::standard().unwrap();
        let selection = Selection {
            enabled: ids(&["analytics", "remote-management"]),
            disabled: ids(&["content"]),
        };
        settle(&mut catalog, &selection).unwrap();

        assert!(!catalog.get("content").unwrap().want_enabled);
        let analytics = catalog.get("analytics").unwrap();
        assert!(!analytics.want_enabled);
        assert_eq!(analytics.reason, "required feature \"content\" is disabled");
        assert!(!catalog.get("remote-management").unwrap().want_enabled);
    }

    #[test]
    fn settle_still_rejects_unknown_ids() {
        let mut catalog = Catalog::standard().unwrap();
        let selection = Selection {
            enabled: ids(&["bogus"]),
            disabled: Vec::new(),
        };
        assert!(matches!(
            settle(&mut catalog, &selection),
            Err(FeatureError::UnknownFeature { .. })
        ));
    }
}
