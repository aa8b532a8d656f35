mod common;

use common::{ids, MockHost};
use rhc_features::models::FeaturePreferences;
use rhc_features::reconcile::FeatureChange;
use rhc_features::{reconcile, validate, Catalog, FeatureError};
use speculate2::speculate;

fn validated(enabled: &[&str], disabled: &[&str]) -> Catalog {
    let mut catalog = Catalog::standard().expect("Failed to build catalog");
    validate(&mut catalog, &ids(enabled), &ids(disabled)).expect("Validation failed");
    catalog
}

speculate! {
    describe "registered host" {
        it "enables missing features in catalog order" {
            let catalog = validated(&[], &[]);
            let host = MockHost::registered(false, false, false);
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(report.registered);
            assert!(report.is_success());
            assert_eq!(
                host.calls(),
                vec!["enable-content", "register-analytics", "activate-remote-management"]
            );
            assert!(report.features.iter().all(|o| o.change == FeatureChange::Enabled));
            assert!(prefs.is_empty(), "live transitions must not touch preferences");
        }

        it "disables dependents before their requirements" {
            let catalog = validated(&[], &["content"]);
            let host = MockHost::registered(true, true, true);
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(report.is_success());
            assert_eq!(
                host.calls(),
                vec!["deactivate-remote-management", "unregister-analytics", "disable-content"]
            );
            assert!(!host.content.get());
            assert!(!host.analytics.get());
            assert!(!host.remote_management.get());
        }

        it "runs disables before enables" {
            let catalog = validated(&["content"], &["analytics"]);
            let host = MockHost::registered(false, true, false);
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert_eq!(host.calls(), vec!["unregister-analytics", "enable-content"]);
            assert_eq!(report.get("remote-management").unwrap().change, FeatureChange::Unchanged);
            assert_eq!(
                report.get("remote-management").unwrap().reason,
                "required feature \"analytics\" is disabled"
            );
        }

        it "leaves features already in their desired state alone" {
            let catalog = validated(&[], &["remote-management"]);
            let host = MockHost::registered(true, true, false);
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(host.calls().is_empty());
            assert!(report.features.iter().all(|o| o.change == FeatureChange::Unchanged));
        }

        it "keeps going after a failed transition" {
            let catalog = validated(&[], &[]);
            let host = MockHost::registered(false, false, false).failing("register-analytics");
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(!report.is_success());
            assert_eq!(report.failures().len(), 1);
            assert!(matches!(
                report.failures()[0],
                FeatureError::Transition { ref id, .. } if id == "analytics"
            ));
            assert_eq!(
                host.calls(),
                vec!["enable-content", "register-analytics", "activate-remote-management"]
            );

            let analytics = report.get("analytics").unwrap();
            assert!(!analytics.is_successful());
            assert_eq!(analytics.change, FeatureChange::Unchanged);
            assert_eq!(report.get("remote-management").unwrap().change, FeatureChange::Enabled);
        }

        it "collects every failure" {
            let catalog = validated(&[], &["content"]);
            let host = MockHost::registered(true, true, true)
                .failing("disable-content")
                .failing("deactivate-remote-management");
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            let failed: Vec<_> = report
                .features
                .iter()
                .filter(|o| !o.is_successful())
                .map(|o| o.id.as_str())
                .collect();
            assert_eq!(failed, vec!["content", "remote-management"]);
            assert_eq!(report.failures().len(), 2);
            assert_eq!(
                report.failures()[0].to_string(),
                "failed to disable remote-management: deactivate-remote-management failed: simulated failure"
            );
        }

        it "re-asserts the desired state when a probe fails" {
            let catalog = validated(&[], &[]);
            let host = MockHost::registered(true, true, true).failing("probe-content");
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(report.is_success());
            assert_eq!(host.calls(), vec!["enable-content"]);
        }
    }

    describe "unregistered host" {
        it "records transitions as preferences" {
            let catalog = validated(&[], &["analytics"]);
            let host = MockHost::unregistered();
            let mut prefs = FeaturePreferences::default();

            let report = reconcile(&catalog, &host, &mut prefs);

            assert!(!report.registered);
            assert!(host.calls().is_empty());
            assert_eq!(prefs.content, Some(true));
            assert_eq!(prefs.analytics, Some(false));
            assert_eq!(prefs.remote_management, Some(false));
        }

        it "does nothing when preferences already match" {
            let catalog = validated(&[], &["remote-management"]);
            let host = MockHost::unregistered();
            let mut prefs = FeaturePreferences {
                content: Some(true),
                analytics: Some(true),
                remote_management: Some(false),
            };
            let before = prefs;

            let report = reconcile(&catalog, &host, &mut prefs);

            assert_eq!(prefs, before);
            assert!(report.features.iter().all(|o| o.change == FeatureChange::Unchanged));
        }

        it "flips a stale preference" {
            let catalog = validated(&["content", "analytics", "remote-management"], &[]);
            let host = MockHost::unregistered();
            let mut prefs = FeaturePreferences {
                content: Some(true),
                analytics: Some(true),
                remote_management: Some(false),
            };

            let report = reconcile(&catalog, &host, &mut prefs);

            assert_eq!(prefs.remote_management, Some(true));
            assert_eq!(report.get("remote-management").unwrap().change, FeatureChange::Enabled);
            assert_eq!(report.get("content").unwrap().change, FeatureChange::Unchanged);
        }
    }
}
