// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for record reconciliation.

#[cfg(test)]
mod tests {
    use crate::errors::{ReconcileError, StoreError};
    use crate::reconciler::*;
    use crate::record::{
        AliasTarget, DesiredRecord, ObservedRecord, RecordData, RecordSet, RecordType,
    };
    use crate::resolver::{DisabledProbe, ProbeResult, RecordProbe};
    use crate::store::{InMemoryZoneStore, StoreCall, Zone, ZoneStore};

    struct LiveDns(Vec<String>);

    impl RecordProbe for LiveDns {
        fn probe(&self, _name: &str, _record_type: RecordType) -> ProbeResult {
            ProbeResult::Found(self.0.clone())
        }
    }

    /// Store where another writer removes the record just before our delete
    struct VanishingRecord<'a>(&'a InMemoryZoneStore);

    impl ZoneStore for VanishingRecord<'_> {
        fn list_zones(&self) -> Result<Vec<Zone>, StoreError> {
            self.0.list_zones()
        }

        fn get_zone(&self, id: &str) -> Result<Zone, StoreError> {
            self.0.get_zone(id)
        }

        fn get_record(
            &self,
            zone: &Zone,
            name: &str,
            record_type: RecordType,
        ) -> Result<Option<ObservedRecord>, StoreError> {
            self.0.get_record(zone, name, record_type)
        }

        fn create_record(&self, zone: &Zone, record: &RecordSet) -> Result<(), StoreError> {
            self.0.create_record(zone, record)
        }

        fn delete_record(
            &self,
            zone: &Zone,
            name: &str,
            record_type: RecordType,
        ) -> Result<(), StoreError> {
            let _ = self.0.delete_record(zone, name, record_type);
            Err(StoreError::RecordNotFound {
                name: name.to_string(),
                record_type,
            })
        }
    }

    fn store() -> InMemoryZoneStore {
        InMemoryZoneStore::new().with_zone("Z1", "example.com.")
    }

    fn foo(values: &[&str]) -> DesiredRecord {
        DesiredRecord::with_values(
            "foo.example.com",
            RecordType::A,
            values.iter().map(ToString::to_string).collect(),
            300,
        )
    }

    fn foo_set(values: &[&str], ttl: u32) -> RecordSet {
        RecordSet {
            name: "foo.example.com.".to_string(),
            record_type: RecordType::A,
            data: RecordData::Values {
                values: values.iter().map(ToString::to_string).collect(),
                ttl,
            },
        }
    }

    // ========== Decisions ==========

    #[test]
    fn test_decide() {
        let desired = foo(&["1.2.3.4"]);
        assert_eq!(decide(&desired, None), ReconciliationDecision::Create);
        assert_eq!(
            decide(&desired, Some(&foo_set(&["1.2.3.4"], 300))),
            ReconciliationDecision::NoOp
        );
        assert_eq!(
            decide(&desired, Some(&foo_set(&["5.6.7.8"], 300))),
            ReconciliationDecision::ReplaceThenCreate
        );
        assert_eq!(
            decide(&desired.overwrite(false), Some(&foo_set(&["5.6.7.8"], 300))),
            ReconciliationDecision::SkipOverwriteProtected
        );
    }

    #[test]
    fn test_decide_delete() {
        assert_eq!(decide_delete(None), ReconciliationDecision::NoOp);
        assert_eq!(
            decide_delete(Some(&foo_set(&["1.2.3.4"], 300))),
            ReconciliationDecision::Delete
        );
    }

    // ========== Create ==========

    #[test]
    fn test_create_when_absent() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);
        let ctx = reconciler.load(foo(&["1.2.3.4"]));

        let outcome = reconciler.create(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::Created {
                record: foo_set(&["1.2.3.4"], 300)
            }
        );
        assert!(outcome.changed());
        assert_eq!(
            store.mutations(),
            vec![StoreCall::Create(foo_set(&["1.2.3.4"], 300))]
        );
    }

    #[test]
    fn test_create_noop_when_identical() {
        let store = store().with_record("Z1", foo_set(&["1.2.3.4"], 300));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let outcome = reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();

        assert!(matches!(
            outcome,
            Outcome::NoOp {
                reason: NoOpReason::UpToDate,
                ..
            }
        ));
        assert!(!outcome.changed());
        assert!(store.mutations().is_empty());
    }

    #[test]
    fn test_create_skips_protected_record() {
        let store = store().with_record("Z1", foo_set(&["5.6.7.8"], 300));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let ctx = reconciler.load(foo(&["1.2.3.4"]).overwrite(false));
        let outcome = reconciler.create(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::SkippedProtected {
                name: "foo.example.com.".to_string(),
                record_type: RecordType::A,
                current: foo_set(&["5.6.7.8"], 300).data,
                desired: foo_set(&["1.2.3.4"], 300).data,
            }
        );
        assert!(store.mutations().is_empty());
        assert_eq!(
            store.record("Z1", "foo.example.com.", RecordType::A),
            Some(foo_set(&["5.6.7.8"], 300))
        );
    }

    #[test]
    fn test_create_replaces_divergent_record() {
        let store = store().with_record("Z1", foo_set(&["5.6.7.8"], 300));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let outcome = reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();

        assert_eq!(
            outcome,
            Outcome::Replaced {
                previous: foo_set(&["5.6.7.8"], 300),
                record: foo_set(&["1.2.3.4"], 300),
            }
        );
        assert_eq!(
            store.mutations(),
            vec![
                StoreCall::Delete {
                    name: "foo.example.com.".to_string(),
                    record_type: RecordType::A,
                },
                StoreCall::Create(foo_set(&["1.2.3.4"], 300)),
            ]
        );
    }

    #[test]
    fn test_ttl_change_replaces() {
        let store = store().with_record("Z1", foo_set(&["1.2.3.4"], 60));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let outcome = reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();
        assert!(matches!(outcome, Outcome::Replaced { .. }));
    }

    #[test]
    fn test_live_dns_match_skips_provider() {
        let store = store();
        let reconciler = Reconciler::new(&store, LiveDns(vec!["1.2.3.4".to_string()]));

        let ctx = reconciler.load(foo(&["1.2.3.4"]));
        assert!(ctx.exists());
        let outcome = reconciler.create(&ctx).unwrap();

        assert!(matches!(
            outcome,
            Outcome::NoOp {
                reason: NoOpReason::AlreadyLive,
                ..
            }
        ));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_live_dns_mismatch_falls_through_to_provider() {
        let store = store();
        let reconciler = Reconciler::new(&store, LiveDns(vec!["9.9.9.9".to_string()]));

        let outcome = reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();
        assert!(matches!(outcome, Outcome::Created { .. }));
    }

    #[test]
    fn test_repeated_runs_converge() {
        let alias = AliasTarget {
            dns_name: "lb.example.net".to_string(),
            evaluate_health: true,
            hosted_zone_id: "Z35SXDOTRQ7X7K".to_string(),
        };
        let records = vec![
            foo(&["1.2.3.4", "1.2.3.5"]),
            DesiredRecord::with_values(
                "example.com",
                RecordType::MX,
                vec!["10 mail.example.com.".to_string()],
                3600,
            ),
            DesiredRecord::with_alias("www.example.com", RecordType::A, alias),
        ];

        for desired in records {
            let store = store().with_record("Z1", foo_set(&["5.6.7.8"], 300));
            let reconciler = Reconciler::new(&store, DisabledProbe);

            let first = reconciler.create(&reconciler.load(desired.clone())).unwrap();
            assert!(first.changed(), "{first:?}");

            let second = reconciler.create(&reconciler.load(desired.clone())).unwrap();
            assert!(
                matches!(second, Outcome::NoOp { .. }),
                "{}: {second:?}",
                desired.name
            );
        }
    }

    #[test]
    fn test_zone_lookup_memoized_within_run() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);
        let ctx = reconciler.load(foo(&["1.2.3.4"]));

        reconciler.create(&ctx).unwrap();
        reconciler.create(&ctx).unwrap();

        let listings = store
            .calls()
            .into_iter()
            .filter(|c| *c == StoreCall::ListZones)
            .count();
        assert_eq!(listings, 1);
    }

    #[test]
    fn test_explicit_zone_qualifies_name() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);
        let desired = DesiredRecord::with_values(
            "foo",
            RecordType::A,
            vec!["1.2.3.4".to_string()],
            300,
        )
        .in_zone("Z1");

        let outcome = reconciler.create(&reconciler.load(desired)).unwrap();

        assert_eq!(
            outcome,
            Outcome::Created {
                record: foo_set(&["1.2.3.4"], 300)
            }
        );
    }

    // ========== Failures ==========

    #[test]
    fn test_provider_rejection_surfaces_message() {
        let store = store();
        store.reject_creates(Some("ARRDATAIllegalIPv4Address".to_string()));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let err = reconciler
            .create(&reconciler.load(foo(&["1.2.3.4"])))
            .unwrap_err();

        assert_eq!(
            err,
            ReconcileError::ProviderRejected {
                name: "foo.example.com.".to_string(),
                operation: "create record".to_string(),
                message: "ARRDATAIllegalIPv4Address".to_string(),
            }
        );
    }

    #[test]
    fn test_failed_replace_recovers_on_next_run() {
        let store = store().with_record("Z1", foo_set(&["5.6.7.8"], 300));
        store.reject_creates(Some("throttled".to_string()));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        assert!(reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).is_err());
        assert_eq!(store.record("Z1", "foo.example.com.", RecordType::A), None);

        store.reject_creates(None);
        let outcome = reconciler.create(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();
        assert!(matches!(outcome, Outcome::Created { .. }));
    }

    #[test]
    fn test_unknown_zone() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);
        let desired = DesiredRecord::with_values(
            "foo.example.org",
            RecordType::A,
            vec!["1.2.3.4".to_string()],
            300,
        );

        let err = reconciler.create(&reconciler.load(desired)).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::ZoneNotFound {
                name: "foo.example.org.".to_string()
            }
        );
        assert!(store.mutations().is_empty());
    }

    #[test]
    fn test_empty_values_rejected() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let err = reconciler.create(&reconciler.load(foo(&[]))).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidRecord { .. }));
        assert!(store.calls().is_empty());
    }

    // ========== Delete ==========

    #[test]
    fn test_delete_without_known_record_makes_no_calls() {
        let store = store().with_record("Z1", foo_set(&["1.2.3.4"], 300));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let outcome = reconciler.delete(&reconciler.load(foo(&["1.2.3.4"]))).unwrap();

        assert!(matches!(
            outcome,
            Outcome::NoOp {
                reason: NoOpReason::Absent,
                ..
            }
        ));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_delete_existing_record() {
        let store = store().with_record("Z1", foo_set(&["1.2.3.4"], 300));
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let ctx = RecordContext::new(foo(&["1.2.3.4"]), true);
        let outcome = reconciler.delete(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::Deleted {
                name: "foo.example.com.".to_string(),
                record_type: RecordType::A,
            }
        );
        assert_eq!(store.record("Z1", "foo.example.com.", RecordType::A), None);
    }

    #[test]
    fn test_delete_already_gone_at_provider() {
        let store = store();
        let reconciler = Reconciler::new(&store, DisabledProbe);

        let ctx = RecordContext::new(foo(&["1.2.3.4"]), true);
        let outcome = reconciler.delete(&ctx).unwrap();

        assert!(matches!(outcome, Outcome::NoOp { .. }));
        assert!(store.mutations().is_empty());
    }

    #[test]
    fn test_delete_tolerates_record_vanishing_after_read() {
        let store = store().with_record("Z1", foo_set(&["1.2.3.4"], 300));
        let reconciler = Reconciler::new(VanishingRecord(&store), DisabledProbe);

        let ctx = RecordContext::new(foo(&["1.2.3.4"]), true);
        let outcome = reconciler.delete(&ctx).unwrap();

        assert_eq!(
            outcome,
            Outcome::Deleted {
                name: "foo.example.com.".to_string(),
                record_type: RecordType::A,
            }
        );
        assert_eq!(store.record("Z1", "foo.example.com.", RecordType::A), None);
    }

    #[test]
    fn test_replace_creates_even_if_old_record_vanished() {
        let store = store().with_record("Z1", foo_set(&["5.6.7.8"], 300));
        let reconciler = Reconciler::new(VanishingRecord(&store), DisabledProbe);

        let outcome = reconciler
            .create(&reconciler.load(foo(&["1.2.3.4"])))
            .unwrap();

        assert!(matches!(outcome, Outcome::Replaced { .. }), "{outcome:?}");
        let creates: Vec<StoreCall> = store
            .mutations()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::Create(_)))
            .collect();
        assert_eq!(creates, vec![StoreCall::Create(foo_set(&["1.2.3.4"], 300))]);
        assert_eq!(
            store.record("Z1", "foo.example.com.", RecordType::A),
            Some(foo_set(&["1.2.3.4"], 300))
        );
    }

    #[test]
    fn test_delete_leaves_address_alias_alone() {
        let alias = AliasTarget {
            dns_name: "lb.example.net".to_string(),
            evaluate_health: false,
            hosted_zone_id: "Z35SXDOTRQ7X7K".to_string(),
        };
        let desired = DesiredRecord::with_alias("www.example.com", RecordType::A, alias);
        let store = store().with_record("Z1", desired.to_record_set("www.example.com."));
        let reconciler = Reconciler::new(&store, LiveDns(vec!["192.0.2.10".to_string()]));

        let ctx = reconciler.load(desired);
        assert!(!ctx.exists());

        let outcome = reconciler.delete(&ctx).unwrap();
        assert!(matches!(
            outcome,
            Outcome::NoOp {
                reason: NoOpReason::Absent,
                ..
            }
        ));
        assert!(store.calls().is_empty());
    }

    // ========== Messages ==========

    #[test]
    fn test_outcome_messages() {
        let created = Outcome::Created {
            record: foo_set(&["1.2.3.4"], 300),
        };
        assert_eq!(
            created.message(),
            "Created A record foo.example.com. with [1.2.3.4] (TTL: 300)"
        );

        let skipped = Outcome::SkippedProtected {
            name: "foo.example.com.".to_string(),
            record_type: RecordType::A,
            current: foo_set(&["5.6.7.8"], 300).data,
            desired: foo_set(&["1.2.3.4"], 300).data,
        };
        assert_eq!(
            skipped.to_string(),
            "A record foo.example.com. should have been modified, but overwrite is disabled"
        );

        let deleted = Outcome::Deleted {
            name: "foo.example.com.".to_string(),
            record_type: RecordType::A,
        };
        assert_eq!(deleted.message(), "Deleted A record foo.example.com.");
    }
}
