// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `watch.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::annotations::{CONTROLLER_CLASS_ANNOTATION, MANAGED_ANNOTATION};
    use crate::test_support::{record, service, TEST_ARN, TEST_CLASS};

    fn key(name: &str) -> ResourceKey {
        ResourceKey::new("ns", name)
    }

    #[test]
    fn test_first_apply_is_added() {
        let mut watch = ResourceWatch::new();

        let events = watch.apply(watcher::Event::Apply(service("ns", "svc-a", &[])));

        assert_eq!(events, vec![ReconcileEvent::Added(record("ns", "svc-a", &[]))]);
        assert_eq!(watch.len(), 1);
    }

    #[test]
    fn test_second_apply_pairs_with_cached_state() {
        let mut watch = ResourceWatch::new();
        let claimed = [(CONTROLLER_CLASS_ANNOTATION, TEST_CLASS)];
        watch.apply(watcher::Event::Apply(service("ns", "svc-a", &[])));

        let events = watch.apply(watcher::Event::Apply(service("ns", "svc-a", &claimed)));

        assert_eq!(
            events,
            vec![ReconcileEvent::Updated {
                old: record("ns", "svc-a", &[]),
                new: record("ns", "svc-a", &claimed),
            }]
        );
        assert_eq!(
            watch.get(&key("svc-a")).and_then(|r| r.annotation(CONTROLLER_CLASS_ANNOTATION)),
            Some(TEST_CLASS)
        );
    }

    #[test]
    fn test_delete_uses_delivered_state_and_evicts() {
        let mut watch = ResourceWatch::new();
        let annotations = [
            (CONTROLLER_CLASS_ANNOTATION, TEST_CLASS),
            (MANAGED_ANNOTATION, TEST_ARN),
        ];
        watch.apply(watcher::Event::Apply(service("ns", "svc-a", &annotations)));

        let events = watch.apply(watcher::Event::Delete(service("ns", "svc-a", &annotations)));

        assert_eq!(
            events,
            vec![ReconcileEvent::Deleted(record("ns", "svc-a", &annotations))]
        );
        assert!(watch.is_empty());
    }

    #[test]
    fn test_relist_reports_vanished_services() {
        let mut watch = ResourceWatch::new();
        watch.apply(watcher::Event::Apply(service("ns", "svc-a", &[])));
        watch.apply(watcher::Event::Apply(service("ns", "svc-b", &[])));

        assert!(watch.apply(watcher::Event::Init).is_empty());
        let relisted = watch.apply(watcher::Event::InitApply(service("ns", "svc-a", &[])));
        let done = watch.apply(watcher::Event::InitDone);

        assert_eq!(
            relisted,
            vec![ReconcileEvent::Updated {
                old: record("ns", "svc-a", &[]),
                new: record("ns", "svc-a", &[]),
            }]
        );
        assert_eq!(done, vec![ReconcileEvent::Deleted(record("ns", "svc-b", &[]))]);
        assert_eq!(watch.len(), 1);
        assert!(watch.get(&key("svc-b")).is_none());
    }

    #[test]
    fn test_initial_list_emits_added() {
        let mut watch = ResourceWatch::new();

        watch.apply(watcher::Event::Init);
        let events = watch.apply(watcher::Event::InitApply(service("ns", "svc-a", &[])));
        let done = watch.apply(watcher::Event::InitDone);

        assert_eq!(events, vec![ReconcileEvent::Added(record("ns", "svc-a", &[]))]);
        assert!(done.is_empty());
    }

    #[test]
    fn test_init_done_without_init_is_ignored() {
        let mut watch = ResourceWatch::new();
        watch.apply(watcher::Event::Apply(service("ns", "svc-a", &[])));

        assert!(watch.apply(watcher::Event::InitDone).is_empty());
        assert_eq!(watch.len(), 1);
    }

    #[test]
    fn test_malformed_service_is_skipped() {
        let mut watch = ResourceWatch::new();
        let mut nameless = service("ns", "svc-a", &[]);
        nameless.metadata.name = None;

        assert!(watch.apply(watcher::Event::Apply(nameless)).is_empty());
        assert!(watch.is_empty());
    }

    #[test]
    fn test_resync_redelivers_every_cached_service() {
        let mut watch = ResourceWatch::new();
        watch.apply(watcher::Event::Apply(service("ns", "svc-b", &[])));
        watch.apply(watcher::Event::Apply(service("ns", "svc-a", &[])));

        let events = watch.resync();

        assert_eq!(events.len(), 2);
        for event in &events {
            match event {
                ReconcileEvent::Updated { old, new } => assert_eq!(old, new),
                other => panic!("expected unchanged update, got {other:?}"),
            }
        }
        assert_eq!(events[0].key(), &key("svc-a"), "resync is ordered by key");
    }
}
