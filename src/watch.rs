// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Local cache of watched Services.
//!
//! [`ResourceWatch`] turns the raw `kube` watcher stream into [`ReconcileEvent`]s with
//! explicit old and new states. It keeps the last observed version of every Service so
//! that updates can be paired with the state they replace, relists can detect Services
//! that disappeared while the watch was down, and resync can re-deliver everything.

use crate::metrics;
use crate::record::{ReconcileEvent, ResourceKey, ResourceRecord};
use k8s_openapi::api::core::v1::Service;
use kube::runtime::watcher;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Last observed state of every watched Service.
#[derive(Debug, Default)]
pub struct ResourceWatch {
    cache: BTreeMap<ResourceKey, ResourceRecord>,
    /// Keys seen since the current relist started; `None` outside a relist
    init_seen: Option<BTreeSet<ResourceKey>>,
}

impl ResourceWatch {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one watcher event into the cache and return the resulting reconcile events.
    pub fn apply(&mut self, event: watcher::Event<Service>) -> Vec<ReconcileEvent> {
        let events = match event {
            watcher::Event::Init => {
                debug!(cached = self.cache.len(), "Relist started");
                self.init_seen = Some(BTreeSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(service) => {
                let Some(record) = Self::record_of(service) else {
                    return Vec::new();
                };
                if let Some(seen) = self.init_seen.as_mut() {
                    seen.insert(record.key().clone());
                }
                vec![self.upsert(record)]
            }
            watcher::Event::InitDone => self.finish_relist(),
            watcher::Event::Apply(service) => match Self::record_of(service) {
                Some(record) => vec![self.upsert(record)],
                None => Vec::new(),
            },
            watcher::Event::Delete(service) => {
                let Some(record) = Self::record_of(service) else {
                    return Vec::new();
                };
                self.cache.remove(record.key());
                vec![ReconcileEvent::Deleted(record)]
            }
        };

        metrics::set_watched_services(self.cache.len());
        events
    }

    /// Re-deliver every cached Service as an unchanged update.
    #[must_use]
    pub fn resync(&self) -> Vec<ReconcileEvent> {
        self.cache
            .values()
            .map(|record| ReconcileEvent::Updated {
                old: record.clone(),
                new: record.clone(),
            })
            .collect()
    }

    /// Last observed state of `key`.
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Option<&ResourceRecord> {
        self.cache.get(key)
    }

    /// Number of cached Services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn upsert(&mut self, record: ResourceRecord) -> ReconcileEvent {
        match self.cache.insert(record.key().clone(), record.clone()) {
            Some(old) => ReconcileEvent::Updated { old, new: record },
            None => ReconcileEvent::Added(record),
        }
    }

    /// Drop Services that were cached before the relist but not listed again.
    fn finish_relist(&mut self) -> Vec<ReconcileEvent> {
        let Some(seen) = self.init_seen.take() else {
            return Vec::new();
        };

        let gone: Vec<ResourceKey> = self
            .cache
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();

        debug!(listed = seen.len(), removed = gone.len(), "Relist finished");

        gone.into_iter()
            .filter_map(|key| self.cache.remove(&key))
            .map(ReconcileEvent::Deleted)
            .collect()
    }

    fn record_of(service: Service) -> Option<ResourceRecord> {
        match ResourceRecord::from_service(service) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed Service from watch");
                metrics::record_error("malformed");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod watch_tests;
