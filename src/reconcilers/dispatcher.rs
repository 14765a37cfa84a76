// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-Service dispatch of reconciliation decisions.
//!
//! The [`Dispatcher`] runs the decision engine for every event and spawns the resulting
//! annotation writes. At most one write is in flight per Service. Events for a Service
//! that is being written are merged into a single pending event (see
//! [`ReconcileEvent::coalesce`]) and reconciled once the write completes, so the pending
//! event is always judged against the latest observed state.
//!
//! Failed writes are logged and counted, never re-queued: the next watch delivery or
//! resync re-runs the decision against fresh state.

use crate::annotations::MANAGED_ANNOTATION;
use crate::context::Context;
use crate::errors::WriteError;
use crate::metrics;
use crate::reconcilers::engine::{reconcile, Action};
use crate::record::{ReconcileEvent, ResourceKey};
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Result of one spawned write.
#[derive(Debug)]
struct WriteOutcome {
    key: ResourceKey,
    action: Action,
    result: Result<(), WriteError>,
    elapsed: Duration,
}

/// Serializes annotation writes per Service.
pub struct Dispatcher {
    ctx: Arc<Context>,
    in_flight: HashSet<ResourceKey>,
    pending: HashMap<ResourceKey, ReconcileEvent>,
    writes: JoinSet<WriteOutcome>,
}

impl Dispatcher {
    /// Create an idle dispatcher.
    #[must_use]
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            in_flight: HashSet::new(),
            pending: HashMap::new(),
            writes: JoinSet::new(),
        }
    }

    /// Reconcile `event`, or park it if a write for the same Service is in flight.
    pub fn submit(&mut self, event: ReconcileEvent) {
        let key = event.key().clone();

        if !self.in_flight.contains(&key) {
            self.dispatch(event);
            return;
        }

        match self.pending.remove(&key) {
            None => {
                debug!(resource = %key, kind = event.kind(), "Write in flight, deferring event");
                self.pending.insert(key, event);
            }
            Some(parked) => {
                metrics::record_coalesced();
                match parked.coalesce(event) {
                    Some(merged) => {
                        debug!(resource = %key, kind = merged.kind(), "Coalesced deferred event");
                        self.pending.insert(key, merged);
                    }
                    None => {
                        debug!(resource = %key, "Service created and deleted while a write was in flight, dropping deferred event");
                    }
                }
            }
        }
    }

    /// Whether a write for `key` is in flight.
    #[must_use]
    pub fn is_busy(&self, key: &ResourceKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Whether any write is in flight.
    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Wait for the next write to finish and dispatch the event deferred behind it.
    ///
    /// Returns the Service whose write finished, or `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<ResourceKey> {
        let joined = self.writes.join_next().await?;

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Annotation write task did not complete");
                metrics::record_error("task");
                return None;
            }
        };

        let WriteOutcome {
            key,
            action,
            result,
            elapsed,
        } = outcome;
        self.in_flight.remove(&key);

        match result {
            Ok(()) => {
                info!(
                    resource = %key,
                    action = %action,
                    duration_ms = elapsed.as_millis(),
                    "Annotation updated"
                );
                metrics::record_write_success(elapsed);
            }
            Err(e) => {
                error!(
                    resource = %key,
                    action = %action,
                    error = %e,
                    "Failed to update annotation"
                );
                metrics::record_write_error(e.category(), elapsed);
            }
        }

        if let Some(next) = self.pending.remove(&key) {
            self.dispatch(next);
        }

        Some(key)
    }

    /// Wait until every in-flight and deferred write has finished.
    pub async fn drain(&mut self) {
        while self.has_in_flight() {
            self.next_completion().await;
        }
    }

    fn dispatch(&mut self, event: ReconcileEvent) {
        let key = event.key().clone();
        let action = reconcile(&self.ctx.identity, &event);
        metrics::record_decision(action.as_str());

        match &action {
            Action::NoOp => {
                debug!(resource = %key, kind = event.kind(), "Nothing to do");
                return;
            }
            Action::LogOnlyDeleted => {
                info!(resource = %key, "Service holding the certificate was deleted");
                return;
            }
            Action::SetAnnotation(value) => {
                info!(
                    resource = %key,
                    annotation = MANAGED_ANNOTATION,
                    value = %value,
                    "Setting certificate annotation"
                );
            }
            Action::ClearAnnotation => {
                info!(
                    resource = %key,
                    annotation = MANAGED_ANNOTATION,
                    "Clearing certificate annotation"
                );
            }
        }

        let (Some(value), Some(record)) = (action.write_value(), event.new_state()) else {
            warn!(resource = %key, action = %action, "No current object to write to");
            return;
        };
        let value = value.to_string();
        let record = record.clone();
        let writer = Arc::clone(&self.ctx.writer);

        self.in_flight.insert(key.clone());
        self.writes.spawn(async move {
            let start = Instant::now();
            let result = AssertUnwindSafe(writer.apply(&record, MANAGED_ANNOTATION, &value))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(WriteError::Client {
                        resource: key.to_string(),
                        reason: "annotation writer panicked".to_string(),
                    })
                });
            WriteOutcome {
                key,
                action,
                result,
                elapsed: start.elapsed(),
            }
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.in_flight)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;
