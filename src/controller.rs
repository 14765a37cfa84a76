// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The Service controller loop.
//!
//! Multiplexes four sources of work until shutdown:
//!
//! - watch events, folded into the [`ResourceWatch`] cache and dispatched
//! - the resync ticker, which re-delivers every cached Service as an unchanged update
//! - completed annotation writes, which release their Service for deferred events
//! - the shutdown signal
//!
//! On shutdown the loop stops accepting events and waits for in-flight writes.

use crate::context::Context;
use crate::metrics;
use crate::reconcilers::Dispatcher;
use crate::watch::ResourceWatch;
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Service;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Watch all Services in the cluster and reconcile them until `shutdown` resolves.
///
/// # Arguments
///
/// * `client` - Kubernetes client
/// * `ctx` - Controller identity and annotation writer
/// * `resync_interval` - Period of full re-delivery of the cache
/// * `ready` - Set once the initial list has been processed
/// * `shutdown` - Resolves when the controller must stop
pub async fn run_service_controller<F>(
    client: Client,
    ctx: Arc<Context>,
    resync_interval: Duration,
    ready: Arc<AtomicBool>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    info!(
        resync_interval_secs = resync_interval.as_secs_f64(),
        "Starting Service controller"
    );

    let api: Api<Service> = Api::all(client);
    let events = watcher(api, watcher::Config::default()).default_backoff();

    run_loop(ctx, events, resync_interval, ready, shutdown).await;
}

/// Drive reconciliation from an arbitrary stream of watcher events.
///
/// Returns when `shutdown` resolves or the stream ends, after every in-flight write has
/// completed.
pub async fn run_loop<S, F>(
    ctx: Arc<Context>,
    events: S,
    resync_interval: Duration,
    ready: Arc<AtomicBool>,
    shutdown: F,
) where
    S: Stream<Item = Result<watcher::Event<Service>, watcher::Error>>,
    F: Future<Output = ()>,
{
    let mut watch = ResourceWatch::new();
    let mut dispatcher = Dispatcher::new(ctx);

    let mut resync = tokio::time::interval(resync_interval);
    resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the cache is still empty.
    resync.tick().await;

    tokio::pin!(events);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested, stopping Service controller");
                break;
            }
            next = events.next() => match next {
                Some(Ok(event)) => {
                    let initial_sync_done = matches!(event, watcher::Event::InitDone);
                    for reconcile_event in watch.apply(event) {
                        metrics::record_watch_event(reconcile_event.kind());
                        dispatcher.submit(reconcile_event);
                    }
                    if initial_sync_done && !ready.swap(true, Ordering::SeqCst) {
                        info!(services = watch.len(), "Initial Service list synchronized");
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Service watch error, backing off");
                    metrics::record_error("watch");
                }
                None => {
                    error!("Service watch stream ended");
                    break;
                }
            },
            _ = resync.tick() => {
                let mut redelivered = 0usize;
                for reconcile_event in watch.resync() {
                    if dispatcher.is_busy(reconcile_event.key()) {
                        continue;
                    }
                    metrics::record_watch_event("resync");
                    dispatcher.submit(reconcile_event);
                    redelivered += 1;
                }
                debug!(services = redelivered, "Resync");
            }
            Some(_) = dispatcher.next_completion(), if dispatcher.has_in_flight() => {}
        }
    }

    ready.store(false, Ordering::SeqCst);
    dispatcher.drain().await;
    info!("Service controller stopped");
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
