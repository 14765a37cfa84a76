// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Leader election on a `coordination.k8s.io/v1` Lease.
//!
//! When enabled, only the replica holding the lease runs the controller loop. The lease is
//! renewed in the background by `kube-lease-manager`; its state is observed through a
//! `watch` channel that flips to `false` when the lease is lost.

use crate::config::LeaseSettings;
use crate::constants::{DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS};
use crate::metrics;
use anyhow::{Context as _, Result};
use kube::Client;
use kube_lease_manager::LeaseManagerBuilder;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A running lease manager and the channel reporting whether this replica leads.
pub struct LeaderElection {
    identity: String,
    state: watch::Receiver<bool>,
    task: JoinHandle<kube_lease_manager::Result<kube_lease_manager::LeaseManager>>,
}

impl LeaderElection {
    /// Start competing for the lease described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lease manager cannot be created.
    pub async fn start(client: Client, settings: &LeaseSettings) -> Result<Self> {
        info!(
            lease = %settings.name,
            namespace = %settings.namespace,
            identity = %settings.identity,
            "Starting leader election"
        );

        let manager = LeaseManagerBuilder::new(client, &settings.name)
            .with_namespace(&settings.namespace)
            .with_identity(&settings.identity)
            .with_duration(DEFAULT_LEASE_DURATION_SECS)
            .with_grace(DEFAULT_LEASE_GRACE_SECS)
            .build()
            .await
            .with_context(|| format!("Failed to create lease manager for {}", settings.name))?;

        let (state, task) = manager.watch().await;

        Ok(Self {
            identity: settings.identity.clone(),
            state,
            task,
        })
    }

    /// Wait until this replica holds the lease.
    ///
    /// Returns `false` if the lease manager stopped before leadership was acquired.
    pub async fn acquired(&mut self) -> bool {
        let acquired = wait_until_leader(&mut self.state).await;
        if acquired {
            info!(identity = %self.identity, "Leadership acquired");
            metrics::record_leader_elected(&self.identity);
        }
        acquired
    }

    /// Resolve once this replica no longer holds the lease.
    pub async fn lost(&mut self) {
        wait_until_lost(&mut self.state).await;
        warn!(identity = %self.identity, "Leadership lost");
        metrics::record_leader_lost(&self.identity);
    }

    /// Whether this replica currently holds the lease.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        *self.state.borrow()
    }

    /// Stop renewing and release the lease.
    pub async fn release(self) {
        drop(self.state);
        match self.task.await {
            Ok(Ok(_)) => debug!(identity = %self.identity, "Lease released"),
            Ok(Err(e)) => warn!(identity = %self.identity, error = %e, "Lease manager failed"),
            Err(e) => warn!(identity = %self.identity, error = %e, "Lease manager task failed"),
        }
    }
}

/// Wait for the channel to report leadership; `false` if the sender went away first.
pub async fn wait_until_leader(state: &mut watch::Receiver<bool>) -> bool {
    state.wait_for(|leader| *leader).await.is_ok()
}

/// Wait for the channel to report loss of leadership or for the sender to go away.
pub async fn wait_until_lost(state: &mut watch::Receiver<bool>) {
    // A closed channel means the manager stopped, which also ends leadership.
    let _ = state.wait_for(|leader| !*leader).await;
}
