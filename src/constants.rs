// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the certificate controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Controller Identity Constants
// ============================================================================

/// Controller class used when `CONTROLLER_CLASS` is not set
pub const DEFAULT_CONTROLLER_CLASS: &str = "certificate-controller";

/// Environment variable holding the certificate ARN (required)
pub const ENV_CERTIFICATE_ARN: &str = "CERTIFICATE_ARN";

// ============================================================================
// Watch Constants
// ============================================================================

/// Interval at which every cached Service is re-delivered as an update (2 seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 2;

// ============================================================================
// Annotation Write Retry Constants
// ============================================================================

/// Initial retry interval for transient write failures (100ms)
pub const WRITE_RETRY_INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between write retries, capped at the resync interval (2 seconds)
pub const WRITE_RETRY_MAX_INTERVAL_SECS: u64 = 2;

/// Default total time spent retrying a single write (10 seconds)
pub const DEFAULT_WRITE_RETRY_SECS: u64 = 10;

/// Backoff multiplier (exponential growth factor)
pub const WRITE_RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
pub const WRITE_RETRY_RANDOMIZATION_FACTOR: f64 = 0.1;

// ============================================================================
// Kubernetes Client Constants
// ============================================================================

/// Kubeconfig location relative to the user's home directory
pub const KUBECONFIG_RELATIVE_PATH: &str = ".kube/config";

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default name of the `Lease` used for leader election
pub const DEFAULT_LEASE_NAME: &str = "certificate-controller-leader";

/// Namespace for the `Lease` when `POD_NAMESPACE` is not set
pub const DEFAULT_LEASE_NAMESPACE: &str = "default";

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election grace period (5 seconds)
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness probe endpoint
pub const HEALTHZ_PATH: &str = "/healthz";

/// Path for the readiness probe endpoint
pub const READYZ_PATH: &str = "/readyz";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
