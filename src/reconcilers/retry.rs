// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded retry with exponential backoff for annotation writes.
//!
//! Only transient errors (HTTP 429, 5xx, transport failures) are retried, and only for a
//! short budget. Conflicts and other permanent errors fail immediately: the watch will
//! deliver the fresh object and the decision is re-run against it.

use crate::constants::{
    DEFAULT_WRITE_RETRY_SECS, WRITE_RETRY_BACKOFF_MULTIPLIER, WRITE_RETRY_INITIAL_INTERVAL_MILLIS,
    WRITE_RETRY_MAX_INTERVAL_SECS, WRITE_RETRY_RANDOMIZATION_FACTOR,
};
use crate::errors::WriteError;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) to prevent thundering herd.
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    /// Maximum interval duration
    pub max_interval: Duration,
    /// Maximum total elapsed time
    pub max_elapsed_time: Duration,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
    /// Start time for tracking total elapsed time
    start_time: Instant,
}

impl ExponentialBackoff {
    /// Get the next backoff interval, or None if max elapsed time exceeded.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.start_time.elapsed() >= self.max_elapsed_time {
            return None;
        }

        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(jittered)
    }

    /// Apply randomization (jitter) to an interval.
    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let jittered = rand::rng().random_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Retry policy for annotation writes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WriteRetryPolicy {
    /// First wait between attempts
    pub initial_interval: Duration,
    /// Upper bound for a single wait
    pub max_interval: Duration,
    /// Total time budget; zero disables retries
    pub max_elapsed_time: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
    /// Jitter factor
    pub randomization_factor: f64,
}

impl Default for WriteRetryPolicy {
    /// # Configuration
    ///
    /// - **Initial interval**: 100ms
    /// - **Max interval**: 2 seconds (one resync period)
    /// - **Max elapsed time**: 10 seconds total
    /// - **Multiplier**: 2.0 (exponential growth)
    /// - **Randomization**: ±10% (prevents thundering herd)
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(WRITE_RETRY_INITIAL_INTERVAL_MILLIS),
            max_interval: Duration::from_secs(WRITE_RETRY_MAX_INTERVAL_SECS),
            max_elapsed_time: Duration::from_secs(DEFAULT_WRITE_RETRY_SECS),
            multiplier: WRITE_RETRY_BACKOFF_MULTIPLIER,
            randomization_factor: WRITE_RETRY_RANDOMIZATION_FACTOR,
        }
    }
}

impl WriteRetryPolicy {
    /// Default policy with a different total budget.
    #[must_use]
    pub fn with_budget(max_elapsed_time: Duration) -> Self {
        Self {
            max_elapsed_time,
            ..Self::default()
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_budget(Duration::ZERO)
    }

    /// Start a fresh backoff sequence.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: self.max_elapsed_time,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            start_time: Instant::now(),
        }
    }
}

/// Retry a write with exponential backoff.
///
/// Retries while `operation` fails with a retryable [`WriteError`] and the policy's
/// budget lasts; fails immediately on anything else.
///
/// # Arguments
///
/// * `policy` - Backoff configuration
/// * `resource` - `namespace/name` of the Service, for logs and errors
/// * `operation` - Async function that performs one write attempt
///
/// # Errors
///
/// Returns the first non-retryable error, or [`WriteError::RetriesExhausted`] once the
/// budget is spent.
pub async fn retry_write<T, F, Fut>(
    policy: &WriteRetryPolicy,
    resource: &str,
    mut operation: F,
) -> Result<T, WriteError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, WriteError>>,
{
    let mut backoff = policy.backoff();
    let start_time = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        resource = resource,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Annotation write succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => match backoff.next_backoff() {
                Some(duration) => {
                    warn!(
                        resource = resource,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable error writing annotation, will retry"
                    );
                    tokio::time::sleep(duration).await;
                }
                None if attempt == 1 => return Err(e),
                None => {
                    return Err(WriteError::RetriesExhausted {
                        resource: resource.to_string(),
                        attempts: attempt,
                        reason: e.to_string(),
                    });
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
