// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for control-plane calls.
//!
//! This module provides utilities for retrying transient control-plane errors
//! (429, 5xx, transport failures) with exponential backoff, while failing fast on
//! permanent errors. "Not found" is never retried: callers rely on seeing it
//! immediately to decide that a cluster is gone.

use crate::errors::CloudError;
use anyhow::Result;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Shape of an exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Total time after which the schedule is exhausted.
    pub max_elapsed_time: Duration,
    pub multiplier: f64,
    /// Fraction of each interval used as jitter in both directions.
    pub randomization_factor: f64,
}

/// Control-plane retries: 100ms doubling up to 30s, for at most 5 minutes.
pub const CLOUD_RETRY_POLICY: BackoffPolicy = BackoffPolicy {
    initial_interval: Duration::from_millis(100),
    max_interval: Duration::from_secs(30),
    max_elapsed_time: Duration::from_secs(300),
    multiplier: 2.0,
    randomization_factor: 0.1,
};

/// Node readiness polling: 1s doubling up to 15s, for at most 10 minutes.
/// Nodes of a freshly created cluster can take a while to register.
pub const NODE_POLL_POLICY: BackoffPolicy = BackoffPolicy {
    initial_interval: Duration::from_secs(1),
    max_interval: Duration::from_secs(15),
    max_elapsed_time: Duration::from_secs(600),
    multiplier: 2.0,
    randomization_factor: 0.1,
};

/// Running exponential backoff over a [`BackoffPolicy`], with jitter.
pub struct ExponentialBackoff {
    policy: BackoffPolicy,
    next_interval: Duration,
    started: Instant,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            next_interval: policy.initial_interval,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Next delay to sleep for, or `None` once the schedule is exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.started.elapsed() >= self.policy.max_elapsed_time {
            return None;
        }

        let interval = self.next_interval;
        self.next_interval = interval
            .mul_f64(self.policy.multiplier)
            .min(self.policy.max_interval);

        Some(jitter(interval, self.policy.randomization_factor))
    }

    /// Time spent since the backoff was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

fn jitter(interval: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return interval;
    }

    let secs = interval.as_secs_f64();
    let spread = secs * factor;
    let jittered = rand::thread_rng().gen_range((secs - spread)..=(secs + spread));

    Duration::from_secs_f64(jittered.max(0.0))
}

/// Backoff for retrying transient control-plane errors.
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(CLOUD_RETRY_POLICY)
}

/// Backoff for polling a fresh cluster until its nodes are ready.
#[must_use]
pub fn poll_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(NODE_POLL_POLICY)
}

/// Retry a control-plane call with exponential backoff.
///
/// Automatically retries on transient errors (HTTP 429, 5xx, transport) and fails
/// immediately on permanent ones, including "not found". The returned error keeps
/// the original [`CloudError`] in its chain so callers can still classify it.
///
/// # Arguments
///
/// * `operation` - Async function that performs the call
/// * `operation_name` - Human-readable name for logging (e.g., "get cluster c1")
///
/// # Errors
///
/// Returns error if:
/// - Non-retryable error encountered
/// - Max elapsed time exceeded (5 minutes)
///
/// # Example
///
/// ```rust,ignore
/// let cluster = retry_cloud_call(
///     || cloud.get_cluster("my-rg", "my-cluster"),
///     "get cluster my-cluster",
/// )
/// .await?;
/// ```
pub async fn retry_cloud_call<T, F, Fut>(mut operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CloudError>>,
{
    let mut backoff = default_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?backoff.elapsed(),
                        "Control-plane call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                if !e.is_retryable() {
                    debug!(
                        operation = operation_name,
                        error = %e,
                        "Non-retryable control-plane error, failing immediately"
                    );
                    return Err(e.into());
                }

                if let Some(duration) = backoff.next_backoff() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable control-plane error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                } else {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?backoff.elapsed(),
                        error = %e,
                        "Backoff exhausted, giving up"
                    );
                    return Err(anyhow::Error::new(e)
                        .context(format!("backoff exhausted after {attempt} attempts")));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
