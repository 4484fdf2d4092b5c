// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for adapter HTTP calls.
//!
//! This module provides utilities for retrying transient errors (network
//! failures, timeouts, 5xx responses) with exponential backoff, while
//! failing fast on permanent errors (4xx client errors, malformed bodies).
//! Both the DNS adapter and the proxy adapter share this implementation
//! rather than rolling their own retry loop.

use crate::constants::{RETRY_BASE, RETRY_CAP, RETRY_DEFAULT_MAX, RETRY_FACTOR};
use crate::errors::Retryable;
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff bounded by an attempt count rather than elapsed time.
///
/// `base=1s, factor=2, cap=30s` with up to `RETRY_DEFAULT_MAX` retries
/// produces the schedule: 1s, 2s, 4s, ... capped at 30s.
pub struct ExponentialBackoff {
    current_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    /// Build a backoff starting at `base`, doubling by `multiplier` each
    /// step, capped at `max_interval`.
    #[must_use]
    pub fn new(base: Duration, max_interval: Duration, multiplier: f64) -> Self {
        Self {
            current_interval: base,
            max_interval,
            multiplier,
        }
    }

    /// Get the next backoff interval with ±10% jitter to avoid thundering
    /// herd, and advance the internal state for the following call.
    pub fn next_backoff(&mut self) -> Duration {
        let interval = self.current_interval;
        let jittered = apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        jittered
    }
}

fn apply_jitter(interval: Duration) -> Duration {
    let secs = interval.as_secs_f64();
    let delta = secs * 0.1;
    let mut rng = rand::thread_rng();
    let jittered = rng.gen_range((secs - delta).max(0.0)..=(secs + delta));
    Duration::from_secs_f64(jittered.max(0.0))
}

/// Construct the default adapter backoff: base 1s, factor 2, cap 30s.
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(RETRY_BASE, RETRY_CAP, RETRY_FACTOR)
}

/// Determine if an HTTP status code indicates a transient (retryable) failure.
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Retry an adapter call with exponential backoff.
///
/// Retries on `Retryable::is_transient() == true` up to `max_retries`
/// additional attempts; returns the first permanent error, or the last
/// transient error once retries are exhausted.
pub async fn with_backoff<T, E, F, Fut>(
    operation_name: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut backoff = default_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) => {
                if !err.is_transient() || attempt > max_retries {
                    if err.is_transient() {
                        warn!(
                            operation = operation_name,
                            attempt, "retries exhausted, giving up"
                        );
                    }
                    return Err(err);
                }

                let delay = backoff.next_backoff();
                warn!(
                    operation = operation_name,
                    attempt,
                    retry_after = ?delay,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry with the crate-wide default retry budget.
pub async fn with_default_backoff<T, E, F, Fut>(operation_name: &str, operation: F) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    with_backoff(operation_name, RETRY_DEFAULT_MAX, operation).await
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
