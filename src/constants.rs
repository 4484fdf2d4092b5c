// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the dnsync reconciler.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// HTTP / Retry Constants
// ============================================================================

/// Per-call HTTP timeout for both the DNS adapter and the proxy adapter.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Base interval for the exponential backoff used by adapter retries.
pub const RETRY_BASE: Duration = Duration::from_secs(1);

/// Backoff multiplier (doubling).
pub const RETRY_FACTOR: f64 = 2.0;

/// Cap on the backoff interval.
pub const RETRY_CAP: Duration = Duration::from_secs(30);

/// Default number of retries on top of the initial attempt.
pub const RETRY_DEFAULT_MAX: u32 = 2;

// ============================================================================
// Scheduler Constants
// ============================================================================

/// Floor applied to the configured poll interval between watch-mode cycles.
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;

/// Default poll interval when `settings.poll_interval` is absent.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Upper bound on proxy instances polled concurrently within one cycle.
pub const MAX_CONCURRENT_POLLS: usize = 8;

// ============================================================================
// Filesystem Defaults
// ============================================================================

/// Default location the scheduler scans for configuration (file or directory).
pub const DEFAULT_CONFIG_PATH: &str = "/config";

/// Default persisted-state path.
pub const DEFAULT_STATE_PATH: &str = "/data/state.json";

/// Suffix used for the atomic-replace temp file.
pub const STATE_TMP_SUFFIX: &str = ".tmp";

/// Extension scanned for when the config path is a directory.
pub const CONFIG_FILE_EXTENSION: &str = "yaml";

/// Files ending in this suffix are excluded from directory config scans.
pub const CONFIG_TEMPLATE_SUFFIX: &str = ".template";

// ============================================================================
// State Document Constants
// ============================================================================

/// Current `PersistedState.version`.
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// Provider Type Tags
// ============================================================================

/// The only recognized DNS provider type tag.
pub const PROVIDER_TYPE_ADGUARD: &str = "adguard";

/// The only recognized proxy source type tag.
pub const SOURCE_TYPE_TRAEFIK: &str = "traefik";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime.
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Constants
// ============================================================================

/// Namespace prefix for all dnsync metrics (prometheus-safe).
pub const METRICS_NAMESPACE: &str = "dnsync";
