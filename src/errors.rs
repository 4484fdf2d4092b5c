// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error taxonomy for the DNS adapter, proxy adapter, configuration loader,
//! and state store.
//!
//! Every I/O primitive in this crate returns one of the typed errors below
//! rather than a bare `anyhow::Error`, so the reconciler can decide whether
//! to retry, log-and-continue, or treat a failure as fatal without string
//! matching on error messages.

use thiserror::Error;

/// Implemented by the two adapter error types so `retry::with_backoff` can
/// classify failures without knowing which adapter produced them.
pub trait Retryable {
    /// True if the operation that produced this error should be retried.
    fn is_transient(&self) -> bool;
}

/// Errors from the DNS adapter (the resolver's rewrite API).
#[derive(Error, Debug, Clone)]
pub enum DnsError {
    /// Network failure, timeout, or 5xx response. Safe to retry.
    #[error("DNS provider '{provider}' transient failure: {reason}")]
    Transient {
        /// Name of the DNS provider instance.
        provider: String,
        /// Underlying failure description.
        reason: String,
    },

    /// 4xx response, authentication failure, or malformed body. Not retried.
    #[error("DNS provider '{provider}' permanent failure: {reason}")]
    Permanent {
        /// Name of the DNS provider instance.
        provider: String,
        /// Underlying failure description.
        reason: String,
    },
}

impl DnsError {
    /// True if the operation that produced this error should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl Retryable for DnsError {
    fn is_transient(&self) -> bool {
        DnsError::is_transient(self)
    }
}

/// Errors from the proxy adapter (route discovery).
#[derive(Error, Debug, Clone)]
pub enum ProxyError {
    /// Network failure, timeout, or 5xx response against the proxy's API.
    #[error("proxy instance '{instance}' transient failure: {reason}")]
    Transient {
        /// The `ProxyInstance.name` that failed.
        instance: String,
        /// Underlying failure description.
        reason: String,
    },

    /// 4xx response or authentication failure against the proxy's API.
    #[error("proxy instance '{instance}' permanent failure: {reason}")]
    Permanent {
        /// The `ProxyInstance.name` that failed.
        instance: String,
        /// Underlying failure description.
        reason: String,
    },
}

impl ProxyError {
    /// True if the operation that produced this error should be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl Retryable for ProxyError {
    fn is_transient(&self) -> bool {
        ProxyError::is_transient(self)
    }
}

/// Errors from loading or validating the configuration document.
///
/// Fatal at startup; logged and the previous configuration is kept on reload.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// The config path is neither a readable file nor a directory.
    #[error("config path '{path}' is not a file or directory")]
    PathNotFound {
        /// The configured path.
        path: String,
    },

    /// A config file failed to parse as YAML.
    #[error("failed to parse config file '{path}': {reason}")]
    Parse {
        /// The offending file.
        path: String,
        /// Parser error description.
        reason: String,
    },

    /// Configuration loaded, but failed semantic validation (e.g. duplicate
    /// provider names, a static rewrite with an empty answer).
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is invalid.
        reason: String,
    },

    /// Configuration enumerates an unrecognized `provider`/`type` tag.
    #[error("unrecognized {kind} type '{type_tag}' (only the built-in type is supported)")]
    UnknownProviderType {
        /// Either `"DNS provider"` or `"proxy source"`.
        kind: &'static str,
        /// The unrecognized tag from the config document.
        type_tag: String,
    },
}

/// Errors from the persisted-state store.
///
/// Never propagated past `StateStore::load` — a `StateCorruption` condition
/// collapses to a logged warning and a fresh, empty `PersistedState`.
#[derive(Error, Debug)]
pub enum StateError {
    /// The state file could not be read (permissions, not a regular file).
    #[error("failed to read state file '{path}': {source}")]
    Io {
        /// The state file path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file's contents are not a valid `PersistedState` document.
    #[error("failed to parse state file '{path}': {source}")]
    Parse {
        /// The state file path.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
