// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The DNS adapter: an abstract `{list, add, delete}` capability set over a
//! recursive resolver's rewrite API.
//!
//! `(domain, answer)` is the identity the adapter and reconciler agree on —
//! there is no separate record id, so every operation is keyed on the pair.

pub mod adguard;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DnsError;

/// A single resolver rewrite: `domain -> answer`.
///
/// `domain` is always stored lowercase; equality and hashing are
/// case-insensitive by construction rather than by a custom `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Fully-qualified hostname, lowercase.
    pub domain: String,
    /// Free-form answer, typically an IPv4/IPv6 literal.
    pub answer: String,
}

impl DnsRecord {
    /// Construct a record, lowercasing `domain` as the constructor's job
    /// rather than relying on every call site to remember to.
    #[must_use]
    pub fn new(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            domain: domain.into().to_lowercase(),
            answer: answer.into(),
        }
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.domain, self.answer)
    }
}

/// Capability set the reconciler needs from a DNS provider.
///
/// Every method's error type is [`DnsError`]; adapters classify transport
/// failures as `Transient` (retried) or `Permanent` (not retried) before
/// returning, so the reconciler never has to inspect a status code.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Human-readable provider name, used in logs and state.
    fn name(&self) -> &str;

    /// Lightweight liveness probe, used once at startup.
    async fn test_connection(&self) -> bool;

    /// Every rewrite currently present in the resolver.
    ///
    /// Malformed entries (missing either field, wrong type) are dropped
    /// with a warning; this call never fails on a single bad entry.
    async fn list(&self) -> Result<Vec<DnsRecord>, DnsError>;

    /// Add a rewrite. Idempotent: if the resolver rejects a duplicate, the
    /// post-state is still "record present" and this returns `Ok`.
    async fn add(&self, domain: &str, answer: &str) -> Result<(), DnsError>;

    /// Delete a rewrite by `(domain, answer)`. Returns `Ok` even if no such
    /// record exists (at-least-once delete semantics).
    async fn delete(&self, domain: &str, answer: &str) -> Result<(), DnsError>;

    /// Replace `old_answer` with `new_answer` for `domain`.
    ///
    /// Default implementation is delete-then-add; concrete adapters may
    /// specialize if their API supports an atomic rename.
    async fn update(&self, domain: &str, old_answer: &str, new_answer: &str) -> Result<(), DnsError> {
        self.delete(domain, old_answer).await?;
        self.add(domain, new_answer).await
    }
}
