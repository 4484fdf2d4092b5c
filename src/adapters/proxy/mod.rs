// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The proxy adapter: discovers `(hostname, zone)` routes exposed by a
//! configured set of reverse-proxy instances.
//!
//! Instance configuration (url, target IP, router/middleware filters) comes
//! from [`crate::config`]; a concrete provider is constructed with its
//! instance list already resolved, and only knows how to poll one.

pub mod traefik;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ProxyError;

/// Which DNS zone a discovered route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Internal,
    External,
}

/// A single configured reverse-proxy instance to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyInstance {
    pub name: String,
    pub url: String,
    pub target_ip: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default)]
    pub router_filter: String,
    #[serde(default)]
    pub middleware_filter: String,
    #[serde(default)]
    pub default_zone: Option<Zone>,
}

fn default_verify_tls() -> bool {
    true
}

/// A hostname discovered behind a proxy instance, with the zone it was
/// classified into and the target IP it should resolve to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProxyRoute {
    pub hostname: String,
    pub instance_name: String,
    pub target_ip: String,
    pub zone: Zone,
    /// The upstream router identifier this route was extracted from, kept
    /// only for diagnostics (not part of the route's identity).
    pub router_name: String,
}

/// Capability set the reconciler needs from a reverse-proxy adapter.
#[async_trait]
pub trait ProxyProvider: Send + Sync {
    /// Human-readable provider name, used in logs and state.
    fn name(&self) -> &str;

    /// The configured instances this provider was built with.
    fn list_instances(&self) -> Vec<ProxyInstance>;

    /// Poll one configured instance and return its currently-exposed routes.
    ///
    /// A transient failure here must not be confused with "instance has zero
    /// routes" by the reconciler's pruning step; callers distinguish the two
    /// via the `Result`, not an empty `Vec`.
    async fn list_routes(&self, instance: &ProxyInstance) -> Result<Vec<ProxyRoute>, ProxyError>;
}
