// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the reconciliation daemon.
//!
//! `AppContext` bundles the wired DNS/proxy providers with the validated
//! configuration and the state file path. It is built once at bootstrap and
//! handed to the scheduler as an `Arc`, rather than living behind any
//! process-wide `static`/`OnceLock` — the engine's only "global" state is
//! the `PersistedState` value the reconciler owns for the duration of a
//! cycle.

use std::path::PathBuf;

use tracing::warn;

use crate::adapters::dns::adguard::AdGuardDnsProvider;
use crate::adapters::dns::DnsProvider;
use crate::adapters::proxy::traefik::TraefikProxyProvider;
use crate::adapters::proxy::ProxyProvider;
use crate::config::Config;

/// Everything a reconciliation cycle needs, wired once at startup.
pub struct AppContext {
    pub dns: Box<dyn DnsProvider>,
    pub proxy: Box<dyn ProxyProvider>,
    pub config: Config,
    pub state_path: PathBuf,
}

impl AppContext {
    /// Build the context from a validated [`Config`].
    ///
    /// Only the first entry of `config.providers` is wired up; a config
    /// enumerating more than one is accepted (it validates), but additional
    /// entries are ignored with a warning, since the reconciler drives a
    /// single DNS adapter per cycle.
    pub fn build(config: Config, state_path: PathBuf) -> anyhow::Result<Self> {
        if config.providers.len() > 1 {
            warn!(
                count = config.providers.len(),
                "multiple DNS providers configured, only the first is used"
            );
        }
        let provider = &config.providers[0];
        let dns = Box::new(AdGuardDnsProvider::new(
            provider.name.clone(),
            provider.url.clone(),
            provider.username.clone(),
            provider.password.clone(),
        )?);
        let proxy = Box::new(TraefikProxyProvider::new(config.sources.clone())?);

        Ok(Self {
            dns,
            proxy,
            config,
            state_path,
        })
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
