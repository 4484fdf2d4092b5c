// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnsync - reverse-proxy aware DNS rewrite reconciler
//!
//! `dnsync` is a small daemon that keeps a recursive resolver's rewrite list
//! (for example AdGuard Home's) in sync with the hostnames a set of
//! reverse-proxy control APIs (for example Traefik's) are currently routing.
//! It polls each configured proxy instance, computes a desired
//! hostname -> IP mapping, and issues the minimal set of add/update/delete
//! operations against the resolver needed to match it.
//!
//! ## Overview
//!
//! - [`config`] - configuration document model and file-set loading
//! - [`context`] - the wired `AppContext` (DNS adapter, proxy adapter, config)
//! - [`adapters`] - the DNS provider and proxy provider trait objects and their implementations
//! - [`reconcile`] - the ten-step reconciliation cycle
//! - [`scheduler`] - the timer/config-reload/shutdown loop that drives cycles
//! - [`state`] - the persisted reconciliation state document
//! - [`errors`] - the typed error taxonomy shared by every adapter
//! - [`retry`] - shared retry/backoff helper for adapter HTTP calls
//! - [`patterns`] - glob-to-regex translation shared by config and exclusions
//! - [`metrics`] - Prometheus metrics definitions
//!
//! ## Example
//!
//! ```rust,no_run
//! use dnsync::config::Config;
//! use dnsync::context::AppContext;
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load(&PathBuf::from("/config"))?;
//! let ctx = AppContext::build(config, PathBuf::from("/data/state.json"))?;
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod metrics;
pub mod patterns;
pub mod reconcile;
pub mod retry;
pub mod scheduler;
pub mod state;
