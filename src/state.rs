// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The persisted reconciliation state: per-instance health, per-domain
//! source ownership, and the set of records this daemon is licensed to
//! mutate.
//!
//! `BTreeMap`/`BTreeSet` are used throughout rather than their hashed
//! counterparts specifically so `serde_json`'s default serialization order
//! (map iteration order) comes out already sorted, satisfying the
//! "deterministic, diffable writes" requirement without a manual sort pass.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{STATE_TMP_SUFFIX, STATE_VERSION};
use crate::errors::StateError;

/// Health and identity of one configured proxy instance, as last observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub last_success_epoch: Option<i64>,
    pub last_error: Option<String>,
    pub url: String,
}

/// One instance's claim on a domain: the answer it reported, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub answer: String,
    pub last_seen_epoch: i64,
}

/// A domain's current ownership set: which instances claim it and with what
/// answer. The key set of `sources` is the authoritative ownership set for
/// the hostname.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainState {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceEntry>,
}

/// The full on-disk reconciliation state document.
///
/// Fields are declared in alphabetical order deliberately: unlike the
/// `BTreeMap` fields inside it, a struct's field order is serde's
/// serialization order, and operator-facing diffs should be stable at the
/// top level too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub domains: BTreeMap<String, DomainState>,
    #[serde(default)]
    pub instances: BTreeMap<String, InstanceState>,
    /// Records this engine is licensed to mutate or delete, `domain -> answers`.
    #[serde(default)]
    pub managed_records: BTreeMap<String, BTreeSet<String>>,
    pub version: u32,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            instances: BTreeMap::new(),
            domains: BTreeMap::new(),
            managed_records: BTreeMap::new(),
        }
    }
}

/// Loads and atomically persists a [`PersistedState`] document.
pub struct StateStore;

impl StateStore {
    /// Load the document at `path`, or a fresh default if the file is
    /// missing or fails to parse. A parse failure is logged but never
    /// propagated — the engine proceeds as if starting fresh.
    pub fn load(path: &Path) -> PersistedState {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => return PersistedState::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "state file is corrupt, starting fresh");
                PersistedState::default()
            }
        }
    }

    /// Write `state` to `path` atomically: serialize to `{path}.tmp`, then
    /// rename over `path`. Parent directories are created if absent.
    pub fn save(path: &Path, state: &PersistedState) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(state).map_err(|source| StateError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(STATE_TMP_SUFFIX);
        let tmp_path = std::path::PathBuf::from(tmp_name);
        std::fs::write(&tmp_path, json).map_err(|source| StateError::Io {
            path: tmp_path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|source| StateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
