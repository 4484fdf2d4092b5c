// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 10: persist the cycle's resulting state, and sample the managed
//! record gauge for observability while it's in hand.

use crate::errors::StateError;
use crate::metrics;
use crate::state::{PersistedState, StateStore};
use std::path::Path;

/// Write `state` to `path` and refresh the per-domain managed-record gauge.
pub fn run(path: &Path, state: &PersistedState) -> Result<(), StateError> {
    for (domain, answers) in &state.managed_records {
        metrics::set_managed_records(domain, answers.len());
    }
    StateStore::save(path, state)
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod persist_tests;
