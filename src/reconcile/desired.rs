// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 6: compute the desired `domain -> answer` set from each domain's
//! remaining sources, breaking multi-instance conflicts by configured
//! instance order.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::context::AppContext;
use crate::state::PersistedState;

/// For every domain with at least one source, pick the answer reported by
/// the first configured instance that claims it. A domain whose surviving
/// sources belong only to instances no longer in configuration (kept by
/// Step 5's failure-preservation rule) falls back to an arbitrary source
/// rather than being dropped from the desired set.
pub fn compute(ctx: &AppContext, state: &PersistedState) -> BTreeMap<String, String> {
    let order: Vec<String> = ctx
        .proxy
        .list_instances()
        .into_iter()
        .map(|instance| instance.name)
        .collect();

    let mut desired = BTreeMap::new();
    for (domain, domain_state) in &state.domains {
        if domain_state.sources.is_empty() {
            continue;
        }

        let distinct: BTreeSet<&str> = domain_state
            .sources
            .values()
            .map(|entry| entry.answer.as_str())
            .collect();

        let chosen = order
            .iter()
            .find_map(|name| domain_state.sources.get(name))
            .map(|entry| entry.answer.as_str())
            .or_else(|| domain_state.sources.values().next().map(|entry| entry.answer.as_str()));

        let Some(chosen) = chosen else { continue };

        if distinct.len() > 1 {
            warn!(
                domain = %domain,
                answers = ?distinct,
                chosen = %chosen,
                "sources disagree on answer, using configured instance order to break the tie"
            );
        }

        desired.insert(domain.clone(), chosen.to_string());
    }
    desired
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
