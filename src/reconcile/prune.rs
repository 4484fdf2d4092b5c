// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 5: drop a `(domain, instance)` source claim once the instance has
//! authoritatively stopped reporting it. A domain left with no sources at
//! all becomes "orphaned" for Step 9 to delete.

use std::collections::BTreeSet;

use crate::context::AppContext;
use crate::reconcile::poll::PollSummary;
use crate::state::PersistedState;

/// Returns the domains whose `sources` map became empty as a result of
/// this prune pass, sorted for deterministic downstream processing.
pub fn run(ctx: &AppContext, state: &mut PersistedState, summary: &PollSummary) -> Vec<String> {
    let configured: BTreeSet<String> = ctx
        .proxy
        .list_instances()
        .into_iter()
        .map(|instance| instance.name)
        .collect();

    let mut orphaned = Vec::new();
    for (domain, domain_state) in state.domains.iter_mut() {
        domain_state.sources.retain(|instance_name, _| {
            let instance_withdrew = configured.contains(instance_name)
                && summary.success.get(instance_name).copied().unwrap_or(false)
                && !summary
                    .seen
                    .get(instance_name)
                    .is_some_and(|seen| seen.contains(domain));
            !instance_withdrew
        });
        if domain_state.sources.is_empty() {
            orphaned.push(domain.clone());
        }
    }
    orphaned.sort();
    orphaned
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod prune_tests;
