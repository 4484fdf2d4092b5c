// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 2: first-cycle-only cleanup of domains abandoned by a proxy
//! instance that has since been renamed or removed from configuration.

use std::collections::BTreeSet;

use tracing::warn;

use crate::context::AppContext;
use crate::state::PersistedState;

/// Delete every managed answer for a domain whose `sources` map contained
/// only instances no longer present in configuration, and erase its state
/// entry. Domains backed by a static rewrite are left alone: those are
/// reconciled separately and never depend on `sources`.
pub async fn run(ctx: &AppContext, state: &mut PersistedState) {
    let configured: BTreeSet<String> = ctx
        .proxy
        .list_instances()
        .into_iter()
        .map(|instance| instance.name)
        .collect();

    let removed: BTreeSet<String> = state
        .instances
        .keys()
        .filter(|name| !configured.contains(*name))
        .cloned()
        .collect();
    if removed.is_empty() {
        return;
    }

    let stale_domains: Vec<String> = state
        .domains
        .iter()
        .filter(|(domain, domain_state)| {
            !domain_state.sources.is_empty()
                && domain_state.sources.keys().all(|name| removed.contains(name))
                && !ctx.config.static_rewrites.contains_key(domain.as_str())
        })
        .map(|(domain, _)| domain.clone())
        .collect();

    for domain in &stale_domains {
        if let Some(answers) = state.managed_records.remove(domain) {
            for answer in answers {
                if let Err(err) = ctx.dns.delete(domain, &answer).await {
                    warn!(
                        domain = %domain,
                        answer = %answer,
                        error = %err,
                        "failed to delete abandoned record during instance cleanup"
                    );
                }
            }
        }
        state.domains.remove(domain);
    }

    for name in &removed {
        state.instances.remove(name);
    }
}

#[cfg(test)]
#[path = "bootstrap_cleanup_tests.rs"]
mod bootstrap_cleanup_tests;
