// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Steps 7-9: reconcile the resolver's actual record list against
//! exclusions, the desired set, and the domains orphaned by Step 5 — the
//! only part of a cycle that issues DNS mutations.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::context::AppContext;
use crate::metrics;
use crate::reconcile::exclusions::{self, Pattern};
use crate::reconcile::CycleOutcome;
use crate::state::PersistedState;

/// Apply exclusion cleanup, then creates/updates for the desired set, then
/// deletions for orphaned domains. Returns [`CycleOutcome::Partial`] if a
/// resolver `list()` failure short-circuited the whole step, or if any
/// individual mutation failed; [`CycleOutcome::Success`] otherwise.
pub async fn run(
    ctx: &AppContext,
    state: &mut PersistedState,
    desired: &BTreeMap<String, String>,
    orphaned: &[String],
    patterns: &[Pattern],
) -> CycleOutcome {
    let records = match ctx.dns.list().await {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "failed to list resolver records, refusing to mutate without an accurate picture");
            return CycleOutcome::Partial;
        }
    };

    let mut by_domain: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in records {
        by_domain.entry(record.domain).or_default().insert(record.answer);
    }

    let mut had_failure = false;

    apply_exclusions(ctx, state, &mut by_domain, patterns, &mut had_failure).await;
    apply_creates_and_updates(ctx, state, desired, &by_domain, &mut had_failure).await;
    apply_deletions(ctx, state, orphaned, &mut had_failure).await;

    if had_failure {
        CycleOutcome::Partial
    } else {
        CycleOutcome::Success
    }
}

/// Step 7: delete every managed answer for a domain that matches an
/// exclusion pattern and is not also a static rewrite, and drop it from
/// both state and the working record map.
async fn apply_exclusions(
    ctx: &AppContext,
    state: &mut PersistedState,
    by_domain: &mut BTreeMap<String, BTreeSet<String>>,
    patterns: &[Pattern],
    had_failure: &mut bool,
) {
    let excluded: Vec<String> = by_domain
        .keys()
        .filter(|domain| {
            exclusions::matches_any(patterns, domain) && !ctx.config.static_rewrites.contains_key(domain.as_str())
        })
        .cloned()
        .collect();

    for domain in &excluded {
        let managed = state.managed_records.remove(domain).unwrap_or_default();
        for answer in &managed {
            match ctx.dns.delete(domain, answer).await {
                Ok(()) => metrics::record_dns_operation("delete", "ok"),
                Err(err) => {
                    *had_failure = true;
                    metrics::record_dns_operation("delete", "error");
                    warn!(domain = %domain, answer = %answer, error = %err, "failed to delete excluded record");
                }
            }
        }
        state.domains.remove(domain);
        by_domain.remove(domain);
    }
}

/// Step 8: for each `(domain, desired_answer)`, reconcile the resolver's
/// existing answers for that domain down to exactly the desired one.
async fn apply_creates_and_updates(
    ctx: &AppContext,
    state: &mut PersistedState,
    desired: &BTreeMap<String, String>,
    by_domain: &BTreeMap<String, BTreeSet<String>>,
    had_failure: &mut bool,
) {
    for (domain, desired_answer) in desired {
        let existing = by_domain.get(domain.as_str()).cloned().unwrap_or_default();

        if existing.is_empty() {
            match ctx.dns.add(domain, desired_answer).await {
                Ok(()) => {
                    metrics::record_dns_operation("add", "ok");
                    state
                        .managed_records
                        .entry(domain.clone())
                        .or_default()
                        .insert(desired_answer.clone());
                }
                Err(err) => {
                    *had_failure = true;
                    metrics::record_dns_operation("add", "error");
                    warn!(domain = %domain, answer = %desired_answer, error = %err, "failed to add record");
                }
            }
            continue;
        }

        if existing.len() == 1 && existing.contains(desired_answer) {
            state
                .managed_records
                .entry(domain.clone())
                .or_default()
                .insert(desired_answer.clone());
            continue;
        }

        let already_managed = state.managed_records.get(domain.as_str()).cloned().unwrap_or_default();
        let managed_existing: BTreeSet<String> = existing
            .iter()
            .filter(|answer| already_managed.contains(answer.as_str()))
            .cloned()
            .collect();
        let unmanaged_existing: BTreeSet<String> = existing.difference(&managed_existing).cloned().collect();

        if !unmanaged_existing.is_empty() && unmanaged_existing.contains(desired_answer) {
            state
                .managed_records
                .entry(domain.clone())
                .or_default()
                .insert(desired_answer.clone());
            delete_stale(ctx, state, domain, &managed_existing, had_failure).await;
        } else if !unmanaged_existing.is_empty() {
            warn!(
                domain = %domain,
                desired = %desired_answer,
                existing = ?existing,
                "desired answer conflicts with an operator-owned record, not writing"
            );
            delete_stale(ctx, state, domain, &managed_existing, had_failure).await;
        } else {
            delete_stale(ctx, state, domain, &managed_existing, had_failure).await;
            match ctx.dns.add(domain, desired_answer).await {
                Ok(()) => {
                    metrics::record_dns_operation("add", "ok");
                    state
                        .managed_records
                        .entry(domain.clone())
                        .or_default()
                        .insert(desired_answer.clone());
                }
                Err(err) => {
                    *had_failure = true;
                    metrics::record_dns_operation("add", "error");
                    warn!(domain = %domain, answer = %desired_answer, error = %err, "failed to add rotated record");
                }
            }
        }
    }
}

async fn delete_stale(
    ctx: &AppContext,
    state: &mut PersistedState,
    domain: &str,
    stale: &BTreeSet<String>,
    had_failure: &mut bool,
) {
    for answer in stale {
        match ctx.dns.delete(domain, answer).await {
            Ok(()) => {
                metrics::record_dns_operation("delete", "ok");
                if let Some(managed) = state.managed_records.get_mut(domain) {
                    managed.remove(answer);
                }
            }
            Err(err) => {
                *had_failure = true;
                metrics::record_dns_operation("delete", "error");
                warn!(domain = %domain, answer = %answer, error = %err, "failed to delete stale managed record");
            }
        }
    }
}

/// Step 9: delete every managed answer for a domain Step 5 found with no
/// remaining sources, unless it is a static rewrite (those are reconciled
/// independently and never depend on proxy observation).
async fn apply_deletions(ctx: &AppContext, state: &mut PersistedState, orphaned: &[String], had_failure: &mut bool) {
    for domain in orphaned {
        if ctx.config.static_rewrites.contains_key(domain.as_str()) {
            continue;
        }
        if let Some(managed) = state.managed_records.remove(domain) {
            for answer in managed {
                match ctx.dns.delete(domain, &answer).await {
                    Ok(()) => metrics::record_dns_operation("delete", "ok"),
                    Err(err) => {
                        *had_failure = true;
                        metrics::record_dns_operation("delete", "error");
                        warn!(domain = %domain, answer = %answer, error = %err, "failed to delete orphaned record");
                    }
                }
            }
        }
        state.domains.remove(domain);
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod apply_tests;
