// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 3: reconcile configured static rewrites against the resolver's
//! current records, independently of anything a proxy instance reports.

use std::collections::BTreeMap;

use tracing::warn;

use crate::context::AppContext;
use crate::metrics;
use crate::state::PersistedState;

/// Add, adopt, or rotate each configured static rewrite. A static rewrite
/// that collides with an unmanaged resolver answer is logged and left
/// alone rather than overwritten.
pub async fn run(ctx: &AppContext, state: &mut PersistedState) {
    if ctx.config.static_rewrites.is_empty() {
        return;
    }

    let records = match ctx.dns.list().await {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "failed to list resolver records, skipping static rewrite reconciliation");
            return;
        }
    };
    let mut by_domain: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for record in records {
        by_domain.entry(record.domain).or_default().push(record.answer);
    }

    for (domain, desired_answer) in &ctx.config.static_rewrites {
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
                    metrics::record_dns_operation("add", "error");
                    warn!(domain = %domain, answer = %desired_answer, error = %err, "failed to add static rewrite");
                }
            }
            continue;
        }

        if existing.iter().any(|answer| answer == desired_answer) {
            state
                .managed_records
                .entry(domain.clone())
                .or_default()
                .insert(desired_answer.clone());
            continue;
        }

        let already_managed = state
            .managed_records
            .get(domain.as_str())
            .cloned()
            .unwrap_or_default();
        let stale_managed: Vec<String> = existing
            .iter()
            .filter(|answer| already_managed.contains(answer.as_str()))
            .cloned()
            .collect();
        if stale_managed.is_empty() {
            warn!(
                domain = %domain,
                desired = %desired_answer,
                existing = ?existing,
                "static rewrite conflicts with an unmanaged resolver record, skipping"
            );
            continue;
        }

        let managed = state.managed_records.entry(domain.clone()).or_default();
        for old_answer in &stale_managed {
            match ctx.dns.update(domain, old_answer, desired_answer).await {
                Ok(()) => {
                    metrics::record_dns_operation("update", "ok");
                    managed.remove(old_answer);
                }
                Err(err) => {
                    metrics::record_dns_operation("update", "error");
                    warn!(
                        domain = %domain,
                        old_answer = %old_answer,
                        new_answer = %desired_answer,
                        error = %err,
                        "failed to rotate static rewrite"
                    );
                }
            }
        }
        managed.insert(desired_answer.clone());
    }
}

#[cfg(test)]
#[path = "static_rewrites_tests.rs"]
mod static_rewrites_tests;
