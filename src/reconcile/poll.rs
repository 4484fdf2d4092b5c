// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Step 4: concurrently poll every configured proxy instance and fold the
//! routes each one reports into `state.domains[*].sources`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::adapters::proxy::Zone;
use crate::constants::MAX_CONCURRENT_POLLS;
use crate::context::AppContext;
use crate::metrics;
use crate::reconcile::exclusions::{self, Pattern};
use crate::state::{InstanceState, PersistedState, SourceEntry};

/// Per-instance outcome of one poll round: whether the poll succeeded, and
/// (if it did) the set of hostnames it reported after exclusion/zone
/// filtering. Step 5 (pruning) needs both.
pub struct PollSummary {
    pub success: BTreeMap<String, bool>,
    pub seen: BTreeMap<String, BTreeSet<String>>,
}

pub async fn run(ctx: &AppContext, state: &mut PersistedState, patterns: &[Pattern]) -> PollSummary {
    let instances = ctx.proxy.list_instances();
    let now = Utc::now().timestamp();

    let polled = stream::iter(instances)
        .map(|instance| async move {
            let result = ctx.proxy.list_routes(&instance).await;
            (instance, result)
        })
        .buffer_unordered(MAX_CONCURRENT_POLLS)
        .collect::<Vec<_>>()
        .await;

    let mut success = BTreeMap::new();
    let mut seen: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (instance, result) in polled {
        match result {
            Ok(routes) => {
                metrics::record_proxy_poll(&instance.name, "ok");
                let mut hostnames = BTreeSet::new();
                for route in routes {
                    if route.zone == Zone::External {
                        continue;
                    }
                    if exclusions::matches_any(patterns, &route.hostname) {
                        continue;
                    }
                    hostnames.insert(route.hostname.clone());
                    state
                        .domains
                        .entry(route.hostname.clone())
                        .or_default()
                        .sources
                        .insert(
                            instance.name.clone(),
                            SourceEntry {
                                answer: route.target_ip.clone(),
                                last_seen_epoch: now,
                            },
                        );
                }
                state.instances.insert(
                    instance.name.clone(),
                    InstanceState {
                        last_success_epoch: Some(now),
                        last_error: None,
                        url: instance.url.clone(),
                    },
                );
                success.insert(instance.name.clone(), true);
                seen.insert(instance.name.clone(), hostnames);
            }
            Err(err) => {
                metrics::record_proxy_poll(&instance.name, "error");
                warn!(
                    instance = %instance.name,
                    error = %err,
                    "proxy poll failed, preserving last known sources for this instance"
                );
                let previous_success = state
                    .instances
                    .get(&instance.name)
                    .and_then(|s| s.last_success_epoch);
                state.instances.insert(
                    instance.name.clone(),
                    InstanceState {
                        last_success_epoch: previous_success,
                        last_error: Some(err.to_string()),
                        url: instance.url.clone(),
                    },
                );
                success.insert(instance.name.clone(), false);
            }
        }
    }

    PollSummary { success, seen }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod poll_tests;
