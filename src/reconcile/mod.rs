// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The reconciliation engine. A [`Reconciler`] drives one cycle at a time
//! through the ten ordered steps described in the component design: load,
//! first-cycle cleanup, static rewrites, proxy polling, pruning, desired-set
//! computation, and applying exclusions/creates/updates/deletes against the
//! resolver. Persisting the result (Step 10) is the caller's job — the
//! scheduler always saves, cycle outcome notwithstanding.

pub mod apply;
pub mod bootstrap_cleanup;
pub mod desired;
pub mod exclusions;
pub mod persist;
pub mod poll;
pub mod prune;
pub mod static_rewrites;

#[cfg(test)]
pub(crate) mod test_support;

use std::time::Instant;

use crate::context::AppContext;
use crate::metrics;
use crate::state::PersistedState;

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every step completed without an unrecovered failure.
    Success,
    /// At least one DNS mutation failed, or Step 7-9 was skipped entirely
    /// because the resolver's record list could not be fetched.
    Partial,
}

impl CycleOutcome {
    fn label(self) -> &'static str {
        match self {
            CycleOutcome::Success => "success",
            CycleOutcome::Partial => "partial",
        }
    }
}

/// Drives reconciliation cycles against a [`PersistedState`] owned by the
/// caller for the cycle's duration.
pub struct Reconciler {
    first_cycle: bool,
}

impl Reconciler {
    /// Construct a reconciler for a fresh process lifetime. The first call
    /// to [`run_cycle`](Self::run_cycle) performs the one-time instance
    /// cleanup pass (Step 2); every subsequent call skips it.
    #[must_use]
    pub fn new() -> Self {
        Self { first_cycle: true }
    }

    /// Run one full reconciliation cycle against `state`, in place.
    pub async fn run_cycle(&mut self, ctx: &AppContext, state: &mut PersistedState) -> CycleOutcome {
        let started = Instant::now();
        let outcome = self.run_cycle_inner(ctx, state).await;
        metrics::record_cycle(outcome.label(), started.elapsed());
        outcome
    }

    async fn run_cycle_inner(&mut self, ctx: &AppContext, state: &mut PersistedState) -> CycleOutcome {
        if self.first_cycle {
            bootstrap_cleanup::run(ctx, state).await;
            self.first_cycle = false;
        }

        static_rewrites::run(ctx, state).await;

        let patterns = exclusions::compile_exclusions(&ctx.config.exclude_domains);

        let poll_summary = poll::run(ctx, state, &patterns).await;
        let orphaned = prune::run(ctx, state, &poll_summary);
        let desired = desired::compute(ctx, state);

        apply::run(ctx, state, &desired, &orphaned, &patterns).await
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}
