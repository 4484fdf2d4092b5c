// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Drives the reconciler on a timer, watches the configuration path for
//! changes, and honors a shared shutdown signal.
//!
//! `once` mode runs a single cycle and returns. `watch` mode repeats until
//! the cancellation token fires, re-checking the configuration file set
//! before every cycle after the first so an edited config takes effect
//! without a restart.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, SyncMode};
use crate::constants::MIN_POLL_INTERVAL_SECS;
use crate::context::AppContext;
use crate::errors::ConfigError;
use crate::reconcile::{persist, CycleOutcome, Reconciler};
use crate::state::{PersistedState, StateStore};

/// `(file path, last-modified time)` for every config file currently in
/// effect. Comparing two snapshots is how a config-directory edit is
/// detected between cycles.
type ConfigSnapshot = Vec<(PathBuf, SystemTime)>;

/// Load configuration and wire a fresh [`AppContext`] from it. Used both
/// for the initial bootstrap and for a watch-mode reload.
pub fn build_context(config_path: &Path, state_path: PathBuf) -> anyhow::Result<AppContext> {
    let config = Config::load(config_path)?;
    AppContext::build(config, state_path)
}

fn snapshot_config_files(config_path: &Path) -> Result<ConfigSnapshot, ConfigError> {
    let files = if config_path.is_dir() {
        crate::config::find_config_files(config_path)?
    } else {
        vec![config_path.to_path_buf()]
    };

    files
        .into_iter()
        .map(|file| {
            let mtime = std::fs::metadata(&file)
                .and_then(|meta| meta.modified())
                .map_err(|err| ConfigError::Parse {
                    path: file.display().to_string(),
                    reason: err.to_string(),
                })?;
            Ok((file, mtime))
        })
        .collect()
}

fn poll_interval(config: &Config) -> Duration {
    Duration::from_secs(config.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
}

/// Run one cycle, catching a panic so a bug in the reconciler costs one
/// lost cycle instead of the whole daemon.
async fn run_cycle_guarded(reconciler: &mut Reconciler, ctx: &AppContext, state: &mut PersistedState) -> CycleOutcome {
    match AssertUnwindSafe(reconciler.run_cycle(ctx, state)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!("reconciliation cycle panicked, skipping to the next cycle");
            CycleOutcome::Partial
        }
    }
}

/// Run the scheduler loop. `config_path`/`state_path` are the paths the
/// daemon was started with; `mode` is the already-resolved CLI/config
/// sync mode. Returns once `once` mode's single cycle completes, or once
/// `cancel` fires in `watch` mode.
pub async fn run(
    config_path: PathBuf,
    state_path: PathBuf,
    mode: SyncMode,
    mut ctx: AppContext,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut state = StateStore::load(&state_path);
    let mut reconciler = Reconciler::new();
    let mut snapshot = snapshot_config_files(&config_path).unwrap_or_default();
    let mut first = true;

    loop {
        if !first {
            match snapshot_config_files(&config_path) {
                Ok(current) if current != snapshot => {
                    info!("configuration changed, reloading before this cycle");
                    match build_context(&config_path, state_path.clone()) {
                        Ok(new_ctx) => {
                            ctx = new_ctx;
                            snapshot = current;
                        }
                        Err(err) => {
                            warn!(error = %err, "config reload failed, keeping previous configuration");
                        }
                    }
                }
                Ok(current) => snapshot = current,
                Err(err) => warn!(error = %err, "failed to check configuration files for changes"),
            }
        }
        first = false;

        let outcome = run_cycle_guarded(&mut reconciler, &ctx, &mut state).await;
        if let Err(err) = persist::run(&state_path, &state) {
            error!(error = %err, "failed to persist state after cycle");
        }
        info!(outcome = ?outcome, "reconciliation cycle complete");

        if matches!(mode, SyncMode::Once) {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Ok(());
        }

        tokio::select! {
            () = tokio::time::sleep(poll_interval(&ctx.config)) => {}
            () = cancel.cancelled() => return Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod scheduler_tests;
