// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dnsync::config::{Config, SyncMode};
use dnsync::constants::{DEFAULT_CONFIG_PATH, DEFAULT_STATE_PATH, TOKIO_WORKER_THREADS};
use dnsync::scheduler;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Reconciles Traefik-discovered routes into AdGuard Home DNS rewrites.
#[derive(Debug, Parser)]
#[command(name = "dnsync", version, about)]
struct Cli {
    /// Configuration file or directory.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Persisted state file.
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Run a single reconciliation cycle and exit, overriding `settings.sync_mode`.
    #[arg(long, conflicts_with = "watch")]
    once: bool,

    /// Run continuously until a shutdown signal, overriding `settings.sync_mode`.
    #[arg(long, conflicts_with = "once")]
    watch: bool,

    /// Increase log verbosity. Ignored if `RUST_LOG` is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("dnsync-worker")
        .enable_all()
        .build()?;

    let exit_code = runtime.block_on(async_main());
    std::process::exit(exit_code);
}

/// Initialize logging.
///
/// Respects the `RUST_LOG` environment variable if set, otherwise derives a
/// level from `-v`/`--verbose`. Respects `RUST_LOG_FORMAT` (`json` or `text`,
/// default `text`) for output format.
fn initialize_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting dnsync reconciler");
}

fn resolve_sync_mode(cli: &Cli, configured: SyncMode) -> SyncMode {
    if cli.once {
        SyncMode::Once
    } else if cli.watch {
        SyncMode::Watch
    } else {
        configured
    }
}

async fn async_main() -> i32 {
    let cli = Cli::parse();
    initialize_logging(cli.verbose);

    let ctx = match scheduler::build_context(&cli.config, cli.state.clone()) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!(error = %err, "configuration failed to load or validate");
            return 1;
        }
    };

    if !ctx.dns.test_connection().await {
        error!(provider = ctx.dns.name(), "DNS provider is unreachable at startup");
        return 1;
    }
    if ctx.proxy.list_instances().is_empty() {
        error!("no usable proxy instances configured");
        return 1;
    }

    let mode = resolve_sync_mode(&cli, ctx.config.sync_mode);
    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();

    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received, finishing the current cycle");
        shutdown_cancel.cancel();
    });

    match scheduler::run(cli.config, cli.state, mode, ctx, cancel).await {
        Ok(()) => {
            info!("dnsync exiting cleanly");
            0
        }
        Err(err) => {
            error!(error = %err, "dnsync exiting after an unrecoverable error");
            1
        }
    }
}

/// Wait for either SIGINT or SIGTERM.
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
