// Copyright (c) 2026 Veris Systems. MIT License.
// See LICENSE for details.

//! # VERIS Registry Node
//!
//! Entry point for the `veris-node` binary. Parses CLI arguments,
//! initializes logging and metrics, constructs the in-process ledger with
//! the configured compliance posture, and serves the HTTP admin API plus
//! the Prometheus metrics endpoint.

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;

use veris_ledger::compliance::{CountryRestrictionRule, MaxBalanceRule, TransferLimitRule};
use veris_ledger::dividend::RecordingSink;
use veris_ledger::{IdentityDirectory, Ledger, LedgerConfig};

use cli::{Commands, VerisNodeCli};
use metrics::LedgerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VerisNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the registry node: ledger construction, API server, and
/// metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init("veris_node=info,veris_ledger=info,tower_http=debug", args.log_json);

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        network = %args.network,
        "starting veris-node"
    );

    // --- Ledger with configured compliance posture ---
    let mut ledger = Ledger::new(
        IdentityDirectory::new(),
        LedgerConfig {
            max_supply: args.max_supply,
        },
    );

    if !args.blocked_jurisdictions.is_empty() {
        tracing::info!(codes = ?args.blocked_jurisdictions, "installing country restriction");
        ledger
            .compliance_mut()
            .add_module(Box::new(CountryRestrictionRule::with_blocked(
                args.blocked_jurisdictions.iter().copied(),
            )));
    }
    if let Some(cap) = args.max_balance {
        tracing::info!(cap, "installing max-balance rule");
        ledger
            .compliance_mut()
            .add_module(Box::new(MaxBalanceRule::new(cap)));
    }
    if let (Some(daily), Some(monthly)) = (args.daily_limit, args.monthly_limit) {
        tracing::info!(daily, monthly, "installing transfer-limit rule");
        ledger
            .compliance_mut()
            .add_module(Box::new(TransferLimitRule::new(daily, monthly)));
    }

    // --- Metrics ---
    let ledger_metrics = Arc::new(LedgerMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (ledger {})",
            env!("CARGO_PKG_VERSION"),
            veris_ledger::config::LEDGER_VERSION,
        ),
        network: args.network.clone(),
        started_at: Utc::now(),
        ledger: Arc::new(RwLock::new(ledger)),
        treasury: Arc::new(RwLock::new(RecordingSink::new())),
        metrics: Arc::clone(&ledger_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&ledger_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("veris-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("veris-node  {}", env!("CARGO_PKG_VERSION"));
    println!("ledger core {}", veris_ledger::config::LEDGER_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
