//! # CLI Interface
//!
//! Defines the command-line argument structure for `veris-node` using
//! `clap` derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};

/// VERIS registry node.
///
/// Hosts a single in-process compliance-gated ledger and exposes it over
/// an HTTP admin/observation surface plus a Prometheus metrics endpoint.
/// Callers are trusted to present their capability class; real
/// authentication sits in front of this node.
#[derive(Parser, Debug)]
#[command(
    name = "veris-node",
    about = "VERIS compliance-gated ledger node",
    version,
    propagate_version = true
)]
pub struct VerisNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the VERIS node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP admin/observation API.
    #[arg(long, env = "VERIS_API_PORT", default_value_t = 8641)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "VERIS_METRICS_PORT", default_value_t = 8642)]
    pub metrics_port: u16,

    /// Network label reported by `/status` (e.g., "sandbox", "production").
    #[arg(long, env = "VERIS_NETWORK", default_value = "sandbox")]
    pub network: String,

    /// Hard cap on total supply. Unset means only u64 bounds apply.
    #[arg(long, env = "VERIS_MAX_SUPPLY")]
    pub max_supply: Option<u64>,

    /// Per-holder balance cap. Installs the max-balance module at startup.
    #[arg(long, env = "VERIS_MAX_BALANCE")]
    pub max_balance: Option<u64>,

    /// Comma-separated ISO 3166-1 numeric jurisdiction codes to block.
    /// Installs the country-restriction module at startup.
    #[arg(long, env = "VERIS_BLOCKED_JURISDICTIONS", value_delimiter = ',')]
    pub blocked_jurisdictions: Vec<u16>,

    /// Per-sender daily transfer allowance. Requires --monthly-limit;
    /// installs the transfer-limit module at startup.
    #[arg(long, env = "VERIS_DAILY_LIMIT", requires = "monthly_limit")]
    pub daily_limit: Option<u64>,

    /// Per-sender monthly transfer allowance.
    #[arg(long, env = "VERIS_MONTHLY_LIMIT", requires = "daily_limit")]
    pub monthly_limit: Option<u64>,

    /// Emit logs as JSON lines instead of pretty-printed text.
    #[arg(long, env = "VERIS_LOG_JSON")]
    pub log_json: bool,
}
