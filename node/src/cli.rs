//! # CLI Interface
//!
//! Defines the command-line argument structure for `burst-node` using
//! `clap` derive. Every subcommand works against a chain snapshot file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Burst-lineage node tooling.
///
/// Creates and inspects chain snapshots, selects Economic Clustering anchors
/// and checks transactions against the local view of the chain.
#[derive(Parser, Debug)]
#[command(
    name = "burst-node",
    about = "Burst-lineage node: Economic Clustering tooling",
    version,
    propagate_version = true
)]
pub struct BurstNodeCli {
    /// Chain snapshot file (JSON).
    #[arg(
        long,
        short = 'c',
        env = "BURST_CHAIN",
        default_value = "chain.json",
        global = true
    )]
    pub chain: PathBuf,

    /// Economic Clustering parameters (JSON). Missing fields take mainnet values.
    #[arg(long, short = 'p', env = "BURST_PARAMS", global = true)]
    pub params: Option<PathBuf>,

    /// Log format: "pretty" or "json".
    #[arg(long, env = "BURST_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Print Prometheus metrics to stdout before exiting.
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forge a signed demo chain, write it with a forger key and two sample
    /// transactions.
    Init(InitArgs),
    /// Print a summary of the chain snapshot.
    Status(StatusArgs),
    /// Print the Economic Clustering anchor for a timestamp.
    Anchor(AnchorArgs),
    /// Check transactions against the chain's Economic Clustering rule.
    Verify(VerifyArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Number of blocks to forge on top of genesis.
    #[arg(long, short = 'n', default_value_t = 120)]
    pub blocks: u64,

    /// Network to tag the snapshot with: mainnet, testnet, or devnet.
    #[arg(long, default_value = "devnet")]
    pub network: String,

    /// Overwrite an existing snapshot.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Emit the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `anchor` subcommand.
#[derive(Parser, Debug)]
pub struct AnchorArgs {
    /// Chain timestamp (seconds since the epoch) to select for.
    /// Defaults to the tip's timestamp.
    #[arg(long, short = 't')]
    pub timestamp: Option<u32>,
}

/// Arguments for the `verify` subcommand.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Transaction files (JSON), one transaction each.
    #[arg(long = "tx", required = true, num_args = 1..)]
    pub transactions: Vec<PathBuf>,
}
