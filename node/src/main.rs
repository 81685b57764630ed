// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Burst Node
//!
//! Entry point for the `burst-node` binary. Parses CLI arguments,
//! initializes logging and metrics, loads the chain snapshot and runs one
//! subcommand against it:
//!
//! - `init`    — forge a demo chain, its forger key and sample transactions
//! - `status`  — summarize the chain snapshot
//! - `anchor`  — print the EC anchor for a timestamp
//! - `verify`  — check transaction files against the EC rule
//! - `version` — print build version information

mod cli;
mod demo;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use burst_protocol::config::{epoch_to_datetime, network_name, EcParams};
use burst_protocol::consensus::{Collaborators, EconomicClustering, Era, Feature, FeatureToggle};
use burst_protocol::crypto::keys::BurstKeypair;
use burst_protocol::storage::{Block, Chain, ChainFile, MemoryChain};
use burst_protocol::transaction::Transaction;

use cli::{BurstNodeCli, Commands};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = BurstNodeCli::parse();
    logging::init_logging(
        "burst_node=info,burst_protocol=warn",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    match &cli.command {
        Commands::Init(args) => init_chain(&cli, args)?,
        Commands::Status(args) => show_status(&cli, args, &metrics)?,
        Commands::Anchor(args) => show_anchor(&cli, args, &metrics)?,
        Commands::Verify(args) => verify_transactions(&cli, args, Arc::clone(&metrics)).await?,
        Commands::Version => print_version(),
    }

    if cli.metrics {
        print!("{}", metrics.encode().context("failed to encode metrics")?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A chain snapshot with Economic Clustering wired over it.
struct LoadedChain {
    chain: Arc<MemoryChain>,
    network_id: u32,
    ec: Arc<EconomicClustering>,
}

impl LoadedChain {
    fn open(cli: &BurstNodeCli, metrics: &NodeMetrics) -> Result<Self> {
        let file = ChainFile::load(&cli.chain)
            .with_context(|| format!("failed to read chain snapshot {}", cli.chain.display()))?;
        let network_id = file.network_id;
        let chain = Arc::new(
            file.into_chain()
                .with_context(|| format!("chain snapshot {} is invalid", cli.chain.display()))?,
        );
        let ec = Arc::new(build_ec(Arc::clone(&chain), network_id, cli.params.as_deref())?);

        metrics.chain_height.set(chain.height() as i64);
        tracing::info!(
            path = %cli.chain.display(),
            network = %network_name(network_id),
            height = chain.height(),
            "chain loaded"
        );
        Ok(Self {
            chain,
            network_id,
            ec,
        })
    }
}

fn load_params(path: Option<&Path>) -> Result<EcParams> {
    let Some(path) = path else {
        return Ok(EcParams::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read params file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("params file {} is not valid JSON", path.display()))
}

fn build_ec(
    chain: Arc<MemoryChain>,
    network_id: u32,
    params_path: Option<&Path>,
) -> Result<EconomicClustering> {
    let params = load_params(params_path)?;
    let collaborators = Collaborators::new(chain).features(demo::features_for(network_id));
    EconomicClustering::new(collaborators, params).context("invalid EC parameters")
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init_chain(cli: &BurstNodeCli, args: &cli::InitArgs) -> Result<()> {
    if cli.chain.exists() && !args.force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            cli.chain.display()
        );
    }
    let network_id = demo::network_id(&args.network)?;
    let out_dir = cli
        .chain
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.display()))?;

    let forger = BurstKeypair::generate();
    let payer = BurstKeypair::generate();
    let chain = Arc::new(demo::forge_chain(args.blocks, &forger, &payer)?);

    ChainFile::from_chain(&chain, network_id)
        .save(&cli.chain)
        .with_context(|| format!("failed to write chain snapshot {}", cli.chain.display()))?;

    let key_path = cli.chain.with_extension("key");
    write_secret_key(&key_path, &forger)?;

    let ec = build_ec(Arc::clone(&chain), network_id, cli.params.as_deref())?;
    let (honest, forked) = demo::sample_transactions(&chain, &ec, &payer)?;
    let honest_path = out_dir.join("tx-honest.json");
    let forked_path = out_dir.join("tx-forked.json");
    write_transaction(&honest_path, &honest)?;
    write_transaction(&forked_path, &forked)?;

    println!("Chain initialized.");
    println!("  Snapshot      : {}", cli.chain.display());
    println!("  Network       : {}", network_name(network_id));
    println!("  Height        : {}", chain.height());
    println!("  Forger key    : {}", key_path.display());
    println!("  Forger pubkey : {}", forger.public_key().to_hex());
    println!("  Sample txs    : {}", honest_path.display());
    println!("                  {}", forked_path.display());

    Ok(())
}

fn write_secret_key(path: &Path, keypair: &BurstKeypair) -> Result<()> {
    std::fs::write(path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write key to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn write_transaction(path: &Path, tx: &Transaction) -> Result<()> {
    let json = serde_json::to_string_pretty(tx)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn read_transaction(path: &Path) -> Result<Transaction> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transaction {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a transaction", path.display()))
}

// ---------------------------------------------------------------------------
// status / anchor
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct StatusReport {
    network: String,
    height: u64,
    tip_id: String,
    tip_timestamp: u32,
    tip_time: String,
    cumulative_difficulty: String,
    era: String,
    ec_active: bool,
    anchor_height: Option<u64>,
    anchor_id: Option<String>,
}

fn status_report(loaded: &LoadedChain) -> Result<StatusReport> {
    let tip = loaded.chain.tip().context("chain is empty")?;
    let features = demo::features_for(loaded.network_id);
    let anchor = status_anchor(&loaded.ec, tip.timestamp);

    Ok(StatusReport {
        network: network_name(loaded.network_id),
        height: tip.height,
        tip_id: tip.string_id(),
        tip_timestamp: tip.timestamp,
        tip_time: epoch_to_datetime(tip.timestamp).to_rfc3339(),
        cumulative_difficulty: tip.cumulative_difficulty.to_string(),
        era: match loaded.ec.era(tip.height) {
            Era::Legacy => "legacy".to_string(),
            Era::Modern => "modern".to_string(),
        },
        ec_active: features.is_active(Feature::EconomicClustering, tip.height),
        anchor_height: anchor.as_ref().map(|b| b.height),
        anchor_id: anchor.as_ref().map(|b| b.string_id()),
    })
}

/// The anchor for `timestamp`, or `None` with a warning when selection fails
/// (a snapshot with a broken link, or a timestamp behind the tip).
fn status_anchor(ec: &EconomicClustering, timestamp: u32) -> Option<Arc<Block>> {
    match ec.select_anchor(timestamp) {
        Ok(anchor) => Some(anchor),
        Err(e) => {
            tracing::warn!(timestamp, error = %e, "anchor selection failed");
            None
        }
    }
}

fn show_status(cli: &BurstNodeCli, args: &cli::StatusArgs, metrics: &NodeMetrics) -> Result<()> {
    let loaded = LoadedChain::open(cli, metrics)?;
    let report = status_report(&loaded)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Network               : {}", report.network);
    println!("Height                : {}", report.height);
    println!("Tip id                : {}", report.tip_id);
    println!("Tip time              : {} ({})", report.tip_time, report.tip_timestamp);
    println!("Cumulative difficulty : {}", report.cumulative_difficulty);
    println!("EC era                : {}", report.era);
    println!("EC active             : {}", report.ec_active);
    if let (Some(height), Some(id)) = (report.anchor_height, &report.anchor_id) {
        println!("EC anchor at tip time : {} ({})", height, id);
    }
    Ok(())
}

fn show_anchor(cli: &BurstNodeCli, args: &cli::AnchorArgs, metrics: &NodeMetrics) -> Result<()> {
    let loaded = LoadedChain::open(cli, metrics)?;
    let timestamp = match args.timestamp {
        Some(ts) => ts,
        None => loaded.chain.tip().context("chain is empty")?.timestamp,
    };

    let anchor = loaded.ec.select_anchor(timestamp)?;
    metrics.ec_anchor_selections_total.inc();

    println!("timestamp={}", timestamp);
    println!("ec_block_height={}", anchor.height);
    println!("ec_block_id={}", anchor.string_id());
    Ok(())
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

/// Verifies each transaction on the blocking pool. The walk is synchronous
/// and CPU-bound, so it never runs on an async worker.
async fn verify_transactions(
    cli: &BurstNodeCli,
    args: &cli::VerifyArgs,
    metrics: Arc<NodeMetrics>,
) -> Result<()> {
    let loaded = LoadedChain::open(cli, &metrics)?;

    let mut handles = Vec::with_capacity(args.transactions.len());
    for path in &args.transactions {
        let tx = read_transaction(path)?;
        let ec = Arc::clone(&loaded.ec);
        let metrics = Arc::clone(&metrics);
        let handle = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let accepted = ec.verify_fork(&tx);
            metrics.observe_verification(accepted, started.elapsed().as_secs_f64());
            (tx.string_id(), accepted)
        });
        handles.push((path, handle));
    }

    let mut rejected = 0usize;
    for (path, handle) in handles {
        let (id, accepted) = handle.await.context("verification task failed")?;
        if !accepted {
            rejected += 1;
        }
        println!(
            "{}\t{}\t{}",
            path.display(),
            id,
            if accepted { "accept" } else { "reject" }
        );
    }

    tracing::info!(
        total = args.transactions.len(),
        rejected,
        "verification finished"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// version
// ---------------------------------------------------------------------------

fn print_version() {
    println!("burst-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", burst_protocol::config::PROTOCOL_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
