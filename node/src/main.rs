// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MHChain Node
//!
//! Entry point for the `mhchain-node` binary. Parses CLI arguments,
//! initializes logging, and drives the ledger stored under the data
//! directory.
//!
//! - `init`    — create the store and write the genesis block
//! - `append`  — append one block
//! - `verify`  — verify the stored chain; non-zero exit if it is broken
//! - `show`    — print a block or the whole chain
//! - `serve`   — REST API plus Prometheus metrics
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use mhchain::storage::{SharedChain, VerificationReport, VerifyOptions};

use cli::{Commands, MhchainCli};
use metrics::NodeMetrics;

const DEFAULT_LOG_FILTER: &str = "mhchain_node=info,mhchain=info,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MhchainCli::parse();

    if !matches!(cli.command, Commands::Version) {
        logging::init_logging(DEFAULT_LOG_FILTER, cli.log_format);
    }

    match cli.command {
        Commands::Init(args) => init_ledger(args),
        Commands::Append(args) => append_block(args),
        Commands::Verify(args) => verify_ledger(args),
        Commands::Show(args) => show_ledger(args),
        Commands::Serve(args) => serve(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Creates the data directory and persists the genesis block.
fn init_ledger(args: cli::StoreArgs) -> Result<()> {
    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), "initializing ledger");

    let db = store::open_db(data_dir)?;
    let chain = store::initialize_chain(&db)?;
    let tail = chain.tail_hash().context("initialized chain has no blocks")?;

    println!("Ledger initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Blocks         : {}", chain.len());
    println!("  Tail hash      : {}", hex::encode(tail));
    Ok(())
}

/// Appends one block and persists it.
fn append_block(args: cli::AppendArgs) -> Result<()> {
    let payload = args
        .encoding
        .decode(&args.payload)
        .context("payload is not valid for the chosen encoding")?;

    let db = store::open_db(&args.store.data_dir)?;
    let mut chain = store::initialize_chain(&db)?;
    let index = chain.len();
    let block = chain.append_with(payload, |index, block| {
        db.put_block(index as u64, block)
            .with_context(|| format!("failed to persist block {}", index))
    })?;
    tracing::info!(index, hash = %block.hash_hex(), "block appended");

    println!("{} {}", index, block.hash_hex());
    Ok(())
}

/// Verifies the stored chain and prints the report.
fn verify_ledger(args: cli::VerifyArgs) -> Result<()> {
    let db = store::open_db(&args.store.data_dir)?;
    let chain = store::load_existing_chain(&db)?;
    let options = VerifyOptions {
        strict_genesis: !args.lenient_genesis,
    };
    let report = chain.verify_with(options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_valid() {
        anyhow::bail!(
            "chain integrity check failed: {} violation(s) at indices {:?}",
            report.violations.len(),
            report.violated_indices()
        );
    }
    Ok(())
}

fn print_report(report: &VerificationReport) {
    if report.is_valid() {
        println!("OK: {} blocks verified", report.length);
        return;
    }
    println!(
        "INVALID: {} violation(s) across {} blocks",
        report.violations.len(),
        report.length
    );
    for violation in &report.violations {
        println!("  block {:>6}  {}", violation.index, violation.kind.label());
    }
}

/// Prints one block or the whole chain.
fn show_ledger(args: cli::ShowArgs) -> Result<()> {
    let db = store::open_db(&args.store.data_dir)?;
    let chain = store::load_existing_chain(&db)?;

    let selected: Vec<(u64, &mhchain::Block)> = match args.index {
        Some(index) => {
            let block = usize::try_from(index)
                .ok()
                .and_then(|i| chain.block_at(i))
                .with_context(|| {
                    format!("no block at index {} (chain length {})", index, chain.len())
                })?;
            vec![(index, block)]
        }
        None => chain
            .iter()
            .enumerate()
            .map(|(i, block)| (i as u64, block))
            .collect(),
    };

    if args.json {
        let blocks: Vec<api::BlockResponse> = selected
            .iter()
            .map(|(index, block)| api::BlockResponse::from_block(*index, block))
            .collect();
        let output = match args.index {
            Some(_) => serde_json::to_string_pretty(&blocks[0])?,
            None => serde_json::to_string_pretty(&api::ChainResponse {
                length: blocks.len(),
                chain: blocks,
            })?,
        };
        println!("{}", output);
        return Ok(());
    }

    for (index, block) in selected {
        println!("#{}", index);
        println!("  hash        : {}", block.hash_hex());
        println!("  predecessor : {}", block.predecessor_hash_hex());
        println!("  payload     : {}", String::from_utf8_lossy(block.payload()));
    }
    Ok(())
}

/// Serves the REST API and the metrics endpoint until shutdown.
async fn serve(args: cli::ServeArgs) -> Result<()> {
    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.store.data_dir.display(),
        "starting mhchain-node"
    );

    let db = Arc::new(store::open_db(&args.store.data_dir)?);
    let chain = store::initialize_chain(&db)?;

    let report = chain.verify()?;
    if !report.is_valid() {
        tracing::warn!(
            violations = report.violations.len(),
            "stored chain failed verification; serving it anyway"
        );
    }

    let node_metrics = Arc::new(NodeMetrics::new());
    node_metrics.chain_length.set(chain.len() as i64);

    let app_state = api::AppState {
        version: format!(
            "{} (digest {})",
            env!("CARGO_PKG_VERSION"),
            mhchain::config::DIGEST_ALGORITHM,
        ),
        chain: SharedChain::new(chain),
        db: Arc::clone(&db),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
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
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    db.flush().context("failed to flush database on shutdown")?;
    tracing::info!("mhchain-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("mhchain-node {}", env!("CARGO_PKG_VERSION"));
    println!("digest       {}", mhchain::config::DIGEST_ALGORITHM);
    println!("format       v{}", mhchain::config::LEDGER_FORMAT_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
