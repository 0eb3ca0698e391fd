//! # CLI Interface
//!
//! Defines the command-line argument structure for `mhchain-node` using
//! `clap` derive. Every flag that names a location or port also reads an
//! `MHCHAIN_*` environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::api::PayloadEncoding;
use crate::logging::LogFormat;

/// Append-only hash-linked ledger.
///
/// Records payloads in a tamper-evident chain on local disk, verifies the
/// chain on demand, and can serve it over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "mhchain-node",
    about = "Append-only hash-linked ledger",
    version,
    propagate_version = true
)]
pub struct MhchainCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        env = "MHCHAIN_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and write the genesis block.
    Init(StoreArgs),
    /// Append one block to the ledger.
    Append(AppendArgs),
    /// Verify every block and link in the ledger.
    Verify(VerifyArgs),
    /// Print one block or the whole chain.
    Show(ShowArgs),
    /// Serve the ledger over HTTP.
    Serve(ServeArgs),
    /// Print version information and exit.
    Version,
}

/// Location of the ledger on disk.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Data directory holding the ledger database.
    #[arg(long, short = 'd', env = "MHCHAIN_DATA_DIR", default_value = ".mhchain")]
    pub data_dir: PathBuf,
}

/// Arguments for the `append` subcommand.
#[derive(Args, Debug)]
pub struct AppendArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Payload to commit.
    pub payload: String,

    /// How to turn `PAYLOAD` into bytes.
    #[arg(long, value_enum, default_value_t = PayloadEncoding::Utf8)]
    pub encoding: PayloadEncoding,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Accept any predecessor hash on the first block.
    #[arg(long)]
    pub lenient_genesis: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Show only the block at this index.
    #[arg(long)]
    pub index: Option<u64>,

    /// Print JSON instead of a listing.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Address to bind both listeners to.
    #[arg(long, env = "MHCHAIN_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the REST API.
    #[arg(long, env = "MHCHAIN_API_PORT", default_value_t = 5000)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MHCHAIN_METRICS_PORT", default_value_t = 5001)]
    pub metrics_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        MhchainCli::command().debug_assert();
    }

    #[test]
    fn parses_append_with_hex_encoding() {
        let cli = MhchainCli::try_parse_from([
            "mhchain-node",
            "append",
            "--data-dir",
            "/tmp/ledger",
            "--encoding",
            "hex",
            "deadbeef",
        ])
        .unwrap();

        match cli.command {
            Commands::Append(args) => {
                assert_eq!(args.payload, "deadbeef");
                assert_eq!(args.encoding, PayloadEncoding::Hex);
                assert_eq!(args.store.data_dir, PathBuf::from("/tmp/ledger"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_verify_flags() {
        let cli = MhchainCli::try_parse_from([
            "mhchain-node",
            "verify",
            "--lenient-genesis",
            "--json",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Verify(args) => {
                assert!(args.lenient_genesis);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
