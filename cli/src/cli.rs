//! # CLI Interface
//!
//! Defines the command-line argument structure for `bm-txkit` using
//! `clap` derive. Supports five subcommands: `address`, `build`, `sign`,
//! `serve` and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use bm_txkit::config::Network;

/// Offline transaction builder and signer for Bytom-style chains.
///
/// Derives addresses from raw extended private keys, builds unsigned
/// transaction templates from JSON action lists, and signs them.
/// Results are printed to stdout as JSON; logs go to stderr.
#[derive(Parser, Debug)]
#[command(
    name = "bm-txkit",
    about = "Offline transaction builder and signer",
    version,
    propagate_version = true
)]
pub struct TxKitCli {
    /// Network whose address prefix is used: mainnet, testnet or solonet.
    #[arg(long, global = true, env = "BM_NETWORK", default_value = "mainnet")]
    pub network: Network,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "BM_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// TTL used when a build request asks for zero, e.g. "5m" or "90s".
    #[arg(
        long,
        global = true,
        env = "BM_DEFAULT_TTL",
        value_parser = humantime::parse_duration,
        default_value = "5m"
    )]
    pub default_ttl: Duration,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the xpub and receive address of a raw private key.
    Address(AddressArgs),
    /// Build an unsigned template from a build request.
    Build(BuildArgs),
    /// Sign a template with a raw private key.
    Sign(SignArgs),
    /// Serve the address, build and sign operations over HTTP.
    Serve(ServeArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `address` subcommand.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Hex-encoded 64-byte extended private key.
    #[arg(env = "BM_PRIVATE_KEY", hide_env_values = true)]
    pub key: String,
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// File holding the build request JSON. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

/// Arguments for the `sign` subcommand.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Hex-encoded 64-byte extended private key.
    ///
    /// Prefer the environment variable over the flag: flags end up in
    /// shell history.
    #[arg(long, short = 'k', env = "BM_PRIVATE_KEY", hide_env_values = true)]
    pub key: String,

    /// File holding the template JSON. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "BM_BIND", default_value = "127.0.0.1")]
    pub bind: String,

    /// Port for the HTTP API.
    #[arg(long, short = 'p', env = "BM_PORT", default_value_t = 9888)]
    pub port: u16,
}
