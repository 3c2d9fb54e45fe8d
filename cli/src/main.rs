// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # bm-txkit
//!
//! Entry point for the `bm-txkit` binary. Parses CLI arguments, initializes
//! logging, and runs one of the library operations or the HTTP server.
//!
//! The binary supports five subcommands:
//!
//! - `address` — xpub and receive address of a raw private key
//! - `build`   — unsigned template from a build request (file or stdin)
//! - `sign`    — sign a template (file or stdin) with a raw private key
//! - `serve`   — expose the three operations over HTTP
//! - `version` — print build version information

mod cli;
mod logging;
mod server;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use zeroize::Zeroizing;

use bm_txkit::api;
use bm_txkit::config::Config;

use cli::{Commands, TxKitCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TxKitCli::parse();
    let format = LogFormat::from_str_lossy(&cli.log_format);
    let config = Config {
        network: cli.network,
        default_ttl: cli.default_ttl,
    };

    match cli.command {
        Commands::Address(args) => {
            logging::init_logging("warn", format);
            let key = Zeroizing::new(args.key);
            let out = api::get_address_json(&key, &config).context("failed to derive address")?;
            println!("{out}");
            Ok(())
        }
        Commands::Build(args) => {
            logging::init_logging("warn", format);
            let request = read_input(args.input.as_deref())?;
            let out = api::create_raw_transaction_json(&request, &config)
                .context("failed to build transaction")?;
            println!("{out}");
            Ok(())
        }
        Commands::Sign(args) => {
            logging::init_logging("warn", format);
            let key = Zeroizing::new(args.key);
            let template = read_input(args.input.as_deref())?;
            let out = api::sign_raw_transaction_json(&key, &template)
                .context("failed to sign transaction")?;
            println!("{out}");
            Ok(())
        }
        Commands::Serve(args) => {
            logging::init_logging("bm_txkit=info,bm_txkit_cli=info,tower_http=debug", format);
            serve(args, config).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Reads the whole request body from `path`, or from stdin when absent.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Runs the HTTP API until SIGINT or SIGTERM.
async fn serve(args: cli::ServeArgs, config: Config) -> Result<()> {
    tracing::info!(
        bind = %args.bind,
        port = args.port,
        network = %config.network,
        "starting bm-txkit server"
    );

    let router = server::create_router(server::AppState {
        config: Arc::new(config),
    });
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", addr))?;
    tracing::info!("HTTP API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("bm-txkit server stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("bm-txkit {}", env!("CARGO_PKG_VERSION"));
    println!("tx version {}", bm_txkit::config::TX_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
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

    tracing::info!("shutdown signal received, draining connections");
}
