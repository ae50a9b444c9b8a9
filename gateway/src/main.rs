// Copyright (c) 2026 Helio Contributors. MIT License.
// See LICENSE for details.

//! # HELIO Tool Gateway
//!
//! Entry point for the `helio-gateway` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the tool-calling HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `serve`   — start the HTTP tool server
//! - `call`    — invoke one tool locally and print its payload
//! - `keygen`  — generate a fresh Ed25519 keypair
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use helio_toolkit::keys::Keypair;
use helio_toolkit::tools::{Dispatcher, ToolCall};

use cli::{Commands, HelioGatewayCli};
use logging::LogFormat;
use metrics::GatewayMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HelioGatewayCli::parse();

    match cli.command {
        Commands::Serve(args) => run_server(args).await,
        Commands::Call(args) => run_call(args).await,
        Commands::Keygen => {
            run_keygen();
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full gateway: tool API server and metrics endpoint.
async fn run_server(args: cli::ServeArgs) -> Result<()> {
    logging::init_logging(
        "helio_gateway=info,helio_toolkit=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        http_port = args.http_port,
        metrics_port = args.metrics_port,
        "starting helio-gateway"
    );

    // --- Dispatcher ---
    let dispatcher = match &args.rpc_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "RPC endpoint override active");
            Dispatcher::with_endpoint(endpoint.clone())
        }
        None => Dispatcher::new(),
    };

    // --- Metrics ---
    let gateway_metrics = Arc::new(GatewayMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        dispatcher,
        metrics: Arc::clone(&gateway_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.http_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind tool API listener on {}", api_addr))?;
    tracing::info!("tool API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&gateway_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("tool API server error: {}", e);
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

    tracing::info!("helio-gateway stopped");
    Ok(())
}

/// Invokes one tool in-process and prints its payload to stdout.
///
/// Failures, including tool-level error payloads, exit nonzero with the
/// payload text on stderr. Success payloads go to stdout so they can be
/// piped.
async fn run_call(args: cli::CallArgs) -> Result<()> {
    logging::init_logging("helio_gateway=warn,helio_toolkit=warn", LogFormat::Pretty);

    let arg_value: serde_json::Value = serde_json::from_str(&args.args)
        .with_context(|| format!("tool arguments are not valid JSON: {}", args.args))?;
    let call = ToolCall::parse(&args.tool, arg_value).map_err(|e| anyhow::anyhow!(e))?;

    let dispatcher = match args.rpc_endpoint {
        Some(endpoint) => Dispatcher::with_endpoint(endpoint),
        None => Dispatcher::new(),
    };

    let response = dispatcher.dispatch(call).await;
    if response.is_error {
        anyhow::bail!("{}", response.text);
    }
    println!("{}", response.text);
    Ok(())
}

/// Generates a fresh Ed25519 keypair and prints it to stdout.
///
/// This is the only place the gateway ever emits secret key material, and
/// it goes to stdout alone. Nothing is written to disk or to the log.
fn run_keygen() {
    let keypair = Keypair::generate();

    println!("Generated a new Ed25519 keypair.");
    println!("  Address (base58)    : {}", keypair.address().to_base58());
    println!("  Secret key (base64) : {}", keypair.to_base64());
    println!();
    println!("Keep the secret key private. Anyone holding it controls the address.");
}

/// Prints version information to stdout.
fn print_version() {
    println!("helio-gateway {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
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
}
