//! mcpdebugger
//!
//! `serve` runs the debug server that instrumented programs pause against.
//! `mcp` runs the JSON-RPC bridge on stdin/stdout for an AI controller.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpdebugger::config::Config;
use mcpdebugger::mcp::{DebugServerClient, McpServer};
use mcpdebugger::server::{shutdown_signal, DebugServer};
use mcpdebugger::BreakpointStore;

#[derive(Parser)]
#[command(name = "mcpdebugger", version, about = "Pause running code and resume it over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP debug server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Start the MCP bridge on stdin/stdout
    Mcp {
        /// Port of the debug server to talk to
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let Some(command) = cli.command else {
        print_usage();
        return ExitCode::FAILURE;
    };

    dotenvy::dotenv().ok();
    // stdout belongs to the protocol in mcp mode
    init_tracing(matches!(command, Command::Mcp { .. }));

    let result = match command {
        Command::Serve { port } => serve(Config::from_env().with_port(port)).await,
        Command::Mcp { port } => mcp(Config::from_env().with_port(port)).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(to_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mcpdebugger=info,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    if to_stderr {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_usage() {
    eprintln!("mcpdebugger - cooperative debugger for AI controllers");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  mcpdebugger serve [--port <PORT>]   Start the debug server");
    eprintln!("  mcpdebugger mcp [--port <PORT>]     Start the MCP bridge on stdin/stdout");
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.host))?;

    tracing::info!("Starting mcpdebugger v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Waiting for breakpoints. Press Ctrl+C to stop.");

    DebugServer::new(Arc::new(BreakpointStore::new()))
        .run(addr, shutdown_signal())
        .await
        .with_context(|| format!("Debug server on {} failed", addr))
}

async fn mcp(config: Config) -> anyhow::Result<()> {
    let client = DebugServerClient::new(&config.debugger.server_url)?;
    let server = McpServer::new(client);

    tokio::select! {
        result = server.run_stdio() => result.context("MCP session failed"),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, stopping MCP bridge");
            Ok(())
        }
    }
}
