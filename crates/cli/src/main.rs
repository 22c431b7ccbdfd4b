// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `colonies`: a standalone CLI driving an in-process orchestrator.
//!
//! `--host`/`--port`/`--runtimeprvkey` are accepted for surface fidelity
//! with the real deployment's flags but are unused here: the HTTP/RPC
//! transport and key-based authentication they'd configure are this repo's
//! non-goal external collaborators. Every invocation constructs a fresh,
//! in-memory [`Controller`](colonies_controller::Controller) (see
//! [`client::InProcessClient`]) and tears it down on exit, so state does not
//! persist across CLI invocations — this binary demonstrates the
//! controller's operations end to end, it does not replace a real
//! daemon-backed deployment.

mod client;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use client::InProcessClient;
use commands::{colony, cron, generator, process, runtime};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "colonies", about = "Colonies process orchestrator CLI", version)]
struct Cli {
    /// Orchestrator host (unused in standalone mode; kept for CLI-surface fidelity)
    #[arg(long, env = "COLONIES_SERVER_HOST", default_value = "localhost", global = true)]
    host: String,
    /// Orchestrator port (unused in standalone mode)
    #[arg(long, env = "COLONIES_SERVER_PORT", default_value_t = 50080, global = true)]
    port: u16,
    /// Caller's runtime id, falls back to COLONIES_RUNTIMEID
    #[arg(long, env = "COLONIES_RUNTIMEID", global = true)]
    runtimeid: Option<String>,
    /// Caller's runtime private key (unused: authentication is a non-goal)
    #[arg(long, env = "COLONIES_RUNTIMEPRVKEY", global = true, hide_env_values = true)]
    runtimeprvkey: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tenant namespaces
    Colony(colony::ColonyArgs),
    /// Worker agents
    Runtime(runtime::RuntimeArgs),
    /// Processes and process graphs
    Process(process::ProcessArgs),
    /// Counter-triggered workflow factories
    Generator(generator::GeneratorArgs),
    /// Time-triggered workflow factories (representative CLI surface)
    Cron(cron::CronArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let client = InProcessClient::new();

    let result = run(cli, &client).await;
    client.shutdown().await;

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(err.code);
    }
}

async fn run(cli: Cli, client: &InProcessClient) -> Result<(), ExitError> {
    let _ = (cli.host, cli.port, cli.runtimeid, cli.runtimeprvkey);
    match cli.command {
        Commands::Colony(args) => colony::handle(args.command, client, cli.format).await,
        Commands::Runtime(args) => runtime::handle(args.command, client, cli.format).await,
        Commands::Process(args) => process::handle(args.command, client, cli.format).await,
        Commands::Generator(args) => generator::handle(args.command, client, cli.format).await,
        Commands::Cron(args) => cron::handle(args.command, client, cli.format).await,
    }
}
