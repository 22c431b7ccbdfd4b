// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Runtime command handlers.

use crate::client::ControllerClient;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};
use colonies_core::{ColonyId, RuntimeId};

#[derive(Args)]
pub struct RuntimeArgs {
    #[command(subcommand)]
    pub command: RuntimeCommand,
}

#[derive(Subcommand)]
pub enum RuntimeCommand {
    /// Register a new worker agent (starts out `pending`)
    Add {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long)]
        runtimetype: String,
    },
    /// Approve a pending runtime so it may be assigned work
    Approve { runtimeid: String },
    /// Reject a pending runtime
    Reject { runtimeid: String },
    /// Look up a runtime by id
    Get { runtimeid: String },
    /// List runtimes belonging to a colony
    Ls {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
    },
    /// Deregister a runtime
    Delete { runtimeid: String },
}

fn text(r: &colonies_core::Runtime) -> String {
    format!("{}  {}  {:?}", r.id, r.runtime_type, r.state)
}

pub async fn handle(command: RuntimeCommand, client: &dyn ControllerClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        RuntimeCommand::Add { colonyid, runtimetype } => {
            let runtime = client.add_runtime(ColonyId::from_string(colonyid), runtimetype).await?;
            output::print_one(format, &runtime, text)?;
        }
        RuntimeCommand::Approve { runtimeid } => {
            client.approve_runtime(RuntimeId::from_string(runtimeid.clone())).await?;
            println!("Runtime {runtimeid} approved");
        }
        RuntimeCommand::Reject { runtimeid } => {
            client.reject_runtime(RuntimeId::from_string(runtimeid.clone())).await?;
            println!("Runtime {runtimeid} rejected");
        }
        RuntimeCommand::Get { runtimeid } => {
            let runtime = client
                .get_runtime(&RuntimeId::from_string(runtimeid.clone()))
                .await?
                .ok_or_else(|| ExitError::new(2, format!("runtime {runtimeid} not found")))?;
            output::print_one(format, &runtime, text)?;
        }
        RuntimeCommand::Ls { colonyid } => {
            let runtimes = client.list_runtimes(&ColonyId::from_string(colonyid)).await?;
            output::print_list(format, &runtimes, "No runtimes found", text)?;
        }
        RuntimeCommand::Delete { runtimeid } => {
            client.delete_runtime(RuntimeId::from_string(runtimeid.clone())).await?;
            println!("Runtime {runtimeid} deleted");
        }
    }
    Ok(())
}
