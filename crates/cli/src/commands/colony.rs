// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Colony command handlers.

use crate::client::ControllerClient;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};
use colonies_core::ColonyId;

#[derive(Args)]
pub struct ColonyArgs {
    #[command(subcommand)]
    pub command: ColonyCommand,
}

#[derive(Subcommand)]
pub enum ColonyCommand {
    /// Register a new colony
    Add { name: String },
    /// Look up a colony by id
    Get {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
    },
    /// List all colonies
    Ls {},
    /// Delete a colony and everything it owns
    Delete {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
    },
}

pub async fn handle(command: ColonyCommand, client: &dyn ControllerClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        ColonyCommand::Add { name } => {
            let colony = client.add_colony(name).await?;
            output::print_one(format, &colony, |c| format!("{}  {}", c.id, c.name))?;
        }
        ColonyCommand::Get { colonyid } => {
            let colony = client
                .get_colony(&ColonyId::from_string(colonyid.clone()))
                .await?
                .ok_or_else(|| ExitError::new(2, format!("colony {colonyid} not found")))?;
            output::print_one(format, &colony, |c| format!("{}  {}", c.id, c.name))?;
        }
        ColonyCommand::Ls {} => {
            let colonies = client.list_colonies().await?;
            output::print_list(format, &colonies, "No colonies found", |c| format!("{}  {}", c.id, c.name))?;
        }
        ColonyCommand::Delete { colonyid } => {
            client.delete_colony(ColonyId::from_string(colonyid.clone())).await?;
            println!("Colony {colonyid} deleted");
        }
    }
    Ok(())
}
