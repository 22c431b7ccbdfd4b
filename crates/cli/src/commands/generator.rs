// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Generator command handlers.

use crate::client::ControllerClient;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};
use colonies_core::{ColonyId, GeneratorId};
use std::path::PathBuf;

#[derive(Args)]
pub struct GeneratorArgs {
    #[command(subcommand)]
    pub command: GeneratorCommand,
}

#[derive(Subcommand)]
pub enum GeneratorCommand {
    /// Register a counter-triggered workflow factory
    Add {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        spec: PathBuf,
        #[arg(long)]
        trigger: i64,
    },
    /// Append one argument onto a generator's pending-args buffer
    Pack {
        generatorid: String,
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        arg: String,
    },
    /// Look up a generator by id
    Get { generatorid: String },
    /// Delete a generator
    Delete { generatorid: String },
}

fn text(g: &colonies_core::Generator) -> String {
    format!("{}  {}  trigger={}", g.id, g.name, g.trigger)
}

pub async fn handle(command: GeneratorCommand, client: &dyn ControllerClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        GeneratorCommand::Add { colonyid, name, spec, trigger } => {
            let workflow_spec = std::fs::read_to_string(&spec)
                .map_err(|err| ExitError::new(2, format!("failed to read {}: {err}", spec.display())))?;
            let generator = client
                .add_generator(ColonyId::from_string(colonyid), name, workflow_spec, trigger)
                .await?;
            output::print_one(format, &generator, text)?;
        }
        GeneratorCommand::Pack { generatorid, colonyid, arg } => {
            client
                .pack_generator_arg(GeneratorId::from_string(generatorid), ColonyId::from_string(colonyid), arg)
                .await?;
            println!("Argument packed");
        }
        GeneratorCommand::Get { generatorid } => {
            let generator = client
                .get_generator(&GeneratorId::from_string(generatorid.clone()))
                .await?
                .ok_or_else(|| ExitError::new(2, format!("generator {generatorid} not found")))?;
            output::print_one(format, &generator, text)?;
        }
        GeneratorCommand::Delete { generatorid } => {
            client.delete_generator(GeneratorId::from_string(generatorid.clone())).await?;
            println!("Generator {generatorid} deleted");
        }
    }
    Ok(())
}
