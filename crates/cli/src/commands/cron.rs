// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Cron command handlers: `add | delete | get | ls | run`.

use crate::client::ControllerClient;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand};
use colonies_core::{ColonyId, CronId};
use std::path::PathBuf;

#[derive(Args)]
pub struct CronArgs {
    #[command(subcommand)]
    pub command: CronCommand,
}

#[derive(Subcommand)]
pub enum CronCommand {
    /// Register a time-triggered workflow factory. Exactly one of
    /// `--cron`/`--interval` must be supplied.
    Add {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        spec: PathBuf,
        /// Cron expression (mutually exclusive with --interval)
        #[arg(long, default_value = "")]
        cron: String,
        /// Interval in seconds (mutually exclusive with --cron)
        #[arg(long, default_value_t = -1)]
        interval: i64,
        /// Jitter within the interval uniformly at random
        #[arg(long)]
        random: bool,
    },
    /// Delete a cron (does not touch workflows it already spawned)
    Delete {
        #[arg(long)]
        cronid: String,
    },
    /// Look up a cron by id
    Get {
        #[arg(long)]
        cronid: String,
    },
    /// List crons in a colony
    Ls {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long, default_value_t = 100)]
        count: usize,
    },
    /// Fire the cron's workflow once, immediately, bypassing `NextRun`
    Run {
        #[arg(long)]
        cronid: String,
    },
}

fn text(c: &colonies_core::Cron) -> String {
    let schedule = if c.interval > 0 {
        format!("interval={}s random={}", c.interval, c.random)
    } else {
        format!("cron={:?}", c.cron_expression)
    };
    format!("{}  {}  {schedule}", c.id, c.name)
}

pub async fn handle(command: CronCommand, client: &dyn ControllerClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        CronCommand::Add { colonyid, name, spec, cron, interval, random } => {
            let workflow_spec = std::fs::read_to_string(&spec)
                .map_err(|err| ExitError::new(2, format!("failed to read {}: {err}", spec.display())))?;
            let cron = client
                .add_cron(ColonyId::from_string(colonyid), name, cron, interval, random, workflow_spec)
                .await?;
            output::print_one(format, &cron, text)?;
        }
        CronCommand::Delete { cronid } => {
            client.delete_cron(CronId::from_string(cronid.clone())).await?;
            println!("Cron {cronid} deleted");
        }
        CronCommand::Get { cronid } => {
            let cron = client
                .get_cron(&CronId::from_string(cronid.clone()))
                .await?
                .ok_or_else(|| ExitError::new(2, format!("cron {cronid} not found")))?;
            output::print_one(format, &cron, text)?;
        }
        CronCommand::Ls { colonyid, count } => {
            let crons = client.list_crons(&ColonyId::from_string(colonyid), count).await?;
            output::print_list(format, &crons, "No crons found", text)?;
        }
        CronCommand::Run { cronid } => {
            let graph = client.run_cron_now(CronId::from_string(cronid)).await?;
            output::print_one(format, &graph, |g| format!("{}  {:?}", g.id, g.state))?;
        }
    }
    Ok(())
}
