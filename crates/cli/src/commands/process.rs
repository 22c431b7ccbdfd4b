// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Process/workflow command handlers.

use crate::client::ControllerClient;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};
use clap::{Args, Subcommand, ValueEnum};
use colonies_core::{ColonyId, ProcessGraphState, ProcessId, RuntimeId, WorkflowSpec};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProcessArgs {
    #[command(subcommand)]
    pub command: ProcessCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GraphStateArg {
    Waiting,
    Running,
    Success,
    Failed,
}

impl From<GraphStateArg> for ProcessGraphState {
    fn from(value: GraphStateArg) -> Self {
        match value {
            GraphStateArg::Waiting => ProcessGraphState::Waiting,
            GraphStateArg::Running => ProcessGraphState::Running,
            GraphStateArg::Success => ProcessGraphState::Success,
            GraphStateArg::Failed => ProcessGraphState::Failed,
        }
    }
}

#[derive(Subcommand)]
pub enum ProcessCommand {
    /// Submit a workflow spec file (a JSON array of process specs, or a
    /// `{"processspecs": [...]}`-wrapped object)
    Submit {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long)]
        spec: PathBuf,
    },
    /// Ask to be handed the next matching process for a runtime
    Assign {
        #[arg(long, env = "COLONIES_RUNTIMEID")]
        runtimeid: String,
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long)]
        latest: bool,
    },
    /// Report a process as successfully completed
    CloseSuccessful { processid: String },
    /// Report a process as failed
    CloseFailed {
        processid: String,
        #[arg(long)]
        error: String,
    },
    /// Look up a process by id
    Get { processid: String },
    /// List process graphs in a colony, optionally filtered by state
    Ls {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
        #[arg(long, value_enum)]
        state: Option<GraphStateArg>,
        #[arg(long, default_value_t = 100)]
        count: usize,
    },
    /// Print colony statistics
    Stats {
        #[arg(long, env = "COLONIES_COLONYID")]
        colonyid: String,
    },
}

pub async fn handle(command: ProcessCommand, client: &dyn ControllerClient, format: OutputFormat) -> Result<(), ExitError> {
    match command {
        ProcessCommand::Submit { colonyid, spec } => {
            let json = std::fs::read_to_string(&spec)
                .map_err(|err| ExitError::new(2, format!("failed to read {}: {err}", spec.display())))?;
            let workflow = WorkflowSpec::from_json(&json).map_err(|err| ExitError::new(2, err.to_string()))?;
            let graph = client.submit_workflow(ColonyId::from_string(colonyid), workflow, vec![]).await?;
            output::print_one(format, &graph, |g| format!("{}  {:?}", g.id, g.state))?;
        }
        ProcessCommand::Assign { runtimeid, colonyid, latest } => {
            let process = client
                .assign(RuntimeId::from_string(runtimeid), ColonyId::from_string(colonyid), latest)
                .await?;
            output::print_one(format, &process, |p| format!("{}  {}  {:?}", p.id, p.spec.name, p.state))?;
        }
        ProcessCommand::CloseSuccessful { processid } => {
            client.close_successful(ProcessId::from_string(processid.clone())).await?;
            println!("Process {processid} closed successful");
        }
        ProcessCommand::CloseFailed { processid, error } => {
            client.close_failed(ProcessId::from_string(processid.clone()), error).await?;
            println!("Process {processid} closed failed");
        }
        ProcessCommand::Get { processid } => {
            let process = client
                .get_process(&ProcessId::from_string(processid.clone()))
                .await?
                .ok_or_else(|| ExitError::new(2, format!("process {processid} not found")))?;
            output::print_one(format, &process, |p| format!("{}  {}  {:?}", p.id, p.spec.name, p.state))?;
        }
        ProcessCommand::Ls { colonyid, state, count } => {
            let graphs = client
                .list_process_graphs(&ColonyId::from_string(colonyid), state.map(Into::into), count)
                .await?;
            output::print_list(format, &graphs, "No process graphs found", |g| format!("{}  {:?}", g.id, g.state))?;
        }
        ProcessCommand::Stats { colonyid } => {
            let stats = client.statistics(&ColonyId::from_string(colonyid)).await?;
            output::print_one(format, &stats, |s| format!("{s:?}"))?;
        }
    }
    Ok(())
}
