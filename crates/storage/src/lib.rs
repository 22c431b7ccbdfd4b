// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! colonies-storage: the storage interface the controller depends on, plus
//! an in-memory reference implementation used in tests and for standalone
//! runs. A SQL-backed implementation is an external collaborator (non-goal
//! of this crate) and is not shipped here.

pub mod error;
pub mod mem;

pub use error::StorageError;
pub use mem::MemStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colonies_core::{
    Attribute, AttributeId, Colony, ColonyId, Cron, CronId, Generator, GeneratorArg, GeneratorArgId, GeneratorId,
    Process, ProcessGraph, ProcessGraphId, ProcessGraphState, ProcessId, Runtime, RuntimeId,
};

pub type Result<T> = std::result::Result<T, StorageError>;

/// CRUD and query surface the controller consumes. Every mutating method
/// takes the whole entity (rather than a SQL-style per-field setter) and
/// overwrites it by id: the domain model in `colonies-core` already
/// centralizes transition logic (`Process::assign`, `::close_successful`,
/// ...), so storage only needs to persist the result.
#[async_trait]
pub trait Storage: Send + Sync {
    // Colonies
    async fn add_colony(&self, colony: Colony) -> Result<()>;
    async fn get_colonies(&self) -> Result<Vec<Colony>>;
    async fn get_colony_by_id(&self, id: &ColonyId) -> Result<Option<Colony>>;
    async fn delete_colony_by_id(&self, id: &ColonyId) -> Result<()>;
    async fn count_colonies(&self) -> Result<i64>;

    // Runtimes
    async fn add_runtime(&self, runtime: Runtime) -> Result<()>;
    async fn get_runtime_by_id(&self, id: &RuntimeId) -> Result<Option<Runtime>>;
    async fn get_runtimes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Runtime>>;
    async fn approve_runtime(&self, id: &RuntimeId) -> Result<()>;
    async fn reject_runtime(&self, id: &RuntimeId) -> Result<()>;
    async fn delete_runtime_by_id(&self, id: &RuntimeId) -> Result<()>;
    async fn mark_alive(&self, id: &RuntimeId, now: DateTime<Utc>) -> Result<()>;
    async fn count_runtimes(&self) -> Result<i64>;
    async fn count_runtimes_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64>;

    // Processes
    async fn add_process(&self, process: Process) -> Result<()>;
    async fn get_process_by_id(&self, id: &ProcessId) -> Result<Option<Process>>;
    #[allow(clippy::too_many_arguments)]
    async fn find_unassigned_processes(
        &self,
        colony_id: &ColonyId,
        runtime_id: &RuntimeId,
        runtime_type: &str,
        max: usize,
        latest: bool,
    ) -> Result<Vec<Process>>;
    async fn find_waiting_processes(&self) -> Result<Vec<Process>>;
    async fn find_running_processes(&self) -> Result<Vec<Process>>;
    async fn find_waiting_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>>;
    async fn find_running_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>>;
    async fn find_successful_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>>;
    async fn find_failed_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>>;
    async fn find_processes_by_graph_id(&self, graph_id: &ProcessGraphId) -> Result<Vec<Process>>;
    async fn update_process(&self, process: Process) -> Result<()>;
    async fn delete_process_by_id(&self, id: &ProcessId) -> Result<()>;
    async fn delete_all_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<()>;
    async fn count_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64>;

    // ProcessGraphs
    async fn add_process_graph(&self, graph: ProcessGraph) -> Result<()>;
    async fn get_process_graph_by_id(&self, id: &ProcessGraphId) -> Result<Option<ProcessGraph>>;
    async fn update_process_graph(&self, graph: ProcessGraph) -> Result<()>;
    async fn find_process_graphs_by_colony_id(
        &self,
        colony_id: &ColonyId,
        state: Option<ProcessGraphState>,
    ) -> Result<Vec<ProcessGraph>>;
    async fn delete_process_graph_by_id(&self, id: &ProcessGraphId) -> Result<()>;
    async fn count_process_graphs_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64>;

    // Attributes
    async fn add_attribute(&self, attribute: Attribute) -> Result<()>;
    async fn get_attribute_by_id(&self, id: &AttributeId) -> Result<Option<Attribute>>;
    async fn get_attributes_by_process_id(&self, process_id: &ProcessId) -> Result<Vec<Attribute>>;

    // Generators
    async fn add_generator(&self, generator: Generator) -> Result<()>;
    async fn get_generator_by_id(&self, id: &GeneratorId) -> Result<Option<Generator>>;
    async fn find_generators_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Generator>>;
    async fn find_all_generators(&self) -> Result<Vec<Generator>>;
    async fn set_generator_last_run(&self, id: &GeneratorId, last_run: DateTime<Utc>) -> Result<()>;
    async fn delete_generator_by_id(&self, id: &GeneratorId) -> Result<()>;
    async fn delete_all_generators_by_colony_id(&self, colony_id: &ColonyId) -> Result<()>;
    async fn add_generator_arg(&self, arg: GeneratorArg) -> Result<()>;
    async fn get_generator_args(&self, generator_id: &GeneratorId, limit: usize) -> Result<Vec<GeneratorArg>>;
    async fn delete_generator_arg_by_id(&self, id: &GeneratorArgId) -> Result<()>;
    async fn count_generator_args(&self, generator_id: &GeneratorId) -> Result<i64>;

    // Crons
    async fn add_cron(&self, cron: Cron) -> Result<()>;
    async fn get_cron_by_id(&self, id: &CronId) -> Result<Option<Cron>>;
    async fn find_crons_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Cron>>;
    async fn find_all_crons(&self) -> Result<Vec<Cron>>;
    #[allow(clippy::too_many_arguments)]
    async fn update_cron(
        &self,
        id: &CronId,
        next_run: Option<DateTime<Utc>>,
        last_run: Option<DateTime<Utc>>,
        last_process_graph_id: Option<ProcessGraphId>,
    ) -> Result<()>;
    async fn delete_cron_by_id(&self, id: &CronId) -> Result<()>;
}
