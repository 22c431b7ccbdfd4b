// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! `ControllerClient`: the seam the CLI drives the orchestrator through.
//!
//! The real deployment's HTTP/RPC transport (and its wire encoding, auth,
//! and key management) lives outside this crate. This crate ships exactly
//! one implementation of the client trait: an in-process one that owns a
//! live [`Controller`] backed by [`MemStorage`]. Each CLI invocation is
//! therefore a fresh, ephemeral orchestrator — enough to exercise every
//! operation end to end, but not a substitute for a real daemon-backed
//! deployment. This mirrors a thin client trait with one concrete
//! transport, without reproducing socket framing that is out of scope here.

use async_trait::async_trait;
use colonies_controller::{
    BasicPlanner, Controller, ControllerDeps, ControllerError, NoopRelay, SingleNodeLeader, SystemCronClock,
};
use colonies_core::{
    Colony, ColonyId, Cron, CronId, Generator, GeneratorId, Process, ProcessGraph, ProcessGraphState, ProcessId,
    Runtime, RuntimeId, Statistics, SystemClock, WorkflowSpec,
};
use colonies_storage::{MemStorage, Storage};
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, ControllerError>;

/// Operations the CLI needs from a running orchestrator. Kept narrow and
/// flat (no generics, no `Clock` parameter) so a future networked
/// implementation can be dropped in without touching any command handler.
#[async_trait]
pub trait ControllerClient: Send + Sync {
    async fn add_colony(&self, name: String) -> Result<Colony>;
    async fn list_colonies(&self) -> Result<Vec<Colony>>;
    async fn get_colony(&self, id: &ColonyId) -> Result<Option<Colony>>;
    async fn delete_colony(&self, id: ColonyId) -> Result<()>;

    async fn add_runtime(&self, colony_id: ColonyId, runtime_type: String) -> Result<Runtime>;
    async fn approve_runtime(&self, id: RuntimeId) -> Result<()>;
    async fn reject_runtime(&self, id: RuntimeId) -> Result<()>;
    async fn get_runtime(&self, id: &RuntimeId) -> Result<Option<Runtime>>;
    async fn list_runtimes(&self, colony_id: &ColonyId) -> Result<Vec<Runtime>>;
    async fn delete_runtime(&self, id: RuntimeId) -> Result<()>;

    async fn submit_workflow(&self, colony_id: ColonyId, workflow: WorkflowSpec, args: Vec<String>) -> Result<ProcessGraph>;
    async fn assign(&self, runtime_id: RuntimeId, colony_id: ColonyId, latest: bool) -> Result<Process>;
    async fn close_successful(&self, process_id: ProcessId) -> Result<()>;
    async fn close_failed(&self, process_id: ProcessId, error_msg: String) -> Result<()>;
    async fn get_process(&self, id: &ProcessId) -> Result<Option<Process>>;
    async fn list_process_graphs(
        &self,
        colony_id: &ColonyId,
        state: Option<ProcessGraphState>,
        count: usize,
    ) -> Result<Vec<ProcessGraph>>;

    async fn add_generator(&self, colony_id: ColonyId, name: String, workflow_spec: String, trigger: i64) -> Result<Generator>;
    async fn pack_generator_arg(&self, generator_id: GeneratorId, colony_id: ColonyId, arg: String) -> Result<()>;
    async fn get_generator(&self, id: &GeneratorId) -> Result<Option<Generator>>;
    async fn delete_generator(&self, id: GeneratorId) -> Result<()>;

    #[allow(clippy::too_many_arguments)]
    async fn add_cron(
        &self,
        colony_id: ColonyId,
        name: String,
        cron_expression: String,
        interval: i64,
        random: bool,
        workflow_spec: String,
    ) -> Result<Cron>;
    async fn delete_cron(&self, id: CronId) -> Result<()>;
    async fn get_cron(&self, id: &CronId) -> Result<Option<Cron>>;
    async fn list_crons(&self, colony_id: &ColonyId, count: usize) -> Result<Vec<Cron>>;
    async fn run_cron_now(&self, id: CronId) -> Result<ProcessGraph>;

    async fn statistics(&self, colony_id: &ColonyId) -> Result<Statistics>;

    async fn shutdown(&self);
}

/// In-process `ControllerClient`: owns the [`Controller`] it drives.
pub struct InProcessClient {
    controller: Controller<SystemClock>,
}

impl InProcessClient {
    pub fn new() -> Self {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let controller = Controller::new(ControllerDeps {
            storage,
            planner: Arc::new(BasicPlanner),
            cron_clock: Arc::new(SystemCronClock),
            leader: Arc::new(SingleNodeLeader::new()),
            clock: SystemClock,
            config: Default::default(),
            relay: Box::new(NoopRelay),
        });
        Self { controller }
    }
}

impl Default for InProcessClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControllerClient for InProcessClient {
    async fn add_colony(&self, name: String) -> Result<Colony> {
        let colony = Colony::new(name);
        self.controller.add_colony(colony.clone()).await?;
        Ok(colony)
    }

    async fn list_colonies(&self) -> Result<Vec<Colony>> {
        self.controller.get_colonies().await
    }

    async fn get_colony(&self, id: &ColonyId) -> Result<Option<Colony>> {
        self.controller.get_colony_by_id(id).await
    }

    async fn delete_colony(&self, id: ColonyId) -> Result<()> {
        self.controller.delete_colony_by_id(id).await
    }

    async fn add_runtime(&self, colony_id: ColonyId, runtime_type: String) -> Result<Runtime> {
        let runtime = Runtime::new(colony_id, runtime_type);
        self.controller.add_runtime(runtime.clone()).await?;
        Ok(runtime)
    }

    async fn approve_runtime(&self, id: RuntimeId) -> Result<()> {
        self.controller.approve_runtime(id).await
    }

    async fn reject_runtime(&self, id: RuntimeId) -> Result<()> {
        self.controller.reject_runtime(id).await
    }

    async fn get_runtime(&self, id: &RuntimeId) -> Result<Option<Runtime>> {
        self.controller.get_runtime_by_id(id).await
    }

    async fn list_runtimes(&self, colony_id: &ColonyId) -> Result<Vec<Runtime>> {
        self.controller.get_runtimes_by_colony_id(colony_id).await
    }

    async fn delete_runtime(&self, id: RuntimeId) -> Result<()> {
        self.controller.delete_runtime_by_id(id).await
    }

    async fn submit_workflow(&self, colony_id: ColonyId, workflow: WorkflowSpec, args: Vec<String>) -> Result<ProcessGraph> {
        self.controller.submit_workflow(colony_id, workflow, args).await
    }

    async fn assign(&self, runtime_id: RuntimeId, colony_id: ColonyId, latest: bool) -> Result<Process> {
        self.controller.assign_runtime(runtime_id, colony_id, latest).await
    }

    async fn close_successful(&self, process_id: ProcessId) -> Result<()> {
        self.controller.close_successful(process_id).await
    }

    async fn close_failed(&self, process_id: ProcessId, error_msg: String) -> Result<()> {
        self.controller.close_failed(process_id, error_msg).await
    }

    async fn get_process(&self, id: &ProcessId) -> Result<Option<Process>> {
        self.controller.get_process_by_id(id).await
    }

    async fn list_process_graphs(
        &self,
        colony_id: &ColonyId,
        state: Option<ProcessGraphState>,
        count: usize,
    ) -> Result<Vec<ProcessGraph>> {
        self.controller.find_process_graphs_by_colony_id(colony_id, state, count).await
    }

    async fn add_generator(&self, colony_id: ColonyId, name: String, workflow_spec: String, trigger: i64) -> Result<Generator> {
        let generator = Generator::new(colony_id, name, workflow_spec, trigger);
        self.controller.add_generator(generator.clone()).await?;
        Ok(generator)
    }

    async fn pack_generator_arg(&self, generator_id: GeneratorId, colony_id: ColonyId, arg: String) -> Result<()> {
        self.controller.pack_generator_arg(generator_id, colony_id, arg).await
    }

    async fn get_generator(&self, id: &GeneratorId) -> Result<Option<Generator>> {
        self.controller.get_generator_by_id(id).await
    }

    async fn delete_generator(&self, id: GeneratorId) -> Result<()> {
        self.controller.delete_generator_by_id(id).await
    }

    async fn add_cron(
        &self,
        colony_id: ColonyId,
        name: String,
        cron_expression: String,
        interval: i64,
        random: bool,
        workflow_spec: String,
    ) -> Result<Cron> {
        let cron = Cron::new(colony_id, name, cron_expression, interval, random, workflow_spec)?;
        self.controller.add_cron(cron.clone()).await?;
        Ok(cron)
    }

    async fn delete_cron(&self, id: CronId) -> Result<()> {
        self.controller.delete_cron_by_id(id).await
    }

    async fn get_cron(&self, id: &CronId) -> Result<Option<Cron>> {
        self.controller.get_cron_by_id(id).await
    }

    async fn list_crons(&self, colony_id: &ColonyId, count: usize) -> Result<Vec<Cron>> {
        self.controller.find_crons_by_colony_id(colony_id, count).await
    }

    async fn run_cron_now(&self, id: CronId) -> Result<ProcessGraph> {
        self.controller.run_cron_now(id).await
    }

    async fn statistics(&self, colony_id: &ColonyId) -> Result<Statistics> {
        self.controller.colony_statistics(colony_id).await
    }

    async fn shutdown(&self) {
        self.controller.stop().await;
    }
}
