// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! colonies-controller: the orchestrator's command-serialized state machine.
//!
//! Everything that mutates the logical store — workflow submission,
//! assignment, closure/retry, generator and cron firing — runs as a closure
//! enqueued on [`Controller`]'s single command queue and executed by one
//! dedicated worker task. This gives transaction-like linearizability
//! without row-level locking: for any two concurrent callers, one command
//! fully completes before the next begins. Background tickers
//! (`timeout_loop`, `generator_loop`, `cron_loop`) compose commands exactly
//! like external callers; they never touch storage directly.
//!
//! A generic `Clock` parameter is threaded through the whole stack, shared
//! mutable state lives behind a lock the mutator owns, and events are
//! pushed out on a channel rather than returned inline.

pub mod config;
pub mod cron_clock;
pub mod error;
pub mod event_bus;
pub mod graph_resolver;
pub mod leader;
pub mod planner;
pub mod subscription;

pub use config::ControllerConfig;
pub use cron_clock::{CronClock, CronParseError, SystemCronClock};
pub use error::{ControllerError, Result};
pub use event_bus::{ClusterRelay, EventBus, NoopRelay, ProcessEvent};
pub use leader::{LeaderElection, SingleNodeLeader};
pub use planner::{BasicPlanner, Planner};
pub use subscription::{DesiredState, SubscriptionController};

use chrono::{DateTime, Utc};
use colonies_core::{
    Clock, Colony, ColonyId, Cron, CronId, Generator, GeneratorArg, GeneratorId, NextRunPolicy, Process,
    ProcessGraph, ProcessGraphId, ProcessGraphState, ProcessId, ProcessState, Runtime, RuntimeId, Statistics,
    WorkflowSpec,
};
use colonies_storage::Storage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Shared dependencies visible to every command handler and background
/// tick. Constructed once by [`Controller::new`] and handed to the worker
/// task as an `Arc`.
struct Ctx<C: Clock> {
    storage: Arc<dyn Storage>,
    planner: Arc<dyn Planner>,
    cron_clock: Arc<dyn CronClock>,
    clock: C,
    config: ControllerConfig,
    event_bus: Arc<EventBus>,
    subscriptions: Mutex<SubscriptionController>,
}

/// One queued unit of work. `Mutate` bundles a mutation closure with its own
/// reply plumbing (the closure sends its result down a oneshot it captured);
/// `Stop` is the shutdown signal — after the worker processes it, it exits.
enum Command<C: Clock> {
    Mutate(Box<dyn FnOnce(Arc<Ctx<C>>) -> BoxFuture<'static, ()> + Send>),
    Stop,
}

/// External dependencies the controller is constructed with.
pub struct ControllerDeps<C: Clock> {
    pub storage: Arc<dyn Storage>,
    pub planner: Arc<dyn Planner>,
    pub cron_clock: Arc<dyn CronClock>,
    pub leader: Arc<dyn LeaderElection>,
    pub clock: C,
    pub config: ControllerConfig,
    pub relay: Box<dyn ClusterRelay>,
}

/// The orchestrator core: a process-wide singleton per node, explicitly
/// constructed with `new` and torn down with `stop` (no ambient module-level
/// storage, per the source's ownership model).
pub struct Controller<C: Clock> {
    cmd_tx: mpsc::Sender<Command<C>>,
    ctx: Arc<Ctx<C>>,
    leader: Arc<dyn LeaderElection>,
    stop_flag: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    tickers: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Clock> Controller<C> {
    pub fn new(deps: ControllerDeps<C>) -> Self {
        let ctx = Arc::new(Ctx {
            storage: deps.storage,
            planner: deps.planner,
            cron_clock: deps.cron_clock,
            clock: deps.clock,
            config: deps.config.clone(),
            event_bus: Arc::new(EventBus::new(deps.relay)),
            subscriptions: Mutex::new(SubscriptionController::new()),
        });

        // "Unbuffered queue": capacity 1 is tokio's closest equivalent to a
        // rendezvous channel (zero-capacity mpsc is not allowed).
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command<C>>(1);
        let stop_flag = Arc::new(AtomicBool::new(false));

        let worker_ctx = ctx.clone();
        let worker = tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    Command::Stop => break,
                    Command::Mutate(f) => f(worker_ctx.clone()).await,
                }
            }
        });

        let leader = deps.leader;
        {
            let leader = leader.clone();
            tokio::spawn(async move { leader.start().await });
        }

        let mut tickers = Vec::with_capacity(3);
        tickers.push(spawn_ticker(
            deps.config.timeout_tick,
            cmd_tx.clone(),
            leader.clone(),
            stop_flag.clone(),
            timeout_tick_boxed,
        ));
        tickers.push(spawn_ticker(
            deps.config.generator_tick,
            cmd_tx.clone(),
            leader.clone(),
            stop_flag.clone(),
            generator_tick_boxed,
        ));
        tickers.push(spawn_ticker(
            deps.config.cron_tick,
            cmd_tx.clone(),
            leader.clone(),
            stop_flag.clone(),
            cron_tick_boxed,
        ));

        Self { cmd_tx, ctx, leader, stop_flag, worker: Mutex::new(Some(worker)), tickers: Mutex::new(tickers) }
    }

    /// Signals shutdown, drains the worker and ticker tasks, stops leader
    /// election, and returns the consensus backend's ephemeral storage dir
    /// (if any) for the caller to remove.
    pub async fn stop(&self) -> Option<std::path::PathBuf> {
        self.stop_flag.store(true, Ordering::SeqCst);
        for handle in self.tickers.lock().drain(..) {
            handle.abort();
        }
        let _ = self.cmd_tx.send(Command::Stop).await;
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.await;
        }
        self.leader.stop().await;
        self.leader.storage_dir()
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ProcessEvent> {
        self.ctx.event_bus.subscribe()
    }

    async fn dispatch<T, F, Fut>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Ctx<C>>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let cmd = Command::Mutate(Box::new(move |ctx| {
            Box::pin(async move {
                let result = f(ctx).await;
                let _ = tx.send(result);
            })
        }));
        self.cmd_tx.send(cmd).await.map_err(|_| ControllerError::StateConflict("controller is stopped".to_string()))?;
        rx.await.map_err(|_| ControllerError::StateConflict("controller is stopped".to_string()))?
    }

    // ---- Colonies ----

    pub async fn add_colony(&self, colony: Colony) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.add_colony(colony).await?) }).await
    }

    pub async fn get_colonies(&self) -> Result<Vec<Colony>> {
        Ok(self.ctx.storage.get_colonies().await?)
    }

    pub async fn get_colony_by_id(&self, id: &ColonyId) -> Result<Option<Colony>> {
        Ok(self.ctx.storage.get_colony_by_id(id).await?)
    }

    pub async fn delete_colony_by_id(&self, id: ColonyId) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.delete_colony_by_id(&id).await?) }).await
    }

    // ---- Runtimes ----

    pub async fn add_runtime(&self, runtime: Runtime) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.add_runtime(runtime).await?) }).await
    }

    pub async fn approve_runtime(&self, id: RuntimeId) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.approve_runtime(&id).await?) }).await
    }

    pub async fn reject_runtime(&self, id: RuntimeId) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.reject_runtime(&id).await?) }).await
    }

    pub async fn delete_runtime_by_id(&self, id: RuntimeId) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.delete_runtime_by_id(&id).await?) }).await
    }

    pub async fn get_runtime_by_id(&self, id: &RuntimeId) -> Result<Option<Runtime>> {
        Ok(self.ctx.storage.get_runtime_by_id(id).await?)
    }

    pub async fn get_runtimes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Runtime>> {
        Ok(self.ctx.storage.get_runtimes_by_colony_id(colony_id).await?)
    }

    // ---- Workflows / processes ----

    /// §4.2 `submitWorkflow`.
    pub async fn submit_workflow(
        &self,
        colony_id: ColonyId,
        workflow: WorkflowSpec,
        args: Vec<String>,
    ) -> Result<ProcessGraph> {
        self.dispatch(move |ctx| async move {
            let now = ctx.clock.now();
            submit_workflow_inner(&ctx, colony_id, workflow, args, now).await
        })
        .await
    }

    /// §4.3 `assignRuntime`. Long-poll retry on `NoProcessesAvailable` is the
    /// transport layer's job (§4.3); this resolves a single attempt.
    pub async fn assign_runtime(&self, runtime_id: RuntimeId, colony_id: ColonyId, latest: bool) -> Result<Process> {
        self.dispatch(move |ctx| async move {
            let now = ctx.clock.now();
            assign_runtime_inner(&ctx, &runtime_id, &colony_id, latest, now).await
        })
        .await
    }

    pub async fn close_successful(&self, process_id: ProcessId) -> Result<()> {
        self.dispatch(move |ctx| async move {
            let now = ctx.clock.now();
            close_successful_inner(&ctx, &process_id, now).await
        })
        .await
    }

    pub async fn close_failed(&self, process_id: ProcessId, error_msg: String) -> Result<()> {
        self.dispatch(move |ctx| async move {
            let now = ctx.clock.now();
            close_failed_inner(&ctx, &process_id, error_msg, now).await
        })
        .await
    }

    pub async fn get_process_by_id(&self, id: &ProcessId) -> Result<Option<Process>> {
        Ok(self.ctx.storage.get_process_by_id(id).await?)
    }

    /// Registers a long-poll subscription for `process_id` reaching a
    /// terminal or matching state. The transport layer awaits the returned
    /// receiver and retries `assign_runtime`/`get_process_by_id` itself.
    pub fn subscribe_process(
        &self,
        process_id: ProcessId,
        deadline: DateTime<Utc>,
    ) -> oneshot::Receiver<Process> {
        self.ctx.subscriptions.lock().subscribe_process(process_id, deadline)
    }

    pub fn subscribe_colony_type(
        &self,
        colony_id: ColonyId,
        runtime_type: String,
        desired_state: DesiredState,
        deadline: DateTime<Utc>,
    ) -> oneshot::Receiver<Process> {
        self.ctx.subscriptions.lock().subscribe_colony_type(colony_id, runtime_type, desired_state, deadline)
    }

    pub async fn find_process_graphs_by_colony_id(
        &self,
        colony_id: &ColonyId,
        state: Option<ProcessGraphState>,
        count: usize,
    ) -> Result<Vec<ProcessGraph>> {
        if count > self.ctx.config.max_count {
            return Err(ControllerError::CountExceeded { requested: count, max: self.ctx.config.max_count });
        }
        let mut graphs = self.ctx.storage.find_process_graphs_by_colony_id(colony_id, state).await?;
        graphs.truncate(count);
        Ok(graphs)
    }

    // ---- Generators ----

    pub async fn add_generator(&self, generator: Generator) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.add_generator(generator).await?) }).await
    }

    /// "Pack": appends an argument onto a generator's pending-args buffer.
    pub async fn pack_generator_arg(&self, generator_id: GeneratorId, colony_id: ColonyId, arg: String) -> Result<()> {
        self.dispatch(move |ctx| async move {
            if ctx.storage.get_generator_by_id(&generator_id).await?.is_none() {
                return Err(ControllerError::NotFound(format!("generator {generator_id}")));
            }
            let arg = GeneratorArg::new(generator_id, colony_id, arg);
            Ok(ctx.storage.add_generator_arg(arg).await?)
        })
        .await
    }

    pub async fn delete_generator_by_id(&self, id: GeneratorId) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.delete_generator_by_id(&id).await?) }).await
    }

    pub async fn get_generator_by_id(&self, id: &GeneratorId) -> Result<Option<Generator>> {
        Ok(self.ctx.storage.get_generator_by_id(id).await?)
    }

    // ---- Crons ----

    pub async fn add_cron(&self, cron: Cron) -> Result<()> {
        self.dispatch(move |ctx| async move { Ok(ctx.storage.add_cron(cron).await?) }).await
    }

    pub async fn delete_cron_by_id(&self, id: CronId) -> Result<()> {
        // §9 note 3: deletion does not re-resolve related workflows; crons
        // are schedulers, not owners of the graphs they already fired.
        self.dispatch(move |ctx| async move { Ok(ctx.storage.delete_cron_by_id(&id).await?) }).await
    }

    pub async fn get_cron_by_id(&self, id: &CronId) -> Result<Option<Cron>> {
        Ok(self.ctx.storage.get_cron_by_id(id).await?)
    }

    pub async fn find_crons_by_colony_id(&self, colony_id: &ColonyId, count: usize) -> Result<Vec<Cron>> {
        if count > self.ctx.config.max_count {
            return Err(ControllerError::CountExceeded { requested: count, max: self.ctx.config.max_count });
        }
        let mut crons = self.ctx.storage.find_crons_by_colony_id(colony_id).await?;
        crons.truncate(count);
        Ok(crons)
    }

    /// Forces a cron to fire immediately (the CLI's `run` subcommand),
    /// bypassing `NextRun` but following the same submission path and
    /// bookkeeping the trigger loop uses.
    pub async fn run_cron_now(&self, id: CronId) -> Result<ProcessGraph> {
        self.dispatch(move |ctx| async move {
            let now = ctx.clock.now();
            let cron = ctx.storage.get_cron_by_id(&id).await?.ok_or_else(|| ControllerError::NotFound(format!("cron {id}")))?;
            let workflow = WorkflowSpec::from_json(&cron.workflow_spec)?;
            let graph = submit_workflow_inner(&ctx, cron.colony_id.clone(), workflow, vec![], now).await?;
            let next_run = calc_next_run(&cron, now, &*ctx.cron_clock).ok();
            ctx.storage.update_cron(&id, next_run, Some(now), Some(graph.id.clone())).await?;
            Ok(graph)
        })
        .await
    }

    // ---- Statistics ----

    pub async fn colony_statistics(&self, colony_id: &ColonyId) -> Result<Statistics> {
        let storage = &self.ctx.storage;
        Ok(Statistics {
            colonies: storage.count_colonies().await?,
            runtimes: storage.count_runtimes_by_colony_id(colony_id).await?,
            waiting_processes: storage.find_waiting_processes_by_colony_id(colony_id).await?.len() as i64,
            running_processes: storage.find_running_processes_by_colony_id(colony_id).await?.len() as i64,
            successful_processes: storage.find_successful_processes_by_colony_id(colony_id).await?.len() as i64,
            failed_processes: storage.find_failed_processes_by_colony_id(colony_id).await?.len() as i64,
            waiting_process_graphs: storage
                .find_process_graphs_by_colony_id(colony_id, Some(ProcessGraphState::Waiting))
                .await?
                .len() as i64,
            running_process_graphs: storage
                .find_process_graphs_by_colony_id(colony_id, Some(ProcessGraphState::Running))
                .await?
                .len() as i64,
            successful_process_graphs: storage
                .find_process_graphs_by_colony_id(colony_id, Some(ProcessGraphState::Success))
                .await?
                .len() as i64,
            failed_process_graphs: storage
                .find_process_graphs_by_colony_id(colony_id, Some(ProcessGraphState::Failed))
                .await?
                .len() as i64,
        })
    }
}

fn emit<C: Clock>(ctx: &Ctx<C>, process: &Process) {
    ctx.event_bus.signal(ProcessEvent {
        process_id: process.id.clone(),
        process_graph_id: process.process_graph_id.clone(),
        colony_id: process.spec.conditions.colony_id.clone(),
        state: process.state,
        timestamp: ctx.clock.now(),
    });
    ctx.subscriptions.lock().notify(process);
}

async fn submit_workflow_inner<C: Clock>(
    ctx: &Ctx<C>,
    colony_id: ColonyId,
    workflow: WorkflowSpec,
    args: Vec<String>,
    now: DateTime<Utc>,
) -> Result<ProcessGraph> {
    let mut processes: Vec<Process> = Vec::with_capacity(workflow.process_specs.len());
    let mut index_by_name: HashMap<String, usize> = HashMap::with_capacity(workflow.process_specs.len());
    for spec in workflow.process_specs {
        let mut spec = spec;
        spec.conditions.colony_id = colony_id.clone();
        index_by_name.insert(spec.name.clone(), processes.len());
        processes.push(Process::new(spec, now));
    }

    // Validate every dependency resolves to a declared spec name *before*
    // persisting anything: per §9 note 4, the graph row must not leak when
    // submission fails `InvalidDependency`.
    for process in &processes {
        for dep in &process.spec.conditions.dependencies {
            if !index_by_name.contains_key(dep) {
                return Err(ControllerError::InvalidDependency(format!(
                    "process {:?} depends on undeclared spec {dep:?}",
                    process.spec.name
                )));
            }
        }
    }

    let mut root_ids = Vec::new();
    for i in 0..processes.len() {
        if processes[i].spec.conditions.dependencies.is_empty() {
            processes[i].wait_for_parents = false;
            if !args.is_empty() {
                processes[i].spec.args = args.clone();
            }
            root_ids.push(processes[i].id.clone());
        } else {
            processes[i].wait_for_parents = true;
            let dep_names: Vec<String> = processes[i].spec.conditions.dependencies.iter().cloned().collect();
            let parent_ids: Vec<ProcessId> = dep_names.iter().map(|d| processes[index_by_name[d]].id.clone()).collect();
            processes[i].parents = parent_ids;
        }
    }
    for i in 0..processes.len() {
        let child_id = processes[i].id.clone();
        let parent_ids = processes[i].parents.clone();
        for parent_id in parent_ids {
            let parent_idx = processes.iter().position(|p| p.id == parent_id).unwrap_or(i);
            if !processes[parent_idx].children.contains(&child_id) {
                processes[parent_idx].children.push(child_id.clone());
            }
        }
    }

    let graph = ProcessGraph::new(colony_id, root_ids, now);
    ctx.storage.add_process_graph(graph.clone()).await?;

    for mut process in processes {
        process.process_graph_id = Some(graph.id.clone());
        ctx.storage.add_process(process.clone()).await?;
        emit(ctx, &process);
    }

    Ok(graph)
}

async fn assign_runtime_inner<C: Clock>(
    ctx: &Ctx<C>,
    runtime_id: &RuntimeId,
    colony_id: &ColonyId,
    latest: bool,
    now: DateTime<Utc>,
) -> Result<Process> {
    let runtime = ctx
        .storage
        .get_runtime_by_id(runtime_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("runtime {runtime_id}")))?;
    if !runtime.is_approved() {
        return Err(ControllerError::StateConflict(format!("runtime {runtime_id} is not approved")));
    }
    ctx.storage.mark_alive(runtime_id, now).await?;

    let candidates = ctx
        .storage
        .find_unassigned_processes(colony_id, runtime_id, &runtime.runtime_type, ctx.config.candidate_batch_size, latest)
        .await?;
    let mut process = ctx.planner.select(runtime_id, &runtime.runtime_type, &candidates)?;
    process.assign(runtime_id.clone(), now)?;
    ctx.storage.update_process(process.clone()).await?;

    if let Some(graph_id) = &process.process_graph_id {
        graph_resolver::resolve(&*ctx.storage, graph_id).await?;
    }
    emit(ctx, &process);
    Ok(process)
}

async fn close_successful_inner<C: Clock>(ctx: &Ctx<C>, process_id: &ProcessId, now: DateTime<Utc>) -> Result<()> {
    let mut process = ctx
        .storage
        .get_process_by_id(process_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("process {process_id}")))?;
    process.close_successful(now)?;
    ctx.storage.update_process(process.clone()).await?;
    graph_resolver::propagate_closure(&*ctx.storage, &process, now).await?;
    if let Some(graph_id) = &process.process_graph_id {
        graph_resolver::resolve(&*ctx.storage, graph_id).await?;
    }
    emit(ctx, &process);
    Ok(())
}

async fn close_failed_inner<C: Clock>(
    ctx: &Ctx<C>,
    process_id: &ProcessId,
    error_msg: String,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut process = ctx
        .storage
        .get_process_by_id(process_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("process {process_id}")))?;
    process.close_failed(error_msg, now)?;
    ctx.storage.update_process(process.clone()).await?;
    graph_resolver::propagate_closure(&*ctx.storage, &process, now).await?;
    if let Some(graph_id) = &process.process_graph_id {
        graph_resolver::resolve(&*ctx.storage, graph_id).await?;
    }
    emit(ctx, &process);
    Ok(())
}

/// §4.4's automatic retry/timeout sweep, plus wait-deadline enforcement.
async fn timeout_tick<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> Result<()> {
    for mut process in ctx.storage.find_running_processes().await? {
        let Some(deadline) = process.exec_deadline else { continue };
        if deadline > now {
            continue;
        }
        if process.exhausted_retries() {
            process.close_failed(format!("exec deadline exceeded after {} retries", process.retries), now)?;
        } else {
            process.retry(now)?;
        }
        ctx.storage.update_process(process.clone()).await?;
        if process.is_terminal() {
            graph_resolver::propagate_closure(&*ctx.storage, &process, now).await?;
        }
        if let Some(graph_id) = &process.process_graph_id {
            graph_resolver::resolve(&*ctx.storage, graph_id).await?;
        }
        emit(&ctx, &process);
    }

    for mut process in ctx.storage.find_waiting_processes().await? {
        let Some(deadline) = process.wait_deadline else { continue };
        if deadline > now {
            continue;
        }
        process.close_failed("wait deadline exceeded", now)?;
        ctx.storage.update_process(process.clone()).await?;
        graph_resolver::propagate_closure(&*ctx.storage, &process, now).await?;
        if let Some(graph_id) = &process.process_graph_id {
            graph_resolver::resolve(&*ctx.storage, graph_id).await?;
        }
        emit(&ctx, &process);
    }

    ctx.subscriptions.lock().prune_expired(now);
    Ok(())
}

/// §4.5's generator trigger sweep.
async fn generator_tick<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> Result<()> {
    for generator in ctx.storage.find_all_generators().await? {
        let pending = ctx.storage.count_generator_args(&generator.id).await?;
        let fire_count = generator.fire_count(pending);
        if fire_count <= 0 {
            continue;
        }
        let workflow = match WorkflowSpec::from_json(&generator.workflow_spec) {
            Ok(workflow) => workflow,
            Err(err) => {
                tracing::error!(generator = %generator.id, %err, "generator workflow spec failed to parse");
                continue;
            }
        };
        let trigger = generator.trigger.max(0) as usize;
        for _ in 0..fire_count {
            let batch = ctx.storage.get_generator_args(&generator.id, trigger).await?;
            if batch.len() < trigger {
                break;
            }
            let args: Vec<String> = batch.iter().map(|a| a.arg.clone()).collect();
            match submit_workflow_inner(&ctx, generator.colony_id.clone(), workflow.clone(), args, now).await {
                Ok(_) => {
                    for arg in &batch {
                        ctx.storage.delete_generator_arg_by_id(&arg.id).await?;
                    }
                }
                Err(err) => tracing::error!(generator = %generator.id, %err, "generator firing failed"),
            }
        }
        ctx.storage.set_generator_last_run(&generator.id, now).await?;
    }
    Ok(())
}

/// §4.5's cron trigger sweep.
async fn cron_tick<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> Result<()> {
    for cron in ctx.storage.find_all_crons().await? {
        let next_run = match cron.next_run {
            Some(nr) => Some(nr),
            None => match calc_next_run(&cron, now, &*ctx.cron_clock) {
                Ok(nr) => Some(nr),
                Err(err) => {
                    tracing::error!(cron = %cron.id, %err, "failed to compute next run");
                    continue;
                }
            },
        };

        if next_run.map(|nr| nr > now).unwrap_or(true) {
            ctx.storage.update_cron(&cron.id, next_run, cron.last_run, None).await?;
            continue;
        }

        let workflow = match WorkflowSpec::from_json(&cron.workflow_spec) {
            Ok(workflow) => workflow,
            Err(err) => {
                tracing::error!(cron = %cron.id, %err, "cron workflow spec failed to parse");
                continue;
            }
        };
        match submit_workflow_inner(&ctx, cron.colony_id.clone(), workflow, vec![], now).await {
            Ok(graph) => {
                let new_next = calc_next_run(&cron, now, &*ctx.cron_clock).ok();
                ctx.storage.update_cron(&cron.id, new_next, Some(now), Some(graph.id)).await?;
            }
            Err(err) => tracing::error!(cron = %cron.id, %err, "cron firing failed"),
        }
    }
    Ok(())
}

fn timeout_tick_boxed<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> BoxFuture<'static, Result<()>> {
    Box::pin(timeout_tick(ctx, now))
}

fn generator_tick_boxed<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> BoxFuture<'static, Result<()>> {
    Box::pin(generator_tick(ctx, now))
}

fn cron_tick_boxed<C: Clock>(ctx: Arc<Ctx<C>>, now: DateTime<Utc>) -> BoxFuture<'static, Result<()>> {
    Box::pin(cron_tick(ctx, now))
}

fn calc_next_run(cron: &Cron, now: DateTime<Utc>, clock: &dyn CronClock) -> Result<DateTime<Utc>> {
    Ok(match cron.next_run_policy() {
        NextRunPolicy::RandomWithinInterval(seconds) => clock.random(now, seconds),
        NextRunPolicy::FixedInterval(seconds) => clock.next_interval(now, seconds),
        NextRunPolicy::CronExpression => clock.next(&cron.cron_expression, now).map_err(|err| {
            ControllerError::InvalidArgument(format!("cron expression {:?}: {err}", cron.cron_expression))
        })?,
    })
}

#[allow(clippy::too_many_arguments)]
fn spawn_ticker<C, F>(
    period: std::time::Duration,
    cmd_tx: mpsc::Sender<Command<C>>,
    leader: Arc<dyn LeaderElection>,
    stop_flag: Arc<AtomicBool>,
    tick: F,
) -> JoinHandle<()>
where
    C: Clock,
    F: Fn(Arc<Ctx<C>>, DateTime<Utc>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
{
    let tick = Arc::new(tick);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if stop_flag.load(Ordering::SeqCst) {
                break;
            }
            if !leader.is_leader() {
                tracing::debug!("skipping background tick, not leader");
                continue;
            }
            let tick = tick.clone();
            let cmd = Command::Mutate(Box::new(move |ctx| {
                Box::pin(async move {
                    let now = ctx.clock.now();
                    if let Err(err) = tick(ctx.clone(), now).await {
                        tracing::error!(%err, "background tick failed");
                    }
                })
            }));
            if cmd_tx.send(cmd).await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonies_core::{Conditions, FakeClock, ProcessSpec};
    use colonies_storage::MemStorage;
    use std::collections::{BTreeMap, BTreeSet};
    use std::time::Duration;

    fn test_config() -> ControllerConfig {
        ControllerConfig {
            timeout_tick: Duration::from_millis(5),
            generator_tick: Duration::from_millis(5),
            cron_tick: Duration::from_millis(5),
            ..ControllerConfig::default()
        }
    }

    fn spec(colony_id: ColonyId, name: &str, deps: &[&str], runtime_type: &str) -> ProcessSpec {
        ProcessSpec {
            name: name.to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: -1,
            max_retries: -1,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id,
                runtime_ids: vec![],
                runtime_type: runtime_type.to_string(),
                dependencies: deps.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    async fn new_controller() -> (Controller<FakeClock>, ColonyId) {
        let clock = FakeClock::default();
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let colony = Colony::new("lab");
        storage.add_colony(colony.clone()).await.unwrap();
        let controller = Controller::new(ControllerDeps {
            storage,
            planner: Arc::new(BasicPlanner),
            cron_clock: Arc::new(SystemCronClock),
            leader: Arc::new(SingleNodeLeader::new()),
            clock,
            config: test_config(),
            relay: Box::new(NoopRelay),
        });
        (controller, colony.id)
    }

    #[tokio::test]
    async fn singleton_submit_and_assign_transitions_pending_to_running() {
        let (controller, colony_id) = new_controller().await;
        let runtime = Runtime::new(colony_id.clone(), "cuda");
        controller.add_runtime(runtime.clone()).await.unwrap();
        controller.approve_runtime(runtime.id.clone()).await.unwrap();

        let workflow = WorkflowSpec { process_specs: vec![spec(colony_id.clone(), "a", &[], "cuda")] };
        let graph = controller.submit_workflow(colony_id.clone(), workflow, vec![]).await.unwrap();

        let assigned = controller.assign_runtime(runtime.id.clone(), colony_id, false).await.unwrap();
        assert_eq!(assigned.state, ProcessState::Running);
        assert_eq!(assigned.assigned_runtime_id, Some(runtime.id.clone()));
        assert_eq!(assigned.process_graph_id, Some(graph.id));

        let heard = controller.get_runtime_by_id(&runtime.id).await.unwrap().unwrap();
        assert!(heard.last_heard_from_time.is_some());
    }

    #[tokio::test]
    async fn assign_with_no_candidates_returns_no_processes_available() {
        let (controller, colony_id) = new_controller().await;
        let runtime = Runtime::new(colony_id.clone(), "cuda");
        controller.add_runtime(runtime.clone()).await.unwrap();
        controller.approve_runtime(runtime.id.clone()).await.unwrap();
        let err = controller.assign_runtime(runtime.id, colony_id, false).await.unwrap_err();
        assert!(matches!(err, ControllerError::NoProcessesAvailable));
    }

    #[tokio::test]
    async fn assign_rejects_an_unapproved_runtime() {
        let (controller, colony_id) = new_controller().await;
        let runtime = Runtime::new(colony_id.clone(), "cuda");
        controller.add_runtime(runtime.clone()).await.unwrap();

        let workflow = WorkflowSpec { process_specs: vec![spec(colony_id.clone(), "a", &[], "cuda")] };
        controller.submit_workflow(colony_id.clone(), workflow, vec![]).await.unwrap();

        let err = controller.assign_runtime(runtime.id, colony_id, false).await.unwrap_err();
        assert!(matches!(err, ControllerError::StateConflict(_)));
    }

    #[tokio::test]
    async fn workflow_dependencies_unblock_children_on_parent_success() {
        let (controller, colony_id) = new_controller().await;
        let runtime = Runtime::new(colony_id.clone(), "cuda");
        controller.add_runtime(runtime.clone()).await.unwrap();
        controller.approve_runtime(runtime.id.clone()).await.unwrap();

        let workflow = WorkflowSpec {
            process_specs: vec![
                spec(colony_id.clone(), "A", &[], "cuda"),
                spec(colony_id.clone(), "B", &["A"], "cuda"),
                spec(colony_id.clone(), "C", &["A"], "cuda"),
            ],
        };
        controller.submit_workflow(colony_id.clone(), workflow, vec![]).await.unwrap();

        let a = controller.assign_runtime(runtime.id.clone(), colony_id.clone(), false).await.unwrap();
        assert_eq!(a.spec.name, "A");
        assert!(matches!(
            controller.assign_runtime(runtime.id.clone(), colony_id.clone(), false).await,
            Err(ControllerError::NoProcessesAvailable)
        ));

        controller.close_successful(a.id).await.unwrap();

        let b_or_c = controller.assign_runtime(runtime.id.clone(), colony_id.clone(), false).await.unwrap();
        assert!(b_or_c.spec.name == "B" || b_or_c.spec.name == "C");
        let last = controller.assign_runtime(runtime.id.clone(), colony_id.clone(), false).await.unwrap();
        assert_ne!(last.spec.name, b_or_c.spec.name);

        controller.close_successful(b_or_c.id).await.unwrap();
        controller.close_successful(last.id).await.unwrap();

        let graphs = controller.find_process_graphs_by_colony_id(&colony_id, None, 10).await.unwrap();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].state, ProcessGraphState::Success);
    }

    #[tokio::test]
    async fn submitting_a_workflow_with_undeclared_dependency_leaves_no_graph() {
        let (controller, colony_id) = new_controller().await;
        let workflow = WorkflowSpec { process_specs: vec![spec(colony_id.clone(), "B", &["ghost"], "cuda")] };
        let err = controller.submit_workflow(colony_id.clone(), workflow, vec![]).await.unwrap_err();
        assert!(matches!(err, ControllerError::InvalidDependency(_)));
        let graphs = controller.find_process_graphs_by_colony_id(&colony_id, None, 10).await.unwrap();
        assert!(graphs.is_empty());
    }

    #[tokio::test]
    async fn generator_fires_a_workflow_once_trigger_is_reached() {
        let (controller, colony_id) = new_controller().await;
        let workflow = WorkflowSpec { process_specs: vec![spec(colony_id.clone(), "a", &[], "cuda")] };
        let generator = Generator::new(colony_id.clone(), "g", workflow.to_json().unwrap(), 3);
        controller.add_generator(generator.clone()).await.unwrap();

        for arg in ["x", "y", "z", "w"] {
            controller.pack_generator_arg(generator.id.clone(), colony_id.clone(), arg.to_string()).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(50)).await;

        let graphs = controller.find_process_graphs_by_colony_id(&colony_id, None, 10).await.unwrap();
        assert_eq!(graphs.len(), 1);
        controller.stop().await;
    }

    #[tokio::test]
    async fn count_exceeded_is_rejected() {
        let (controller, colony_id) = new_controller().await;
        let err = controller
            .find_process_graphs_by_colony_id(&colony_id, None, controller.ctx.config.max_count + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ControllerError::CountExceeded { .. }));
    }

    #[tokio::test]
    async fn stop_is_idempotent_with_repeated_calls() {
        let (controller, _colony_id) = new_controller().await;
        controller.stop().await;
        controller.stop().await;
    }
}
