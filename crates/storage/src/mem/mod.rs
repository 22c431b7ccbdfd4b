// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! In-memory reference implementation of the `Storage` trait.
//!
//! Backs standalone runs and every test in this workspace. Not persisted:
//! a SQL-backed implementation is the external collaborator a real
//! deployment would plug in instead.

use crate::{Result, Storage, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use colonies_core::{
    Attribute, AttributeId, Colony, ColonyId, Cron, CronId, Generator, GeneratorArg, GeneratorArgId, GeneratorId,
    Process, ProcessGraph, ProcessGraphId, ProcessGraphState, ProcessId, ProcessState, Runtime, RuntimeId,
    RuntimeState,
};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct State {
    colonies: HashMap<ColonyId, Colony>,
    runtimes: HashMap<RuntimeId, Runtime>,
    processes: HashMap<ProcessId, Process>,
    process_graphs: HashMap<ProcessGraphId, ProcessGraph>,
    attributes: HashMap<AttributeId, Attribute>,
    generators: HashMap<GeneratorId, Generator>,
    generator_args: HashMap<GeneratorArgId, GeneratorArg>,
    crons: HashMap<CronId, Cron>,
}

/// An in-memory, process-local `Storage` implementation guarded by a single
/// mutex. Fine for the controller's single-writer access pattern and for
/// tests; a real deployment backs `Storage` with a database instead.
#[derive(Default)]
pub struct MemStorage {
    state: Mutex<State>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: impl std::fmt::Display) -> StorageError {
    StorageError::NotFound(format!("{what} {id}"))
}

#[async_trait]
impl Storage for MemStorage {
    // ---- Colonies ----

    async fn add_colony(&self, colony: Colony) -> Result<()> {
        let mut state = self.state.lock();
        if state.colonies.contains_key(&colony.id) {
            return Err(StorageError::Conflict(format!("colony {}", colony.id)));
        }
        state.colonies.insert(colony.id.clone(), colony);
        Ok(())
    }

    async fn get_colonies(&self) -> Result<Vec<Colony>> {
        Ok(self.state.lock().colonies.values().cloned().collect())
    }

    async fn get_colony_by_id(&self, id: &ColonyId) -> Result<Option<Colony>> {
        Ok(self.state.lock().colonies.get(id).cloned())
    }

    async fn delete_colony_by_id(&self, id: &ColonyId) -> Result<()> {
        let mut state = self.state.lock();
        state.colonies.remove(id).ok_or_else(|| not_found("colony", id))?;

        state.runtimes.retain(|_, r| &r.colony_id != id);
        state.process_graphs.retain(|_, g| &g.colony_id != id);
        let dead_processes: Vec<ProcessId> = state
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == id)
            .map(|p| p.id.clone())
            .collect();
        for pid in &dead_processes {
            state.processes.remove(pid);
            state.attributes.retain(|_, a| &a.target_process_id != pid);
        }
        let dead_generators: Vec<GeneratorId> = state
            .generators
            .values()
            .filter(|g| &g.colony_id == id)
            .map(|g| g.id.clone())
            .collect();
        for gid in &dead_generators {
            state.generators.remove(gid);
            state.generator_args.retain(|_, a| &a.generator_id != gid);
        }
        state.crons.retain(|_, c| &c.colony_id != id);
        Ok(())
    }

    async fn count_colonies(&self) -> Result<i64> {
        Ok(self.state.lock().colonies.len() as i64)
    }

    // ---- Runtimes ----

    async fn add_runtime(&self, runtime: Runtime) -> Result<()> {
        let mut state = self.state.lock();
        if state.runtimes.contains_key(&runtime.id) {
            return Err(StorageError::Conflict(format!("runtime {}", runtime.id)));
        }
        state.runtimes.insert(runtime.id.clone(), runtime);
        Ok(())
    }

    async fn get_runtime_by_id(&self, id: &RuntimeId) -> Result<Option<Runtime>> {
        Ok(self.state.lock().runtimes.get(id).cloned())
    }

    async fn get_runtimes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Runtime>> {
        Ok(self
            .state
            .lock()
            .runtimes
            .values()
            .filter(|r| &r.colony_id == colony_id)
            .cloned()
            .collect())
    }

    async fn approve_runtime(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.state.lock();
        let runtime = state.runtimes.get_mut(id).ok_or_else(|| not_found("runtime", id))?;
        runtime.state = RuntimeState::Approved;
        Ok(())
    }

    async fn reject_runtime(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.state.lock();
        let runtime = state.runtimes.get_mut(id).ok_or_else(|| not_found("runtime", id))?;
        runtime.state = RuntimeState::Rejected;
        Ok(())
    }

    async fn delete_runtime_by_id(&self, id: &RuntimeId) -> Result<()> {
        self.state
            .lock()
            .runtimes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("runtime", id))
    }

    async fn mark_alive(&self, id: &RuntimeId, now: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock();
        let runtime = state.runtimes.get_mut(id).ok_or_else(|| not_found("runtime", id))?;
        runtime.mark_alive(now);
        Ok(())
    }

    async fn count_runtimes(&self) -> Result<i64> {
        Ok(self.state.lock().runtimes.len() as i64)
    }

    async fn count_runtimes_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .runtimes
            .values()
            .filter(|r| &r.colony_id == colony_id)
            .count() as i64)
    }

    // ---- Processes ----

    async fn add_process(&self, process: Process) -> Result<()> {
        let mut state = self.state.lock();
        if state.processes.contains_key(&process.id) {
            return Err(StorageError::Conflict(format!("process {}", process.id)));
        }
        state.processes.insert(process.id.clone(), process);
        Ok(())
    }

    async fn get_process_by_id(&self, id: &ProcessId) -> Result<Option<Process>> {
        Ok(self.state.lock().processes.get(id).cloned())
    }

    async fn find_unassigned_processes(
        &self,
        colony_id: &ColonyId,
        runtime_id: &RuntimeId,
        runtime_type: &str,
        max: usize,
        latest: bool,
    ) -> Result<Vec<Process>> {
        let state = self.state.lock();
        let mut candidates: Vec<Process> = state
            .processes
            .values()
            .filter(|p| {
                !p.is_assigned
                    && matches!(p.state, ProcessState::Pending | ProcessState::Waiting)
                    && !p.wait_for_parents
                    && &p.spec.conditions.colony_id == colony_id
                    && (p.spec.conditions.runtime_ids.is_empty() || p.spec.conditions.runtime_ids.contains(runtime_id))
                    && (p.spec.conditions.runtime_type.is_empty() || p.spec.conditions.runtime_type == runtime_type)
            })
            .cloned()
            .collect();
        if latest {
            candidates.sort_by(|a, b| b.submission_time.cmp(&a.submission_time));
        } else {
            candidates.sort_by(|a, b| a.submission_time.cmp(&b.submission_time));
        }
        candidates.truncate(max);
        Ok(candidates)
    }

    async fn find_waiting_processes(&self) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| matches!(p.state, ProcessState::Pending | ProcessState::Waiting))
            .cloned()
            .collect())
    }

    async fn find_running_processes(&self) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| p.state == ProcessState::Running)
            .cloned()
            .collect())
    }

    async fn find_waiting_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| {
                &p.spec.conditions.colony_id == colony_id
                    && matches!(p.state, ProcessState::Pending | ProcessState::Waiting)
            })
            .cloned()
            .collect())
    }

    async fn find_running_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == colony_id && p.state == ProcessState::Running)
            .cloned()
            .collect())
    }

    async fn find_successful_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == colony_id && p.state == ProcessState::Success)
            .cloned()
            .collect())
    }

    async fn find_failed_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == colony_id && p.state == ProcessState::Failed)
            .cloned()
            .collect())
    }

    async fn find_processes_by_graph_id(&self, graph_id: &ProcessGraphId) -> Result<Vec<Process>> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| p.process_graph_id.as_ref() == Some(graph_id))
            .cloned()
            .collect())
    }

    async fn update_process(&self, process: Process) -> Result<()> {
        let mut state = self.state.lock();
        if !state.processes.contains_key(&process.id) {
            return Err(not_found("process", &process.id));
        }
        state.processes.insert(process.id.clone(), process);
        Ok(())
    }

    async fn delete_process_by_id(&self, id: &ProcessId) -> Result<()> {
        let mut state = self.state.lock();
        state.processes.remove(id).ok_or_else(|| not_found("process", id))?;
        state.attributes.retain(|_, a| &a.target_process_id != id);
        Ok(())
    }

    async fn delete_all_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<()> {
        let mut state = self.state.lock();
        let dead: Vec<ProcessId> = state
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == colony_id)
            .map(|p| p.id.clone())
            .collect();
        for id in &dead {
            state.processes.remove(id);
            state.attributes.retain(|_, a| &a.target_process_id != id);
        }
        Ok(())
    }

    async fn count_processes_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .processes
            .values()
            .filter(|p| &p.spec.conditions.colony_id == colony_id)
            .count() as i64)
    }

    // ---- ProcessGraphs ----

    async fn add_process_graph(&self, graph: ProcessGraph) -> Result<()> {
        let mut state = self.state.lock();
        if state.process_graphs.contains_key(&graph.id) {
            return Err(StorageError::Conflict(format!("process graph {}", graph.id)));
        }
        state.process_graphs.insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn get_process_graph_by_id(&self, id: &ProcessGraphId) -> Result<Option<ProcessGraph>> {
        Ok(self.state.lock().process_graphs.get(id).cloned())
    }

    async fn update_process_graph(&self, graph: ProcessGraph) -> Result<()> {
        let mut state = self.state.lock();
        if !state.process_graphs.contains_key(&graph.id) {
            return Err(not_found("process graph", &graph.id));
        }
        state.process_graphs.insert(graph.id.clone(), graph);
        Ok(())
    }

    async fn find_process_graphs_by_colony_id(
        &self,
        colony_id: &ColonyId,
        state_filter: Option<ProcessGraphState>,
    ) -> Result<Vec<ProcessGraph>> {
        Ok(self
            .state
            .lock()
            .process_graphs
            .values()
            .filter(|g| &g.colony_id == colony_id && state_filter.map(|s| s == g.state).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn delete_process_graph_by_id(&self, id: &ProcessGraphId) -> Result<()> {
        self.state
            .lock()
            .process_graphs
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("process graph", id))
    }

    async fn count_process_graphs_by_colony_id(&self, colony_id: &ColonyId) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .process_graphs
            .values()
            .filter(|g| &g.colony_id == colony_id)
            .count() as i64)
    }

    // ---- Attributes ----

    async fn add_attribute(&self, attribute: Attribute) -> Result<()> {
        let mut state = self.state.lock();
        state.attributes.insert(attribute.id.clone(), attribute);
        Ok(())
    }

    async fn get_attribute_by_id(&self, id: &AttributeId) -> Result<Option<Attribute>> {
        Ok(self.state.lock().attributes.get(id).cloned())
    }

    async fn get_attributes_by_process_id(&self, process_id: &ProcessId) -> Result<Vec<Attribute>> {
        Ok(self
            .state
            .lock()
            .attributes
            .values()
            .filter(|a| &a.target_process_id == process_id)
            .cloned()
            .collect())
    }

    // ---- Generators ----

    async fn add_generator(&self, generator: Generator) -> Result<()> {
        let mut state = self.state.lock();
        if state.generators.contains_key(&generator.id) {
            return Err(StorageError::Conflict(format!("generator {}", generator.id)));
        }
        state.generators.insert(generator.id.clone(), generator);
        Ok(())
    }

    async fn get_generator_by_id(&self, id: &GeneratorId) -> Result<Option<Generator>> {
        Ok(self.state.lock().generators.get(id).cloned())
    }

    async fn find_generators_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Generator>> {
        Ok(self
            .state
            .lock()
            .generators
            .values()
            .filter(|g| &g.colony_id == colony_id)
            .cloned()
            .collect())
    }

    async fn find_all_generators(&self) -> Result<Vec<Generator>> {
        Ok(self.state.lock().generators.values().cloned().collect())
    }

    async fn set_generator_last_run(&self, id: &GeneratorId, last_run: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock();
        let generator = state.generators.get_mut(id).ok_or_else(|| not_found("generator", id))?;
        generator.last_run = Some(last_run);
        Ok(())
    }

    async fn delete_generator_by_id(&self, id: &GeneratorId) -> Result<()> {
        let mut state = self.state.lock();
        state.generators.remove(id).ok_or_else(|| not_found("generator", id))?;
        state.generator_args.retain(|_, a| &a.generator_id != id);
        Ok(())
    }

    async fn delete_all_generators_by_colony_id(&self, colony_id: &ColonyId) -> Result<()> {
        let mut state = self.state.lock();
        let dead: Vec<GeneratorId> = state
            .generators
            .values()
            .filter(|g| &g.colony_id == colony_id)
            .map(|g| g.id.clone())
            .collect();
        for id in &dead {
            state.generators.remove(id);
            state.generator_args.retain(|_, a| &a.generator_id != id);
        }
        Ok(())
    }

    async fn add_generator_arg(&self, arg: GeneratorArg) -> Result<()> {
        self.state.lock().generator_args.insert(arg.id.clone(), arg);
        Ok(())
    }

    async fn get_generator_args(&self, generator_id: &GeneratorId, limit: usize) -> Result<Vec<GeneratorArg>> {
        let mut args: Vec<GeneratorArg> = self
            .state
            .lock()
            .generator_args
            .values()
            .filter(|a| &a.generator_id == generator_id)
            .cloned()
            .collect();
        args.truncate(limit);
        Ok(args)
    }

    async fn delete_generator_arg_by_id(&self, id: &GeneratorArgId) -> Result<()> {
        self.state
            .lock()
            .generator_args
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("generator arg", id))
    }

    async fn count_generator_args(&self, generator_id: &GeneratorId) -> Result<i64> {
        Ok(self
            .state
            .lock()
            .generator_args
            .values()
            .filter(|a| &a.generator_id == generator_id)
            .count() as i64)
    }

    // ---- Crons ----

    async fn add_cron(&self, cron: Cron) -> Result<()> {
        let mut state = self.state.lock();
        if state.crons.contains_key(&cron.id) {
            return Err(StorageError::Conflict(format!("cron {}", cron.id)));
        }
        state.crons.insert(cron.id.clone(), cron);
        Ok(())
    }

    async fn get_cron_by_id(&self, id: &CronId) -> Result<Option<Cron>> {
        Ok(self.state.lock().crons.get(id).cloned())
    }

    async fn find_crons_by_colony_id(&self, colony_id: &ColonyId) -> Result<Vec<Cron>> {
        Ok(self
            .state
            .lock()
            .crons
            .values()
            .filter(|c| &c.colony_id == colony_id)
            .cloned()
            .collect())
    }

    async fn find_all_crons(&self) -> Result<Vec<Cron>> {
        Ok(self.state.lock().crons.values().cloned().collect())
    }

    async fn update_cron(
        &self,
        id: &CronId,
        next_run: Option<DateTime<Utc>>,
        last_run: Option<DateTime<Utc>>,
        last_process_graph_id: Option<ProcessGraphId>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let cron = state.crons.get_mut(id).ok_or_else(|| not_found("cron", id))?;
        cron.next_run = next_run;
        cron.last_run = last_run;
        if last_process_graph_id.is_some() {
            cron.last_process_graph_id = last_process_graph_id;
        }
        Ok(())
    }

    async fn delete_cron_by_id(&self, id: &CronId) -> Result<()> {
        self.state.lock().crons.remove(id).map(|_| ()).ok_or_else(|| not_found("cron", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonies_core::{Conditions, ProcessSpec};
    use std::collections::{BTreeMap, BTreeSet};

    fn spec(colony_id: ColonyId, name: &str, runtime_type: &str) -> ProcessSpec {
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
                dependencies: BTreeSet::new(),
            },
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn colony_delete_cascades_to_owned_entities() {
        let storage = MemStorage::new();
        let colony = Colony::new("lab");
        storage.add_colony(colony.clone()).await.unwrap();

        let runtime = Runtime::new(colony.id.clone(), "cuda");
        storage.add_runtime(runtime.clone()).await.unwrap();

        let process = Process::new(spec(colony.id.clone(), "a", "cuda"), now());
        storage.add_process(process.clone()).await.unwrap();

        storage.delete_colony_by_id(&colony.id).await.unwrap();

        assert!(storage.get_colony_by_id(&colony.id).await.unwrap().is_none());
        assert!(storage.get_runtime_by_id(&runtime.id).await.unwrap().is_none());
        assert!(storage.get_process_by_id(&process.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_unassigned_processes_filters_by_runtime_type_and_respects_ordering() {
        let storage = MemStorage::new();
        let colony_id = ColonyId::new();
        let runtime_id = RuntimeId::new();

        let mut p1 = Process::new(spec(colony_id.clone(), "a", "cuda"), now());
        p1.submission_time = now();
        let mut p2 = Process::new(spec(colony_id.clone(), "b", "cuda"), now());
        p2.submission_time = now() + chrono::Duration::seconds(1);
        let p3 = Process::new(spec(colony_id.clone(), "c", "rocm"), now());

        storage.add_process(p1.clone()).await.unwrap();
        storage.add_process(p2.clone()).await.unwrap();
        storage.add_process(p3).await.unwrap();

        let found = storage
            .find_unassigned_processes(&colony_id, &runtime_id, "cuda", 10, false)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, p1.id);
        assert_eq!(found[1].id, p2.id);
    }

    #[tokio::test]
    async fn update_process_rejects_unknown_id() {
        let storage = MemStorage::new();
        let process = Process::new(spec(ColonyId::new(), "a", "cuda"), now());
        assert!(storage.update_process(process).await.is_err());
    }

    #[tokio::test]
    async fn generator_arg_count_tracks_inserts_and_deletes() {
        let storage = MemStorage::new();
        let colony_id = ColonyId::new();
        let generator = Generator::new(colony_id.clone(), "g", "[]", 3);
        storage.add_generator(generator.clone()).await.unwrap();

        let arg = GeneratorArg::new(generator.id.clone(), colony_id, "x");
        storage.add_generator_arg(arg.clone()).await.unwrap();
        assert_eq!(storage.count_generator_args(&generator.id).await.unwrap(), 1);

        storage.delete_generator_arg_by_id(&arg.id).await.unwrap();
        assert_eq!(storage.count_generator_args(&generator.id).await.unwrap(), 0);
    }
}
