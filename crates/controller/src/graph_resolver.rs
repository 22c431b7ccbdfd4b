// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! ProcessGraph resolver (C2): walks a DAG's member processes to recompute
//! the graph's aggregate state and to unblock children whose parents have
//! all closed successfully, per §4.6.
//!
//! The graph is pure data at rest (`colonies_core::ProcessGraph`); the
//! storage handle it would otherwise carry is expressed instead as
//! ordinary functions taking `&dyn Storage`, never a field on the struct.

use crate::error::{ControllerError, Result};
use chrono::{DateTime, Utc};
use colonies_core::{aggregate_state, Process, ProcessGraph, ProcessGraphId, ProcessGraphState, ProcessState};
use colonies_storage::Storage;

/// Recomputes `graph`'s aggregate state from its member processes and
/// persists it if it changed. Returns the up-to-date graph.
pub async fn resolve(storage: &dyn Storage, graph_id: &ProcessGraphId) -> Result<ProcessGraph> {
    let mut graph = storage
        .get_process_graph_by_id(graph_id)
        .await?
        .ok_or_else(|| ControllerError::NotFound(format!("process graph {graph_id}")))?;
    let members = storage.find_processes_by_graph_id(graph_id).await?;
    let member_states: Vec<(ProcessState, bool)> =
        members.iter().map(|p| (p.state, p.state == ProcessState::Failed && p.exhausted_retries())).collect();
    let new_state = aggregate_state(&member_states);
    if new_state != graph.state {
        graph.state = new_state;
        storage.update_process_graph(graph.clone()).await?;
    }
    Ok(graph)
}

/// Propagates a just-closed `process`'s outcome to its children, per §4.6:
/// a Success clears `wait_for_parents` once *all* of a child's parents have
/// succeeded; a Failed parent fails every child transitively with
/// `"parent failed"` (the source leaves this as an implicit side effect of
/// repeated `Resolve()` calls; here it is an explicit walk).
pub async fn propagate_closure(storage: &dyn Storage, process: &Process, now: DateTime<Utc>) -> Result<()> {
    if process.children.is_empty() {
        return Ok(());
    }
    for child_id in &process.children {
        let mut child = match storage.get_process_by_id(child_id).await? {
            Some(child) => child,
            None => continue,
        };
        if child.is_terminal() {
            continue;
        }
        match process.state {
            ProcessState::Success => {
                if !child.wait_for_parents {
                    continue;
                }
                let mut all_parents_succeeded = true;
                for parent_id in &child.parents {
                    let parent = storage
                        .get_process_by_id(parent_id)
                        .await?
                        .ok_or_else(|| ControllerError::NotFound(format!("process {parent_id}")))?;
                    if parent.state != ProcessState::Success {
                        all_parents_succeeded = false;
                        break;
                    }
                }
                if all_parents_succeeded {
                    child.wait_for_parents = false;
                    storage.update_process(child).await?;
                }
            }
            ProcessState::Failed => {
                child.close_failed("parent failed", now)?;
                storage.update_process(child.clone()).await?;
                Box::pin(propagate_closure(storage, &child, now)).await?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonies_core::{ColonyId, Conditions, ProcessSpec};
    use colonies_storage::MemStorage;
    use std::collections::{BTreeMap, BTreeSet};

    fn spec(colony_id: ColonyId, name: &str, deps: &[&str]) -> ProcessSpec {
        ProcessSpec {
            name: name.to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: -1,
            max_retries: 0,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id,
                runtime_ids: vec![],
                runtime_type: "cuda".to_string(),
                dependencies: deps.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn success_clears_wait_for_parents_only_once_every_parent_succeeds() {
        let storage = MemStorage::new();
        let colony_id = ColonyId::new();

        let parent_a = Process::new(spec(colony_id.clone(), "a", &[]), now());
        let parent_b = Process::new(spec(colony_id.clone(), "b", &[]), now());
        let mut child = Process::new(spec(colony_id, "c", &["a", "b"]), now());
        child.wait_for_parents = true;
        child.parents = vec![parent_a.id.clone(), parent_b.id.clone()];

        let mut parent_a_with_child = parent_a.clone();
        parent_a_with_child.children = vec![child.id.clone()];
        let mut parent_b_with_child = parent_b.clone();
        parent_b_with_child.children = vec![child.id.clone()];

        storage.add_process(parent_a_with_child.clone()).await.unwrap();
        storage.add_process(parent_b_with_child.clone()).await.unwrap();
        storage.add_process(child.clone()).await.unwrap();

        let mut closed_a = parent_a_with_child.clone();
        closed_a.close_successful(now()).unwrap();
        storage.update_process(closed_a.clone()).await.unwrap();
        propagate_closure(&storage, &closed_a, now()).await.unwrap();

        let still_waiting = storage.get_process_by_id(&child.id).await.unwrap().unwrap();
        assert!(still_waiting.wait_for_parents);

        let mut closed_b = parent_b_with_child;
        closed_b.close_successful(now()).unwrap();
        storage.update_process(closed_b.clone()).await.unwrap();
        propagate_closure(&storage, &closed_b, now()).await.unwrap();

        let unblocked = storage.get_process_by_id(&child.id).await.unwrap().unwrap();
        assert!(!unblocked.wait_for_parents);
    }

    #[tokio::test]
    async fn failed_parent_fails_children_transitively() {
        let storage = MemStorage::new();
        let colony_id = ColonyId::new();

        let mut grandchild = Process::new(spec(colony_id.clone(), "gc", &["c"]), now());
        let mut child = Process::new(spec(colony_id.clone(), "c", &["a"]), now());
        child.children = vec![grandchild.id.clone()];
        let mut parent = Process::new(spec(colony_id, "a", &[]), now());
        parent.children = vec![child.id.clone()];

        grandchild.parents = vec![child.id.clone()];
        child.parents = vec![parent.id.clone()];

        storage.add_process(parent.clone()).await.unwrap();
        storage.add_process(child.clone()).await.unwrap();
        storage.add_process(grandchild.clone()).await.unwrap();

        parent.close_failed("boom", now()).unwrap();
        storage.update_process(parent.clone()).await.unwrap();
        propagate_closure(&storage, &parent, now()).await.unwrap();

        let failed_child = storage.get_process_by_id(&child.id).await.unwrap().unwrap();
        assert_eq!(failed_child.state, ProcessState::Failed);
        assert_eq!(failed_child.error_msg.as_deref(), Some("parent failed"));

        let failed_grandchild = storage.get_process_by_id(&grandchild.id).await.unwrap().unwrap();
        assert_eq!(failed_grandchild.state, ProcessState::Failed);
    }

    #[tokio::test]
    async fn resolve_reports_success_once_every_member_succeeds() {
        let storage = MemStorage::new();
        let colony_id = ColonyId::new();
        let mut p = Process::new(spec(colony_id.clone(), "a", &[]), now());
        p.close_successful(now()).unwrap();
        let graph = ProcessGraph::new(colony_id, vec![p.id.clone()], now());
        p.process_graph_id = Some(graph.id.clone());
        storage.add_process_graph(graph.clone()).await.unwrap();
        storage.add_process(p).await.unwrap();

        let resolved = resolve(&storage, &graph.id).await.unwrap();
        assert_eq!(resolved.state, ProcessGraphState::Success);
    }
}
