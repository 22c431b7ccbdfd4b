// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Planner: selection/priority policy over a candidate set of waiting processes.

use crate::error::{ControllerError, Result};
use colonies_core::{Process, RuntimeId};

/// Decides which waiting process an assignment call should hand out.
///
/// `prioritize` and `select` both take candidates already filtered and
/// ordered by storage (`Storage::find_unassigned_processes`); the planner
/// only has to break ties / apply eligibility rules the storage query can't
/// express (per-process `RuntimeIDs` allow-lists).
pub trait Planner: Send + Sync {
    fn prioritize(&self, runtime_id: &RuntimeId, processes: &[Process], count: usize, latest: bool) -> Vec<Process>;

    fn select(&self, runtime_id: &RuntimeId, runtime_type: &str, processes: &[Process]) -> Result<Process>;
}

/// The policy described in the component design: first candidate (in the
/// order storage handed them over) whose `RuntimeIDs` allow-list is empty
/// or contains this runtime, and whose `RuntimeType` matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicPlanner;

impl Planner for BasicPlanner {
    fn prioritize(&self, _runtime_id: &RuntimeId, processes: &[Process], count: usize, latest: bool) -> Vec<Process> {
        let mut ordered: Vec<Process> = processes.to_vec();
        if latest {
            ordered.sort_by(|a, b| b.submission_time.cmp(&a.submission_time));
        } else {
            ordered.sort_by(|a, b| a.submission_time.cmp(&b.submission_time));
        }
        ordered.truncate(count);
        ordered
    }

    fn select(&self, runtime_id: &RuntimeId, runtime_type: &str, processes: &[Process]) -> Result<Process> {
        processes
            .iter()
            .find(|p| {
                let conditions = &p.spec.conditions;
                (conditions.runtime_ids.is_empty() || conditions.runtime_ids.contains(runtime_id))
                    && conditions.runtime_type == runtime_type
            })
            .cloned()
            .ok_or(ControllerError::NoProcessesAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonies_core::{ColonyId, Conditions, ProcessSpec};
    use std::collections::{BTreeMap, BTreeSet};

    fn process(runtime_type: &str, runtime_ids: Vec<RuntimeId>) -> Process {
        let spec = ProcessSpec {
            name: "a".to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: -1,
            max_retries: -1,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id: ColonyId::new(),
                runtime_ids,
                runtime_type: runtime_type.to_string(),
                dependencies: BTreeSet::new(),
            },
        };
        Process::new(spec, chrono::DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn select_skips_processes_reserved_for_other_runtimes() {
        let runtime_id = RuntimeId::new();
        let other_id = RuntimeId::new();
        let reserved = process("cuda", vec![other_id]);
        let open = process("cuda", vec![]);
        let planner = BasicPlanner;
        let chosen = planner.select(&runtime_id, "cuda", &[reserved.clone(), open.clone()]).unwrap();
        assert_eq!(chosen.id, open.id);
    }

    #[test]
    fn select_fails_when_nothing_matches_the_runtime_type() {
        let runtime_id = RuntimeId::new();
        let rocm_only = process("rocm", vec![]);
        let planner = BasicPlanner;
        assert!(planner.select(&runtime_id, "cuda", &[rocm_only]).is_err());
    }

    #[test]
    fn empty_allow_list_matches_any_runtime_of_the_right_type() {
        let runtime_id = RuntimeId::new();
        let open = process("cuda", vec![]);
        let planner = BasicPlanner;
        assert!(planner.select(&runtime_id, "cuda", &[open]).is_ok());
    }
}
