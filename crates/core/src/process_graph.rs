// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! ProcessGraph: a DAG instance created from a `WorkflowSpec`.
//!
//! Kept as pure data: resolving a graph's aggregate state requires walking
//! its member processes, which lives in storage, so that walk is a function
//! taking `&dyn Storage` as a parameter (see `colonies-controller::graph_resolver`)
//! rather than a method on a handle embedded in this struct.

use crate::ids::{ColonyId, ProcessGraphId, ProcessId};
use crate::process::ProcessState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessGraphState {
    Waiting,
    Running,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessGraph {
    pub id: ProcessGraphId,
    pub colony_id: ColonyId,
    pub root_process_ids: Vec<ProcessId>,
    pub state: ProcessGraphState,
    pub submission_time: DateTime<Utc>,
}

impl ProcessGraph {
    pub fn new(colony_id: ColonyId, root_process_ids: Vec<ProcessId>, now: DateTime<Utc>) -> Self {
        Self {
            id: ProcessGraphId::new(),
            colony_id,
            root_process_ids,
            state: ProcessGraphState::Waiting,
            submission_time: now,
        }
    }
}

/// Aggregates member process states into a graph state, per invariant C2:
/// any exhausted-retry failure dominates, then all-success, then any-running,
/// else waiting.
pub fn aggregate_state(member_states: &[(ProcessState, bool)]) -> ProcessGraphState {
    let any_failed_exhausted = member_states
        .iter()
        .any(|(state, retries_exhausted)| *state == ProcessState::Failed && *retries_exhausted);
    if any_failed_exhausted {
        return ProcessGraphState::Failed;
    }
    if member_states.iter().all(|(state, _)| *state == ProcessState::Success) {
        return ProcessGraphState::Success;
    }
    if member_states.iter().any(|(state, _)| *state == ProcessState::Running) {
        return ProcessGraphState::Running;
    }
    ProcessGraphState::Waiting
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_success_yields_success() {
        let states = vec![(ProcessState::Success, false), (ProcessState::Success, false)];
        assert_eq!(aggregate_state(&states), ProcessGraphState::Success);
    }

    #[test]
    fn any_running_yields_running() {
        let states = vec![(ProcessState::Success, false), (ProcessState::Running, false)];
        assert_eq!(aggregate_state(&states), ProcessGraphState::Running);
    }

    #[test]
    fn exhausted_failure_dominates() {
        let states = vec![(ProcessState::Running, false), (ProcessState::Failed, true)];
        assert_eq!(aggregate_state(&states), ProcessGraphState::Failed);
    }

    #[test]
    fn pending_failure_without_exhausted_retries_does_not_fail_the_graph() {
        let states = vec![(ProcessState::Waiting, false), (ProcessState::Failed, false)];
        assert_eq!(aggregate_state(&states), ProcessGraphState::Waiting);
    }

    #[test]
    fn no_members_running_or_success_is_waiting() {
        let states = vec![(ProcessState::Pending, false), (ProcessState::Waiting, false)];
        assert_eq!(aggregate_state(&states), ProcessGraphState::Waiting);
    }
}
