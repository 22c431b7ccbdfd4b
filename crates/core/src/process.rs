// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Process: a runtime instance of a `ProcessSpec`.

use crate::attribute::Attribute;
use crate::error::{ColoniesError, Result};
use crate::ids::{ProcessGraphId, ProcessId, RuntimeId};
use crate::process_spec::ProcessSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    Pending,
    Waiting,
    Running,
    Success,
    Failed,
}

impl ProcessState {
    /// Whether `self -> next` is a legal transition under invariant 1
    /// (forward-only except Running -> Waiting retry, and terminal states).
    pub fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Success, _) | (Failed, _) => false,
            (Pending, Waiting) | (Pending, Running) | (Pending, Failed) => true,
            (Waiting, Running) | (Waiting, Failed) => true,
            (Running, Waiting) | (Running, Success) | (Running, Failed) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub spec: ProcessSpec,
    pub assigned_runtime_id: Option<RuntimeId>,
    pub is_assigned: bool,
    pub state: ProcessState,
    pub submission_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub wait_deadline: Option<DateTime<Utc>>,
    pub exec_deadline: Option<DateTime<Utc>>,
    pub retries: i64,
    pub error_msg: Option<String>,
    pub parents: Vec<ProcessId>,
    pub children: Vec<ProcessId>,
    pub process_graph_id: Option<ProcessGraphId>,
    pub wait_for_parents: bool,
    pub attributes: Vec<Attribute>,
}

impl Process {
    pub fn new(spec: ProcessSpec, now: DateTime<Utc>) -> Self {
        let spec = spec.normalize();
        let wait_deadline = (spec.max_wait_time > 0).then(|| now + chrono::Duration::seconds(spec.max_wait_time));
        Self {
            id: ProcessId::new(),
            spec,
            assigned_runtime_id: None,
            is_assigned: false,
            state: ProcessState::Pending,
            submission_time: now,
            start_time: None,
            end_time: None,
            wait_deadline,
            exec_deadline: None,
            retries: 0,
            error_msg: None,
            parents: Vec::new(),
            children: Vec::new(),
            process_graph_id: None,
            wait_for_parents: false,
            attributes: Vec::new(),
        }
    }

    fn transition(&mut self, next: ProcessState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(ColoniesError::StateConflict(format!(
                "process {} cannot transition {:?} -> {:?}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    pub fn assign(&mut self, runtime_id: RuntimeId, now: DateTime<Utc>) -> Result<()> {
        self.transition(ProcessState::Running)?;
        self.assigned_runtime_id = Some(runtime_id);
        self.is_assigned = true;
        self.start_time = Some(now);
        self.exec_deadline =
            (self.spec.max_exec_time > 0).then(|| now + chrono::Duration::seconds(self.spec.max_exec_time));
        Ok(())
    }

    pub fn retry(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition(ProcessState::Waiting)?;
        self.retries += 1;
        self.assigned_runtime_id = None;
        self.is_assigned = false;
        self.exec_deadline = None;
        self.wait_deadline = (self.spec.max_wait_time > 0).then(|| now + chrono::Duration::seconds(self.spec.max_wait_time));
        let _ = now;
        Ok(())
    }

    pub fn exhausted_retries(&self) -> bool {
        self.spec.max_retries >= 0 && self.retries >= self.spec.max_retries
    }

    pub fn close_successful(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state == ProcessState::Success {
            return Ok(());
        }
        self.transition(ProcessState::Success)?;
        self.end_time = Some(now);
        self.exec_deadline = None;
        Ok(())
    }

    pub fn close_failed(&mut self, error_msg: impl Into<String>, now: DateTime<Utc>) -> Result<()> {
        if self.state == ProcessState::Failed {
            return Ok(());
        }
        self.transition(ProcessState::Failed)?;
        self.error_msg = Some(error_msg.into());
        self.end_time = Some(now);
        self.exec_deadline = None;
        self.wait_deadline = None;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ProcessState::Success | ProcessState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ColonyId;
    use crate::process_spec::Conditions;
    use std::collections::{BTreeMap, BTreeSet};

    fn spec(max_wait: i64, max_exec: i64, max_retries: i64) -> ProcessSpec {
        ProcessSpec {
            name: "a".to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: max_wait,
            max_exec_time: max_exec,
            max_retries,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id: ColonyId::new(),
                runtime_ids: vec![],
                runtime_type: "cuda".to_string(),
                dependencies: BTreeSet::new(),
            },
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn new_process_is_pending_with_wait_deadline_when_positive() {
        let p = Process::new(spec(10, 5, 1), now());
        assert_eq!(p.state, ProcessState::Pending);
        assert_eq!(p.wait_deadline, Some(now() + chrono::Duration::seconds(10)));
    }

    #[test]
    fn unbounded_wait_time_has_no_deadline() {
        let p = Process::new(spec(-1, 5, 1), now());
        assert!(p.wait_deadline.is_none());
    }

    #[test]
    fn assign_is_assigned_and_sets_exec_deadline() {
        let mut p = Process::new(spec(-1, 5, 1), now());
        p.assign(RuntimeId::new(), now()).unwrap();
        assert_eq!(p.state, ProcessState::Running);
        assert!(p.is_assigned);
        assert_eq!(p.exec_deadline, Some(now() + chrono::Duration::seconds(5)));
    }

    #[test]
    fn retry_returns_to_waiting_and_clears_assignment() {
        let mut p = Process::new(spec(-1, 5, 1), now());
        p.assign(RuntimeId::new(), now()).unwrap();
        p.retry(now()).unwrap();
        assert_eq!(p.state, ProcessState::Waiting);
        assert!(!p.is_assigned);
        assert_eq!(p.retries, 1);
        assert!(p.exec_deadline.is_none());
    }

    #[test]
    fn retries_exhausted_respects_unlimited_sentinel() {
        let mut p = Process::new(spec(-1, 5, -1), now());
        p.retries = 1000;
        assert!(!p.exhausted_retries());
    }

    #[test]
    fn retries_exhausted_once_cap_is_reached() {
        let mut p = Process::new(spec(-1, 5, 1), now());
        p.retries = 1;
        assert!(p.exhausted_retries());
    }

    #[test]
    fn close_twice_is_idempotent() {
        let mut p = Process::new(spec(-1, 5, 1), now());
        p.assign(RuntimeId::new(), now()).unwrap();
        p.close_successful(now()).unwrap();
        assert!(p.close_successful(now()).is_ok());
        assert_eq!(p.state, ProcessState::Success);
    }

    #[test]
    fn cannot_transition_out_of_a_terminal_state() {
        let mut p = Process::new(spec(-1, 5, 1), now());
        p.assign(RuntimeId::new(), now()).unwrap();
        p.close_failed("boom", now()).unwrap();
        assert!(p.assign(RuntimeId::new(), now()).is_err());
    }
}
