// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Runtime: a registered worker agent that pulls and executes processes.

use crate::ids::{ColonyId, RuntimeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeState {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub id: RuntimeId,
    pub colony_id: ColonyId,
    pub runtime_type: String,
    pub state: RuntimeState,
    pub last_heard_from_time: Option<DateTime<Utc>>,
}

impl Runtime {
    pub fn new(colony_id: ColonyId, runtime_type: impl Into<String>) -> Self {
        Self {
            id: RuntimeId::new(),
            colony_id,
            runtime_type: runtime_type.into(),
            state: RuntimeState::Pending,
            last_heard_from_time: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.state == RuntimeState::Approved
    }

    pub fn mark_alive(&mut self, now: DateTime<Utc>) {
        self.last_heard_from_time = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_runtime_starts_pending_and_unassignable() {
        let runtime = Runtime::new(ColonyId::new(), "cuda");
        assert_eq!(runtime.state, RuntimeState::Pending);
        assert!(!runtime.is_approved());
    }

    #[test]
    fn approved_runtime_is_assignable() {
        let mut runtime = Runtime::new(ColonyId::new(), "cuda");
        runtime.state = RuntimeState::Approved;
        assert!(runtime.is_approved());
    }

    #[test]
    fn mark_alive_records_the_given_instant() {
        let mut runtime = Runtime::new(ColonyId::new(), "cuda");
        let now = DateTime::from_timestamp(123, 0).unwrap();
        runtime.mark_alive(now);
        assert_eq!(runtime.last_heard_from_time, Some(now));
    }
}
