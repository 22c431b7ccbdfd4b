// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! ProcessSpec: the declarative description of a unit of work.

use crate::ids::{ColonyId, RuntimeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub colony_id: ColonyId,
    #[serde(default)]
    pub runtime_ids: Vec<RuntimeId>,
    #[serde(default)]
    pub runtime_type: String,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub func: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub max_wait_time: i64,
    pub max_exec_time: i64,
    pub max_retries: i64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    pub conditions: Conditions,
}

impl ProcessSpec {
    /// Normalizes `max_exec_time`: 0 is illegal and coerced to -1 (unbounded).
    pub fn normalize(mut self) -> Self {
        if self.max_exec_time == 0 {
            self.max_exec_time = -1;
        }
        self
    }

    pub fn has_dependencies(&self) -> bool {
        !self.conditions.dependencies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, deps: &[&str]) -> ProcessSpec {
        ProcessSpec {
            name: name.to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: 0,
            max_retries: -1,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id: crate::ids::ColonyId::new(),
                runtime_ids: vec![],
                runtime_type: "cuda".to_string(),
                dependencies: deps.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    #[test]
    fn zero_exec_time_is_coerced_to_unbounded() {
        let spec = spec("a", &[]).normalize();
        assert_eq!(spec.max_exec_time, -1);
    }

    #[test]
    fn negative_exec_time_is_left_alone() {
        let mut spec = spec("a", &[]);
        spec.max_exec_time = -1;
        let spec = spec.normalize();
        assert_eq!(spec.max_exec_time, -1);
    }

    #[test]
    fn has_dependencies_reflects_conditions() {
        assert!(!spec("a", &[]).has_dependencies());
        assert!(spec("b", &["a"]).has_dependencies());
    }
}
