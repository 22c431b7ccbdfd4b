// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Generator: a counter-triggered workflow factory.

use crate::ids::{ColonyId, GeneratorArgId, GeneratorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
    pub id: GeneratorId,
    pub colony_id: ColonyId,
    pub name: String,
    pub workflow_spec: String,
    pub trigger: i64,
    pub last_run: Option<DateTime<Utc>>,
}

impl Generator {
    pub fn new(colony_id: ColonyId, name: impl Into<String>, workflow_spec: impl Into<String>, trigger: i64) -> Self {
        Self {
            id: GeneratorId::new(),
            colony_id,
            name: name.into(),
            workflow_spec: workflow_spec.into(),
            trigger,
            last_run: None,
        }
    }

    /// How many workflow instances should fire for the given pending arg count.
    pub fn fire_count(&self, pending_args: i64) -> i64 {
        if self.trigger <= 0 {
            return 0;
        }
        pending_args / self.trigger
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorArg {
    pub id: GeneratorArgId,
    pub generator_id: GeneratorId,
    pub colony_id: ColonyId,
    pub arg: String,
}

impl GeneratorArg {
    pub fn new(generator_id: GeneratorId, colony_id: ColonyId, arg: impl Into<String>) -> Self {
        Self {
            id: GeneratorArgId::new(),
            generator_id,
            colony_id,
            arg: arg.into(),
        }
    }
}
