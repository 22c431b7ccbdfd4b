// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Colony: a tenant namespace owning runtimes, specs, and schedules.

use crate::ids::ColonyId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colony {
    pub id: ColonyId,
    pub name: String,
}

impl Colony {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: ColonyId::new(), name: name.into() }
    }
}
