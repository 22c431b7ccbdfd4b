// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Controller configuration: ticker periods, resource limits, node identity.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Identity of this controller instance, used by leader election.
    pub node_id: String,
    /// Upper bound on any single list-returning query.
    pub max_count: usize,
    /// How many unassigned-process candidates `assign_runtime` considers.
    pub candidate_batch_size: usize,
    pub timeout_tick: Duration,
    pub generator_tick: Duration,
    pub cron_tick: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            node_id: "node-0".to_string(),
            max_count: 1000,
            candidate_batch_size: 10,
            timeout_tick: Duration::from_secs(1),
            generator_tick: Duration::from_secs(1),
            cron_tick: Duration::from_secs(1),
        }
    }
}
