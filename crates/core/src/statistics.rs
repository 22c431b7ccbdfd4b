// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Statistics: aggregate counters exposed by the controller.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub colonies: i64,
    pub runtimes: i64,
    pub waiting_processes: i64,
    pub running_processes: i64,
    pub successful_processes: i64,
    pub failed_processes: i64,
    pub waiting_process_graphs: i64,
    pub running_process_graphs: i64,
    pub successful_process_graphs: i64,
    pub failed_process_graphs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_zero() {
        assert_eq!(Statistics::default(), Statistics {
            colonies: 0,
            runtimes: 0,
            waiting_processes: 0,
            running_processes: 0,
            successful_processes: 0,
            failed_processes: 0,
            waiting_process_graphs: 0,
            running_process_graphs: 0,
            successful_process_graphs: 0,
            failed_process_graphs: 0,
        });
    }
}
