// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Cron: a time-triggered workflow factory.

use crate::error::{ColoniesError, Result};
use crate::ids::{ColonyId, CronId, ProcessGraphId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cron {
    pub id: CronId,
    pub colony_id: ColonyId,
    pub name: String,
    pub cron_expression: String,
    pub interval: i64,
    pub random: bool,
    pub workflow_spec: String,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_process_graph_id: Option<ProcessGraphId>,
}

/// Which policy `calc_next_run` should apply, decided before any randomness
/// or cron-expression evaluation happens (those live in the cron clock,
/// since they need an RNG / cron-grammar parser respectively).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRunPolicy {
    RandomWithinInterval(i64),
    FixedInterval(i64),
    CronExpression,
}

impl Cron {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        colony_id: ColonyId,
        name: impl Into<String>,
        cron_expression: impl Into<String>,
        interval: i64,
        random: bool,
        workflow_spec: impl Into<String>,
    ) -> Result<Self> {
        let cron_expression = cron_expression.into();
        if cron_expression.is_empty() && interval <= 0 {
            return Err(ColoniesError::InvalidArgument(
                "cron requires either a cron expression or a positive interval".to_string(),
            ));
        }
        Ok(Self {
            id: CronId::new(),
            colony_id,
            name: name.into(),
            cron_expression,
            interval,
            random,
            workflow_spec: workflow_spec.into(),
            next_run: None,
            last_run: None,
            last_process_graph_id: None,
        })
    }

    /// Source ordering checked `Interval > 0` before `Interval > 0 && Random`,
    /// making the random branch dead. This checks `random` first so jittered
    /// intervals are reachable.
    pub fn next_run_policy(&self) -> NextRunPolicy {
        if self.interval > 0 && self.random {
            NextRunPolicy::RandomWithinInterval(self.interval)
        } else if self.interval > 0 {
            NextRunPolicy::FixedInterval(self.interval)
        } else {
            NextRunPolicy::CronExpression
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_expression_or_interval() {
        let err = Cron::new(ColonyId::new(), "c", "", 0, false, "[]").unwrap_err();
        assert!(matches!(err, ColoniesError::InvalidArgument(_)));
    }

    #[test]
    fn random_interval_takes_priority_over_plain_interval() {
        let cron = Cron::new(ColonyId::new(), "c", "", 60, true, "[]").unwrap();
        assert_eq!(cron.next_run_policy(), NextRunPolicy::RandomWithinInterval(60));
    }

    #[test]
    fn plain_interval_without_random() {
        let cron = Cron::new(ColonyId::new(), "c", "", 60, false, "[]").unwrap();
        assert_eq!(cron.next_run_policy(), NextRunPolicy::FixedInterval(60));
    }

    #[test]
    fn expression_used_when_no_interval() {
        let cron = Cron::new(ColonyId::new(), "c", "0 * * * *", 0, false, "[]").unwrap();
        assert_eq!(cron.next_run_policy(), NextRunPolicy::CronExpression);
    }
}
