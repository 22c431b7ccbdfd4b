// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! colonies-core: data model for the Colonies process orchestrator.
//!
//! Every type here is plain data plus the small amount of logic that does
//! not need storage access (state transitions, id generation, JSON shape).
//! Anything that needs to walk a graph or query a backing store lives in
//! `colonies-controller` instead.

#[macro_use]
pub mod id;

pub mod attribute;
pub mod clock;
pub mod colony;
pub mod cron;
pub mod error;
pub mod generator;
pub mod ids;
pub mod process;
pub mod process_graph;
pub mod process_spec;
pub mod runtime;
pub mod statistics;
pub mod workflow_spec;

pub use attribute::{Attribute, Kind as AttributeKind};
pub use clock::{Clock, FakeClock, SystemClock};
pub use colony::Colony;
pub use cron::{Cron, NextRunPolicy};
pub use error::{ColoniesError, ErrorKind, Result};
pub use generator::{Generator, GeneratorArg};
pub use ids::{AttributeId, ColonyId, CronId, GeneratorArgId, GeneratorId, ProcessGraphId, ProcessId, RuntimeId};
pub use process::{Process, ProcessState};
pub use process_graph::{aggregate_state, ProcessGraph, ProcessGraphState};
pub use process_spec::{Conditions, ProcessSpec};
pub use runtime::{Runtime, RuntimeState};
pub use statistics::Statistics;
pub use workflow_spec::WorkflowSpec;
