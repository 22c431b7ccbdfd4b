// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Typed identifiers for every entity in the data model.

use crate::define_id;

define_id! {
    /// Identifies a tenant namespace.
    pub struct ColonyId("cln-");
}

define_id! {
    /// Identifies a registered worker agent.
    pub struct RuntimeId("rnt-");
}

define_id! {
    /// Identifies a scheduled instance of a `ProcessSpec`.
    pub struct ProcessId("prc-");
}

define_id! {
    /// Identifies a DAG instance created from a `WorkflowSpec`.
    pub struct ProcessGraphId("pgr-");
}

define_id! {
    /// Identifies a key/value attribute attached to a process.
    pub struct AttributeId("atr-");
}

define_id! {
    /// Identifies a counter-triggered workflow factory.
    pub struct GeneratorId("gen-");
}

define_id! {
    /// Identifies one pending argument packed onto a generator.
    pub struct GeneratorArgId("gar-");
}

define_id! {
    /// Identifies a time-triggered workflow factory.
    pub struct CronId("crn-");
}
