// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Attribute: a key/value pair attached to a process or process graph.

use crate::ids::{AttributeId, ProcessGraphId, ProcessId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    In,
    Out,
    Err,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub target_process_id: ProcessId,
    pub target_process_graph_id: Option<ProcessGraphId>,
    pub kind: Kind,
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(target_process_id: ProcessId, kind: Kind, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: AttributeId::new(),
            target_process_id,
            target_process_graph_id: None,
            kind,
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_attribute_gets_a_fresh_id_and_no_graph_target() {
        let attr = Attribute::new(ProcessId::new(), Kind::Out, "result", "42");
        assert!(attr.target_process_graph_id.is_none());
        assert_eq!(attr.key, "result");
        assert_eq!(attr.value, "42");
    }

    #[test]
    fn json_round_trips() {
        let attr = Attribute::new(ProcessId::new(), Kind::Err, "reason", "boom");
        let json = serde_json::to_string(&attr).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(attr, back);
    }
}
