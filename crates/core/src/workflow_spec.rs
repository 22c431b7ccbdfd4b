// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! WorkflowSpec: a list of `ProcessSpec`s linked by name-based dependencies.

use crate::error::{ColoniesError, Result};
use crate::process_spec::ProcessSpec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub process_specs: Vec<ProcessSpec>,
}

/// Mirrors the wrapped shape some callers submit: `{"processspecs": [...]}`.
#[derive(Deserialize)]
struct Wrapped {
    processspecs: Vec<ProcessSpec>,
}

impl WorkflowSpec {
    /// Accepts either a bare JSON array of process specs or a
    /// `{"processspecs": [...]}`-wrapped object.
    pub fn from_json(json: &str) -> Result<Self> {
        if let Ok(specs) = serde_json::from_str::<Vec<ProcessSpec>>(json) {
            return Ok(Self { process_specs: specs });
        }
        match serde_json::from_str::<Wrapped>(json) {
            Ok(wrapped) => Ok(Self { process_specs: wrapped.processspecs }),
            Err(err) => Err(ColoniesError::InvalidArgument(format!("invalid workflow spec json: {err}"))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.process_specs)
            .map_err(|err| ColoniesError::InvalidArgument(format!("failed to serialize workflow spec: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ColonyId;
    use crate::process_spec::Conditions;
    use std::collections::{BTreeMap, BTreeSet};

    fn spec_json(name: &str) -> String {
        let spec = ProcessSpec {
            name: name.to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: -1,
            max_retries: -1,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id: ColonyId::new(),
                runtime_ids: vec![],
                runtime_type: "cuda".to_string(),
                dependencies: BTreeSet::new(),
            },
        };
        serde_json::to_string(&spec).unwrap()
    }

    #[test]
    fn accepts_bare_array() {
        let json = format!("[{}]", spec_json("a"));
        let wf = WorkflowSpec::from_json(&json).unwrap();
        assert_eq!(wf.process_specs.len(), 1);
    }

    #[test]
    fn accepts_wrapped_object() {
        let json = format!("{{\"processspecs\": [{}]}}", spec_json("a"));
        let wf = WorkflowSpec::from_json(&json).unwrap();
        assert_eq!(wf.process_specs.len(), 1);
    }

    #[test]
    fn rejects_garbage() {
        assert!(WorkflowSpec::from_json("not json").is_err());
    }
}
