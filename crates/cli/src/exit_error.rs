// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Error type that carries a process exit code, so `main` can translate any
//! command failure into the documented "exit 0 on success, non-zero on any
//! error with stderr message" contract without scattering `process::exit`
//! calls through the command handlers.

use colonies_controller::ControllerError;
use colonies_core::ErrorKind;
use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

/// Maps the orchestrator's error taxonomy onto a small, stable set of exit
/// codes. Not found / invalid input is a usage error (2); everything else
/// surfaced from the controller is a runtime failure (1).
impl From<ControllerError> for ExitError {
    fn from(err: ControllerError) -> Self {
        let code = match err.kind() {
            ErrorKind::NotFound | ErrorKind::InvalidArgument | ErrorKind::InvalidDependency => 2,
            _ => 1,
        };
        Self::new(code, err.to_string())
    }
}

impl From<anyhow::Error> for ExitError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(1, err.to_string())
    }
}
