// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Error taxonomy surfaced by the controller.

use colonies_core::{ColoniesError, ErrorKind};
use colonies_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("no processes available")]
    NoProcessesAvailable,

    #[error("count {requested} exceeds max count {max}")]
    CountExceeded { requested: usize, max: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("leadership lost")]
    LeadershipLost,
}

impl ControllerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControllerError::NotFound(_) => ErrorKind::NotFound,
            ControllerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ControllerError::InvalidDependency(_) => ErrorKind::InvalidDependency,
            ControllerError::StateConflict(_) => ErrorKind::StateConflict,
            ControllerError::NoProcessesAvailable => ErrorKind::NoProcessesAvailable,
            ControllerError::CountExceeded { .. } => ErrorKind::CountExceeded,
            ControllerError::Storage(_) => ErrorKind::StorageError,
            ControllerError::LeadershipLost => ErrorKind::LeadershipLost,
        }
    }
}

impl From<ColoniesError> for ControllerError {
    fn from(err: ColoniesError) -> Self {
        match err {
            ColoniesError::NotFound(m) => ControllerError::NotFound(m),
            ColoniesError::InvalidArgument(m) => ControllerError::InvalidArgument(m),
            ColoniesError::InvalidDependency(m) => ControllerError::InvalidDependency(m),
            ColoniesError::StateConflict(m) => ControllerError::StateConflict(m),
            ColoniesError::NoProcessesAvailable => ControllerError::NoProcessesAvailable,
            ColoniesError::CountExceeded { requested, max } => ControllerError::CountExceeded { requested, max },
            ColoniesError::StorageError(m) => ControllerError::Storage(StorageError::Backend(m)),
            ColoniesError::LeadershipLost => ControllerError::LeadershipLost,
        }
    }
}

pub type Result<T> = std::result::Result<T, ControllerError>;
