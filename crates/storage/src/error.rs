// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Storage-layer error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}
