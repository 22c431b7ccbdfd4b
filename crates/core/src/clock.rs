// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Clock abstraction for testable time handling.
//!
//! The data model requires absolute UTC instants (`WaitDeadline`,
//! `ExecDeadline`, `SubmissionTime`, ...); every place that would otherwise
//! call `Utc::now()` goes through this trait instead, so deadline and retry
//! tests can drive time deterministically with [`FakeClock`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: chrono::Duration) {
        *self.now.lock() += duration;
    }

    /// Set the clock to a specific instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_else(Utc::now))
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
