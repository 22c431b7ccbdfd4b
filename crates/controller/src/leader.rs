// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Leader election: wraps an external consensus service (abstracted).
//!
//! Exactly one controller instance in a cluster should be leader at a time;
//! only the leader runs background loops and externally-visible side
//! effects. The real multi-node consensus backend is an external
//! collaborator; `SingleNodeLeader` is the always-leader implementation for
//! standalone runs and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[async_trait]
pub trait LeaderElection: Send + Sync {
    async fn start(&self);
    async fn stop(&self);
    fn is_leader(&self) -> bool;
    /// Registers a callback invoked whenever leadership status flips.
    fn on_leadership_change(&self, callback: Box<dyn Fn(bool) + Send + Sync>);
    /// Ephemeral storage this backend owns, cleaned up on `stop`.
    fn storage_dir(&self) -> Option<PathBuf>;
}

#[derive(Default)]
pub struct SingleNodeLeader {
    leader: Arc<AtomicBool>,
    callbacks: Mutex<Vec<Box<dyn Fn(bool) + Send + Sync>>>,
}

impl SingleNodeLeader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaderElection for SingleNodeLeader {
    async fn start(&self) {
        self.leader.store(true, Ordering::SeqCst);
        for cb in self.callbacks.lock().iter() {
            cb(true);
        }
    }

    async fn stop(&self) {
        self.leader.store(false, Ordering::SeqCst);
        for cb in self.callbacks.lock().iter() {
            cb(false);
        }
    }

    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::SeqCst)
    }

    fn on_leadership_change(&self, callback: Box<dyn Fn(bool) + Send + Sync>) {
        self.callbacks.lock().push(callback);
    }

    fn storage_dir(&self) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_node_leader_is_leader_once_started() {
        let leader = SingleNodeLeader::new();
        assert!(!leader.is_leader());
        leader.start().await;
        assert!(leader.is_leader());
        leader.stop().await;
        assert!(!leader.is_leader());
    }

    #[tokio::test]
    async fn leadership_change_callbacks_fire_on_start_and_stop() {
        use std::sync::atomic::AtomicUsize;
        let leader = SingleNodeLeader::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        leader.on_leadership_change(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        leader.start().await;
        leader.stop().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
