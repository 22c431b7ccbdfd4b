// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! EventBus: in-process pub/sub of process-state events.
//!
//! Fans out to local subscribers via a broadcast channel (non-blocking from
//! the command worker's perspective: `signal` never awaits a receiver) and,
//! optionally, to a cluster relay for other controller replicas. Events
//! flow out of the mutator on a channel and a separate task fans them out
//! to many readers rather than one.

use chrono::{DateTime, Utc};
use colonies_core::{ColonyId, ProcessGraphId, ProcessId, ProcessState};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Wire shape for a process state change, delivered at-least-once locally
/// and best-effort across the cluster relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub process_id: ProcessId,
    pub process_graph_id: Option<ProcessGraphId>,
    pub colony_id: ColonyId,
    pub state: ProcessState,
    pub timestamp: DateTime<Utc>,
}

/// Cluster relay: publishes locally-signaled events to other controller
/// replicas. The real transport is an external collaborator; `NoopRelay` is
/// the standalone-node implementation.
pub trait ClusterRelay: Send + Sync {
    fn publish(&self, event: &ProcessEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRelay;

impl ClusterRelay for NoopRelay {
    fn publish(&self, _event: &ProcessEvent) {}
}

/// In-process pub/sub. Cheap to clone: the sender side is reference-counted
/// by `broadcast::Sender` itself.
pub struct EventBus {
    tx: broadcast::Sender<ProcessEvent>,
    relay: Box<dyn ClusterRelay>,
}

impl EventBus {
    pub fn new(relay: Box<dyn ClusterRelay>) -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self { tx, relay }
    }

    /// Publishes an event to local subscribers and the cluster relay.
    /// Never blocks: a lagging or absent subscriber only drops frames of
    /// the broadcast channel, it never backs up the command worker.
    pub fn signal(&self, event: ProcessEvent) {
        self.relay.publish(&event);
        // No receivers is not an error: nobody has subscribed yet.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProcessEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Box::new(NoopRelay))
    }
}
