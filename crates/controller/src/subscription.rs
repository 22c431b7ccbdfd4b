// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Colonies contributors

//! Subscription controller (S1): maps (runtime, process/colony, desired
//! state) to active long-poll subscribers and fans out a matching process
//! to the first channel found, matching §4.8 / §4.3's long-poll semantics.
//!
//! Each subscription is single-delivery (a long-poll caller wants exactly
//! one process back) and carries a deadline; `prune_expired` drops the rest
//! so a disconnected or timed-out caller's sender is garbage-collected
//! instead of leaking.

use chrono::{DateTime, Utc};
use colonies_core::{ColonyId, Process, ProcessId, ProcessState};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// What state a subscriber is waiting to observe. `Any` matches the
/// colony/type index regardless of which state the process lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DesiredState {
    Specific(ProcessState),
    Any,
}

impl DesiredState {
    fn matches(self, state: ProcessState) -> bool {
        match self {
            DesiredState::Specific(s) => s == state,
            DesiredState::Any => true,
        }
    }
}

struct Subscriber {
    sender: oneshot::Sender<Process>,
    deadline: DateTime<Utc>,
}

#[derive(Default)]
pub struct SubscriptionController {
    by_process: HashMap<ProcessId, Vec<Subscriber>>,
    by_colony_type: HashMap<(ColonyId, String, DesiredState), Vec<Subscriber>>,
}

impl SubscriptionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a single process reaching `desired_state`. Returns a
    /// receiver that resolves with the process once matched, or is dropped
    /// (sender side) once `deadline` passes and `prune_expired` runs.
    pub fn subscribe_process(
        &mut self,
        process_id: ProcessId,
        deadline: DateTime<Utc>,
    ) -> oneshot::Receiver<Process> {
        let (tx, rx) = oneshot::channel();
        self.by_process.entry(process_id).or_default().push(Subscriber { sender: tx, deadline });
        rx
    }

    /// Subscribes to the next process of `runtime_type` in `colony_id`
    /// reaching `desired_state`. Backs `assignRuntime`'s long-poll: the
    /// transport layer retries the assignment call once this resolves.
    pub fn subscribe_colony_type(
        &mut self,
        colony_id: ColonyId,
        runtime_type: String,
        desired_state: DesiredState,
        deadline: DateTime<Utc>,
    ) -> oneshot::Receiver<Process> {
        let (tx, rx) = oneshot::channel();
        self.by_colony_type
            .entry((colony_id, runtime_type, desired_state))
            .or_default()
            .push(Subscriber { sender: tx, deadline });
        rx
    }

    /// Delivers `process` to every subscriber whose criteria match. A
    /// delivery consumes the subscription (single-shot, matching long-poll
    /// semantics); a dropped receiver (disconnected caller) is silently
    /// discarded rather than treated as an error.
    pub fn notify(&mut self, process: &Process) {
        if let Some(subs) = self.by_process.remove(&process.id) {
            for sub in subs {
                let _ = sub.sender.send(process.clone());
            }
        }
        let runtime_type = &process.spec.conditions.runtime_type;
        let colony_id = &process.spec.conditions.colony_id;
        let keys: Vec<_> = self
            .by_colony_type
            .keys()
            .filter(|(cid, rtype, desired)| {
                cid == colony_id && rtype == runtime_type && desired.matches(process.state)
            })
            .cloned()
            .collect();
        for key in keys {
            if let Some(subs) = self.by_colony_type.remove(&key) {
                for sub in subs {
                    let _ = sub.sender.send(process.clone());
                }
            }
        }
    }

    /// Drops subscriptions past their deadline. Call periodically (e.g.
    /// from the timeout loop) so a long-poll caller that never reconnects
    /// doesn't pin its sender in memory forever.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) {
        self.by_process.retain(|_, subs| {
            subs.retain(|s| s.deadline > now);
            !subs.is_empty()
        });
        self.by_colony_type.retain(|_, subs| {
            subs.retain(|s| s.deadline > now);
            !subs.is_empty()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.by_process.values().map(Vec::len).sum::<usize>()
            + self.by_colony_type.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonies_core::{Conditions, ProcessSpec};
    use std::collections::{BTreeMap, BTreeSet};

    fn process(colony_id: ColonyId, runtime_type: &str, state: ProcessState) -> Process {
        let spec = ProcessSpec {
            name: "a".to_string(),
            func: "echo".to_string(),
            args: vec![],
            max_wait_time: -1,
            max_exec_time: -1,
            max_retries: -1,
            priority: 0,
            env: BTreeMap::new(),
            conditions: Conditions {
                colony_id,
                runtime_ids: vec![],
                runtime_type: runtime_type.to_string(),
                dependencies: BTreeSet::new(),
            },
        };
        let mut p = Process::new(spec, DateTime::from_timestamp(0, 0).unwrap());
        p.state = state;
        p
    }

    fn far_future() -> DateTime<Utc> {
        DateTime::from_timestamp(9_999_999_999, 0).unwrap()
    }

    #[tokio::test]
    async fn process_subscriber_receives_matching_process() {
        let mut ctrl = SubscriptionController::new();
        let process = process(ColonyId::new(), "cuda", ProcessState::Running);
        let rx = ctrl.subscribe_process(process.id.clone(), far_future());
        ctrl.notify(&process);
        let delivered = rx.await.unwrap();
        assert_eq!(delivered.id, process.id);
    }

    #[tokio::test]
    async fn colony_type_subscriber_matches_on_specific_state() {
        let mut ctrl = SubscriptionController::new();
        let colony_id = ColonyId::new();
        let rx = ctrl.subscribe_colony_type(
            colony_id.clone(),
            "cuda".to_string(),
            DesiredState::Specific(ProcessState::Waiting),
            far_future(),
        );
        let wrong_state = process(colony_id.clone(), "cuda", ProcessState::Running);
        ctrl.notify(&wrong_state);
        assert_eq!(ctrl.subscriber_count(), 1);

        let right_state = process(colony_id, "cuda", ProcessState::Waiting);
        ctrl.notify(&right_state);
        let delivered = rx.await.unwrap();
        assert_eq!(delivered.id, right_state.id);
    }

    #[test]
    fn prune_expired_drops_subscriptions_past_their_deadline() {
        let mut ctrl = SubscriptionController::new();
        let process = process(ColonyId::new(), "cuda", ProcessState::Running);
        let past = DateTime::from_timestamp(1, 0).unwrap();
        let _rx = ctrl.subscribe_process(process.id.clone(), past);
        assert_eq!(ctrl.subscriber_count(), 1);
        ctrl.prune_expired(DateTime::from_timestamp(2, 0).unwrap());
        assert_eq!(ctrl.subscriber_count(), 0);
    }

    #[test]
    fn dropped_receiver_does_not_panic_on_notify() {
        let mut ctrl = SubscriptionController::new();
        let process = process(ColonyId::new(), "cuda", ProcessState::Running);
        let rx = ctrl.subscribe_process(process.id.clone(), far_future());
        drop(rx);
        ctrl.notify(&process);
    }
}
