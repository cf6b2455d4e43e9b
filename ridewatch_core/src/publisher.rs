//! Observer registry for `DetectionState`.
//!
//! The current state and the subscriber list live behind one lock, so a
//! publish replaces the state and fans it out atomically with respect to new
//! subscriptions: a subscriber sees the state current at subscription time
//! first, then every later publish in order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel as xch;

use crate::state::DetectionState;

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub rx: xch::Receiver<DetectionState>,
}

#[derive(Debug, Default)]
struct Inner {
    current: DetectionState,
    subscribers: Vec<(SubscriptionId, xch::Sender<DetectionState>)>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct StatePublisher {
    inner: Mutex<Inner>,
}

impl StatePublisher {
    pub fn new(initial: DetectionState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer; the current state is queued first.
    ///
    /// The queue is unbounded and holds every published state until it is
    /// read. A caller must keep draining `rx`, or `unsubscribe` (or drop
    /// `rx`, which prunes it on the next publish) once it stops listening.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = xch::unbounded();
        let mut g = self.lock();
        let id = SubscriptionId(g.next_id);
        g.next_id += 1;
        // receiver is alive, cannot fail
        let _ = tx.send(g.current.clone());
        g.subscribers.push((id, tx));
        Subscription { id, rx }
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut g = self.lock();
        let before = g.subscribers.len();
        g.subscribers.retain(|(sid, _)| *sid != id);
        g.subscribers.len() != before
    }

    /// Replace the current state and deliver it to every subscriber.
    /// Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, state: DetectionState) {
        let mut g = self.lock();
        g.subscribers
            .retain(|(_, tx)| tx.send(state.clone()).is_ok());
        g.current = state;
    }

    pub fn current(&self) -> DetectionState {
        self.lock().current.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}
