//! Shared message queue between the ingress and egress tasks
//!
//! A FIFO guarded by a [`Mutex`]. Every push and pop takes the lock for a
//! short critical section; nobody spins waiting for it. When a capacity is
//! configured, the [`OverflowPolicy`] decides what a push into a full queue
//! does, and blocked producers park on a [`Condvar`] until a pop makes room
//! or the queue is closed.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::OverflowPolicy;
use crate::error::MuxError;

/// Result of a successful push
#[derive(Debug, PartialEq, Eq)]
pub enum PushOutcome<T> {
    /// The item was appended
    Enqueued,
    /// The item was appended after evicting the oldest item
    Evicted(T),
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Mutex-guarded FIFO with an optional capacity bound
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_full: Condvar,
    capacity: Option<usize>,
    policy: OverflowPolicy,
}

impl<T> BoundedQueue<T> {
    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(None, OverflowPolicy::default())
    }

    /// Create a queue with an optional capacity and its overflow policy
    pub fn new(capacity: Option<usize>, policy: OverflowPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            not_full: Condvar::new(),
            capacity,
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // The deque is never left half-updated, even by a panicking holder
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an item
    ///
    /// Never blocks on an unbounded queue. On a full bounded queue the
    /// overflow policy applies.
    pub fn push(&self, item: T) -> Result<PushOutcome<T>, MuxError> {
        let mut state = self.lock();
        if state.closed {
            return Err(MuxError::QueueClosed);
        }

        if let Some(capacity) = self.capacity {
            if state.items.len() >= capacity {
                match self.policy {
                    OverflowPolicy::Reject => return Err(MuxError::QueueFull { capacity }),
                    OverflowPolicy::DropOldest => {
                        let evicted = state.items.pop_front();
                        state.items.push_back(item);
                        return Ok(match evicted {
                            Some(old) => PushOutcome::Evicted(old),
                            None => PushOutcome::Enqueued,
                        });
                    }
                    OverflowPolicy::Block { timeout_ms } => {
                        let (guard, _) = self
                            .not_full
                            .wait_timeout_while(state, Duration::from_millis(timeout_ms), |s| {
                                !s.closed && s.items.len() >= capacity
                            })
                            .unwrap_or_else(PoisonError::into_inner);
                        state = guard;

                        if state.closed {
                            return Err(MuxError::QueueClosed);
                        }
                        if state.items.len() >= capacity {
                            return Err(MuxError::QueueFull { capacity });
                        }
                    }
                }
            }
        }

        state.items.push_back(item);
        Ok(PushOutcome::Enqueued)
    }

    /// Remove the oldest item without waiting
    pub fn try_pop(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() && self.capacity.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Configured overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Refuse further pushes and wake any blocked producer
    ///
    /// Items already queued can still be popped.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_full.notify_all();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
