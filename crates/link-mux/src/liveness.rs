//! Per-radio liveness tracking
//!
//! Each channel remembers when it was last heard from (or successfully sent
//! to). A channel is alive while `now - last_contact < timeout`; a channel
//! that has never been contacted is down.
//!
//! The record is a single timestamp, so an atomic per channel is enough:
//! the egress task stores with `Release`, readers load with `Acquire`.

use std::sync::atomic::{AtomicU64, Ordering};

use link_protocol::Channel;

const NEVER: u64 = u64::MAX;

/// Liveness state of one channel at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLivenessRecord {
    /// Last contact in ms since startup (`None` if never contacted)
    pub last_contact: Option<u64>,
    /// Whether the channel is within its timeout
    pub is_alive: bool,
}

/// Last-contact timestamps for both radio channels
#[derive(Debug)]
pub struct RadioLiveness {
    last_contact: [AtomicU64; 2],
    timeout_ms: u64,
}

impl RadioLiveness {
    /// Create a tracker with both channels down
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            last_contact: [AtomicU64::new(NEVER), AtomicU64::new(NEVER)],
            timeout_ms,
        }
    }

    /// Configured timeout in ms
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Record contact with a channel at `now`
    pub fn record_contact(&self, channel: Channel, now: u64) {
        // NEVER is reserved; a clock this far out is not a real reading.
        let now = now.min(NEVER - 1);
        self.last_contact[channel.index()].store(now, Ordering::Release);
    }

    /// Last contact with a channel
    pub fn last_contact(&self, channel: Channel) -> Option<u64> {
        match self.last_contact[channel.index()].load(Ordering::Acquire) {
            NEVER => None,
            at => Some(at),
        }
    }

    /// Whether a channel has been heard from within the timeout
    pub fn is_alive(&self, channel: Channel, now: u64) -> bool {
        self.last_contact(channel)
            .is_some_and(|at| now.saturating_sub(at) < self.timeout_ms)
    }

    /// Liveness record for a channel
    pub fn record(&self, channel: Channel, now: u64) -> ChannelLivenessRecord {
        let last_contact = self.last_contact(channel);
        ChannelLivenessRecord {
            last_contact,
            is_alive: last_contact.is_some_and(|at| now.saturating_sub(at) < self.timeout_ms),
        }
    }

    /// Records for both channels, indexed by [`Channel::index`]
    pub fn snapshot(&self, now: u64) -> [ChannelLivenessRecord; 2] {
        Channel::ALL.map(|c| self.record(c, now))
    }
}

/// Status text for a liveness flag
pub fn status_label(alive: bool) -> &'static str {
    if alive {
        "OK"
    } else {
        "TIMEOUT"
    }
}
