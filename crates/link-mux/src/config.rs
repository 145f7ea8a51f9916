//! Router configuration

use std::time::Duration;

use link_protocol::{
    normalize_team_name, Channel, DEFAULT_FRAME_CAPACITY, DEFAULT_MAX_TEAM_NAME_LEN,
};
use serde::{Deserialize, Serialize};

use crate::error::MuxError;

/// What the queue does with a message pushed while it is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Refuse the new message with `QueueFull`
    #[default]
    Reject,
    /// Evict the oldest queued message to make room
    DropOldest,
    /// Wait for room up to `timeout_ms`, then refuse with `QueueFull`
    Block { timeout_ms: u64 },
}

impl OverflowPolicy {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reject => "Reject",
            Self::DropOldest => "Drop Oldest",
            Self::Block { .. } => "Block",
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum console line length in bytes
    pub frame_capacity: usize,
    /// Maximum queued messages (`None` for unbounded)
    pub queue_capacity: Option<usize>,
    /// Behaviour when a bounded queue is full
    pub overflow_policy: OverflowPolicy,
    /// A radio is alive while its last contact is younger than this (ms)
    pub liveness_timeout_ms: u64,
    /// Receive wait per poll, indexed by channel (ms)
    pub receive_timeout_ms: [u64; 2],
    /// Ingress sleep when the console has no data (ms)
    pub ingress_idle_ms: u64,
    /// Egress sleep between iterations (ms)
    pub egress_idle_ms: u64,
    /// Interval between heartbeat status reports (ms)
    pub heartbeat_interval_ms: u64,
    /// Maximum announced team name length in bytes
    pub max_team_name_len: usize,
    /// Receive buffer size per radio in bytes
    pub radio_receive_buffer: usize,
    /// Team name that addresses every radio (`None` disables)
    pub broadcast_team: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            queue_capacity: None,
            overflow_policy: OverflowPolicy::Reject,
            liveness_timeout_ms: 1000,
            receive_timeout_ms: [50, 50],
            ingress_idle_ms: 5,
            egress_idle_ms: 10,
            heartbeat_interval_ms: 1000,
            max_team_name_len: DEFAULT_MAX_TEAM_NAME_LEN,
            radio_receive_buffer: 128,
            broadcast_team: Some("*".to_string()),
        }
    }
}

impl RouterConfig {
    /// Check the configuration for values the router cannot run with
    pub fn validate(&self) -> Result<(), MuxError> {
        if self.frame_capacity == 0 {
            return Err(MuxError::Config("frame_capacity must be at least 1".into()));
        }
        if self.queue_capacity == Some(0) {
            return Err(MuxError::Config("queue_capacity must be at least 1".into()));
        }
        if self.max_team_name_len == 0 {
            return Err(MuxError::Config(
                "max_team_name_len must be at least 1".into(),
            ));
        }
        if self.radio_receive_buffer == 0 {
            return Err(MuxError::Config(
                "radio_receive_buffer must be at least 1".into(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(MuxError::Config(
                "heartbeat_interval_ms must be at least 1".into(),
            ));
        }
        if let Some(team) = &self.broadcast_team {
            // Console team names are compared after trailing whitespace is
            // stripped, so a name that changes under stripping never matches.
            let name = normalize_team_name(team);
            if name.trim().is_empty() || name != team || team.contains(':') {
                return Err(MuxError::Config(format!(
                    "broadcast_team {team:?} must be non-empty, contain no ':' and no trailing whitespace"
                )));
            }
        }
        Ok(())
    }

    /// Receive wait for a channel
    pub fn receive_timeout(&self, channel: Channel) -> Duration {
        Duration::from_millis(self.receive_timeout_ms[channel.index()])
    }

    /// Ingress idle sleep
    pub fn ingress_idle(&self) -> Duration {
        Duration::from_millis(self.ingress_idle_ms)
    }

    /// Egress idle sleep
    pub fn egress_idle(&self) -> Duration {
        Duration::from_millis(self.egress_idle_ms)
    }

    /// Heartbeat interval
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}
