//! Router events and the display/logging sink
//!
//! Every routing decision, binding change, liveness transition and fault is
//! reported as a [`RouterEvent`] to an [`EventSink`]. The sink is
//! write-only: routing never reads it back, so swapping in [`NullSink`]
//! changes nothing but what the operator sees.

use std::sync::{Mutex, PoisonError};

use link_protocol::{Channel, Target};
use tracing::{debug, info, trace, warn};

use crate::liveness::{status_label, ChannelLivenessRecord};
use crate::registry::TeamBindings;

/// Router task identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Console framing and routing
    Ingress,
    /// Radio send/receive
    Egress,
    /// Periodic status report
    Heartbeat,
}

impl TaskKind {
    /// Thread name for this task
    pub fn thread_name(&self) -> &'static str {
        match self {
            TaskKind::Ingress => "teamlink-ingress",
            TaskKind::Egress => "teamlink-egress",
            TaskKind::Heartbeat => "teamlink-heartbeat",
        }
    }
}

/// Everything the router reports to the operator
#[derive(Debug, Clone, PartialEq)]
pub enum RouterEvent {
    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// A task entered its loop
    TaskStarted { task: TaskKind },

    /// A task observed shutdown and left its loop
    TaskStopped { task: TaskKind },

    // -------------------------------------------------------------------------
    // Ingress
    // -------------------------------------------------------------------------
    /// A byte arrived on the console
    ConsoleByte { byte: u8 },

    /// A console line filled the frame buffer; the rest of it is discarded
    ///
    /// Reported once per line, on the first discarded byte.
    FrameOverflow { capacity: usize },

    /// A truncated console line was completed and routed
    LineTruncated { kept: usize, discarded: usize },

    /// The console link reported an error
    ConsoleError { reason: String },

    /// A console line was queued for delivery
    Routed {
        /// Team named on the line (`None` for unstructured lines)
        team: Option<String>,
        /// Chosen target
        target: Target,
        /// Payload length in bytes
        payload_len: usize,
    },

    /// Both radios claim the team; the message went to `chosen` only
    AmbiguousBinding {
        team: String,
        chosen: Channel,
        shadowed: Channel,
    },

    /// The queue refused a message
    MessageDropped {
        target: Target,
        payload_len: usize,
        reason: String,
    },

    /// A queued message was evicted to make room
    MessageEvicted { target: Target, payload_len: usize },

    // -------------------------------------------------------------------------
    // Egress
    // -------------------------------------------------------------------------
    /// A payload was transmitted on a radio
    Sent { channel: Channel, payload_len: usize },

    /// A radio failed to transmit (not retried)
    SendFailed { channel: Channel, reason: String },

    /// A radio failed while receiving
    ReceiveFailed { channel: Channel, reason: String },

    /// A radio announced its team
    TeamBound {
        channel: Channel,
        team: String,
        previous: Option<String>,
    },

    /// A radio sent a line that trims to nothing; binding unchanged
    EmptyAnnouncement { channel: Channel },

    /// A radio crossed the liveness timeout in either direction
    LivenessChanged { channel: Channel, alive: bool },

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------
    /// Periodic status report
    Heartbeat {
        uptime_ms: u64,
        bindings: TeamBindings,
        liveness: [ChannelLivenessRecord; 2],
        queue_depth: usize,
    },
}

impl RouterEvent {
    /// Check if this event reports a fault the operator should see
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            RouterEvent::FrameOverflow { .. }
                | RouterEvent::LineTruncated { .. }
                | RouterEvent::ConsoleError { .. }
                | RouterEvent::MessageDropped { .. }
                | RouterEvent::MessageEvicted { .. }
                | RouterEvent::SendFailed { .. }
                | RouterEvent::ReceiveFailed { .. }
                | RouterEvent::EmptyAnnouncement { .. }
                | RouterEvent::AmbiguousBinding { .. }
        )
    }

    /// Get the channel if this event is associated with a specific radio
    pub fn channel(&self) -> Option<Channel> {
        match self {
            RouterEvent::Sent { channel, .. }
            | RouterEvent::SendFailed { channel, .. }
            | RouterEvent::ReceiveFailed { channel, .. }
            | RouterEvent::TeamBound { channel, .. }
            | RouterEvent::EmptyAnnouncement { channel }
            | RouterEvent::LivenessChanged { channel, .. } => Some(*channel),
            RouterEvent::AmbiguousBinding { chosen, .. } => Some(*chosen),
            _ => None,
        }
    }
}

/// Write-only destination for router events
pub trait EventSink: Send + Sync {
    /// Report an event
    fn emit(&self, event: RouterEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RouterEvent) {}
}

/// Sink that logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: RouterEvent) {
        match event {
            RouterEvent::TaskStarted { task } => debug!("{} started", task.thread_name()),
            RouterEvent::TaskStopped { task } => debug!("{} stopped", task.thread_name()),
            RouterEvent::ConsoleByte { byte } => {
                trace!("Console byte: {:?} (0x{:02X})", byte as char, byte)
            }
            RouterEvent::FrameOverflow { capacity } => {
                warn!("Buffer full ({} bytes), discarding until end of line", capacity)
            }
            RouterEvent::LineTruncated { kept, discarded } => warn!(
                "Line truncated: kept {} bytes, discarded {}",
                kept, discarded
            ),
            RouterEvent::ConsoleError { reason } => warn!("Console read failed: {}", reason),
            RouterEvent::Routed {
                team,
                target,
                payload_len,
            } => match team {
                Some(team) => info!("Console RX for '{}' ({} bytes) -> {}", team, payload_len, target),
                None => info!("Console RX ({} bytes) -> {}", payload_len, target),
            },
            RouterEvent::AmbiguousBinding {
                team,
                chosen,
                shadowed,
            } => warn!(
                "Team '{}' is bound to both radios; routing to {} and not {}",
                team, chosen, shadowed
            ),
            RouterEvent::MessageDropped {
                target,
                payload_len,
                reason,
            } => warn!(
                "Dropped {}-byte message for {}: {}",
                payload_len, target, reason
            ),
            RouterEvent::MessageEvicted {
                target,
                payload_len,
            } => warn!(
                "Evicted oldest {}-byte message for {} to make room",
                payload_len, target
            ),
            RouterEvent::Sent {
                channel,
                payload_len,
            } => debug!("Radio TX to {}: {} bytes", channel, payload_len),
            RouterEvent::SendFailed { channel, reason } => {
                warn!("Radio TX to {} failed: {}", channel, reason)
            }
            RouterEvent::ReceiveFailed { channel, reason } => {
                warn!("Radio RX on {} failed: {}", channel, reason)
            }
            RouterEvent::TeamBound {
                channel,
                team,
                previous,
            } => match previous {
                Some(previous) if previous != team => {
                    info!("{} team: {} (was {})", channel, team, previous)
                }
                Some(_) => debug!("{} team re-announced: {}", channel, team),
                None => info!("{} team: {}", channel, team),
            },
            RouterEvent::EmptyAnnouncement { channel } => {
                debug!("Ignoring empty announcement on {}", channel)
            }
            RouterEvent::LivenessChanged { channel, alive } => {
                if alive {
                    info!("{} link OK", channel)
                } else {
                    warn!("{} link TIMEOUT", channel)
                }
            }
            RouterEvent::Heartbeat {
                uptime_ms,
                bindings,
                liveness,
                queue_depth,
            } => info!(
                "Time: {}ms | A: {} [{}] | B: {} [{}] | queued: {}",
                uptime_ms,
                bindings.display(Channel::ChannelA),
                status_label(liveness[0].is_alive),
                bindings.display(Channel::ChannelB),
                status_label(liveness[1].is_alive),
                queue_depth
            ),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RouterEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<RouterEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Count recorded events matching a predicate
    pub fn count(&self, predicate: impl Fn(&RouterEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RouterEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: RouterEvent) {
        (**self).emit(event)
    }
}
