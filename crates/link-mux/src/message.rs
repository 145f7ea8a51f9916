//! Routable console messages

use link_protocol::Target;

/// A console message on its way to one or both radios
///
/// Owned by the queue while queued, then by the egress task until its
/// payload is handed to the radio links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Bytes sent to the radio (framing guarantees at most the frame capacity)
    pub payload: Vec<u8>,
    /// Where the message goes
    pub target: Target,
    /// Enqueue time in ms since startup
    pub enqueued_at: u64,
    /// Team named on the console line, if any
    pub team: Option<String>,
}

impl Message {
    /// Create a message
    pub fn new(payload: Vec<u8>, target: Target, enqueued_at: u64) -> Self {
        Self {
            payload,
            target,
            enqueued_at,
            team: None,
        }
    }

    /// Attach the team name the message was addressed to
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Payload as text for display
    pub fn payload_display(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}
