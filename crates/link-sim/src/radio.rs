//! Virtual radio worker
//!
//! Emulates the far end of a radio link: the worker announces the team it
//! serves by sending the team name as a line, optionally repeating it on a
//! fixed interval, and logs whatever it receives. Announcements are queued
//! by the caller; received payloads are kept in a history that can be bounded
//! for long-running use.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use link_mux::{LinkError, RadioLink};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Received payloads kept by a configured radio
pub const DEFAULT_HISTORY: usize = 64;

#[derive(Debug)]
struct Reannounce {
    line: Vec<u8>,
    every: Duration,
    last: Instant,
}

impl Reannounce {
    fn due(&self) -> bool {
        self.last.elapsed() >= self.every
    }
}

#[derive(Debug, Default)]
struct RadioState {
    /// Chunks waiting to be received by the router
    inbound: VecDeque<Vec<u8>>,
    /// Payloads the router sent to this radio, oldest first
    sent: VecDeque<Vec<u8>>,
    /// Most payloads kept in `sent` (`None` keeps all)
    history: Option<usize>,
    /// Periodic team announcement
    reannounce: Option<Reannounce>,
    /// Fail every send
    fail_sends: bool,
    /// Fail every receive
    fail_receives: bool,
}

impl RadioState {
    fn record_sent(&mut self, payload: &[u8]) {
        if self.history == Some(0) {
            return;
        }
        self.sent.push_back(payload.to_vec());
        if let Some(limit) = self.history {
            while self.sent.len() > limit {
                self.sent.pop_front();
            }
        }
    }

    fn queue_reannounce(&mut self) {
        // Only when idle, so a stalled router never piles up announcements.
        if !self.inbound.is_empty() {
            return;
        }
        if let Some(reannounce) = self.reannounce.as_mut().filter(|r| r.due()) {
            reannounce.last = Instant::now();
            self.inbound.push_back(reannounce.line.clone());
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<RadioState>,
    arrived: Condvar,
}

/// A simulated radio worker
#[derive(Debug, Clone)]
pub struct VirtualRadio {
    id: String,
    shared: Arc<Shared>,
}

/// Configuration for creating a virtual radio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualRadioConfig {
    /// Display name/identifier
    pub id: String,
    /// Team announced as soon as the radio is created
    pub team: Option<String>,
    /// Repeat the team announcement this often (ms)
    pub reannounce_ms: Option<u64>,
    /// Received payloads to keep (`None` keeps all, 0 only logs them)
    pub history: Option<usize>,
}

impl Default for VirtualRadioConfig {
    fn default() -> Self {
        Self {
            id: "Virtual Radio".to_string(),
            team: None,
            reannounce_ms: None,
            history: Some(DEFAULT_HISTORY),
        }
    }
}

impl VirtualRadioConfig {
    /// Announce `team` on creation
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Repeat the announcement every `ms`
    pub fn with_reannounce_ms(mut self, ms: u64) -> Self {
        self.reannounce_ms = Some(ms);
        self
    }
}

fn announcement(team: &str) -> Vec<u8> {
    let mut line = team.as_bytes().to_vec();
    line.push(b'\n');
    line
}

impl VirtualRadio {
    /// Create a radio with nothing queued that keeps every payload it receives
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Create a radio from configuration
    pub fn from_config(config: VirtualRadioConfig) -> Self {
        let radio = Self::new(config.id);
        {
            let mut state = radio.lock();
            state.history = config.history;
            if let (Some(team), Some(ms)) = (&config.team, config.reannounce_ms) {
                state.reannounce = Some(Reannounce {
                    line: announcement(team),
                    every: Duration::from_millis(ms),
                    last: Instant::now(),
                });
            }
        }
        if let Some(team) = config.team {
            radio.announce(&team);
        }
        radio
    }

    fn lock(&self) -> MutexGuard<'_, RadioState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Radio identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a team announcement line
    pub fn announce(&self, team: &str) {
        self.push_inbound(announcement(team));
    }

    /// Queue arbitrary bytes for the router to receive
    pub fn push_inbound(&self, bytes: Vec<u8>) {
        debug!("{}: queued {} inbound bytes", self.id, bytes.len());
        self.lock().inbound.push_back(bytes);
        self.shared.arrived.notify_all();
    }

    /// Chunks not yet received by the router
    pub fn pending_inbound(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Payloads received so far, oldest first
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.lock().sent.iter().cloned().collect()
    }

    /// Received payloads as text
    pub fn sent_text(&self) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect()
    }

    /// Make sends fail (or succeed again)
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Make receives fail (or succeed again)
    pub fn set_fail_receives(&self, fail: bool) {
        self.lock().fail_receives = fail;
        self.shared.arrived.notify_all();
    }
}

impl RadioLink for VirtualRadio {
    fn send(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let mut state = self.lock();
        if state.fail_sends {
            return Err(LinkError::Rejected(format!("{} refused the payload", self.id)));
        }
        info!("{} RX: {}", self.id, String::from_utf8_lossy(data));
        state.record_sent(data);
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError> {
        let mut state = self.lock();
        state.queue_reannounce();
        let (mut state, _) = self
            .shared
            .arrived
            .wait_timeout_while(state, timeout, |s| s.inbound.is_empty() && !s.fail_receives)
            .unwrap_or_else(PoisonError::into_inner);

        if state.fail_receives {
            return Err(LinkError::Disconnected);
        }

        let Some(chunk) = state.inbound.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }
}
