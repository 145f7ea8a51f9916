//! Virtual console link

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use link_mux::{ConsoleSource, LinkError};
use link_protocol::MessageCodec;

#[derive(Debug, Default)]
struct ConsoleState {
    pending: VecDeque<u8>,
    disconnected: bool,
}

/// A console whose bytes are supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct VirtualConsole {
    state: Arc<Mutex<ConsoleState>>,
    codec: MessageCodec,
}

impl VirtualConsole {
    /// Create an empty console
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw bytes
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.lock().pending.extend(bytes.iter().copied());
    }

    /// Queue a line, adding the `\n` terminator
    pub fn push_line(&self, line: &str) {
        let mut state = self.lock();
        state.pending.extend(line.bytes());
        state.pending.push_back(b'\n');
    }

    /// Queue an addressed `<team>:<payload>` line
    pub fn send_to(&self, team: &str, payload: &[u8]) {
        let encoded = self.codec.encode(team, payload);
        self.push_bytes(&encoded);
    }

    /// Bytes not yet read by the router
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Make every further read fail
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }
}

impl ConsoleSource for VirtualConsole {
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        let mut state = self.lock();
        if state.disconnected {
            return Err(LinkError::Disconnected);
        }
        Ok(state.pending.pop_front())
    }
}
