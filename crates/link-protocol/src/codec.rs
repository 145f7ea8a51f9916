//! Console message and radio announcement decoding
//!
//! Console lines use the form `<team>:<payload>`. The team name is
//! everything before the first `:`, so the payload may itself contain
//! colons. A line without a `:` is unstructured and carries only a payload.
//!
//! Radio links speak a simpler dialect: every inbound line is an
//! announcement whose trimmed content is the team name the radio serves.

use crate::error::ProtocolError;
use crate::framer::Line;

/// Maximum team name length in bytes (a 64-byte buffer less its terminator)
pub const DEFAULT_MAX_TEAM_NAME_LEN: usize = 63;

const SEPARATOR: u8 = b':';

/// Decoded form of a console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedForm {
    /// `<team>:<payload>`
    RoutedMessage {
        /// Text before the first `:`, as received
        team_name: String,
        /// Bytes after the first `:`
        payload: Vec<u8>,
    },
    /// A line without a team separator
    Unstructured {
        /// The whole line
        payload: Vec<u8>,
    },
}

impl DecodedForm {
    /// Team name, if the line named one
    pub fn team_name(&self) -> Option<&str> {
        match self {
            DecodedForm::RoutedMessage { team_name, .. } => Some(team_name),
            DecodedForm::Unstructured { .. } => None,
        }
    }

    /// Payload bytes
    pub fn payload(&self) -> &[u8] {
        match self {
            DecodedForm::RoutedMessage { payload, .. } | DecodedForm::Unstructured { payload } => {
                payload
            }
        }
    }
}

/// Strip trailing whitespace and NUL padding from a team name
///
/// Bindings and lookups both go through this so that `"Alpha\r\n"` and
/// `"Alpha"` name the same team. Matching stays case-sensitive.
pub fn normalize_team_name(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// Codec for console lines and radio announcements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageCodec {
    max_team_name_len: usize,
}

impl MessageCodec {
    /// Create a codec accepting team names of up to `max_team_name_len` bytes
    pub fn new(max_team_name_len: usize) -> Self {
        Self { max_team_name_len }
    }

    /// Decode a console line
    ///
    /// Total and deterministic: every line, including the empty line, maps to
    /// exactly one form.
    pub fn decode(&self, line: &Line) -> DecodedForm {
        let bytes = line.as_bytes();
        match bytes.iter().position(|&b| b == SEPARATOR) {
            Some(pos) => DecodedForm::RoutedMessage {
                team_name: String::from_utf8_lossy(&bytes[..pos]).into_owned(),
                payload: bytes[pos + 1..].to_vec(),
            },
            None => DecodedForm::Unstructured {
                payload: bytes.to_vec(),
            },
        }
    }

    /// Decode bytes received on a radio link as a team announcement
    ///
    /// The content ends at the first NUL. If the radio packed several lines
    /// into one receive, the last non-empty line wins. Each line is cut to
    /// the maximum team name length before trimming; invalid UTF-8 is
    /// replaced rather than rejected.
    pub fn decode_announcement(&self, data: &[u8]) -> Result<String, ProtocolError> {
        let content = data.split(|&b| b == 0).next().unwrap_or_default();

        content
            .split(|&b| b == b'\n' || b == b'\r')
            .rev()
            .map(|line| {
                let end = line.len().min(self.max_team_name_len);
                let text = String::from_utf8_lossy(&line[..end]);
                normalize_team_name(&text).to_string()
            })
            .find(|name| !name.is_empty())
            .ok_or(ProtocolError::EmptyAnnouncement)
    }

    /// Encode a team-addressed console line, terminator included
    pub fn encode(&self, team_name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(team_name.len() + payload.len() + 2);
        out.extend_from_slice(team_name.as_bytes());
        out.push(SEPARATOR);
        out.extend_from_slice(payload);
        out.push(b'\n');
        out
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TEAM_NAME_LEN)
    }
}
