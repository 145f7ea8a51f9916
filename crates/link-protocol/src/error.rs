//! Error types for teamlink framing and decoding

use thiserror::Error;

/// Conditions raised while framing or decoding link data
///
/// None of these are fatal: the framer keeps its truncated line after an
/// overflow, and an empty announcement leaves the existing binding alone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A console line exceeded the frame buffer; the byte was discarded
    #[error("frame overflow: line exceeds {capacity} bytes, byte discarded")]
    FrameOverflow { capacity: usize },

    /// A radio announcement contained nothing but whitespace
    #[error("empty team announcement")]
    EmptyAnnouncement,
}
