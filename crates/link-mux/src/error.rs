//! Error types for the router

use link_protocol::{Channel, ProtocolError};
use thiserror::Error;

/// Errors raised by a console or radio transport
#[derive(Debug, Error)]
pub enum LinkError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer is gone
    #[error("link disconnected")]
    Disconnected,

    /// The transport refused the data
    #[error("transmission rejected: {0}")]
    Rejected(String),
}

/// Errors that can occur in the router
#[derive(Debug, Error)]
pub enum MuxError {
    /// The queue is at capacity and the overflow policy refused the message
    #[error("queue full: capacity {capacity} reached")]
    QueueFull { capacity: usize },

    /// The queue was closed for shutdown
    #[error("queue closed")]
    QueueClosed,

    /// A radio link failed to transmit
    #[error("send failed on {channel}: {source}")]
    SendFailure {
        /// Channel the send was attempted on
        channel: Channel,
        /// Transport error
        #[source]
        source: LinkError,
    },

    /// A radio link failed while receiving
    #[error("receive failed on {channel}: {source}")]
    ReceiveFailure {
        /// Channel the receive was attempted on
        channel: Channel,
        /// Transport error
        #[source]
        source: LinkError,
    },

    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid router configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A router thread could not be started
    #[error("failed to spawn {task} thread: {source}")]
    ThreadSpawn {
        /// Task name
        task: &'static str,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// A router thread panicked before it could be joined
    #[error("{0} thread panicked")]
    TaskPanicked(&'static str),
}
