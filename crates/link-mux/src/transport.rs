//! Console and radio link abstractions
//!
//! The router never touches hardware directly. The console is polled one
//! byte at a time; each radio exposes a send and a receive with a bounded
//! wait. Radio links carry a byte stream in both directions: callers frame
//! received bytes into lines themselves, and implementations terminate each
//! sent payload so the far end can tell messages apart. Real serial ports
//! and simulated links both implement these traits.

use std::time::Duration;

use link_protocol::Channel;

use crate::error::LinkError;

/// Byte source for the console link
pub trait ConsoleSource: Send {
    /// Read the next byte
    ///
    /// `Ok(None)` means nothing is available right now; it is not an
    /// end-of-stream signal and the caller will poll again.
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError>;
}

/// A bidirectional radio link
pub trait RadioLink: Send {
    /// Transmit a payload as one `\n`-terminated line
    fn send(&mut self, data: &[u8]) -> Result<(), LinkError>;

    /// Receive into `buf`, waiting at most `timeout`
    ///
    /// Returns the number of bytes received; 0 means nothing arrived within
    /// the timeout. The bytes need not end on a line boundary.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError>;
}

impl<T: ConsoleSource + ?Sized> ConsoleSource for Box<T> {
    fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
        (**self).read_byte()
    }
}

impl<T: RadioLink + ?Sized> RadioLink for Box<T> {
    fn send(&mut self, data: &[u8]) -> Result<(), LinkError> {
        (**self).send(data)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, LinkError> {
        (**self).receive(buf, timeout)
    }
}

/// The two radio links, owned by the egress task
pub struct RadioPair {
    links: [Box<dyn RadioLink>; 2],
}

impl RadioPair {
    /// Pair up the links for radio A and radio B
    pub fn new(radio_a: Box<dyn RadioLink>, radio_b: Box<dyn RadioLink>) -> Self {
        Self {
            links: [radio_a, radio_b],
        }
    }

    /// Borrow the link for a channel
    pub fn get_mut(&mut self, channel: Channel) -> &mut dyn RadioLink {
        self.links[channel.index()].as_mut()
    }
}

impl std::fmt::Debug for RadioPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioPair")
            .field("links", &"<radio links>")
            .finish()
    }
}
