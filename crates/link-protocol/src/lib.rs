//! Teamlink Protocol Library
//!
//! This crate provides the wire-level pieces of the teamlink bridge, which
//! relays line-delimited text from a single console link to two radio links:
//!
//! - **Framing**: [`LineFramer`] accumulates console bytes into lines
//!   terminated by `\n` or `\r`, truncating lines that exceed the frame
//!   capacity.
//! - **Console messages**: `<team>:<payload>` lines are decoded into a team
//!   name and payload; lines without a `:` are unstructured.
//! - **Radio announcements**: a radio link announces the team it serves by
//!   sending a single line containing only the team name.
//!
//! # Example
//!
//! ```rust
//! use link_protocol::{DecodedForm, LineFramer, MessageCodec};
//!
//! let mut framer = LineFramer::new(255);
//! let codec = MessageCodec::default();
//!
//! let mut lines = Vec::new();
//! for &byte in b"Alpha:move 10\n" {
//!     if let Ok(Some(line)) = framer.feed(byte) {
//!         lines.push(line);
//!     }
//! }
//!
//! match codec.decode(&lines[0]) {
//!     DecodedForm::RoutedMessage { team_name, payload } => {
//!         assert_eq!(team_name, "Alpha");
//!         assert_eq!(payload, b"move 10");
//!     }
//!     DecodedForm::Unstructured { .. } => unreachable!(),
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod error;
pub mod framer;

pub use channel::{Channel, Target};
pub use codec::{normalize_team_name, DecodedForm, MessageCodec, DEFAULT_MAX_TEAM_NAME_LEN};
pub use error::ProtocolError;
pub use framer::{Line, LineFramer, DEFAULT_FRAME_CAPACITY};
