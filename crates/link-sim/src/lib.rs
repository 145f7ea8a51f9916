//! Team Link Simulation Library
//!
//! This crate provides in-memory links for testing the router without serial
//! hardware. It includes:
//!
//! - **VirtualConsole**: a console byte source fed from test code
//! - **VirtualRadio**: a radio worker that announces its team (once or on an
//!   interval), logs every payload it receives and keeps a bounded history
//!
//! Both are cheap clonable handles: hand one clone to the router and keep
//! the other to drive and inspect it.
//!
//! # Example
//!
//! ```rust
//! use link_mux::{ConsoleSource, RadioLink};
//! use link_sim::{VirtualConsole, VirtualRadio};
//! use std::time::Duration;
//!
//! let console = VirtualConsole::new();
//! console.send_to("Alpha", b"go");
//!
//! let mut reader = console.clone();
//! assert_eq!(reader.read_byte().unwrap(), Some(b'A'));
//!
//! let radio = VirtualRadio::new("worker-1");
//! radio.announce("Alpha");
//!
//! let mut link = radio.clone();
//! let mut buf = [0u8; 64];
//! let n = link.receive(&mut buf, Duration::ZERO).unwrap();
//! assert_eq!(&buf[..n], b"Alpha\n");
//! ```

pub mod console;
pub mod radio;

pub use console::VirtualConsole;
pub use radio::{VirtualRadio, VirtualRadioConfig, DEFAULT_HISTORY};
