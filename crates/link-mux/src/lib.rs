//! Teamlink Router Engine
//!
//! This crate routes line-delimited console messages to one of two radio
//! links according to the team named in each line, and learns which radio
//! serves which team from the radios' own announcements.
//!
//! # Architecture
//!
//! Three threads share one [`RouterContext`]:
//!
//! - **Ingress**: frames console bytes into lines, decodes `<team>:<payload>`,
//!   resolves the team in the [`TeamRegistry`] and pushes a [`Message`] onto
//!   the [`BoundedQueue`]
//! - **Egress**: pops messages and sends them to the resolved radio (or both
//!   when the team is unknown), then polls each radio for team
//!   announcements and updates [`RadioLiveness`]
//! - **Heartbeat**: reports status periodically
//!
//! Everything the router does is reported to an [`EventSink`] as
//! [`RouterEvent`]s. A single `running` flag stops all three threads.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use link_mux::{RadioPair, Router, RouterConfig, RouterContext};
//! # fn links() -> (Box<dyn link_mux::ConsoleSource>, Box<dyn link_mux::RadioLink>, Box<dyn link_mux::RadioLink>) { unimplemented!() }
//!
//! let (console, radio_a, radio_b) = links();
//! let ctx = Arc::new(RouterContext::new(RouterConfig::default())?);
//! let handle = Router::spawn(ctx, console, RadioPair::new(radio_a, radio_b))?;
//!
//! // ... later
//! let _links = handle.shutdown()?;
//! # Ok::<(), link_mux::MuxError>(())
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod egress;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod ingress;
pub mod liveness;
pub mod message;
pub mod queue;
pub mod registry;
pub mod router;
pub mod transport;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{OverflowPolicy, RouterConfig};
pub use context::RouterContext;
pub use egress::Egress;
pub use error::{LinkError, MuxError};
pub use events::{EventSink, NullSink, RecordingSink, RouterEvent, TaskKind, TracingSink};
pub use heartbeat::Heartbeat;
pub use ingress::{route_line, Ingress, Step};
pub use liveness::{ChannelLivenessRecord, RadioLiveness};
pub use message::Message;
pub use queue::{BoundedQueue, PushOutcome};
pub use registry::{Resolution, TeamBindings, TeamRegistry};
pub use router::{Router, RouterHandle, StoppedLinks};
pub use transport::{ConsoleSource, RadioLink, RadioPair};
