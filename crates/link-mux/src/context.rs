//! Shared router state
//!
//! One [`RouterContext`] is built at startup and shared by `Arc` between
//! the ingress, egress and heartbeat tasks. It owns the message queue, the
//! team registry, the liveness records and the `running` flag; there is no
//! other shared state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use link_protocol::MessageCodec;

use crate::clock::{Clock, MonotonicClock};
use crate::config::RouterConfig;
use crate::error::MuxError;
use crate::events::{EventSink, RouterEvent, TracingSink};
use crate::liveness::RadioLiveness;
use crate::message::Message;
use crate::queue::BoundedQueue;
use crate::registry::TeamRegistry;

/// State shared by every router task
pub struct RouterContext {
    config: RouterConfig,
    codec: MessageCodec,
    queue: BoundedQueue<Message>,
    registry: TeamRegistry,
    liveness: RadioLiveness,
    running: AtomicBool,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl RouterContext {
    /// Create a context with a monotonic clock and a tracing sink
    pub fn new(config: RouterConfig) -> Result<Self, MuxError> {
        Self::with_parts(config, Arc::new(MonotonicClock::new()), Arc::new(TracingSink))
    }

    /// Create a context with an explicit clock and event sink
    pub fn with_parts(
        config: RouterConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, MuxError> {
        config.validate()?;

        Ok(Self {
            codec: MessageCodec::new(config.max_team_name_len),
            queue: BoundedQueue::new(config.queue_capacity, config.overflow_policy),
            registry: TeamRegistry::new(),
            liveness: RadioLiveness::new(config.liveness_timeout_ms),
            running: AtomicBool::new(true),
            clock,
            sink,
            config,
        })
    }

    /// Router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Message codec configured for this router
    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    /// Console-to-radio queue
    pub fn queue(&self) -> &BoundedQueue<Message> {
        &self.queue
    }

    /// Team bindings
    pub fn registry(&self) -> &TeamRegistry {
        &self.registry
    }

    /// Radio liveness records
    pub fn liveness(&self) -> &RadioLiveness {
        &self.liveness
    }

    /// Current time in ms since startup
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Report an event to the sink
    pub fn emit(&self, event: RouterEvent) {
        self.sink.emit(event);
    }

    /// Whether the tasks should keep running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every task to stop after its current iteration
    ///
    /// Also closes the queue so a producer blocked on a full queue wakes up.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.queue.close();
    }
}

impl std::fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterContext")
            .field("config", &self.config)
            .field("queue", &self.queue)
            .field("registry", &self.registry)
            .field("liveness", &self.liveness)
            .field("running", &self.is_running())
            .finish()
    }
}
