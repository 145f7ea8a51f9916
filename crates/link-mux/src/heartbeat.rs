//! Heartbeat task: periodic status report
//!
//! Read-only: reports uptime, bindings, liveness and queue depth to the
//! event sink and never mutates router state.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::context::RouterContext;
use crate::events::{RouterEvent, TaskKind};

/// Longest single sleep, so shutdown is noticed promptly
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Status reporting task
pub struct Heartbeat {
    ctx: Arc<RouterContext>,
}

impl Heartbeat {
    /// Create the task
    pub fn new(ctx: Arc<RouterContext>) -> Self {
        Self { ctx }
    }

    /// Emit one status report
    pub fn report(&self) {
        let now = self.ctx.now_ms();
        self.ctx.emit(RouterEvent::Heartbeat {
            uptime_ms: now,
            bindings: self.ctx.registry().snapshot(),
            liveness: self.ctx.liveness().snapshot(now),
            queue_depth: self.ctx.queue().len(),
        });
    }

    /// Report every interval until the router stops
    pub fn run(self) {
        self.ctx.emit(RouterEvent::TaskStarted {
            task: TaskKind::Heartbeat,
        });

        let interval = self.ctx.config().heartbeat_interval();
        while self.ctx.is_running() {
            self.report();
            self.sleep_while_running(interval);
        }

        self.ctx.emit(RouterEvent::TaskStopped {
            task: TaskKind::Heartbeat,
        });
    }

    fn sleep_while_running(&self, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() && self.ctx.is_running() {
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
    }
}
