//! Router supervisor
//!
//! [`Router::spawn`] starts the ingress, egress and heartbeat threads
//! around a shared [`RouterContext`]. [`RouterHandle::shutdown`] clears the
//! `running` flag, waits for all three threads to finish their current
//! iteration and hands the links back.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use crate::context::RouterContext;
use crate::egress::Egress;
use crate::error::MuxError;
use crate::events::TaskKind;
use crate::heartbeat::Heartbeat;
use crate::ingress::Ingress;
use crate::transport::{ConsoleSource, RadioPair};

/// Links returned once the router has stopped
pub struct StoppedLinks {
    /// Console link
    pub console: Box<dyn ConsoleSource>,
    /// Radio links
    pub radios: RadioPair,
}

/// Entry point for starting the router
pub struct Router;

impl Router {
    /// Spawn the three router threads
    ///
    /// If a thread fails to start, the ones already running are stopped and
    /// joined before the error is returned.
    pub fn spawn(
        ctx: Arc<RouterContext>,
        console: Box<dyn ConsoleSource>,
        radios: RadioPair,
    ) -> Result<RouterHandle, MuxError> {
        let queue = ctx.queue();
        match queue.capacity() {
            Some(capacity) => info!(
                "Starting router (queue capacity {}, overflow policy: {})",
                capacity,
                queue.policy().name()
            ),
            None => info!("Starting router (unbounded queue)"),
        }

        let ingress = {
            let task = Ingress::new(ctx.clone(), console);
            spawn_task(TaskKind::Ingress, move || task.run())?
        };

        let egress = {
            let task = Egress::new(ctx.clone(), radios);
            match spawn_task(TaskKind::Egress, move || task.run()) {
                Ok(handle) => handle,
                Err(e) => {
                    ctx.stop();
                    let _ = ingress.join();
                    return Err(e);
                }
            }
        };

        let heartbeat = {
            let task = Heartbeat::new(ctx.clone());
            match spawn_task(TaskKind::Heartbeat, move || task.run()) {
                Ok(handle) => handle,
                Err(e) => {
                    ctx.stop();
                    let _ = ingress.join();
                    let _ = egress.join();
                    return Err(e);
                }
            }
        };

        info!("All router threads started");

        Ok(RouterHandle {
            ctx,
            ingress,
            egress,
            heartbeat,
        })
    }
}

fn spawn_task<T, F>(task: TaskKind, f: F) -> Result<JoinHandle<T>, MuxError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    thread::Builder::new()
        .name(task.thread_name().to_string())
        .spawn(f)
        .map_err(|source| MuxError::ThreadSpawn {
            task: task.thread_name(),
            source,
        })
}

/// Handle to a running router
pub struct RouterHandle {
    ctx: Arc<RouterContext>,
    ingress: JoinHandle<Box<dyn ConsoleSource>>,
    egress: JoinHandle<RadioPair>,
    heartbeat: JoinHandle<()>,
}

impl RouterHandle {
    /// Shared router state
    pub fn context(&self) -> &Arc<RouterContext> {
        &self.ctx
    }

    /// Whether any router thread has exited
    pub fn is_finished(&self) -> bool {
        self.ingress.is_finished() || self.egress.is_finished() || self.heartbeat.is_finished()
    }

    /// Stop all threads and wait for them to exit
    pub fn shutdown(self) -> Result<StoppedLinks, MuxError> {
        info!("Shutting down router threads");
        self.ctx.stop();

        let console = self
            .ingress
            .join()
            .map_err(|_| MuxError::TaskPanicked(TaskKind::Ingress.thread_name()));
        let radios = self
            .egress
            .join()
            .map_err(|_| MuxError::TaskPanicked(TaskKind::Egress.thread_name()));
        let heartbeat = self
            .heartbeat
            .join()
            .map_err(|_| MuxError::TaskPanicked(TaskKind::Heartbeat.thread_name()));

        let stopped = StoppedLinks {
            console: console?,
            radios: radios?,
        };
        heartbeat?;

        info!("All router threads stopped");
        Ok(stopped)
    }
}

impl std::fmt::Debug for RouterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterHandle")
            .field("ctx", &self.ctx)
            .field("finished", &self.is_finished())
            .finish()
    }
}
