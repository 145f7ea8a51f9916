//! Ingress task: console bytes to queued messages
//!
//! Polls the console one byte at a time, frames lines, decodes them,
//! resolves the team against the registry and pushes the resulting
//! [`Message`] onto the shared queue. Unknown teams and unstructured lines
//! are queued as [`Target::Unresolved`] and fan out to both radios.

use std::sync::Arc;
use std::thread;

use link_protocol::{normalize_team_name, DecodedForm, Line, LineFramer, ProtocolError, Target};
use tracing::warn;

use crate::context::RouterContext;
use crate::events::{RouterEvent, TaskKind};
use crate::message::Message;
use crate::queue::PushOutcome;
use crate::registry::Resolution;
use crate::transport::ConsoleSource;

/// What one loop iteration accomplished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Nothing to do; the loop should sleep
    Idle,
    /// Work was done; the loop should yield and continue
    Progress,
}

/// Console-side router task
pub struct Ingress {
    ctx: Arc<RouterContext>,
    console: Box<dyn ConsoleSource>,
    framer: LineFramer,
}

impl Ingress {
    /// Create the task around a console link
    pub fn new(ctx: Arc<RouterContext>, console: Box<dyn ConsoleSource>) -> Self {
        let framer = LineFramer::new(ctx.config().frame_capacity);
        Self {
            ctx,
            console,
            framer,
        }
    }

    /// Run one iteration: read at most one byte and route a completed line
    pub fn step(&mut self) -> Step {
        let byte = match self.console.read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return Step::Idle,
            Err(e) => {
                self.ctx.emit(RouterEvent::ConsoleError {
                    reason: e.to_string(),
                });
                return Step::Idle;
            }
        };

        self.ctx.emit(RouterEvent::ConsoleByte { byte });

        let discarded = self.framer.discarded();
        match self.framer.feed(byte) {
            Ok(Some(line)) => {
                if discarded > 0 {
                    self.ctx.emit(RouterEvent::LineTruncated {
                        kept: line.len(),
                        discarded,
                    });
                }
                let message = route_line(&self.ctx, line);
                enqueue(&self.ctx, message);
            }
            Ok(None) => {}
            Err(ProtocolError::FrameOverflow { capacity }) => {
                if discarded == 0 {
                    self.ctx.emit(RouterEvent::FrameOverflow { capacity });
                }
            }
            Err(e) => warn!("Unexpected framing error: {}", e),
        }

        Step::Progress
    }

    /// Loop until the router stops, then hand the console link back
    pub fn run(mut self) -> Box<dyn ConsoleSource> {
        self.ctx.emit(RouterEvent::TaskStarted {
            task: TaskKind::Ingress,
        });

        let idle = self.ctx.config().ingress_idle();
        while self.ctx.is_running() {
            match self.step() {
                Step::Idle => thread::sleep(idle),
                Step::Progress => thread::yield_now(),
            }
        }

        self.ctx.emit(RouterEvent::TaskStopped {
            task: TaskKind::Ingress,
        });
        self.console
    }
}

/// Decode a framed console line and choose its target
pub fn route_line(ctx: &RouterContext, line: Line) -> Message {
    let now = ctx.now_ms();

    match ctx.codec().decode(&line) {
        DecodedForm::RoutedMessage { team_name, payload } => {
            let target = resolve_target(ctx, &team_name);
            Message::new(payload, target, now).with_team(team_name)
        }
        DecodedForm::Unstructured { payload } => Message::new(payload, Target::Unresolved, now),
    }
}

fn resolve_target(ctx: &RouterContext, team_name: &str) -> Target {
    let is_broadcast = ctx
        .config()
        .broadcast_team
        .as_deref()
        .is_some_and(|b| normalize_team_name(team_name) == b);
    if is_broadcast {
        return Target::Broadcast;
    }

    match ctx.registry().lookup(team_name) {
        Resolution::Unbound => Target::Unresolved,
        Resolution::Bound(channel) => channel.into(),
        Resolution::Ambiguous { chosen, shadowed } => {
            ctx.emit(RouterEvent::AmbiguousBinding {
                team: normalize_team_name(team_name).to_string(),
                chosen,
                shadowed,
            });
            chosen.into()
        }
    }
}

/// Push a message and report the outcome
pub fn enqueue(ctx: &RouterContext, message: Message) {
    let target = message.target;
    let payload_len = message.payload.len();
    let team = message.team.clone();

    match ctx.queue().push(message) {
        Ok(outcome) => {
            ctx.emit(RouterEvent::Routed {
                team,
                target,
                payload_len,
            });
            if let PushOutcome::Evicted(old) = outcome {
                ctx.emit(RouterEvent::MessageEvicted {
                    target: old.target,
                    payload_len: old.payload.len(),
                });
            }
        }
        Err(e) => ctx.emit(RouterEvent::MessageDropped {
            target,
            payload_len,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use link_protocol::Channel;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::{OverflowPolicy, RouterConfig};
    use crate::error::LinkError;
    use crate::events::RecordingSink;

    struct ScriptedConsole(VecDeque<u8>);

    impl ConsoleSource for ScriptedConsole {
        fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
            Ok(self.0.pop_front())
        }
    }

    fn context(config: RouterConfig) -> (Arc<RouterContext>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let ctx = RouterContext::with_parts(config, Arc::new(ManualClock::new(42)), sink.clone())
            .unwrap();
        (Arc::new(ctx), sink)
    }

    fn ingress(ctx: &Arc<RouterContext>, input: &[u8]) -> Ingress {
        let console = ScriptedConsole(input.iter().copied().collect());
        Ingress::new(ctx.clone(), Box::new(console))
    }

    fn drain_steps(ingress: &mut Ingress) {
        while ingress.step() == Step::Progress {}
    }

    #[test]
    fn test_unknown_team_is_unresolved() {
        let (ctx, _) = context(RouterConfig::default());
        let mut task = ingress(&ctx, b"Alpha:move 10\n");
        drain_steps(&mut task);

        let msg = ctx.queue().try_pop().unwrap();
        assert_eq!(msg.target, Target::Unresolved);
        assert_eq!(msg.payload, b"move 10");
        assert_eq!(msg.team.as_deref(), Some("Alpha"));
        assert_eq!(msg.enqueued_at, 42);
        assert!(ctx.queue().is_empty());
    }

    #[test]
    fn test_bound_team_routes_to_channel() {
        let (ctx, _) = context(RouterConfig::default());
        ctx.registry().bind(Channel::ChannelB, "Alpha").unwrap();

        let mut task = ingress(&ctx, b"Alpha:move 10\n");
        drain_steps(&mut task);

        assert_eq!(ctx.queue().try_pop().unwrap().target, Target::ChannelB);
    }

    #[test]
    fn test_unstructured_line() {
        let (ctx, sink) = context(RouterConfig::default());
        let mut task = ingress(&ctx, b"hello\r");
        drain_steps(&mut task);

        let msg = ctx.queue().try_pop().unwrap();
        assert_eq!(msg.target, Target::Unresolved);
        assert_eq!(msg.payload, b"hello");
        assert_eq!(msg.team, None);
        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::Routed { team: None, .. })),
            1
        );
    }

    #[test]
    fn test_broadcast_team() {
        let (ctx, _) = context(RouterConfig::default());
        let mut task = ingress(&ctx, b"*:stop\n");
        drain_steps(&mut task);

        assert_eq!(ctx.queue().try_pop().unwrap().target, Target::Broadcast);
    }

    #[test]
    fn test_broadcast_team_disabled() {
        let config = RouterConfig {
            broadcast_team: None,
            ..Default::default()
        };
        let (ctx, _) = context(config);
        let mut task = ingress(&ctx, b"*:stop\n");
        drain_steps(&mut task);

        assert_eq!(ctx.queue().try_pop().unwrap().target, Target::Unresolved);
    }

    #[test]
    fn test_empty_line_is_queued() {
        let (ctx, _) = context(RouterConfig::default());
        let mut task = ingress(&ctx, b"\n");
        drain_steps(&mut task);

        let msg = ctx.queue().try_pop().unwrap();
        assert!(msg.payload.is_empty());
        assert_eq!(msg.target, Target::Unresolved);
    }

    #[test]
    fn test_overflow_is_reported() {
        let config = RouterConfig {
            frame_capacity: 4,
            ..Default::default()
        };
        let (ctx, sink) = context(config);
        let mut task = ingress(&ctx, b"abcdef\n");
        drain_steps(&mut task);

        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::FrameOverflow { capacity: 4 })),
            1
        );
        assert_eq!(
            sink.count(|e| *e == RouterEvent::LineTruncated { kept: 4, discarded: 2 }),
            1
        );
        assert_eq!(ctx.queue().try_pop().unwrap().payload, b"abcd");
    }

    #[test]
    fn test_runaway_line_reports_overflow_once_per_line() {
        let config = RouterConfig {
            frame_capacity: 8,
            ..Default::default()
        };
        let (ctx, sink) = context(config);
        let mut input = vec![b'x'; 10_000];
        input.push(b'\n');
        input.extend_from_slice(b"0123456789\n");
        let mut task = ingress(&ctx, &input);
        drain_steps(&mut task);

        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::FrameOverflow { .. })),
            2
        );
        let truncated: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, RouterEvent::LineTruncated { .. }))
            .collect();
        assert_eq!(
            truncated,
            vec![
                RouterEvent::LineTruncated {
                    kept: 8,
                    discarded: 9_992
                },
                RouterEvent::LineTruncated {
                    kept: 8,
                    discarded: 2
                },
            ]
        );
        assert_eq!(ctx.queue().len(), 2);
    }

    #[test]
    fn test_ambiguous_binding_routes_to_channel_a() {
        let (ctx, sink) = context(RouterConfig::default());
        ctx.registry().bind(Channel::ChannelA, "Alpha").unwrap();
        ctx.registry().bind(Channel::ChannelB, "Alpha").unwrap();

        let mut task = ingress(&ctx, b"Alpha:go\n");
        drain_steps(&mut task);

        assert_eq!(ctx.queue().try_pop().unwrap().target, Target::ChannelA);
        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::AmbiguousBinding { .. })),
            1
        );
    }

    #[test]
    fn test_full_queue_drops_and_reports() {
        let config = RouterConfig {
            queue_capacity: Some(1),
            overflow_policy: OverflowPolicy::Reject,
            ..Default::default()
        };
        let (ctx, sink) = context(config);
        let mut task = ingress(&ctx, b"one\ntwo\n");
        drain_steps(&mut task);

        assert_eq!(ctx.queue().len(), 1);
        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::MessageDropped { .. })),
            1
        );
    }

    #[test]
    fn test_console_error_is_not_fatal() {
        struct FailingConsole;
        impl ConsoleSource for FailingConsole {
            fn read_byte(&mut self) -> Result<Option<u8>, LinkError> {
                Err(LinkError::Disconnected)
            }
        }

        let (ctx, sink) = context(RouterConfig::default());
        let mut task = Ingress::new(ctx.clone(), Box::new(FailingConsole));

        assert_eq!(task.step(), Step::Idle);
        assert_eq!(
            sink.count(|e| matches!(e, RouterEvent::ConsoleError { .. })),
            1
        );
    }

    #[test]
    fn test_run_exits_when_stopped() {
        let (ctx, sink) = context(RouterConfig::default());
        let task = ingress(&ctx, b"");
        ctx.stop();
        let _console = task.run();

        assert_eq!(
            sink.count(|e| matches!(
                e,
                RouterEvent::TaskStopped {
                    task: TaskKind::Ingress
                }
            )),
            1
        );
    }
}
