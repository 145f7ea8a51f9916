//! Egress task: queued messages to radios, announcements back
//!
//! Each iteration pops at most one message and sends it on every channel
//! its target names, then polls both radios (with a short bounded wait) for
//! team announcements. Radio input is a byte stream: each channel has its own
//! [`LineFramer`], and only completed lines are read as announcements.
//! Successful sends and any received data count as contact for liveness.
//! Failures are reported and never retried.

use std::sync::Arc;
use std::thread;

use link_protocol::{Channel, LineFramer};
use tracing::debug;

use crate::context::RouterContext;
use crate::error::MuxError;
use crate::events::{RouterEvent, TaskKind};
use crate::message::Message;
use crate::transport::RadioPair;

/// Radio-side router task
pub struct Egress {
    ctx: Arc<RouterContext>,
    radios: RadioPair,
    rx_buffer: Vec<u8>,
    framers: [LineFramer; 2],
    last_alive: [bool; 2],
}

impl Egress {
    /// Create the task around both radio links
    pub fn new(ctx: Arc<RouterContext>, radios: RadioPair) -> Self {
        let rx_buffer = vec![0u8; ctx.config().radio_receive_buffer];
        let capacity = ctx.config().frame_capacity;
        Self {
            ctx,
            radios,
            rx_buffer,
            framers: [LineFramer::new(capacity), LineFramer::new(capacity)],
            last_alive: [false; 2],
        }
    }

    /// Run one iteration: dispatch one queued message, then poll both radios
    pub fn step(&mut self) {
        let now = self.ctx.now_ms();
        if let Some(message) = self.ctx.queue().try_pop() {
            self.dispatch(message, now);
        }

        for channel in Channel::ALL {
            self.poll_channel(channel);
        }

        self.update_liveness(self.ctx.now_ms());
    }

    /// Send a message on every channel its target names
    ///
    /// Returns the number of channels the payload was delivered to.
    pub fn dispatch(&mut self, message: Message, now: u64) -> usize {
        let mut delivered = 0;
        debug!(
            "Dispatching '{}' to {}",
            message.payload_display(),
            message.target
        );

        for &channel in message.target.channels() {
            match self.send_to(channel, &message.payload, now) {
                Ok(()) => {
                    delivered += 1;
                    self.ctx.emit(RouterEvent::Sent {
                        channel,
                        payload_len: message.payload.len(),
                    });
                }
                Err(e) => self.ctx.emit(RouterEvent::SendFailed {
                    channel,
                    reason: e.to_string(),
                }),
            }
        }

        delivered
    }

    fn send_to(&mut self, channel: Channel, payload: &[u8], now: u64) -> Result<(), MuxError> {
        self.radios
            .get_mut(channel)
            .send(payload)
            .map_err(|source| MuxError::SendFailure { channel, source })?;
        self.ctx.liveness().record_contact(channel, now);
        Ok(())
    }

    /// Poll one radio and read any completed announcement lines
    ///
    /// A partial line stays buffered until a later poll completes it. Blank
    /// lines (the `\n` of a `\r\n` pair) are skipped. Returns the last team
    /// bound by this poll, if any.
    pub fn poll_channel(&mut self, channel: Channel) -> Option<String> {
        let timeout = self.ctx.config().receive_timeout(channel);
        let received = match self
            .radios
            .get_mut(channel)
            .receive(&mut self.rx_buffer, timeout)
        {
            Ok(0) => return None,
            Ok(n) => n.min(self.rx_buffer.len()),
            Err(source) => {
                let err = MuxError::ReceiveFailure { channel, source };
                self.ctx.emit(RouterEvent::ReceiveFailed {
                    channel,
                    reason: err.to_string(),
                });
                return None;
            }
        };

        self.ctx
            .liveness()
            .record_contact(channel, self.ctx.now_ms());

        let mut bound = None;
        for &byte in &self.rx_buffer[..received] {
            match self.framers[channel.index()].feed(byte) {
                Ok(Some(line)) if line.is_empty() => {}
                Ok(Some(line)) => {
                    if let Some(team) = self.announce(channel, line.as_bytes()) {
                        bound = Some(team);
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("{} announcement: {}", channel, e),
            }
        }
        bound
    }

    fn announce(&self, channel: Channel, line: &[u8]) -> Option<String> {
        let bound = self
            .ctx
            .codec()
            .decode_announcement(line)
            .and_then(|team| {
                let previous = self.ctx.registry().bind(channel, &team)?;
                Ok((team, previous))
            });

        match bound {
            Ok((team, previous)) => {
                self.ctx.emit(RouterEvent::TeamBound {
                    channel,
                    team: team.clone(),
                    previous,
                });
                Some(team)
            }
            Err(_) => {
                self.ctx.emit(RouterEvent::EmptyAnnouncement { channel });
                None
            }
        }
    }

    fn update_liveness(&mut self, now: u64) {
        for channel in Channel::ALL {
            let alive = self.ctx.liveness().is_alive(channel, now);
            let last = &mut self.last_alive[channel.index()];
            if alive != *last {
                *last = alive;
                self.ctx
                    .emit(RouterEvent::LivenessChanged { channel, alive });
            }
        }
    }

    /// Loop until the router stops, then hand the radio links back
    pub fn run(mut self) -> RadioPair {
        self.ctx.emit(RouterEvent::TaskStarted {
            task: TaskKind::Egress,
        });

        let idle = self.ctx.config().egress_idle();
        while self.ctx.is_running() {
            self.step();
            if idle.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(idle);
            }
        }

        self.ctx.emit(RouterEvent::TaskStopped {
            task: TaskKind::Egress,
        });
        self.radios
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use link_protocol::Target;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RouterConfig;
    use crate::error::LinkError;
    use crate::events::RecordingSink;
    use crate::transport::RadioLink;

    #[derive(Default)]
    struct FakeState {
        inbound: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        fail_sends: bool,
    }

    #[derive(Clone, Default)]
    struct FakeRadio(Arc<Mutex<FakeState>>);

    impl FakeRadio {
        fn queue_inbound(&self, data: &[u8]) {
            self.0.lock().unwrap().inbound.push_back(data.to_vec());
        }

        fn sent(&self) -> Vec<Vec<u8>> {
            self.0.lock().unwrap().sent.clone()
        }

        fn fail_sends(&self) {
            self.0.lock().unwrap().fail_sends = true;
        }
    }

    impl RadioLink for FakeRadio {
        fn send(&mut self, data: &[u8]) -> Result<(), LinkError> {
            let mut state = self.0.lock().unwrap();
            if state.fail_sends {
                return Err(LinkError::Rejected("no ack".into()));
            }
            state.sent.push(data.to_vec());
            Ok(())
        }

        fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, LinkError> {
            match self.0.lock().unwrap().inbound.pop_front() {
                Some(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }

    struct Fixture {
        ctx: Arc<RouterContext>,
        clock: Arc<ManualClock>,
        sink: Arc<RecordingSink>,
        radio_a: FakeRadio,
        radio_b: FakeRadio,
        egress: Egress,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let sink = Arc::new(RecordingSink::new());
        let ctx = Arc::new(
            RouterContext::with_parts(RouterConfig::default(), clock.clone(), sink.clone())
                .unwrap(),
        );
        let radio_a = FakeRadio::default();
        let radio_b = FakeRadio::default();
        let egress = Egress::new(
            ctx.clone(),
            RadioPair::new(Box::new(radio_a.clone()), Box::new(radio_b.clone())),
        );
        Fixture {
            ctx,
            clock,
            sink,
            radio_a,
            radio_b,
            egress,
        }
    }

    #[test]
    fn test_unresolved_goes_to_both() {
        let mut f = fixture();
        f.ctx
            .queue()
            .push(Message::new(b"move 10".to_vec(), Target::Unresolved, 0))
            .unwrap();

        f.egress.step();

        assert_eq!(f.radio_a.sent(), vec![b"move 10".to_vec()]);
        assert_eq!(f.radio_b.sent(), vec![b"move 10".to_vec()]);
    }

    #[test]
    fn test_resolved_goes_to_one() {
        let mut f = fixture();
        f.ctx
            .queue()
            .push(Message::new(b"x".to_vec(), Target::ChannelB, 0))
            .unwrap();

        f.egress.step();

        assert!(f.radio_a.sent().is_empty());
        assert_eq!(f.radio_b.sent().len(), 1);
    }

    #[test]
    fn test_send_records_contact_only_where_sent() {
        let mut f = fixture();
        f.clock.set(500);
        let delivered = f
            .egress
            .dispatch(Message::new(b"x".to_vec(), Target::ChannelA, 0), 500);

        assert_eq!(delivered, 1);
        assert_eq!(f.ctx.liveness().last_contact(Channel::ChannelA), Some(500));
        assert_eq!(f.ctx.liveness().last_contact(Channel::ChannelB), None);
    }

    #[test]
    fn test_send_failure_is_reported_not_retried() {
        let mut f = fixture();
        f.radio_a.fail_sends();

        let delivered = f
            .egress
            .dispatch(Message::new(b"x".to_vec(), Target::Broadcast, 0), 10);

        assert_eq!(delivered, 1);
        assert_eq!(f.radio_b.sent().len(), 1);
        assert_eq!(f.ctx.liveness().last_contact(Channel::ChannelA), None);
        assert_eq!(
            f.sink.count(|e| matches!(
                e,
                RouterEvent::SendFailed {
                    channel: Channel::ChannelA,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn test_announcement_binds_and_records_contact() {
        let mut f = fixture();
        f.clock.set(1234);
        f.radio_b.queue_inbound(b"Alpha\n");

        let team = f.egress.poll_channel(Channel::ChannelB);

        assert_eq!(team.as_deref(), Some("Alpha"));
        assert_eq!(f.ctx.registry().resolve("Alpha"), Some(Channel::ChannelB));
        assert_eq!(f.ctx.liveness().last_contact(Channel::ChannelB), Some(1234));
    }

    #[test]
    fn test_empty_announcement_keeps_binding_but_counts_as_contact() {
        let mut f = fixture();
        f.ctx.registry().bind(Channel::ChannelA, "Alpha").unwrap();
        f.clock.set(77);
        f.radio_a.queue_inbound(b"  \r\n");

        assert_eq!(f.egress.poll_channel(Channel::ChannelA), None);
        assert_eq!(f.ctx.registry().resolve("Alpha"), Some(Channel::ChannelA));
        assert_eq!(f.ctx.liveness().last_contact(Channel::ChannelA), Some(77));
        assert_eq!(
            f.sink
                .count(|e| matches!(e, RouterEvent::EmptyAnnouncement { .. })),
            1
        );
    }

    #[test]
    fn test_announcement_split_across_reads() {
        let mut f = fixture();
        f.radio_a.queue_inbound(b"ALP");
        f.radio_a.queue_inbound(b"HA\n");

        assert_eq!(f.egress.poll_channel(Channel::ChannelA), None);
        assert_eq!(f.ctx.registry().snapshot().get(Channel::ChannelA), None);
        assert_eq!(
            f.egress.poll_channel(Channel::ChannelA).as_deref(),
            Some("ALPHA")
        );
        assert_eq!(f.ctx.registry().resolve("ALPHA"), Some(Channel::ChannelA));
        assert_eq!(f.ctx.registry().resolve("HA"), None);
    }

    #[test]
    fn test_partial_lines_are_framed_per_channel() {
        let mut f = fixture();
        f.radio_a.queue_inbound(b"Al");
        f.radio_b.queue_inbound(b"Br");
        f.egress.poll_channel(Channel::ChannelA);
        f.egress.poll_channel(Channel::ChannelB);
        f.radio_a.queue_inbound(b"pha\r\n");
        f.radio_b.queue_inbound(b"avo\n");
        f.egress.poll_channel(Channel::ChannelA);
        f.egress.poll_channel(Channel::ChannelB);

        let bindings = f.ctx.registry().snapshot();
        assert_eq!(bindings.get(Channel::ChannelA), Some("Alpha"));
        assert_eq!(bindings.get(Channel::ChannelB), Some("Bravo"));
        assert_eq!(
            f.sink
                .count(|e| matches!(e, RouterEvent::EmptyAnnouncement { .. })),
            0
        );
    }

    #[test]
    fn test_several_lines_in_one_read_bind_the_last() {
        let mut f = fixture();
        f.radio_b.queue_inbound(b"Alpha\nBravo\n");

        assert_eq!(
            f.egress.poll_channel(Channel::ChannelB).as_deref(),
            Some("Bravo")
        );
        assert_eq!(
            f.sink.count(|e| matches!(e, RouterEvent::TeamBound { .. })),
            2
        );
    }

    #[test]
    fn test_liveness_transitions_are_reported_once() {
        let mut f = fixture();
        f.radio_a.queue_inbound(b"Alpha");

        f.egress.step();
        f.egress.step();
        f.clock.set(1000);
        f.egress.step();

        let changes: Vec<_> = f
            .sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, RouterEvent::LivenessChanged { .. }))
            .collect();
        assert_eq!(
            changes,
            vec![
                RouterEvent::LivenessChanged {
                    channel: Channel::ChannelA,
                    alive: true
                },
                RouterEvent::LivenessChanged {
                    channel: Channel::ChannelA,
                    alive: false
                },
            ]
        );
    }
}
