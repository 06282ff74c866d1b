//! Stop-and-wait ARQ transport (§4.H): sequence numbers, ACK timeout,
//! retry budget, and the PING/PONG handshake.

use std::time::Duration;

use crate::config::arq_timing::{ACK_TIMEOUT, MAX_RETRIES, TURNAROUND};
use crate::errors::{ArqError, FrameError};
use crate::frame::{Frame, FrameType};
use crate::host::Clock;

/// Initiator-side state machine: `Idle -> Sending -> WaitingAck -> (Idle | Sending)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Sending,
    WaitingAck,
}

/// A single logical link to a peer; owns its own 8-bit sequence counter,
/// which must never be touched externally (§5).
pub struct ArqSender {
    seq: u8,
    state: SenderState,
}

/// What the transport layer needs from the channel: a way to push a frame
/// out and a way to try to pull the next inbound frame (non-blocking;
/// `None` means nothing has arrived yet).
pub trait Channel {
    fn send_frame(&mut self, frame: &Frame);
    fn try_receive_frame(&mut self, deadline: Duration) -> Option<Frame>;
}

impl ArqSender {
    pub fn new() -> Self {
        Self { seq: 0, state: SenderState::Idle }
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Send one DATA frame and wait for its ACK, retrying on timeout or
    /// NACK up to `MAX_RETRIES`. On success, `seq` advances.
    pub fn send(
        &mut self,
        payload: Vec<u8>,
        channel: &mut dyn Channel,
        clock: &dyn Clock,
    ) -> Result<(), ArqError> {
        self.state = SenderState::Sending;
        let frame = Frame::new(FrameType::Data, self.seq, payload);

        let mut last_cause: Option<ArqError> = None;
        for _attempt in 0..=MAX_RETRIES {
            channel.send_frame(&frame);
            self.state = SenderState::WaitingAck;

            match channel.try_receive_frame(ACK_TIMEOUT) {
                Some(reply) if reply.frame_type == FrameType::Ack && reply.seq == self.seq => {
                    self.seq = self.seq.wrapping_add(1);
                    self.state = SenderState::Idle;
                    return Ok(());
                }
                Some(reply) if reply.frame_type == FrameType::Nack => {
                    last_cause = Some(ArqError::Timeout { expected: "ACK after NACK" });
                    self.state = SenderState::Sending;
                }
                Some(_) => {
                    last_cause = Some(ArqError::Timeout { expected: "ACK with matching seq" });
                    self.state = SenderState::Sending;
                }
                None => {
                    last_cause = Some(ArqError::Timeout { expected: "ACK" });
                    self.state = SenderState::Sending;
                }
            }
            clock.sleep(Duration::from_millis(0));
        }

        self.state = SenderState::Idle;
        Err(ArqError::RetriesExhausted {
            retries: MAX_RETRIES,
            cause: Box::new(crate::errors::ModemError::Arq(
                last_cause.unwrap_or(ArqError::Timeout { expected: "ACK" }),
            )),
        })
    }

    /// Initiator handshake: send PING, wait `2 * ACK_TIMEOUT` for PONG.
    pub fn handshake(&self, channel: &mut dyn Channel) -> Result<(), ArqError> {
        let ping = Frame::new(FrameType::Ping, 0, Vec::new());
        channel.send_frame(&ping);
        match channel.try_receive_frame(2 * ACK_TIMEOUT) {
            Some(reply) if reply.frame_type == FrameType::Pong => Ok(()),
            _ => Err(ArqError::Timeout { expected: "PONG" }),
        }
    }
}

impl Default for ArqSender {
    fn default() -> Self {
        Self::new()
    }
}

/// Responder-side state machine: `Idle -> Receiving -> Sending -> Idle`.
pub struct ArqResponder;

impl ArqResponder {
    /// Receive one frame, then after `TURNAROUND` send its ACK, surfacing
    /// the frame (or a frame-codec error) to the caller regardless.
    pub fn receive(
        &self,
        frame_bytes: &[u8],
        channel: &mut dyn Channel,
        clock: &dyn Clock,
    ) -> Result<Frame, FrameError> {
        let frame = Frame::decode(frame_bytes)?;
        clock.sleep(TURNAROUND);
        let ack = Frame::new(FrameType::Ack, frame.seq, Vec::new());
        channel.send_frame(&ack);
        Ok(frame)
    }

    /// Respond to an inbound PING with a PONG after `TURNAROUND`.
    pub fn respond_to_ping(&self, channel: &mut dyn Channel, clock: &dyn Clock) {
        clock.sleep(TURNAROUND);
        let pong = Frame::new(FrameType::Pong, 0, Vec::new());
        channel.send_frame(&pong);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct NullClock;
    impl Clock for NullClock {
        fn now(&self) -> std::time::Instant {
            std::time::Instant::now()
        }
        fn sleep(&self, _duration: Duration) {}
    }

    struct LoopbackChannel {
        inbound: RefCell<VecDeque<Frame>>,
        sent: RefCell<Vec<Frame>>,
    }

    impl LoopbackChannel {
        fn new() -> Self {
            Self { inbound: RefCell::new(VecDeque::new()), sent: RefCell::new(Vec::new()) }
        }

        fn push_inbound(&self, frame: Frame) {
            self.inbound.borrow_mut().push_back(frame);
        }
    }

    impl Channel for LoopbackChannel {
        fn send_frame(&mut self, frame: &Frame) {
            self.sent.borrow_mut().push(frame.clone());
        }

        fn try_receive_frame(&mut self, _deadline: Duration) -> Option<Frame> {
            self.inbound.borrow_mut().pop_front()
        }
    }

    #[test]
    fn send_succeeds_on_matching_ack() {
        let mut sender = ArqSender::new();
        let mut channel = LoopbackChannel::new();
        channel.push_inbound(Frame::new(FrameType::Ack, 0, Vec::new()));
        let clock = NullClock;

        sender.send(b"hi".to_vec(), &mut channel, &clock).unwrap();
        assert_eq!(sender.seq(), 1);
    }

    #[test]
    fn send_exhausts_retries_on_silence() {
        let mut sender = ArqSender::new();
        let mut channel = LoopbackChannel::new();
        let clock = NullClock;

        let result = sender.send(b"hi".to_vec(), &mut channel, &clock);
        assert!(matches!(result, Err(ArqError::RetriesExhausted { retries: 3, .. })));
    }

    #[test]
    fn handshake_succeeds_on_pong() {
        let sender = ArqSender::new();
        let mut channel = LoopbackChannel::new();
        channel.push_inbound(Frame::new(FrameType::Pong, 0, Vec::new()));
        assert!(sender.handshake(&mut channel).is_ok());
    }

    #[test]
    fn handshake_times_out_without_pong() {
        let sender = ArqSender::new();
        let mut channel = LoopbackChannel::new();
        assert!(matches!(sender.handshake(&mut channel), Err(ArqError::Timeout { .. })));
    }
}
