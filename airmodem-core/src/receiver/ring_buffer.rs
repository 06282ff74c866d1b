//! Ring buffer over the continuous receive stream (§4.I). Samples are
//! addressed by a monotonic global position rather than a local index,
//! so a preamble position found earlier stays valid no matter how much
//! the window has slid by the time the frame is fully collected.

use crate::errors::StreamError;

pub struct RingBuffer {
    capacity: usize,
    buf: Vec<f64>,
    total_written: u64,
}

/// Outcome of a read against the live edge of the buffer: either the
/// requested range is fully resident, or it hasn't arrived yet. Overrun
/// (the range fell off the back of the ring) is a hard error instead.
pub enum ReadOutcome {
    Ready(Vec<f64>),
    NotYetAvailable,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, buf: Vec::with_capacity(capacity), total_written: 0 }
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Oldest global position still resident in the buffer.
    pub fn horizon(&self) -> u64 {
        self.total_written.saturating_sub(self.buf.len() as u64)
    }

    pub fn push(&mut self, samples: &[f64]) {
        self.buf.extend_from_slice(samples);
        self.total_written += samples.len() as u64;
        if self.buf.len() > self.capacity {
            let drop = self.buf.len() - self.capacity;
            self.buf.drain(..drop);
        }
    }

    /// Read `len` samples starting at global position `pos`.
    pub fn try_read(&self, pos: u64, len: usize) -> Result<ReadOutcome, StreamError> {
        let horizon = self.horizon();
        if pos < horizon {
            return Err(StreamError::Overrun { position: pos, horizon });
        }
        let end = pos + len as u64;
        if end > self.total_written {
            return Ok(ReadOutcome::NotYetAvailable);
        }
        let start_idx = (pos - horizon) as usize;
        Ok(ReadOutcome::Ready(self.buf[start_idx..start_idx + len].to_vec()))
    }

    /// All samples resident in the buffer, oldest first, alongside the
    /// global position of the first sample. Used by the Idle-state scan,
    /// which walks forward from the last-scanned position.
    pub fn resident(&self) -> (&[f64], u64) {
        (&self.buf, self.horizon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_within_horizon_succeeds() {
        let mut rb = RingBuffer::new(10);
        rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        match rb.try_read(1, 3).unwrap() {
            ReadOutcome::Ready(v) => assert_eq!(v, vec![2.0, 3.0, 4.0]),
            ReadOutcome::NotYetAvailable => panic!("expected Ready"),
        }
    }

    #[test]
    fn read_past_write_head_is_not_yet_available() {
        let mut rb = RingBuffer::new(10);
        rb.push(&[1.0, 2.0]);
        assert!(matches!(rb.try_read(0, 5).unwrap(), ReadOutcome::NotYetAvailable));
    }

    #[test]
    fn read_before_horizon_is_overrun() {
        let mut rb = RingBuffer::new(4);
        rb.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]); // horizon now at position 2
        assert!(matches!(rb.try_read(0, 2), Err(StreamError::Overrun { .. })));
    }

    #[test]
    fn capacity_is_enforced_by_dropping_oldest() {
        let mut rb = RingBuffer::new(3);
        rb.push(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(rb.horizon(), 1);
        assert_eq!(rb.total_written(), 4);
    }
}
