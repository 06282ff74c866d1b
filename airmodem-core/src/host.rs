//! Host-interface contract (§6): the collaborators the core consumes but
//! does not implement. Concrete implementations (WAV files, an in-memory
//! map, the system clock) live in the CLI crate.

use std::time::{Duration, Instant};

use crate::errors::StreamError;

pub trait AudioSink {
    /// Blocks until the samples are buffered for playback.
    fn write(&mut self, samples: &[f32]);
}

pub trait AudioSource {
    /// Blocks up to device latency; returns captured samples in order.
    /// Returns fewer than `n` samples only at end of stream.
    fn read(&mut self, n: usize) -> Vec<f32>;
}

pub trait ChunkStore {
    fn put(&mut self, seq: u32, bytes: &[u8]) -> Result<(), StreamError>;
    fn get(&self, seq: u32) -> Result<Option<Vec<u8>>, StreamError>;
    fn clear(&mut self) -> Result<(), StreamError>;
}

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}
