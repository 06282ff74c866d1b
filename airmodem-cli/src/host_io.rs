//! Concrete host-interface implementations: WAV-backed audio I/O, an
//! in-memory and a file-backed `ChunkStore`, and the system clock. The
//! core crate only declares the traits; every implementation a real
//! transfer needs lives here, keeping the core transport-agnostic.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use airmodem_core::errors::StreamError;
use airmodem_core::host::{AudioSink, AudioSource, ChunkStore, Clock};

/// Buffers samples in memory and writes them to a WAV file on `finalize`.
pub struct WavAudioSink {
    writer: hound::WavWriter<std::io::BufWriter<std::fs::File>>,
}

impl WavAudioSink {
    pub fn create(path: &Path, sample_rate: usize) -> Result<Self, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: sample_rate as u32,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        Ok(Self { writer: hound::WavWriter::create(path, spec)? })
    }

    pub fn finalize(self) -> Result<(), hound::Error> {
        self.writer.finalize()
    }
}

impl AudioSink for WavAudioSink {
    fn write(&mut self, samples: &[f32]) {
        for &s in samples {
            // A WAV file is not a live device; a write failure here means
            // the output path became unwritable mid-transfer, which the
            // CLI has no sane recovery for.
            self.writer.write_sample(s).expect("WAV write failed");
        }
    }
}

/// Reads an entire WAV file into memory up front, then serves it back in
/// caller-chosen slices, mimicking a capture device's blocking `read`.
pub struct WavAudioSource {
    samples: Vec<f32>,
    pos: usize,
}

impl WavAudioSource {
    pub fn open(path: &Path) -> Result<(Self, usize), hound::Error> {
        let mut reader = hound::WavReader::open(path)?;
        let sample_rate = reader.spec().sample_rate as usize;
        let samples = read_mono_f32(&mut reader)?;
        Ok((Self { samples, pos: 0 }, sample_rate))
    }
}

fn read_mono_f32(reader: &mut hound::WavReader<std::io::BufReader<std::fs::File>>) -> Result<Vec<f32>, hound::Error> {
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let mono: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    if channels <= 1 {
        return Ok(mono);
    }
    Ok(mono
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect())
}

impl AudioSource for WavAudioSource {
    fn read(&mut self, n: usize) -> Vec<f32> {
        let end = self.pos.saturating_add(n).min(self.samples.len());
        let out = self.samples[self.pos..end].to_vec();
        self.pos = end;
        out
    }
}

impl WavAudioSource {
    /// Drain every remaining sample, ignoring the per-call `n` contract of
    /// `AudioSource::read` (the CLI isn't a live capture device: the whole
    /// file is already resident once `open` returns).
    pub fn drain(&mut self) -> Vec<f32> {
        let out = self.samples[self.pos..].to_vec();
        self.pos = self.samples.len();
        out
    }
}

/// Single-threaded, process-local chunk store; fine for a CLI invocation
/// that never outlives the transfer it serves.
#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: HashMap<u32, Vec<u8>>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn put(&mut self, seq: u32, bytes: &[u8]) -> Result<(), StreamError> {
        self.chunks.insert(seq, bytes.to_vec());
        Ok(())
    }

    fn get(&self, seq: u32) -> Result<Option<Vec<u8>>, StreamError> {
        Ok(self.chunks.get(&seq).cloned())
    }

    fn clear(&mut self) -> Result<(), StreamError> {
        self.chunks.clear();
        Ok(())
    }
}

/// Persists chunks as files under a session directory, so a partially
/// received transfer survives a crashed or killed receiver (§7).
pub struct FileChunkStore {
    dir: PathBuf,
}

impl FileChunkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StreamError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StreamError::StoreError { reason: e.to_string() })?;
        Ok(Self { dir })
    }

    fn path_for(&self, seq: u32) -> PathBuf {
        self.dir.join(format!("chunk-{seq:08}.bin"))
    }
}

impl ChunkStore for FileChunkStore {
    fn put(&mut self, seq: u32, bytes: &[u8]) -> Result<(), StreamError> {
        fs::write(self.path_for(seq), bytes).map_err(|e| StreamError::StoreError { reason: e.to_string() })
    }

    fn get(&self, seq: u32) -> Result<Option<Vec<u8>>, StreamError> {
        match fs::read(self.path_for(seq)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StreamError::StoreError { reason: e.to_string() }),
        }
    }

    fn clear(&mut self) -> Result<(), StreamError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StreamError::StoreError { reason: e.to_string() })?;
        for entry in entries.flatten() {
            let _ = fs::remove_file(entry.path());
        }
        Ok(())
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips() {
        let mut store = InMemoryChunkStore::new();
        store.put(3, &[1, 2, 3]).unwrap();
        assert_eq!(store.get(3).unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.get(4).unwrap(), None);
        store.clear().unwrap();
        assert_eq!(store.get(3).unwrap(), None);
    }

    #[test]
    fn file_store_round_trips() {
        let dir = std::env::temp_dir().join(format!("airmodem-test-{}", std::process::id()));
        let mut store = FileChunkStore::new(&dir).unwrap();
        store.put(1, b"hello").unwrap();
        assert_eq!(store.get(1).unwrap(), Some(b"hello".to_vec()));
        store.clear().unwrap();
        assert_eq!(store.get(1).unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }
}
