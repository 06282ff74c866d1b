//! Error types with granular per-subsystem categories.

use thiserror::Error;

/// Top-level error type for all core operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("chunk protocol error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("ARQ error: {0}")]
    Arq(#[from] ArqError),

    #[error("streaming receiver error: {0}")]
    Stream(#[from] StreamError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("audio I/O error: {0}")]
    Audio(#[from] AudioError),
}

/// FFT / OFDM symbol codec errors.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("FFT size {size} is not a power of two")]
    InvalidFftSize { size: usize },

    #[error("preamble not detected")]
    PreambleNotDetected,

    #[error("channel unobservable: |H[k]|^2 below tolerance on {bad_subcarriers} of {total_subcarriers} in-band subcarriers")]
    ChannelUnobservable {
        bad_subcarriers: usize,
        total_subcarriers: usize,
    },

    #[error("buffer underrun: requested {requested}, available {available}")]
    BufferUnderrun { requested: usize, available: usize },
}

/// Link-frame codec errors (§4.F).
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame too short: {len} bytes, minimum 8")]
    TooShort { len: usize },

    #[error("frame truncated: header declares {declared} payload bytes, only {available} available")]
    Truncated { declared: usize, available: usize },

    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },
}

/// Chunk-protocol codec errors (§4.G).
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("name length {len} exceeds 253 bytes (reserved for tag discrimination)")]
    NameTooLong { len: usize },

    #[error("chunk size {size} exceeds 65535 bytes")]
    ChunkSizeTooLarge { size: usize },

    #[error("totalChunks is zero")]
    ZeroTotalChunks,

    #[error("buffer too short to contain a {kind} record: {len} bytes")]
    TooShort { kind: &'static str, len: usize },

    #[error("unrecognized tag byte {tag:#04x}")]
    UnknownTag { tag: u8 },
}

/// ARQ transport errors (§4.H).
#[derive(Debug, Error)]
pub enum ArqError {
    #[error("timed out waiting for {expected}")]
    Timeout { expected: &'static str },

    #[error("retries exhausted after {retries} attempts: {cause}")]
    RetriesExhausted {
        retries: u32,
        cause: Box<ModemError>,
    },

    #[error("cancelled by caller")]
    Cancelled,
}

/// Streaming receiver / chunk store errors.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("requested ring range already overwritten: position {position}, horizon {horizon}")]
    Overrun { position: u64, horizon: u64 },

    #[error("chunk store failure: {reason}")]
    StoreError { reason: String },

    #[error("cancelled by caller")]
    Cancelled,
}

/// External audio file loading errors (decode + resample, §4.O).
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("{path}: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("resampling failed: {reason}")]
    ResampleFailed { reason: String },
}

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid repetition factor: {repetition} (must be odd and >= 1)")]
    InvalidRepetition { repetition: u32 },
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, ModemError>;
