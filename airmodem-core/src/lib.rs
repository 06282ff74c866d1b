//! Acoustic OFDM modem core: waveform synthesis and recovery, a
//! frame-based link layer, and a streaming chunked-file transfer
//! protocol, all independent of any particular audio transport.
//!
//! `dsp` and `ofdm` hold the signal path (FFT, constellations, OFDM
//! symbol codec, Schmidl-Cox preamble and channel estimation). `frame`
//! and `chunk` are the wire formats carried over one OFDM burst. `arq`
//! is the stop-and-wait reliability layer above those frames. `sender`
//! and `receiver` assemble the pieces into the two host-facing
//! directions of a transfer.

pub mod arq;
pub mod channel;
pub mod chunk;
pub mod config;
pub mod diagnostics;
pub mod dsp;
pub mod errors;
pub mod external_audio;
pub mod frame;
pub mod host;
pub mod ofdm;
pub mod receiver;
pub mod sender;
pub mod transmit;
pub mod utils;

pub use config::SessionConfig;
pub use errors::{ModemError, Result};
pub use ofdm::{Modulation, Profile, ProfileName};
