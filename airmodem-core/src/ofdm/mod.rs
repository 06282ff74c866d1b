//! OFDM waveform layer: profiles, the per-symbol codec, and the
//! preamble/channel-estimation machinery built on top of `dsp`.

pub mod burst;
pub mod modulation;
pub mod preamble;
pub mod profile;
pub mod symbol;

pub use modulation::Modulation;
pub use profile::{Profile, ProfileName};
