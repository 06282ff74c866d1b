//! Low-level signal processing primitives: FFT and constellation mapping.

pub mod constellation;
pub mod fft;

pub use constellation::{Constellation, ConstellationKind};
