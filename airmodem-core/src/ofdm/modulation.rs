//! The configuration-facing modulation enum (§6): a `Modulation` choice
//! bundles a constellation, an OFDM profile, and a repetition factor.

use crate::dsp::ConstellationKind;
use crate::ofdm::profile::{Profile, ProfileName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Modulation {
    Qpsk,
    Qam16,
    BpskAcoustic,
    BpskRepeat,
    BpskNarrow,
}

impl Modulation {
    pub fn profile_name(self) -> ProfileName {
        match self {
            Modulation::Qpsk => ProfileName::Standard,
            Modulation::Qam16 => ProfileName::Standard,
            Modulation::BpskAcoustic => ProfileName::Acoustic,
            Modulation::BpskRepeat => ProfileName::Acoustic,
            Modulation::BpskNarrow => ProfileName::Narrowband,
        }
    }

    pub fn repetition(self) -> u32 {
        match self {
            Modulation::Qpsk | Modulation::Qam16 | Modulation::BpskAcoustic => 1,
            Modulation::BpskRepeat | Modulation::BpskNarrow => 3,
        }
    }

    pub fn constellation_kind(self) -> ConstellationKind {
        match self {
            Modulation::Qpsk => ConstellationKind::Qpsk,
            Modulation::Qam16 => ConstellationKind::Qam16,
            Modulation::BpskAcoustic | Modulation::BpskRepeat | Modulation::BpskNarrow => {
                ConstellationKind::Bpsk
            }
        }
    }

    pub fn profile(self) -> Profile {
        Profile::named(self.profile_name())
    }

    /// Chunk size in bytes for large-file transfers, by modulation (§4.J).
    pub fn chunk_size_bytes(self) -> usize {
        match self {
            Modulation::Qam16 => 4096,
            Modulation::Qpsk => 2048,
            Modulation::BpskAcoustic | Modulation::BpskRepeat | Modulation::BpskNarrow => 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_spec_table() {
        assert_eq!(Modulation::Qpsk.profile_name(), ProfileName::Standard);
        assert_eq!(Modulation::Qpsk.repetition(), 1);
        assert_eq!(Modulation::Qam16.profile_name(), ProfileName::Standard);
        assert_eq!(Modulation::Qam16.repetition(), 1);
        assert_eq!(Modulation::BpskAcoustic.profile_name(), ProfileName::Acoustic);
        assert_eq!(Modulation::BpskAcoustic.repetition(), 1);
        assert_eq!(Modulation::BpskRepeat.profile_name(), ProfileName::Acoustic);
        assert_eq!(Modulation::BpskRepeat.repetition(), 3);
        assert_eq!(Modulation::BpskNarrow.profile_name(), ProfileName::Narrowband);
        assert_eq!(Modulation::BpskNarrow.repetition(), 3);
    }
}
