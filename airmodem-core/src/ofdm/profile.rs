//! Named OFDM parameter sets (§4.C).
//!
//! Profiles are plain immutable values passed by the caller's session
//! object, never a process-wide mutable switch — see DESIGN.md's Open
//! Question resolution for the `set_profile` global in the source this
//! pipeline descends from.

use crate::errors::DspError;

/// Which named profile a session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProfileName {
    Standard,
    Acoustic,
    Narrowband,
}

/// An immutable OFDM parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: ProfileName,
    pub fft_size: usize,
    pub cp_len: usize,
    pub sample_rate: usize,
    pub sub_start: usize,
    pub sub_end: usize,
    pub pilots: Vec<usize>,
}

impl Profile {
    pub fn symbol_len(&self) -> usize {
        self.fft_size + self.cp_len
    }

    /// `acoustic.CP_LEN >= 128` is the flag that widens silence padding and
    /// lowers throughput budgeting, per §3.
    pub fn is_acoustic(&self) -> bool {
        self.cp_len >= 128
    }

    /// Number of in-band data subcarriers (in-band minus pilots).
    pub fn data_subcarriers(&self) -> usize {
        let in_band = self.sub_end - self.sub_start + 1;
        in_band - self.pilots.len()
    }

    /// `BITS_PER_OFDM(profile, mod) = DATA_SUBS * mod.bits_per_symbol`.
    pub fn bits_per_ofdm(&self, bits_per_symbol: usize) -> usize {
        self.data_subcarriers() * bits_per_symbol
    }

    fn validate(&self) -> Result<(), DspError> {
        if self.fft_size < 4 || self.fft_size & (self.fft_size - 1) != 0 {
            return Err(DspError::InvalidFftSize { size: self.fft_size });
        }
        Ok(())
    }

    pub fn standard() -> Self {
        let p = Self {
            name: ProfileName::Standard,
            fft_size: 512,
            cp_len: 32,
            sample_rate: 44_100,
            sub_start: 8,
            sub_end: 200,
            pilots: (8..=200).step_by(16).collect(),
        };
        p.validate().expect("standard profile is valid by construction");
        p
    }

    pub fn acoustic() -> Self {
        let p = Self {
            name: ProfileName::Acoustic,
            fft_size: 512,
            cp_len: 128,
            sample_rate: 44_100,
            sub_start: 16,
            sub_end: 120,
            pilots: (16..=120).step_by(8).collect(),
        };
        p.validate().expect("acoustic profile is valid by construction");
        p
    }

    pub fn narrowband() -> Self {
        let p = Self {
            name: ProfileName::Narrowband,
            fft_size: 512,
            cp_len: 192,
            sample_rate: 44_100,
            sub_start: 24,
            sub_end: 72,
            pilots: (24..=72).step_by(6).collect(),
        };
        p.validate().expect("narrowband profile is valid by construction");
        p
    }

    pub fn named(name: ProfileName) -> Self {
        match name {
            ProfileName::Standard => Self::standard(),
            ProfileName::Acoustic => Self::acoustic(),
            ProfileName::Narrowband => Self::narrowband(),
        }
    }

    /// Complex pilot value carried on every pilot subcarrier: `1 + 0j`.
    pub fn pilot_value() -> num_complex::Complex64 {
        num_complex::Complex64::new(1.0, 0.0)
    }

    pub fn is_pilot(&self, k: usize) -> bool {
        self.pilots.contains(&k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acoustic_flag_matches_cp_len() {
        assert!(!Profile::standard().is_acoustic());
        assert!(Profile::acoustic().is_acoustic());
        assert!(Profile::narrowband().is_acoustic());
    }

    #[test]
    fn dc_and_nyquist_excluded_from_band() {
        for profile in [Profile::standard(), Profile::acoustic(), Profile::narrowband()] {
            assert!(profile.sub_start > 0);
            assert!(profile.sub_end < profile.fft_size / 2);
        }
    }

    #[test]
    fn pilots_are_subset_of_band() {
        for profile in [Profile::standard(), Profile::acoustic(), Profile::narrowband()] {
            for &p in &profile.pilots {
                assert!(p >= profile.sub_start && p <= profile.sub_end);
            }
        }
    }

    #[test]
    fn data_subcarriers_excludes_pilots() {
        let p = Profile::standard();
        let in_band = p.sub_end - p.sub_start + 1;
        assert_eq!(p.data_subcarriers(), in_band - p.pilots.len());
    }
}
