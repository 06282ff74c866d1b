//! Session-scoped configuration: the explicit value a `Sender` or
//! `StreamingReceiver` carries in place of a process-wide mutable profile
//! switch.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::ofdm::{Modulation, Profile};

/// Chunked-vs-legacy threshold (§6): at or below, legacy single-shot
/// packet; above, the chunked metadata/data-chunk protocol.
pub const CHUNK_THRESHOLD_BYTES: usize = 32 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub modulation: Modulation,
    pub chunk_threshold: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { modulation: Modulation::Qpsk, chunk_threshold: CHUNK_THRESHOLD_BYTES }
    }
}

impl SessionConfig {
    pub fn profile(&self) -> Profile {
        self.modulation.profile()
    }

    pub fn repetition(&self) -> u32 {
        self.modulation.repetition()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repetition() % 2 == 0 {
            return Err(ConfigError::InvalidRepetition { repetition: self.repetition() });
        }
        Ok(())
    }
}

/// ARQ timing constants (§4.H), not session-configurable: the wire
/// protocol requires both endpoints to agree on these exactly.
pub mod arq_timing {
    use std::time::Duration;

    pub const ACK_TIMEOUT: Duration = Duration::from_millis(500);
    pub const TURNAROUND: Duration = Duration::from_millis(50);
    pub const MAX_RETRIES: u32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_qpsk_with_default_threshold() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.chunk_threshold, CHUNK_THRESHOLD_BYTES);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn all_modulations_have_odd_repetition() {
        for m in [
            Modulation::Qpsk,
            Modulation::Qam16,
            Modulation::BpskAcoustic,
            Modulation::BpskRepeat,
            Modulation::BpskNarrow,
        ] {
            let cfg = SessionConfig { modulation: m, ..SessionConfig::default() };
            assert!(cfg.validate().is_ok());
        }
    }
}
