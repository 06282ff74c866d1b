//! Per-burst diagnostic reporting: signal-quality metrics (`metrics`
//! submodule) bundled with the preamble/channel facts a CLI or test
//! harness wants to display alongside a decode.

pub mod metrics;

use serde::{Deserialize, Serialize};

/// Snapshot of one decoded burst, independent of whether it came from the
/// legacy single-shot path or the streaming receiver.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BurstDiagnostics {
    pub preamble_metric: f64,
    pub channel_observable_fraction: f64,
    pub evm_percent: f32,
    pub estimated_snr_db: f32,
    pub crc_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bundle_is_all_zero() {
        let d = BurstDiagnostics::default();
        assert_eq!(d.preamble_metric, 0.0);
        assert!(!d.crc_valid);
    }
}
