//! Sender pipeline (§4.J) and the host-exposed build/decode entry points
//! (§6): file -> metadata frame -> data-chunk frames, with double-buffered
//! waveform production for large files.

use crate::chunk::{self, DataChunk, LegacyPacket, Metadata};
use crate::config::SessionConfig;
use crate::dsp::Constellation;
use crate::errors::{DspError, ModemError};
use crate::ofdm::burst::{decode_from_position, encode_burst, locate_preamble};
use crate::ofdm::preamble::observable_fraction;
use crate::transmit::{build_signal, leading_silence_secs, TRAILING_SILENCE_SECS};

/// Result of `build_transmit_signal`: the waveform and a symbol count for
/// diagnostics/telemetry.
pub struct TransmitSignal {
    pub samples: Vec<f32>,
    pub num_symbols: usize,
}

fn to_f32(samples: Vec<f64>) -> Vec<f32> {
    samples.into_iter().map(|s| s as f32).collect()
}

fn frame_waveform(
    payload: &[u8],
    session: &SessionConfig,
    is_first_in_burst: bool,
) -> (Vec<f64>, usize) {
    let profile = session.profile();
    let constellation = Constellation::new(session.modulation.constellation_kind());
    let burst = encode_burst(payload, &profile, &constellation, session.repetition());

    let leading = leading_silence_secs(is_first_in_burst, profile.is_acoustic());
    let signal = build_signal(
        profile.sample_rate,
        leading,
        &burst.p1,
        &burst.p2,
        &burst.ce,
        &burst.data_symbols,
        TRAILING_SILENCE_SECS,
        0.8,
    );
    (signal, burst.data_symbols.len())
}

/// Legacy mode (§4.J): a single legacy packet, OFDM-encoded, preamble- and
/// silence-wrapped. Used for files at or below `chunk_threshold`.
pub fn build_transmit_signal(
    file_bytes: &[u8],
    name: &str,
    session: &SessionConfig,
) -> Result<TransmitSignal, ModemError> {
    let packet = LegacyPacket { name: name.to_string(), data: file_bytes.to_vec() };
    let payload = packet.encode()?;
    let (signal, num_symbols) = frame_waveform(&payload, session, true);
    Ok(TransmitSignal { samples: to_f32(signal), num_symbols })
}

/// Build the waveform for one METADATA burst (chunked mode, §4.J).
pub fn build_metadata_frame(metadata: &Metadata, session: &SessionConfig) -> Result<TransmitSignal, ModemError> {
    let payload = metadata.encode()?;
    let (signal, num_symbols) = frame_waveform(&payload, session, true);
    Ok(TransmitSignal { samples: to_f32(signal), num_symbols })
}

/// Build the waveform for one DATA_CHUNK burst (chunked mode, §4.J).
pub fn build_data_chunk_frame(
    chunk: &DataChunk,
    session: &SessionConfig,
    is_first_in_burst: bool,
) -> Result<TransmitSignal, ModemError> {
    let payload = chunk.encode()?;
    let (signal, num_symbols) = frame_waveform(&payload, session, is_first_in_burst);
    Ok(TransmitSignal { samples: to_f32(signal), num_symbols })
}

/// Decoded result of a legacy single-shot transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDecodeResult {
    pub file_name: String,
    pub data: Vec<u8>,
    pub crc_valid: bool,
}

/// Legacy single-shot decode (§6): search the whole buffer for the
/// preamble, decode the burst, and parse the legacy packet payload.
pub fn decode_received_signal(
    samples: &[f32],
    session: &SessionConfig,
) -> Result<LegacyDecodeResult, ModemError> {
    let profile = session.profile();
    let constellation = Constellation::new(session.modulation.constellation_kind());
    let samples_f64: Vec<f64> = samples.iter().map(|&s| s as f64).collect();

    let pos = locate_preamble(&samples_f64, &profile).ok_or(DspError::PreambleNotDetected)?;

    let channel = crate::ofdm::burst::channel_at(&samples_f64, pos, &profile);
    let fraction = observable_fraction(&channel, &profile);
    if fraction < 0.5 {
        let total = profile.sub_end - profile.sub_start + 1;
        return Err(DspError::ChannelUnobservable {
            bad_subcarriers: ((1.0 - fraction) * total as f64) as usize,
            total_subcarriers: total,
        }
        .into());
    }

    let decoded_bytes = decode_from_position(&samples_f64, pos, &profile, &constellation, session.repetition(), None);

    match chunk::decode_any(&decoded_bytes)? {
        chunk::Decoded::Legacy(packet, crc_valid) => {
            Ok(LegacyDecodeResult { file_name: packet.name, data: packet.data, crc_valid })
        }
        chunk::Decoded::Metadata(m, crc_valid) => {
            Ok(LegacyDecodeResult { file_name: m.name, data: Vec::new(), crc_valid })
        }
        chunk::Decoded::DataChunk(c, crc_valid) => {
            Ok(LegacyDecodeResult { file_name: String::new(), data: c.data, crc_valid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_echo_round_trip() {
        let session = SessionConfig::default();
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0x6F];

        let tx = build_transmit_signal(&bytes, "hi.txt", &session).unwrap();
        let result = decode_received_signal(&tx.samples, &session).unwrap();

        assert_eq!(result.file_name, "hi.txt");
        assert_eq!(result.data, bytes);
        assert!(result.crc_valid);
    }

    #[test]
    fn legacy_echo_round_trip_with_repetition() {
        let session = SessionConfig { modulation: crate::ofdm::Modulation::BpskRepeat, ..Default::default() };
        let bytes = b"retry me".to_vec();

        let tx = build_transmit_signal(&bytes, "r.txt", &session).unwrap();
        let result = decode_received_signal(&tx.samples, &session).unwrap();

        assert_eq!(result.data, bytes);
        assert!(result.crc_valid);
    }
}
