//! Shared encode/decode machinery for one OFDM burst: preamble + CE +
//! data symbols. Used by both the sender (build) and the streaming
//! receiver / legacy decoder (decode from a known or searched-for start).

use num_complex::Complex64;

use crate::dsp::Constellation;
use crate::ofdm::preamble::{build_ce, build_p1, build_p2, coarse_detect, estimate_channel, fine_detect};
use crate::ofdm::profile::Profile;
use crate::ofdm::symbol::{decode_symbol, encode_symbol};
use crate::utils::{majority_vote, repeat_bits};

/// `P1, P2, CE` waveforms and the data-symbol waveforms for `payload_bits`
/// (already repetition-expanded by the caller if `repetition > 1`).
pub struct EncodedBurst {
    pub p1: Vec<f64>,
    pub p2: Vec<f64>,
    pub ce: Vec<f64>,
    pub data_symbols: Vec<Vec<f64>>,
}

/// Encode `payload_bytes` (raw bytes, not yet bit-expanded) into a full
/// burst: MSB-first bit expansion, optional repetition, then one OFDM
/// symbol per `BITS_PER_OFDM` bits, zero-padded in the last symbol.
pub fn encode_burst(payload_bytes: &[u8], profile: &Profile, constellation: &Constellation, repetition: u32) -> EncodedBurst {
    let bits = crate::utils::bytes_to_bits(payload_bytes);
    let bits = if repetition > 1 { repeat_bits(&bits, repetition) } else { bits };

    let bits_per_symbol = profile.bits_per_ofdm(constellation.bits_per_symbol());
    let mut data_symbols = Vec::new();
    for chunk in bits.chunks(bits_per_symbol) {
        let mut padded = chunk.to_vec();
        padded.resize(bits_per_symbol, 0);
        data_symbols.push(encode_symbol(&padded, profile, constellation));
    }
    if data_symbols.is_empty() {
        let padded = vec![0u8; bits_per_symbol];
        data_symbols.push(encode_symbol(&padded, profile, constellation));
    }

    EncodedBurst {
        p1: build_p1(profile),
        p2: build_p2(profile),
        ce: build_ce(profile).0,
        data_symbols,
    }
}

/// Find the P1 start position within `samples` via coarse auto-correlation
/// followed by fine cross-correlation refinement (§4.E).
pub fn locate_preamble(samples: &[f64], profile: &Profile) -> Option<usize> {
    let half_len = profile.symbol_len() / 2;
    let coarse = coarse_detect(samples, half_len)?;
    let p1 = build_p1(profile);
    let fine = fine_detect(samples, &p1, coarse.position, 3 * profile.cp_len);
    if fine.metric < 0.15 {
        return None;
    }
    Some(fine.position)
}

/// Decode the data payload of a burst whose P1 start is already known at
/// `preamble_pos`, reading exactly `num_data_symbols` symbols (or as many
/// as fit in `samples`, whichever is fewer).
pub fn decode_from_position(
    samples: &[f64],
    preamble_pos: usize,
    profile: &Profile,
    constellation: &Constellation,
    repetition: u32,
    num_data_symbols: Option<usize>,
) -> Vec<u8> {
    let symbol_len = profile.symbol_len();
    let ce_start = preamble_pos + 2 * symbol_len;
    let ce_samples = &samples[ce_start..ce_start + symbol_len];
    let (_, known_spectrum) = build_ce(profile);
    let channel = estimate_channel(ce_samples, profile, &known_spectrum);

    let data_start = preamble_pos + 3 * symbol_len;
    let available_symbols = (samples.len() - data_start) / symbol_len;
    let count = num_data_symbols.map_or(available_symbols, |n| n.min(available_symbols));

    let mut bits = Vec::new();
    for i in 0..count {
        let start = data_start + i * symbol_len;
        let symbol_samples = &samples[start..start + symbol_len];
        bits.extend(decode_symbol(symbol_samples, profile, constellation, &channel));
    }

    let bits = if repetition > 1 { majority_vote(&bits, repetition) } else { bits };
    crate::utils::pack_bits(&bits)
}

/// Channel response estimated from the CE symbol at a known preamble
/// position; exposed so callers can check `observable_fraction` before
/// trusting the decode.
pub fn channel_at(samples: &[f64], preamble_pos: usize, profile: &Profile) -> Vec<Complex64> {
    let symbol_len = profile.symbol_len();
    let ce_start = preamble_pos + 2 * symbol_len;
    let ce_samples = &samples[ce_start..ce_start + symbol_len];
    let (_, known_spectrum) = build_ce(profile);
    estimate_channel(ce_samples, profile, &known_spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ConstellationKind;
    use crate::transmit::build_signal;

    #[test]
    fn encode_then_locate_then_decode_round_trip() {
        let profile = Profile::standard();
        let constellation = Constellation::new(ConstellationKind::Qpsk);
        let payload = b"Hello, World!".to_vec();

        let burst = encode_burst(&payload, &profile, &constellation, 1);
        let signal = build_signal(
            profile.sample_rate,
            0.3,
            &burst.p1,
            &burst.p2,
            &burst.ce,
            &burst.data_symbols,
            0.02,
            0.8,
        );

        let pos = locate_preamble(&signal, &profile).expect("preamble must be found");
        let decoded = decode_from_position(
            &signal,
            pos,
            &profile,
            &constellation,
            1,
            Some(burst.data_symbols.len()),
        );

        assert_eq!(&decoded[..payload.len()], &payload[..]);
    }
}
