//! Bitstream conversion helpers shared by the OFDM burst codec.

/// MSB-first bit expansion of a raw byte slice.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |bit| (byte >> bit) & 1))
        .collect()
}

pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | (b & 1)))
        .collect()
}

/// Repeat each bit `r` times, in order.
pub fn repeat_bits(bits: &[u8], r: u32) -> Vec<u8> {
    bits.iter().flat_map(|&b| std::iter::repeat(b).take(r as usize)).collect()
}

/// Majority vote over consecutive runs of `r` bits (`r` odd); the inverse
/// of `repeat_bits`.
pub fn majority_vote(bits: &[u8], r: u32) -> Vec<u8> {
    debug_assert!(r % 2 == 1, "repetition factor must be odd");
    bits.chunks(r as usize)
        .map(|chunk| {
            let ones: usize = chunk.iter().filter(|&&b| b == 1).count();
            if ones * 2 > chunk.len() { 1 } else { 0 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_to_bits_and_pack_bits_roundtrip() {
        let text = "Airmodem";
        let bits = bytes_to_bits(text.as_bytes());
        assert_eq!(bits.len(), text.len() * 8);
        let packed = pack_bits(&bits);
        assert_eq!(String::from_utf8(packed).unwrap(), text);
    }

    #[test]
    fn majority_vote_inverts_repeat_bits_for_odd_r() {
        let bits = vec![0u8, 1, 1, 0, 1];
        for r in [1u32, 3, 5] {
            let repeated = repeat_bits(&bits, r);
            assert_eq!(majority_vote(&repeated, r), bits);
        }
    }

    #[test]
    fn majority_vote_corrects_a_single_flipped_copy() {
        let repeated = vec![1u8, 1, 0]; // 2 of 3 are 1
        assert_eq!(majority_vote(&repeated, 3), vec![1]);
    }
}
