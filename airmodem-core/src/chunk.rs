//! Streaming chunk-frame codec (§4.G, §3): METADATA / DATA_CHUNK payloads
//! carried as the raw byte image inside an OFDM waveform, plus the legacy
//! single-shot packet format for small files.

use crate::errors::ChunkError;

pub const TAG_METADATA: u8 = 0xFE;
pub const TAG_DATA_CHUNK: u8 = 0xFF;

/// Encoders must clamp name length to <= 253 bytes so the first byte of a
/// legacy packet can never collide with a tag byte — see DESIGN.md's
/// resolution of the legacy-discrimination open question.
pub const MAX_LEGACY_NAME_LEN: usize = 253;
pub const MAX_CHUNK_NAME_LEN: usize = 255;
pub const MAX_CHUNK_SIZE: usize = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub total_chunks: u32,
    pub total_file_size: u32,
    pub chunk_size: u16,
    pub name: String,
}

impl Metadata {
    pub fn encode(&self) -> Result<Vec<u8>, ChunkError> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_CHUNK_NAME_LEN {
            return Err(ChunkError::NameTooLong { len: name_bytes.len() });
        }
        if self.total_chunks == 0 {
            return Err(ChunkError::ZeroTotalChunks);
        }

        let mut out = Vec::with_capacity(1 + 4 + 4 + 2 + 1 + name_bytes.len() + 4);
        out.push(TAG_METADATA);
        out.extend_from_slice(&self.total_chunks.to_be_bytes());
        out.extend_from_slice(&self.total_file_size.to_be_bytes());
        out.extend_from_slice(&self.chunk_size.to_be_bytes());
        out.push(name_bytes.len() as u8);
        out.extend_from_slice(name_bytes);

        let crc = crc32fast::hash(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }

    /// Never fails on a bad CRC: returns the parsed record and whether its
    /// CRC was valid, since the assembler wants to see and count invalid
    /// records rather than have them thrown away silently.
    pub fn decode(bytes: &[u8]) -> Result<(Self, bool), ChunkError> {
        const FIXED_LEN: usize = 1 + 4 + 4 + 2 + 1;
        if bytes.len() < FIXED_LEN + 4 {
            return Err(ChunkError::TooShort { kind: "METADATA", len: bytes.len() });
        }
        if bytes[0] != TAG_METADATA {
            return Err(ChunkError::UnknownTag { tag: bytes[0] });
        }

        let total_chunks = u32::from_be_bytes(bytes[1..5].try_into().unwrap());
        let total_file_size = u32::from_be_bytes(bytes[5..9].try_into().unwrap());
        let chunk_size = u16::from_be_bytes(bytes[9..11].try_into().unwrap());
        let name_len = bytes[11] as usize;

        if bytes.len() < FIXED_LEN + name_len + 4 {
            return Err(ChunkError::TooShort { kind: "METADATA", len: bytes.len() });
        }

        let name = String::from_utf8_lossy(&bytes[12..12 + name_len]).into_owned();
        let crc_offset = FIXED_LEN + name_len;
        let expected = u32::from_be_bytes(bytes[crc_offset..crc_offset + 4].try_into().unwrap());
        let actual = crc32fast::hash(&bytes[..crc_offset]);

        Ok((
            Metadata { total_chunks, total_file_size, chunk_size, name },
            actual == expected,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub seq_num: u32,
    pub data: Vec<u8>,
}

impl DataChunk {
    pub fn encode(&self) -> Result<Vec<u8>, ChunkError> {
        if self.data.len() > MAX_CHUNK_SIZE {
            return Err(ChunkError::ChunkSizeTooLarge { size: self.data.len() });
        }

        let mut out = Vec::with_capacity(1 + 4 + 2 + self.data.len() + 4);
        out.push(TAG_DATA_CHUNK);
        out.extend_from_slice(&self.seq_num.to_be_bytes());
        out.extend_from_slice(&(self.data.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.data);

        let crc = crc32fast::hash(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, bool), ChunkError> {
        const FIXED_LEN: usize = 1 + 4 + 2;
        if bytes.len() < FIXED_LEN + 4 {
            return Err(ChunkError::TooShort { kind: "DATA_CHUNK", len: bytes.len() });
        }
        if bytes[0] != TAG_DATA_CHUNK {
            return Err(ChunkError::UnknownTag { tag: bytes[0] });
        }

        let seq_num = u32::from_be_bytes(bytes[1..5].try_into().unwrap());
        let data_len = u16::from_be_bytes(bytes[5..7].try_into().unwrap()) as usize;

        if bytes.len() < FIXED_LEN + data_len + 4 {
            return Err(ChunkError::TooShort { kind: "DATA_CHUNK", len: bytes.len() });
        }

        let data = bytes[FIXED_LEN..FIXED_LEN + data_len].to_vec();
        let crc_offset = FIXED_LEN + data_len;
        let expected = u32::from_be_bytes(bytes[crc_offset..crc_offset + 4].try_into().unwrap());
        let actual = crc32fast::hash(&bytes[..crc_offset]);

        Ok((DataChunk { seq_num, data }, actual == expected))
    }
}

/// Legacy single-shot packet for small files: `[nameLen(1)][name][dataLen(4 BE)][data][CRC-32(4 BE)]`.
/// `nameLen` is always `< 0xFE`, which is what lets a decoder branch on the
/// first byte before knowing whether it is looking at a tag or a length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPacket {
    pub name: String,
    pub data: Vec<u8>,
}

impl LegacyPacket {
    pub fn encode(&self) -> Result<Vec<u8>, ChunkError> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_LEGACY_NAME_LEN {
            return Err(ChunkError::NameTooLong { len: name_bytes.len() });
        }

        let mut out = Vec::with_capacity(1 + name_bytes.len() + 4 + self.data.len() + 4);
        out.push(name_bytes.len() as u8);
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);

        let crc = crc32fast::hash(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, bool), ChunkError> {
        if bytes.is_empty() {
            return Err(ChunkError::TooShort { kind: "legacy", len: 0 });
        }
        let name_len = bytes[0] as usize;
        let fixed_len = 1 + name_len + 4;
        if bytes.len() < fixed_len + 4 {
            return Err(ChunkError::TooShort { kind: "legacy", len: bytes.len() });
        }

        let name = String::from_utf8_lossy(&bytes[1..1 + name_len]).into_owned();
        let data_len = u32::from_be_bytes(bytes[1 + name_len..fixed_len].try_into().unwrap()) as usize;

        if bytes.len() < fixed_len + data_len + 4 {
            return Err(ChunkError::TooShort { kind: "legacy", len: bytes.len() });
        }

        let data = bytes[fixed_len..fixed_len + data_len].to_vec();
        let crc_offset = fixed_len + data_len;
        let expected = u32::from_be_bytes(bytes[crc_offset..crc_offset + 4].try_into().unwrap());
        let actual = crc32fast::hash(&bytes[..crc_offset]);

        Ok((LegacyPacket { name, data }, actual == expected))
    }
}

/// What kind of streaming payload a decoded byte buffer carries, chosen by
/// inspecting the first byte: `0xFE` -> metadata, `0xFF` -> chunk,
/// otherwise -> legacy. Parsers must branch on tag first (§3).
pub enum Decoded {
    Metadata(Metadata, bool),
    DataChunk(DataChunk, bool),
    Legacy(LegacyPacket, bool),
}

pub fn decode_any(bytes: &[u8]) -> Result<Decoded, ChunkError> {
    match bytes.first() {
        Some(&TAG_METADATA) => Metadata::decode(bytes).map(|(m, ok)| Decoded::Metadata(m, ok)),
        Some(&TAG_DATA_CHUNK) => DataChunk::decode(bytes).map(|(c, ok)| Decoded::DataChunk(c, ok)),
        Some(_) => LegacyPacket::decode(bytes).map(|(p, ok)| Decoded::Legacy(p, ok)),
        None => Err(ChunkError::TooShort { kind: "any", len: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trip() {
        let m = Metadata {
            total_chunks: 4,
            total_file_size: 64,
            chunk_size: 16,
            name: "file.bin".to_string(),
        };
        let encoded = m.encode().unwrap();
        let (decoded, crc_ok) = Metadata::decode(&encoded).unwrap();
        assert!(crc_ok);
        assert_eq!(decoded, m);
    }

    #[test]
    fn metadata_rejects_zero_total_chunks() {
        let m = Metadata { total_chunks: 0, total_file_size: 0, chunk_size: 1, name: String::new() };
        assert!(matches!(m.encode(), Err(ChunkError::ZeroTotalChunks)));
    }

    #[test]
    fn data_chunk_round_trip_and_crc_detection() {
        let c = DataChunk { seq_num: 7, data: vec![1, 2, 3, 4] };
        let mut encoded = c.encode().unwrap();
        let (decoded, crc_ok) = DataChunk::decode(&encoded).unwrap();
        assert!(crc_ok);
        assert_eq!(decoded, c);

        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        let (_, crc_ok) = DataChunk::decode(&encoded).unwrap();
        assert!(!crc_ok);
    }

    #[test]
    fn chunk_size_over_limit_rejected_at_encode() {
        let c = DataChunk { seq_num: 0, data: vec![0u8; MAX_CHUNK_SIZE + 1] };
        assert!(matches!(c.encode(), Err(ChunkError::ChunkSizeTooLarge { .. })));
    }

    #[test]
    fn legacy_packet_round_trip() {
        let p = LegacyPacket { name: "hi.txt".to_string(), data: vec![0x48, 0x65, 0x6C, 0x6C, 0x6F] };
        let encoded = p.encode().unwrap();
        assert_eq!(encoded[0], 6);
        let (decoded, crc_ok) = LegacyPacket::decode(&encoded).unwrap();
        assert!(crc_ok);
        assert_eq!(decoded, p);
    }

    #[test]
    fn decode_any_dispatches_on_tag() {
        let m = Metadata { total_chunks: 1, total_file_size: 1, chunk_size: 1, name: "a".into() };
        let encoded = m.encode().unwrap();
        assert!(matches!(decode_any(&encoded), Ok(Decoded::Metadata(_, true))));

        let c = DataChunk { seq_num: 0, data: vec![1] };
        let encoded = c.encode().unwrap();
        assert!(matches!(decode_any(&encoded), Ok(Decoded::DataChunk(_, true))));

        let p = LegacyPacket { name: "x".into(), data: vec![1] };
        let encoded = p.encode().unwrap();
        assert!(matches!(decode_any(&encoded), Ok(Decoded::Legacy(_, true))));
    }
}
