//! Chunk assembler (§4.I): accumulates DATA_CHUNK payloads behind a
//! bitmap keyed by the METADATA-declared total, persisting each chunk
//! through a `ChunkStore` so duplicate or out-of-order deliveries are
//! idempotent.

use crate::chunk::{DataChunk, Metadata};
use crate::errors::StreamError;
use crate::host::ChunkStore;

pub struct Assembler<S: ChunkStore> {
    store: S,
    metadata: Option<Metadata>,
    received: Vec<bool>,
    crc_errors: u64,
}

impl<S: ChunkStore> Assembler<S> {
    pub fn new(store: S) -> Self {
        Self { store, metadata: None, received: Vec::new(), crc_errors: 0 }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn crc_errors(&self) -> u64 {
        self.crc_errors
    }

    /// Start (or restart) assembly for a new file. Clears the store, since
    /// a fresh METADATA always begins a new transfer.
    pub fn accept_metadata(&mut self, metadata: Metadata) -> Result<(), StreamError> {
        self.store.clear()?;
        self.received = vec![false; metadata.total_chunks as usize];
        self.metadata = Some(metadata);
        self.crc_errors = 0;
        Ok(())
    }

    /// Accept one data chunk. Returns `true` if this seq_num was newly
    /// stored. A duplicate seq_num or a CRC failure is a no-op; CRC
    /// failures still increment `crc_errors` for diagnostics.
    pub fn accept_chunk(&mut self, chunk: DataChunk, crc_valid: bool) -> Result<bool, StreamError> {
        if !crc_valid {
            self.crc_errors += 1;
            return Ok(false);
        }
        let seq = chunk.seq_num as usize;
        if seq >= self.received.len() || self.received[seq] {
            return Ok(false);
        }
        self.store.put(chunk.seq_num, &chunk.data)?;
        self.received[seq] = true;
        Ok(true)
    }

    pub fn is_complete(&self) -> bool {
        !self.received.is_empty() && self.received.iter().all(|&r| r)
    }

    pub fn missing_chunks(&self) -> Vec<u32> {
        self.received
            .iter()
            .enumerate()
            .filter(|(_, &r)| !r)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Concatenate all chunks in order and trim to the declared file size.
    /// Only meaningful once `is_complete()`.
    pub fn assemble(&self) -> Result<Vec<u8>, StreamError> {
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| StreamError::StoreError { reason: "no metadata accepted yet".into() })?;

        let mut out = Vec::with_capacity(metadata.total_file_size as usize);
        for seq in 0..metadata.total_chunks {
            let bytes = self
                .store
                .get(seq)?
                .ok_or_else(|| StreamError::StoreError { reason: format!("missing chunk {seq}") })?;
            out.extend_from_slice(&bytes);
        }
        out.truncate(metadata.total_file_size as usize);
        Ok(out)
    }
}
