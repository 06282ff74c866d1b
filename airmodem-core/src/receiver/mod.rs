//! Streaming receiver (§4.I): DC removal, running preamble detection over
//! an unbounded sample stream, and chunk reassembly, without ever holding
//! the whole transfer in memory at once.

pub mod assembler;
pub mod ring_buffer;

use crate::chunk::{self, Decoded};
use crate::config::SessionConfig;
use crate::dsp::Constellation;
use crate::host::ChunkStore;
use crate::ofdm::burst::decode_from_position;
use crate::ofdm::preamble::{build_p1, fine_detect, AutoCorrelationScanner};
use crate::ofdm::profile::Profile;
use assembler::Assembler;
use ring_buffer::{ReadOutcome, RingBuffer};

/// Threshold the streaming receiver applies to the fine cross-correlation
/// metric; looser than the standalone single-shot decoder's 0.15, since a
/// false coarse trigger here only costs one wasted `CollectingFrame` wait
/// rather than a whole-buffer mis-decode.
const FINE_DETECT_THRESHOLD: f64 = 0.1;

/// DC-blocker EMA coefficient (§4.I).
const DC_ALPHA: f64 = 0.999;

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverState {
    Idle,
    PreambleDetected { p1_pos: u64 },
    CollectingFrame { p1_pos: u64, frame_end: u64 },
    Demodulating { p1_pos: u64, frame_end: u64 },
}

/// Events surfaced by `StreamingReceiver::feed`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverEvent {
    Metadata { total_chunks: u32, total_file_size: u32, name: String },
    Chunk { seq_num: u32, crc_valid: bool },
    Complete { file: Vec<u8> },
    FrameCrcInvalid,
}

pub struct StreamingReceiver<S: ChunkStore> {
    profile: Profile,
    constellation: Constellation,
    repetition: u32,
    chunk_size_hint: Option<usize>,
    ring: RingBuffer,
    scanner: AutoCorrelationScanner,
    scan_pos: u64,
    state: ReceiverState,
    dc: f64,
    p1_reference: Vec<f64>,
    assembler: Assembler<S>,
}

impl<S: ChunkStore> StreamingReceiver<S> {
    pub fn new(session: &SessionConfig, store: S) -> Self {
        let profile = session.profile();
        let constellation = Constellation::new(session.modulation.constellation_kind());
        let repetition = session.repetition();
        let capacity_symbols = worst_case_frame_symbols(session);
        let half_len = profile.symbol_len() / 2;
        let capacity = profile.symbol_len() * (3 + capacity_symbols) * 3 + half_len * 4;

        Self {
            p1_reference: build_p1(&profile),
            profile,
            constellation,
            repetition,
            chunk_size_hint: None,
            ring: RingBuffer::new(capacity),
            scanner: AutoCorrelationScanner::new(half_len),
            scan_pos: 0,
            state: ReceiverState::Idle,
            dc: 0.0,
            assembler: Assembler::new(store),
        }
    }

    /// Two-phase adaptive frame-length estimate (§4.I): `payloadBytes` is
    /// 280 (enough for a metadata frame) before metadata has been seen,
    /// and the known chunk size plus its 11-byte DATA_CHUNK overhead once
    /// a metadata frame has actually been decoded.
    fn estimated_frame_symbols(&self) -> usize {
        let payload_bytes = self.chunk_size_hint.map(|cs| cs + 11).unwrap_or(280);
        frame_symbols_for_payload(&self.profile, self.constellation.kind(), self.repetition, payload_bytes)
    }

    pub fn state(&self) -> &ReceiverState {
        &self.state
    }

    pub fn assembler(&self) -> &Assembler<S> {
        &self.assembler
    }

    /// Feed newly arrived samples and drive the state machine as far
    /// forward as the resident data allows, returning every event
    /// produced along the way (zero or more).
    pub fn feed(&mut self, samples: &[f32]) -> Vec<ReceiverEvent> {
        let cleaned: Vec<f64> = samples.iter().map(|&s| self.remove_dc(s as f64)).collect();
        self.ring.push(&cleaned);

        let mut events = Vec::new();
        loop {
            match self.state.clone() {
                ReceiverState::Idle => {
                    if !self.scan_for_preamble() {
                        break;
                    }
                }
                ReceiverState::PreambleDetected { p1_pos } => {
                    let frame_symbols = self.estimated_frame_symbols();
                    let frame_end = p1_pos + (3 + frame_symbols) as u64 * self.profile.symbol_len() as u64;
                    self.state = ReceiverState::CollectingFrame { p1_pos, frame_end };
                }
                ReceiverState::CollectingFrame { p1_pos, frame_end } => {
                    if self.ring.total_written() < frame_end {
                        break;
                    }
                    self.state = ReceiverState::Demodulating { p1_pos, frame_end };
                }
                ReceiverState::Demodulating { p1_pos, frame_end } => {
                    let (event, resume_at) = self.demodulate(p1_pos, frame_end);
                    if let Some(event) = event {
                        events.push(event);
                    }
                    self.scan_pos = resume_at;
                    // The scanner's sliding window would otherwise splice
                    // samples from before the frame to samples after it;
                    // start clean so the next window is contiguous.
                    self.scanner = AutoCorrelationScanner::new(self.profile.symbol_len() / 2);
                    self.state = ReceiverState::Idle;
                }
            }
        }
        events
    }

    fn remove_dc(&mut self, sample: f64) -> f64 {
        let out = sample - self.dc;
        self.dc = DC_ALPHA * self.dc + (1.0 - DC_ALPHA) * sample;
        out
    }

    /// Advance the incremental auto-correlation scanner over resident,
    /// unscanned samples. Returns `true` if a preamble was accepted and
    /// the state machine should advance; `false` if more data is needed.
    fn scan_for_preamble(&mut self) -> bool {
        let (buf, horizon) = self.ring.resident();
        if self.scan_pos < horizon {
            self.scan_pos = horizon;
        }
        let start_idx = (self.scan_pos - horizon) as usize;

        for (offset, &sample) in buf[start_idx..].iter().enumerate() {
            let global_idx = self.scan_pos + offset as u64;
            if let Some(metric) = self.scanner.push(sample) {
                if metric > 0.5 {
                    let half_len = self.profile.symbol_len() / 2;
                    let coarse_pos = global_idx + 1 - (2 * half_len) as u64;
                    if let Some(p1_pos) = self.refine_at(coarse_pos) {
                        self.scan_pos = global_idx + 1;
                        self.state = ReceiverState::PreambleDetected { p1_pos };
                        return true;
                    }
                }
            }
        }
        self.scan_pos = self.ring.total_written();
        false
    }

    fn refine_at(&self, coarse_pos: u64) -> Option<u64> {
        let radius = 3 * self.profile.cp_len;
        let lo = coarse_pos.saturating_sub(radius as u64);
        let span = (radius as u64 * 2 + self.p1_reference.len() as u64).min(self.ring.total_written().saturating_sub(lo));
        match self.ring.try_read(lo, span as usize) {
            Ok(ReadOutcome::Ready(window)) => {
                let fine = fine_detect(&window, &self.p1_reference, (coarse_pos - lo) as usize, radius);
                if fine.metric >= FINE_DETECT_THRESHOLD {
                    Some(lo + fine.position as u64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Demodulate the frame at `[p1_pos, frame_end)` and report the event.
    /// Also returns where the scanner should resume: `frame_end` is only an
    /// upper-bound estimate (§4.I), so once a record's own declared length
    /// is known, resume right after the real frame instead of the
    /// estimate's overshoot, or the next frame's own preamble can fall
    /// inside the skipped span and never be found.
    fn demodulate(&mut self, p1_pos: u64, frame_end: u64) -> (Option<ReceiverEvent>, u64) {
        let len = (frame_end - p1_pos) as usize;
        let samples = match self.ring.try_read(p1_pos, len) {
            Ok(ReadOutcome::Ready(s)) => s,
            _ => return (None, frame_end),
        };

        let data_symbols = len / self.profile.symbol_len() - 3;
        let payload = decode_from_position(
            &samples,
            0,
            &self.profile,
            &self.constellation,
            self.repetition,
            Some(data_symbols),
        );

        match chunk::decode_any(&payload) {
            Ok(Decoded::Metadata(m, true)) => {
                let (total_chunks, total_file_size, name) = (m.total_chunks, m.total_file_size, m.name.clone());
                let actual_bytes = 1 + 4 + 4 + 2 + 1 + name.len() + 4;
                let resume_at = self.resume_position(p1_pos, frame_end, actual_bytes);
                self.chunk_size_hint = Some(m.chunk_size as usize);
                self.assembler.accept_metadata(m).ok();
                (Some(ReceiverEvent::Metadata { total_chunks, total_file_size, name }), resume_at)
            }
            Ok(Decoded::DataChunk(c, crc_valid)) => {
                let seq_num = c.seq_num;
                let actual_bytes = 1 + 4 + 2 + c.data.len() + 4;
                let resume_at = self.resume_position(p1_pos, frame_end, actual_bytes);
                let accepted = self.assembler.accept_chunk(c, crc_valid).unwrap_or(false);
                if accepted && self.assembler.is_complete() {
                    if let Ok(file) = self.assembler.assemble() {
                        return (Some(ReceiverEvent::Complete { file }), resume_at);
                    }
                }
                (Some(ReceiverEvent::Chunk { seq_num, crc_valid }), resume_at)
            }
            Ok(Decoded::Metadata(_, false)) | Ok(Decoded::DataChunk(_, false)) | Err(_) => {
                (Some(ReceiverEvent::FrameCrcInvalid), frame_end)
            }
            Ok(Decoded::Legacy(_, _)) => (Some(ReceiverEvent::FrameCrcInvalid), frame_end),
        }
    }

    /// Where to resume scanning once a frame's real wire size is known:
    /// `p1_pos` plus the three preamble symbols plus however many data
    /// symbols `actual_bytes` really occupied, capped at `frame_end` (the
    /// estimate can only ever be an upper bound on the real frame).
    fn resume_position(&self, p1_pos: u64, frame_end: u64, actual_bytes: usize) -> u64 {
        let actual_symbols =
            frame_symbols_for_payload(&self.profile, self.constellation.kind(), self.repetition, actual_bytes);
        let actual_end = p1_pos + (3 + actual_symbols) as u64 * self.profile.symbol_len() as u64;
        actual_end.min(frame_end)
    }
}

/// OFDM symbol count for a frame carrying `payload_bytes` bytes of data
/// under the given profile/constellation/repetition.
fn frame_symbols_for_payload(
    profile: &Profile,
    constellation_kind: crate::dsp::ConstellationKind,
    repetition: u32,
    payload_bytes: usize,
) -> usize {
    let bits_per_ofdm = profile.bits_per_ofdm(constellation_kind.bits_per_symbol());
    let total_bits = payload_bytes * 8 * repetition as usize;
    (total_bits + bits_per_ofdm - 1) / bits_per_ofdm
}

/// Worst-case OFDM symbol count for a chunked-protocol frame under this
/// session: the larger of a maximum-length METADATA record and a
/// maximum-length DATA_CHUNK record. Used only to size the ring buffer
/// so it can always hold the largest frame that could actually arrive,
/// independent of the adaptive, two-phase estimate used to decide when
/// to attempt a decode (`estimated_frame_symbols`).
fn worst_case_frame_symbols(session: &SessionConfig) -> usize {
    use crate::chunk::MAX_CHUNK_NAME_LEN;

    let metadata_max_bytes = 1 + 4 + 4 + 2 + 1 + MAX_CHUNK_NAME_LEN + 4;
    let data_chunk_max_bytes = 1 + 4 + 2 + session.modulation.chunk_size_bytes() + 4;
    let max_bytes = metadata_max_bytes.max(data_chunk_max_bytes);

    frame_symbols_for_payload(&session.profile(), session.modulation.constellation_kind(), session.repetition(), max_bytes)
}
