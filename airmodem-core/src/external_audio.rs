//! Decode a recorded/captured audio file (MP3, M4A, WAV, FLAC, ...) via
//! `symphonia` and resample it to the modem's sample rate via `rubato`.
//! Used by the CLI's `receive` path when the input isn't already a raw
//! WAV at the profile's native rate.

use std::fs::File;
use std::path::Path;

use rubato::{FastFixedIn, Resampler};
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::errors::AudioError;

/// Decode `path` to mono f32 samples and resample to `target_sample_rate`.
pub fn load_audio_file(path: &Path, target_sample_rate: usize) -> Result<Vec<f32>, AudioError> {
    let file = File::open(path).map_err(|e| AudioError::LoadFailed {
        path: path.to_string_lossy().into_owned(),
        reason: format!("failed to open file: {e}"),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext_str);
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| AudioError::LoadFailed {
            path: path.to_string_lossy().into_owned(),
            reason: format!("failed to probe format: {e}"),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::LoadFailed {
            path: path.to_string_lossy().into_owned(),
            reason: "no audio track found".to_string(),
        })?;

    let track_id = track.id;
    let source_sample_rate = track.codec_params.sample_rate.ok_or_else(|| AudioError::LoadFailed {
        path: path.to_string_lossy().into_owned(),
        reason: "unknown sample rate".to_string(),
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| AudioError::LoadFailed {
            path: path.to_string_lossy().into_owned(),
            reason: format!("failed to create decoder: {e}"),
        })?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }
        if let Ok(decoded) = decoder.decode(&packet) {
            samples.extend_from_slice(&convert_to_mono_f32(&decoded));
        }
    }

    if samples.is_empty() {
        return Err(AudioError::LoadFailed {
            path: path.to_string_lossy().into_owned(),
            reason: "no audio samples decoded".to_string(),
        });
    }

    if source_sample_rate as usize != target_sample_rate {
        resample_audio(&samples, source_sample_rate as usize, target_sample_rate)
    } else {
        Ok(samples)
    }
}

fn convert_to_mono_f32(buffer: &AudioBufferRef) -> Vec<f32> {
    macro_rules! mix_down {
        ($buf:expr, $to_f32:expr) => {{
            let channels = $buf.spec().channels.count();
            let frames = $buf.frames();
            let mut mono = Vec::with_capacity(frames);
            for i in 0..frames {
                let mut sum = 0.0f32;
                for ch in 0..channels {
                    sum += $to_f32($buf.chan(ch)[i]);
                }
                mono.push(sum / channels as f32);
            }
            mono
        }};
    }

    match buffer {
        AudioBufferRef::F32(buf) => mix_down!(buf, |v: f32| v),
        AudioBufferRef::F64(buf) => mix_down!(buf, |v: f64| v as f32),
        AudioBufferRef::U8(buf) => mix_down!(buf, |v: u8| (v as f32 - 128.0) / 128.0),
        AudioBufferRef::U16(buf) => mix_down!(buf, |v: u16| (v as f32 - 32768.0) / 32768.0),
        AudioBufferRef::U24(buf) => mix_down!(buf, |v: symphonia::core::sample::u24| (v.inner() as i32 - 8_388_608) as f32 / 8_388_608.0),
        AudioBufferRef::U32(buf) => mix_down!(buf, |v: u32| (v as f32 - 2_147_483_648.0) / 2_147_483_648.0),
        AudioBufferRef::S8(buf) => mix_down!(buf, |v: i8| v as f32 / 128.0),
        AudioBufferRef::S16(buf) => mix_down!(buf, |v: i16| v as f32 / 32768.0),
        AudioBufferRef::S24(buf) => mix_down!(buf, |v: symphonia::core::sample::i24| v.inner() as f32 / 8_388_608.0),
        AudioBufferRef::S32(buf) => mix_down!(buf, |v: i32| v as f32 / 2_147_483_648.0),
    }
}

fn resample_audio(samples: &[f32], source_rate: usize, target_rate: usize) -> Result<Vec<f32>, AudioError> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = source_rate;
    let mut resampler = FastFixedIn::<f32>::new(
        target_rate as f64 / source_rate as f64,
        1.0,
        rubato::PolynomialDegree::Linear,
        chunk_size,
        1,
    )
    .map_err(|e| AudioError::ResampleFailed { reason: format!("failed to create resampler: {e}") })?;

    let mut output = Vec::new();
    let mut input_buf = vec![Vec::new(); 1];

    for chunk in samples.chunks(chunk_size) {
        input_buf[0].clear();
        input_buf[0].extend_from_slice(chunk);
        if input_buf[0].len() < chunk_size {
            input_buf[0].resize(chunk_size, 0.0);
        }

        let out = resampler
            .process(&input_buf, None)
            .map_err(|e| AudioError::ResampleFailed { reason: format!("resampling failed: {e}") })?;
        output.extend_from_slice(&out[0]);
    }

    Ok(output)
}

/// Loop or truncate `audio` to match `target_length`, for mixing captured
/// background audio behind a transmission in test harnesses.
pub fn prepare_audio_for_mixing(audio: &[f32], target_length: usize, loop_audio: bool) -> Vec<f32> {
    if audio.is_empty() {
        return vec![0.0; target_length];
    }
    if audio.len() == target_length {
        return audio.to_vec();
    }
    if audio.len() > target_length {
        return audio[..target_length].to_vec();
    }
    if !loop_audio {
        let mut result = audio.to_vec();
        result.resize(target_length, 0.0);
        return result;
    }

    let mut result = Vec::with_capacity(target_length);
    let full_loops = target_length / audio.len();
    let remainder = target_length % audio.len();
    for _ in 0..full_loops {
        result.extend_from_slice(audio);
    }
    if remainder > 0 {
        result.extend_from_slice(&audio[..remainder]);
    }
    result
}
