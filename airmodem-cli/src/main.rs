mod config;
mod host_io;
mod logging;
mod transfer;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;

use airmodem_core::receiver::ReceiverEvent;
use config::CliConfig;
use host_io::{FileChunkStore, InMemoryChunkStore, WavAudioSink, WavAudioSource};
use logging::{LogEvent, StructuredLogger, TransferSummary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Acoustic OFDM file-transfer modem", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a file into an OFDM waveform and write it to a WAV file.
    Send {
        file: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        /// Inject AWGN at this SNR (dB) before writing, for bench testing.
        #[arg(long)]
        noise_db: Option<f64>,
    },
    /// Decode an OFDM waveform captured in a WAV file and write the
    /// recovered file to `--out`.
    Receive {
        wav: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        /// Persist chunks to disk under this directory as they arrive,
        /// instead of holding the whole transfer in memory.
        #[arg(long)]
        chunk_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let cli_config = match &args.config {
        Some(path) => CliConfig::from_file(path).wrap_err("failed to load config")?,
        None => CliConfig::default(),
    };
    let session = cli_config.session();
    session.validate().map_err(|e| eyre!(e.to_string()))?;

    let mut logger = StructuredLogger::new(cli_config.logging.clone())?;

    match args.command {
        Command::Send { file, out, noise_db } => run_send(&file, &out, &session, noise_db, &mut logger),
        Command::Receive { wav, out, chunk_dir } => {
            run_receive(&wav, &out, &session, chunk_dir, cli_config.feed_chunk_samples, &mut logger)
        }
    }
}

fn run_send(
    file: &PathBuf,
    out: &PathBuf,
    session: &airmodem_core::SessionConfig,
    noise_db: Option<f64>,
    logger: &mut StructuredLogger,
) -> Result<()> {
    use airmodem_core::host::AudioSink;

    let bytes = std::fs::read(file).wrap_err_with(|| format!("reading {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let chunked = bytes.len() > session.chunk_threshold;

    logger.log(LogEvent::TransferStart { name: name.clone(), total_bytes: bytes.len(), chunked })?;

    let profile = session.profile();
    let mut sink = WavAudioSink::create(out, profile.sample_rate).wrap_err("creating WAV output")?;

    let frame_count = if let Some(snr_db) = noise_db {
        let noise_std = 10f64.powf(-snr_db / 20.0);
        let rng = rand::rngs::StdRng::seed_from_u64(0);
        let mut noisy = NoisyAudioSink { inner: &mut sink, noise_std, rng };
        let (_, frame_count) =
            transfer::build_send_signal(&bytes, &name, session, &mut noisy).map_err(|e| eyre!(e.to_string()))?;
        frame_count
    } else {
        let (_, frame_count) =
            transfer::build_send_signal(&bytes, &name, session, &mut sink).map_err(|e| eyre!(e.to_string()))?;
        frame_count
    };

    sink.finalize().wrap_err("finalizing WAV output")?;

    let bar = ProgressBar::new(frame_count as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} frames encoded")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.finish_with_message(format!("wrote {} frames to {}", frame_count, out.display()));

    logger.log(LogEvent::TransferComplete(TransferSummary {
        timestamp: chrono::Utc::now(),
        duration_secs: logger.elapsed(),
        bytes_transferred: bytes.len(),
        chunks_total: frame_count,
        crc_errors: 0,
    }))?;

    Ok(())
}

/// Applies AWGN to each frame as it is handed to the wrapped sink, for the
/// `--noise-db` bench path; the transfer's per-frame pipelining means noise
/// is injected per-frame rather than over one materialized buffer.
struct NoisyAudioSink<'a, K: airmodem_core::host::AudioSink> {
    inner: &'a mut K,
    noise_std: f64,
    rng: rand::rngs::StdRng,
}

impl<'a, K: airmodem_core::host::AudioSink> airmodem_core::host::AudioSink for NoisyAudioSink<'a, K> {
    fn write(&mut self, samples: &[f32]) {
        let noisy = airmodem_core::channel::apply_audio_noise(samples, self.noise_std, &mut self.rng);
        self.inner.write(&noisy);
    }
}

fn run_receive(
    wav: &PathBuf,
    out: &PathBuf,
    session: &airmodem_core::SessionConfig,
    chunk_dir: Option<PathBuf>,
    feed_chunk_samples: usize,
    logger: &mut StructuredLogger,
) -> Result<()> {
    let is_wav = wav.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("wav")).unwrap_or(false);

    let samples = if is_wav {
        let (mut source, sample_rate) = WavAudioSource::open(wav).wrap_err("opening WAV input")?;
        if sample_rate != session.profile().sample_rate {
            logger.log(LogEvent::Warn {
                message: format!(
                    "WAV sample rate {sample_rate} Hz differs from profile's {} Hz; decode may fail",
                    session.profile().sample_rate
                ),
            })?;
        }
        source.drain()
    } else {
        logger.log(LogEvent::Info {
            message: format!("decoding {} via symphonia, resampling to {} Hz", wav.display(), session.profile().sample_rate),
        })?;
        airmodem_core::external_audio::load_audio_file(wav, session.profile().sample_rate)
            .map_err(|e| eyre!(e.to_string()))?
    };

    let bar = ProgressBar::new_spinner();
    bar.set_message("scanning for preamble...");

    let mut events_seen = Vec::new();
    let received = match &chunk_dir {
        Some(dir) => {
            let store = FileChunkStore::new(dir.as_path()).wrap_err("creating chunk store directory")?;
            transfer::receive_from_samples(&samples, session, store, feed_chunk_samples, |e| {
                events_seen.push(e.clone())
            })
        }
        None => transfer::receive_from_samples(
            &samples,
            session,
            InMemoryChunkStore::new(),
            feed_chunk_samples,
            |e| events_seen.push(e.clone()),
        ),
    };

    for event in &events_seen {
        match event {
            ReceiverEvent::Chunk { seq_num, crc_valid } => {
                logger.log(LogEvent::ChunkEvent { seq_num: *seq_num, crc_valid: *crc_valid })?;
            }
            ReceiverEvent::FrameCrcInvalid => {
                logger.log(LogEvent::Warn { message: "frame CRC invalid, discarded".to_string() })?;
            }
            _ => {}
        }
    }

    let received = received.ok_or_else(|| eyre!("no complete transfer recovered from {}", wav.display()))?;
    bar.finish_and_clear();

    let out_path = if out.is_dir() || out.extension().is_none() {
        std::fs::create_dir_all(out).ok();
        out.join(if received.name.is_empty() { "received.bin".to_string() } else { received.name.clone() })
    } else {
        out.clone()
    };
    std::fs::write(&out_path, &received.data).wrap_err_with(|| format!("writing {}", out_path.display()))?;

    logger.log(LogEvent::TransferComplete(TransferSummary {
        timestamp: chrono::Utc::now(),
        duration_secs: logger.elapsed(),
        bytes_transferred: received.data.len(),
        chunks_total: received.chunk_events.len().max(1),
        crc_errors: received.crc_errors,
    }))?;

    Ok(())
}
