//! Structured logging for the `send`/`receive` CLI commands: JSON, logfmt,
//! or human-readable lines over a transfer's lifecycle, selectable per
//! deployment the same way the core signal logger's level/subsystem
//! filters are.

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::{LogFormat, LogTarget, LoggingConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    TransferStart { name: String, total_bytes: usize, chunked: bool },
    ChunkEvent { seq_num: u32, crc_valid: bool },
    TransferComplete(TransferSummary),
    Info { message: String },
    Warn { message: String },
    Error { message: String, details: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub bytes_transferred: usize,
    pub chunks_total: usize,
    pub crc_errors: u64,
}

pub struct StructuredLogger {
    config: LoggingConfig,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match &config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config
                    .file_path
                    .as_ref()
                    .ok_or_else(|| color_eyre::eyre::eyre!("file path required for file logging"))?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self { config, writer, start_time: Utc::now() })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let output = match self.config.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Logfmt => self.format_logfmt(&event),
            LogFormat::Pretty => self.format_pretty(&event),
        };
        writeln!(self.writer, "{output}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_logfmt(&self, event: &LogEvent) -> String {
        let ts = Utc::now().to_rfc3339();
        match event {
            LogEvent::TransferStart { name, total_bytes, chunked } => format!(
                "ts=\"{ts}\" type=transfer_start name=\"{name}\" bytes={total_bytes} chunked={chunked}"
            ),
            LogEvent::ChunkEvent { seq_num, crc_valid } => {
                format!("ts=\"{ts}\" type=chunk seq={seq_num} crc_valid={crc_valid}")
            }
            LogEvent::TransferComplete(s) => format!(
                "ts=\"{ts}\" type=complete duration_secs={:.2} bytes={} chunks={} crc_errors={}",
                s.duration_secs, s.bytes_transferred, s.chunks_total, s.crc_errors
            ),
            LogEvent::Info { message } => format!("ts=\"{ts}\" level=info msg=\"{message}\""),
            LogEvent::Warn { message } => format!("ts=\"{ts}\" level=warn msg=\"{message}\""),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("ts=\"{ts}\" level=error msg=\"{message}\" details=\"{d}\""),
                None => format!("ts=\"{ts}\" level=error msg=\"{message}\""),
            },
        }
    }

    fn format_pretty(&self, event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::TransferStart { name, total_bytes, chunked } => format!(
                "[{ts}] START: {name} ({total_bytes} bytes, {})",
                if *chunked { "chunked" } else { "legacy" }
            ),
            LogEvent::ChunkEvent { seq_num, crc_valid } => format!(
                "[{ts}] CHUNK {seq_num}: {}",
                if *crc_valid { "ok" } else { "CRC MISMATCH" }
            ),
            LogEvent::TransferComplete(s) => format!(
                "[{ts}] COMPLETE ({:.2}s): {} bytes, {} chunks, {} CRC errors",
                s.duration_secs, s.bytes_transferred, s.chunks_total, s.crc_errors
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
            LogEvent::Warn { message } => format!("[{ts}] WARN: {message}"),
            LogEvent::Error { message, details } => match details {
                Some(d) => format!("[{ts}] ERROR: {message} | {d}"),
                None => format!("[{ts}] ERROR: {message}"),
            },
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
