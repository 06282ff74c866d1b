//! CLI-specific configuration: a single flat TOML document.
//!
//! No `include` merge chain — a session needs one modulation choice and a
//! handful of paths, not a layered preset system.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use airmodem_core::{Modulation, SessionConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_modulation")]
    pub modulation: Modulation,

    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    /// Feed the receiver this many samples per `feed()` call, simulating a
    /// live capture stream instead of handing it the whole WAV at once.
    #[serde(default = "default_feed_chunk_samples")]
    pub feed_chunk_samples: usize,

    /// SNR, in dB, for the optional AWGN noise-injection test mode
    /// (`send --noise-db`); `None` means no noise is added.
    #[serde(default)]
    pub snr_db: Option<f64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_chunk_threshold() -> usize {
    airmodem_core::config::CHUNK_THRESHOLD_BYTES
}

fn default_feed_chunk_samples() -> usize {
    4096
}

fn default_modulation() -> Modulation {
    Modulation::Qpsk
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            modulation: default_modulation(),
            chunk_threshold: default_chunk_threshold(),
            feed_chunk_samples: default_feed_chunk_samples(),
            snr_db: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&content).wrap_err("failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig { modulation: self.modulation, chunk_threshold: self.chunk_threshold }
    }
}

/// Logging output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_target")]
    pub target: LogTarget,

    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_target() -> LogTarget {
    LogTarget::Stderr
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            target: default_log_target(),
            file_path: None,
            format: default_log_format(),
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Stdout,
    Stderr,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Logfmt,
    Pretty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let cfg = CliConfig::default();
        assert!(cfg.session().validate().is_ok());
    }

    #[test]
    fn parses_minimal_toml() {
        let toml_str = "modulation = \"BpskRepeat\"\n";
        let cfg: CliConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.modulation, Modulation::BpskRepeat);
        assert_eq!(cfg.chunk_threshold, default_chunk_threshold());
    }
}
