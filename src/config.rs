use crate::defaults;
use crate::vox::settings::VoxSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub vox: VoxSettings,
    pub audio: AudioConfig,
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name; `None` picks the best default.
    pub device: Option<String>,
    /// Sample rate used when recording to a WAV file.
    pub record_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            record_sample_rate: defaults::RECORD_SAMPLE_RATE,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - RAILVOX_VOX_PATH → vox.path
    /// - RAILVOX_AUDIO_DEVICE → audio.device
    /// - RAILVOX_VOLUME → vox.volume
    /// - RAILVOX_RATE → vox.rate
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("RAILVOX_VOX_PATH")
            && !path.is_empty()
        {
            self.vox.path = path;
        }

        if let Ok(device) = std::env::var("RAILVOX_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Some(volume) = env_number("RAILVOX_VOLUME") {
            self.vox.volume = volume;
        }

        if let Some(rate) = env_number("RAILVOX_RATE") {
            self.vox.rate = rate;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/railvox/config.toml on Linux, or a relative
    /// `railvox/config.toml` when no config directory is known.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("railvox")
            .join("config.toml")
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn env_number(key: &str) -> Option<f64> {
    let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => {
            warn!("ignoring {}={:?}: not a number", key, value);
            None
        }
    }
}
