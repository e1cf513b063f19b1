//! Per-announcement speech settings and the remaps applied to them.

use crate::defaults;
use serde::{Deserialize, Serialize};

/// Settings for one `speak` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoxSettings {
    /// Base URL or directory holding the clips, impulse responses and chimes.
    pub path: String,
    /// Impulse response file for the reverb; empty disables reverb.
    pub reverb: String,
    /// Chime file played before the announcement; empty disables the chime.
    pub chime: String,
    /// Volume, 0.0 to 1.9.
    pub volume: f64,
    /// Playback rate, 0.1 to 1.9.
    pub rate: f64,
}

impl Default for VoxSettings {
    fn default() -> Self {
        Self {
            path: defaults::VOX_PATH.to_string(),
            reverb: String::new(),
            chime: String::new(),
            volume: defaults::VOLUME,
            rate: defaults::RATE,
        }
    }
}

impl VoxSettings {
    /// Location of an asset file under the base path.
    pub fn asset_path(&self, file: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), file)
    }

    /// Location of the clip for a vox key.
    pub fn clip_path(&self, key: &str) -> String {
        self.asset_path(&format!("{}.{}", key, defaults::CLIP_EXTENSION))
    }

    /// Gain for the configured volume.
    pub fn gain(&self) -> f32 {
        volume_to_gain(self.volume) as f32
    }

    /// The configured rate, or 1.0 when it is unset or unusable.
    pub fn effective_rate(&self) -> f64 {
        if self.rate.is_finite() && self.rate > 0.0 {
            self.rate
        } else {
            defaults::RATE
        }
    }
}

/// Maps volume onto gain: values up to 1.0 pass through, 1.1..1.9 become 2..10.
/// Negative volumes mute.
pub fn volume_to_gain(volume: f64) -> f64 {
    if !volume.is_finite() {
        return defaults::VOLUME;
    }
    if volume <= 0.0 {
        return 0.0;
    }
    if volume > 1.0 {
        volume * 10.0 - 9.0
    } else {
        volume
    }
}

/// Compresses the 0.1..1.9 user rate range onto 0.82..1.45.
pub fn remap_rate(rate: f64) -> f64 {
    if rate < 1.0 {
        rate * 0.2 + 0.8
    } else if rate > 1.0 {
        rate * 0.5 + 0.5
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = VoxSettings::default();
        assert_eq!(settings.path, "data/vox");
        assert!(settings.reverb.is_empty());
        assert!(settings.chime.is_empty());
        assert_eq!(settings.volume, 1.0);
        assert_eq!(settings.rate, 1.0);
    }

    #[test]
    fn test_clip_path() {
        let settings = VoxSettings {
            path: "https://example.org/vox/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.clip_path("station.ABC.mid"),
            "https://example.org/vox/station.ABC.mid.mp3"
        );
        assert_eq!(
            settings.asset_path("ir.stalbans.wav"),
            "https://example.org/vox/ir.stalbans.wav"
        );
    }

    #[test]
    fn test_volume_remap() {
        assert_eq!(volume_to_gain(0.5), 0.5);
        assert_eq!(volume_to_gain(1.0), 1.0);
        assert!((volume_to_gain(1.1) - 2.0).abs() < 1e-9);
        assert!((volume_to_gain(1.9) - 10.0).abs() < 1e-9);
        assert_eq!(volume_to_gain(0.0), 0.0);
        assert_eq!(volume_to_gain(f64::NAN), 1.0);
        assert_eq!(volume_to_gain(-0.5), 0.0);
    }

    #[test]
    fn test_rate_remap() {
        assert!((remap_rate(0.5) - 0.9).abs() < 1e-9);
        assert!((remap_rate(0.1) - 0.82).abs() < 1e-9);
        assert_eq!(remap_rate(1.0), 1.0);
        assert!((remap_rate(1.5) - 1.25).abs() < 1e-9);
        assert!((remap_rate(1.9) - 1.45).abs() < 1e-9);
    }

    #[test]
    fn test_effective_rate() {
        let mut settings = VoxSettings::default();
        settings.rate = 0.0;
        assert_eq!(settings.effective_rate(), 1.0);
        settings.rate = 1.4;
        assert_eq!(settings.effective_rate(), 1.4);
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: VoxSettings = toml::from_str("rate = 1.2\nchime = \"chime.mp3\"").unwrap();
        assert_eq!(settings.rate, 1.2);
        assert_eq!(settings.chime, "chime.mp3");
        assert_eq!(settings.path, "data/vox");
    }
}
