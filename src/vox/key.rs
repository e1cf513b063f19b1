//! Vox keys: the instructions a resolved announcement is made of.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a resolved announcement.
///
/// A clip key names a pre-recorded fragment (`"station.ABC.mid"`); a silence
/// is a pause in seconds that delays the next clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoxKey {
    Silence(f64),
    Clip(String),
}

impl VoxKey {
    /// Returns true if this key is a silence.
    pub fn is_silence(&self) -> bool {
        matches!(self, VoxKey::Silence(_))
    }

    /// Returns the clip id, if this key is a clip.
    pub fn as_clip(&self) -> Option<&str> {
        match self {
            VoxKey::Clip(id) => Some(id),
            VoxKey::Silence(_) => None,
        }
    }
}

impl From<f64> for VoxKey {
    fn from(seconds: f64) -> Self {
        VoxKey::Silence(seconds)
    }
}

impl From<&str> for VoxKey {
    fn from(id: &str) -> Self {
        VoxKey::Clip(id.to_string())
    }
}

impl From<String> for VoxKey {
    fn from(id: String) -> Self {
        VoxKey::Clip(id)
    }
}

impl fmt::Display for VoxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoxKey::Silence(seconds) => write!(f, "{}", seconds),
            VoxKey::Clip(id) => write!(f, "{}", id),
        }
    }
}

/// Parses command-line style keys: anything that reads as a number is a
/// silence, everything else is a clip id.
impl FromStr for VoxKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty vox key".to_string());
        }
        match s.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(VoxKey::Silence(seconds)),
            Ok(_) => Err(format!("invalid silence duration: {}", s)),
            Err(_) => Ok(VoxKey::Clip(s.to_string())),
        }
    }
}

/// Builds a `Vec<VoxKey>` from a mix of numbers and clip ids.
///
/// ```
/// use railvox::vox;
/// let keys = vox![0.2, "station.ABC.mid", 0.2];
/// assert_eq!(keys.len(), 3);
/// ```
#[macro_export]
macro_rules! vox {
    ($($key:expr),* $(,)?) => {
        vec![$($crate::vox::VoxKey::from($key)),*]
    };
}

/// Formats a key sequence the way it is logged and printed by the CLI.
pub fn format_keys(keys: &[VoxKey]) -> String {
    keys.iter()
        .map(|k| match k {
            VoxKey::Silence(s) => format!("{}", s),
            VoxKey::Clip(id) => format!("\"{}\"", id),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_is_silence() {
        assert_eq!("0.65".parse::<VoxKey>().unwrap(), VoxKey::Silence(0.65));
        assert_eq!("1".parse::<VoxKey>().unwrap(), VoxKey::Silence(1.0));
    }

    #[test]
    fn test_parse_text_is_clip() {
        assert_eq!(
            "station.ABC.mid".parse::<VoxKey>().unwrap(),
            VoxKey::Clip("station.ABC.mid".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_negative_and_empty() {
        assert!("-0.5".parse::<VoxKey>().is_err());
        assert!("   ".parse::<VoxKey>().is_err());
    }

    #[test]
    fn test_json_untagged() {
        let keys: Vec<VoxKey> = serde_json::from_str(r#"[0.2, "letter.A.mid", 0.2]"#).unwrap();
        assert_eq!(keys, vox![0.2, "letter.A.mid", 0.2]);
        assert_eq!(
            serde_json::to_string(&keys).unwrap(),
            r#"[0.2,"letter.A.mid",0.2]"#
        );
    }

    #[test]
    fn test_format_keys() {
        let keys = vox![0.2, "station.ABC.end"];
        assert_eq!(format_keys(&keys), r#"0.2, "station.ABC.end""#);
    }

    #[test]
    fn test_accessors() {
        assert!(VoxKey::Silence(0.1).is_silence());
        assert_eq!(VoxKey::from("a.b").as_clip(), Some("a.b"));
        assert_eq!(VoxKey::Silence(0.1).as_clip(), None);
    }
}
