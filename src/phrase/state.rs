//! Slot values the resolver reads while walking a phrase.

use crate::error::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A platform number with an optional letter suffix, e.g. `2` + `a`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub number: String,
    #[serde(default)]
    pub letter: String,
}

impl Platform {
    pub fn new(number: &str, letter: &str) -> Self {
        Self {
            number: number.to_string(),
            letter: letter.to_string(),
        }
    }
}

/// Source of slot values, keyed by the slot's context where slots of the
/// same type can appear more than once in a phrase.
///
/// `None` means the slot has no value; it is then not spoken.
pub trait PhraseState {
    fn coach(&self, context: &str) -> Option<&str>;
    fn excuse(&self) -> Option<&str>;
    fn integer(&self, context: &str) -> Option<i64>;
    fn named(&self) -> Option<&str>;
    fn platform(&self) -> Option<&Platform>;
    fn service(&self, context: &str) -> Option<&str>;
    /// Station code, e.g. `"CRE"`.
    fn station(&self, context: &str) -> Option<&str>;
    fn station_list(&self, context: &str) -> Option<&[String]>;
    /// Time as `"HH:MM"`.
    fn time(&self, context: &str) -> Option<&str>;
}

/// Slot values for one announcement, loadable from TOML or JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementState {
    pub coaches: BTreeMap<String, String>,
    pub excuse: Option<String>,
    pub integers: BTreeMap<String, i64>,
    pub named: Option<String>,
    pub platform: Option<Platform>,
    pub services: BTreeMap<String, String>,
    pub stations: BTreeMap<String, String>,
    pub station_lists: BTreeMap<String, Vec<String>>,
    pub times: BTreeMap<String, String>,
}

impl AnnouncementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads state from a `.json` file, or TOML for any other extension.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            toml::from_str(&content).map_err(VoxError::from)
        }
    }

    pub fn with_coach(mut self, context: &str, letter: &str) -> Self {
        self.coaches.insert(context.to_string(), letter.to_string());
        self
    }

    pub fn with_excuse(mut self, excuse: &str) -> Self {
        self.excuse = Some(excuse.to_string());
        self
    }

    pub fn with_integer(mut self, context: &str, value: i64) -> Self {
        self.integers.insert(context.to_string(), value);
        self
    }

    pub fn with_named(mut self, name: &str) -> Self {
        self.named = Some(name.to_string());
        self
    }

    pub fn with_platform(mut self, number: &str, letter: &str) -> Self {
        self.platform = Some(Platform::new(number, letter));
        self
    }

    pub fn with_service(mut self, context: &str, service: &str) -> Self {
        self.services.insert(context.to_string(), service.to_string());
        self
    }

    pub fn with_station(mut self, context: &str, code: &str) -> Self {
        self.stations.insert(context.to_string(), code.to_string());
        self
    }

    pub fn with_station_list(mut self, context: &str, codes: &[&str]) -> Self {
        self.station_lists.insert(
            context.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn with_time(mut self, context: &str, time: &str) -> Self {
        self.times.insert(context.to_string(), time.to_string());
        self
    }
}

impl PhraseState for AnnouncementState {
    fn coach(&self, context: &str) -> Option<&str> {
        self.coaches.get(context).map(String::as_str)
    }

    fn excuse(&self) -> Option<&str> {
        self.excuse.as_deref()
    }

    fn integer(&self, context: &str) -> Option<i64> {
        self.integers.get(context).copied()
    }

    fn named(&self) -> Option<&str> {
        self.named.as_deref()
    }

    fn platform(&self) -> Option<&Platform> {
        self.platform.as_ref()
    }

    fn service(&self, context: &str) -> Option<&str> {
        self.services.get(context).map(String::as_str)
    }

    fn station(&self, context: &str) -> Option<&str> {
        self.stations.get(context).map(String::as_str)
    }

    fn station_list(&self, context: &str) -> Option<&[String]> {
        self.station_lists.get(context).map(Vec::as_slice)
    }

    fn time(&self, context: &str) -> Option<&str> {
        self.times.get(context).map(String::as_str)
    }
}
