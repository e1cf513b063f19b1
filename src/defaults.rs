//! Default configuration constants for railvox.
//!
//! Shared by the engine, the resolver and the configuration types so the
//! timing and sizing numbers live in one place.

/// Default base path (URL or directory) holding the vox clips.
pub const VOX_PATH: &str = "data/vox";

/// File extension appended to every clip key.
pub const CLIP_EXTENSION: &str = "mp3";

/// Default volume. Values above 1.0 are remapped onto a 2..10 gain range.
pub const VOLUME: f64 = 1.0;

/// Default playback rate.
pub const RATE: f64 = 1.0;

/// Maximum number of clip requests in flight per session.
pub const MAX_PENDING_REQUESTS: usize = 10;

/// Maximum number of clips scheduled on the output at once.
pub const MAX_LIVE_CLIPS: usize = 6;

/// Interval between pump ticks in milliseconds.
pub const PUMP_INTERVAL_MS: u64 = 100;

/// Output base latency assumed when the device does not report one (seconds).
pub const BASE_LATENCY: f64 = 0.01;

/// Fixed overlap subtracted between consecutive clips, on top of the
/// output base latency (seconds).
pub const LATENCY_COMPENSATION: f64 = 0.15;

/// Silence inserted between the chime and the first spoken clip (seconds).
pub const CHIME_GAP: f64 = 1.0;

/// Playback rate forced on the chime, whatever the voice rate.
pub const CHIME_RATE: f64 = 1.0;

/// High-pass filter cutoff in Hz.
pub const HIGHPASS_FREQUENCY: f32 = 350.0;

/// High-pass filter Q.
pub const HIGHPASS_Q: f32 = 0.4;

/// Partition size of the convolution reverb, in frames.
pub const REVERB_BLOCK_SIZE: usize = 512;

/// Output sample rate used when recording to a WAV file.
pub const RECORD_SAMPLE_RATE: u32 = 44100;

/// Render period of the WAV recorder in milliseconds.
pub const RECORD_PERIOD_MS: u64 = 10;

/// Silence durations emitted by the resolver, in seconds.
pub mod silence {
    /// Full stop.
    pub const SENTENCE: f64 = 0.65;
    /// Around coach letters, station names and named trains.
    pub const SLOT: f64 = 0.2;
    /// Around excuses, platforms, services and integer suffixes.
    pub const SHORT: f64 = 0.15;
    /// Before an integer.
    pub const INTEGER: f64 = 0.125;
    /// Between stations of a list.
    pub const LIST: f64 = 0.25;
    /// Between the hour and "hundred".
    pub const HUNDRED: f64 = 0.075;
}
