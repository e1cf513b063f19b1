//! Audio rendering: decoded buffers, the effects graph and output devices.

pub mod buffer;
pub mod filter;
pub mod graph;
#[cfg(feature = "cpal-audio")]
pub mod output;
pub mod reverb;
pub mod wav;

pub use buffer::AudioBuffer;
pub use graph::{AudioContext, ManualOutput, OutputDevice, Renderer, VoiceId, VoiceInfo};
pub use reverb::Convolver;
pub use wav::{Recording, WavRecorder};
