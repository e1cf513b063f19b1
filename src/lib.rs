//! railvox - Railway announcements from pre-recorded clips
//!
//! Resolves announcement phrases into clip sequences and plays them gaplessly
//! through a small effects graph.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod phrase;
pub mod vox;

// L4 composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Core traits (fetch → decode → render)
pub use audio::graph::OutputDevice;
pub use phrase::state::PhraseState;
pub use vox::decode::ClipDecoder;
pub use vox::fetch::ClipFetcher;

// Resolution and playback
pub use audio::graph::AudioContext;
pub use phrase::{AnnouncementState, PhraseElement, PhraseNode, Resolver, to_vox};
pub use vox::engine::{EngineStatus, VoxEngine};
pub use vox::key::VoxKey;
pub use vox::settings::VoxSettings;

// Error handling
pub use error::{Result, VoxError};

// Config
pub use config::{AudioConfig, Config};
