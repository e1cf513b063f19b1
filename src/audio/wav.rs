//! WAV recorder output: renders the graph in real time and keeps the result
//! for writing to a file.

use crate::audio::graph::{OutputDevice, Renderer};
use crate::defaults;
use crate::error::{Result, VoxError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Output device that records instead of playing.
///
/// A background thread pulls one render period at a time, paced by the wall
/// clock, so sessions are scheduled exactly as they would be on a sound card.
pub struct WavRecorder {
    sample_rate: u32,
    renderer: Option<Renderer>,
    samples: Arc<Mutex<Vec<f32>>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Handle to the audio captured by a [`WavRecorder`].
#[derive(Clone)]
pub struct Recording {
    sample_rate: u32,
    samples: Arc<Mutex<Vec<f32>>>,
    running: Arc<AtomicBool>,
}

impl WavRecorder {
    /// Creates a recorder and the handle used to retrieve its audio.
    pub fn new(sample_rate: u32) -> (Self, Recording) {
        let samples = Arc::new(Mutex::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(false));
        let recording = Recording {
            sample_rate,
            samples: Arc::clone(&samples),
            running: Arc::clone(&running),
        };
        let recorder = Self {
            sample_rate,
            renderer: None,
            samples,
            running,
            thread: None,
        };
        (recorder, recording)
    }
}

impl OutputDevice for WavRecorder {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn attach(&mut self, renderer: Renderer) -> Result<()> {
        self.renderer = Some(renderer);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.thread.is_none()
    }

    fn resume(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }
        let renderer = self.renderer.clone().ok_or_else(|| VoxError::AudioOutput {
            message: "recorder not attached".to_string(),
        })?;

        let period = Duration::from_millis(defaults::RECORD_PERIOD_MS);
        let frames = (self.sample_rate as u64 * defaults::RECORD_PERIOD_MS / 1000) as usize;
        let samples = Arc::clone(&self.samples);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("railvox-recorder".to_string())
            .spawn(move || {
                let mut block = vec![0.0f32; frames.max(1)];
                while running.load(Ordering::SeqCst) {
                    renderer.render(&mut block, 1);
                    match samples.lock() {
                        Ok(mut buf) => buf.extend_from_slice(&block),
                        Err(_) => break,
                    }
                    thread::sleep(period);
                }
            })?;
        self.thread = Some(handle);
        debug!(sample_rate = self.sample_rate, "recorder started");
        Ok(())
    }
}

impl Drop for WavRecorder {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            warn!("recorder thread panicked");
        }
    }
}

impl Recording {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stops capturing. Audio rendered so far is kept.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Copy of the samples captured so far.
    pub fn samples(&self) -> Vec<f32> {
        self.samples
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Stops capturing and writes the audio as 16-bit mono PCM.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        self.stop();
        write_wav(path, &self.samples(), self.sample_rate)
    }
}

/// Writes mono samples to a 16-bit PCM WAV file.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| VoxError::AudioOutput {
        message: format!("Failed to create WAV file {}: {}", path.display(), e),
    })?;
    for &s in samples {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .map_err(|e| VoxError::AudioOutput {
                message: format!("Failed to write WAV sample: {}", e),
            })?;
    }
    writer.finalize().map_err(|e| VoxError::AudioOutput {
        message: format!("Failed to finalize WAV file: {}", e),
    })?;
    Ok(())
}
