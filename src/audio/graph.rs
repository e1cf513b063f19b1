//! The rendering context: scheduled voices mixed through gain, a high-pass
//! filter and an optional convolution reverb.
//!
//! Time is counted in rendered output frames, so the clock only advances while
//! an output device pulls audio. Voices are scheduled against that clock and
//! report their end over a channel that the engine drains on each pump tick.

use crate::audio::buffer::AudioBuffer;
use crate::audio::filter::HighpassFilter;
use crate::audio::reverb::Convolver;
use crate::defaults;
use crate::error::{Result, VoxError};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifies a scheduled voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

/// Read-only description of a scheduled voice.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceInfo {
    pub id: VoiceId,
    /// Scheduled start, in seconds on the context clock.
    pub start: f64,
    pub rate: f64,
    /// Duration of the underlying buffer at rate 1, in seconds.
    pub duration: f64,
    pub playing: bool,
}

struct Voice {
    id: VoiceId,
    buffer: Arc<AudioBuffer>,
    rate: f64,
    start_frame: u64,
    /// Read position in source frames.
    position: f64,
    /// Source frames advanced per output frame.
    step: f64,
}

impl Voice {
    fn next_sample(&mut self) -> Option<f32> {
        let samples = self.buffer.samples();
        let idx = self.position as usize;
        if idx >= samples.len() {
            return None;
        }
        let frac = (self.position - idx as f64) as f32;
        let a = samples[idx];
        let b = samples.get(idx + 1).copied().unwrap_or(0.0);
        self.position += self.step;
        Some(a + (b - a) * frac)
    }
}

/// Mixer state shared between the engine and the output callback.
pub struct EffectsGraph {
    sample_rate: u32,
    frame: u64,
    gain: f32,
    filter: HighpassFilter,
    reverb: Option<Convolver>,
    voices: Vec<Voice>,
    next_voice: u64,
    ended_tx: Sender<VoiceId>,
}

impl EffectsGraph {
    fn new(sample_rate: u32, ended_tx: Sender<VoiceId>) -> Self {
        Self {
            sample_rate,
            frame: 0,
            gain: 1.0,
            filter: HighpassFilter::new(
                defaults::HIGHPASS_FREQUENCY,
                defaults::HIGHPASS_Q,
                sample_rate,
            ),
            reverb: None,
            voices: Vec::new(),
            next_voice: 0,
            ended_tx,
        }
    }

    fn render_frame(&mut self) -> f32 {
        let now = self.frame;
        let mut mix = 0.0;
        let mut ended = Vec::new();

        for voice in self.voices.iter_mut() {
            if now < voice.start_frame {
                continue;
            }
            match voice.next_sample() {
                Some(s) => mix += s,
                None => ended.push(voice.id),
            }
        }

        if !ended.is_empty() {
            self.voices.retain(|v| !ended.contains(&v.id));
            for id in ended {
                // Receiver dropped: the context is gone.
                if self.ended_tx.send(id).is_err() {
                    break;
                }
            }
        }

        let mut out = self.filter.process(mix * self.gain);
        if let Some(reverb) = self.reverb.as_mut() {
            out = reverb.process(out);
        }
        self.frame += 1;
        out
    }

    /// Renders interleaved output, writing the same mono signal to every channel.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let value = self.render_frame().clamp(-1.0, 1.0);
            for sample in frame.iter_mut() {
                *sample = value;
            }
        }
    }
}

/// Handle an output device uses to pull mixed audio from the graph.
#[derive(Clone)]
pub struct Renderer {
    graph: Arc<Mutex<EffectsGraph>>,
}

impl Renderer {
    /// Renders into `out`. On a poisoned graph the output is silenced.
    pub fn render(&self, out: &mut [f32], channels: usize) {
        match self.graph.lock() {
            Ok(mut graph) => graph.render(out, channels),
            Err(_) => out.fill(0.0),
        }
    }
}

/// A device that pulls audio from a [`Renderer`].
///
/// Implementations: the cpal output stream, the WAV recorder, and
/// [`ManualOutput`] for driving the clock by hand.
pub trait OutputDevice: Send {
    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Output latency reported by the device, in seconds.
    fn base_latency(&self) -> Option<f64> {
        None
    }

    /// Connects the device to the graph. Called once by [`AudioContext::new`];
    /// the device must stay suspended until [`OutputDevice::resume`].
    fn attach(&mut self, renderer: Renderer) -> Result<()>;

    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> Result<()>;
}

/// Output device whose clock only moves when the caller renders through
/// [`AudioContext::renderer`].
pub struct ManualOutput {
    sample_rate: u32,
    base_latency: Option<f64>,
    attached: bool,
    suspended: bool,
    fail_attach: bool,
}

impl ManualOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            base_latency: None,
            attached: false,
            suspended: true,
            fail_attach: false,
        }
    }

    pub fn with_base_latency(mut self, seconds: f64) -> Self {
        self.base_latency = Some(seconds);
        self
    }

    /// Configure the device to fail on attach.
    pub fn with_attach_failure(mut self) -> Self {
        self.fail_attach = true;
        self
    }
}

impl OutputDevice for ManualOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn base_latency(&self) -> Option<f64> {
        self.base_latency
    }

    fn attach(&mut self, _renderer: Renderer) -> Result<()> {
        if self.fail_attach {
            return Err(VoxError::AudioOutput {
                message: "manual output refused to attach".to_string(),
            });
        }
        self.attached = true;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<()> {
        if !self.attached {
            return Err(VoxError::AudioOutput {
                message: "manual output is not attached".to_string(),
            });
        }
        self.suspended = false;
        Ok(())
    }
}

/// The rendering context shared by every speech session.
pub struct AudioContext {
    graph: Arc<Mutex<EffectsGraph>>,
    device: Mutex<Box<dyn OutputDevice>>,
    ended_rx: Receiver<VoiceId>,
    sample_rate: u32,
    base_latency: Option<f64>,
}

impl AudioContext {
    /// Builds the graph and attaches it to `device`.
    ///
    /// # Errors
    /// Returns the device's error if it cannot be attached. Nothing can be
    /// spoken without a context, so callers should fall back to another voice.
    pub fn new(mut device: Box<dyn OutputDevice>) -> Result<Self> {
        let sample_rate = device.sample_rate();
        if sample_rate == 0 {
            return Err(VoxError::AudioOutput {
                message: "output device reported a sample rate of 0".to_string(),
            });
        }

        let (ended_tx, ended_rx) = unbounded();
        let graph = Arc::new(Mutex::new(EffectsGraph::new(sample_rate, ended_tx)));
        device.attach(Renderer {
            graph: Arc::clone(&graph),
        })?;

        Ok(Self {
            base_latency: device.base_latency(),
            graph,
            device: Mutex::new(device),
            ended_rx,
            sample_rate,
        })
    }

    /// Convenience constructor for a [`ManualOutput`] context.
    pub fn manual(sample_rate: u32) -> Result<Self> {
        Self::new(Box::new(ManualOutput::new(sample_rate)))
    }

    fn graph(&self) -> MutexGuard<'_, EffectsGraph> {
        // The graph holds no invariants a panicking renderer could break
        // halfway, so a poisoned lock is still usable.
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A renderer for driving the clock directly (tests, offline use).
    pub fn renderer(&self) -> Renderer {
        Renderer {
            graph: Arc::clone(&self.graph),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn base_latency(&self) -> Option<f64> {
        self.base_latency
    }

    /// Current time on the output clock, in seconds.
    pub fn current_time(&self) -> f64 {
        self.graph().frame as f64 / self.sample_rate as f64
    }

    pub fn is_suspended(&self) -> bool {
        match self.device.lock() {
            Ok(device) => device.is_suspended(),
            Err(_) => true,
        }
    }

    pub fn resume(&self) -> Result<()> {
        let mut device = self.device.lock().map_err(|_| VoxError::AudioOutput {
            message: "output device lock poisoned".to_string(),
        })?;
        device.resume()
    }

    pub fn set_gain(&self, gain: f32) {
        self.graph().gain = gain;
    }

    pub fn gain(&self) -> f32 {
        self.graph().gain
    }

    /// Routes the filter through `reverb`, or straight to the output when `None`.
    pub fn set_reverb(&self, reverb: Option<Convolver>) {
        let mut graph = self.graph();
        graph.filter.reset();
        graph.reverb = reverb;
    }

    pub fn has_reverb(&self) -> bool {
        self.graph().reverb.is_some()
    }

    /// Schedules `buffer` to start at `when` seconds, played at `rate`.
    ///
    /// A start time already in the past starts on the next rendered frame.
    pub fn start_voice(&self, buffer: Arc<AudioBuffer>, rate: f64, when: f64) -> VoiceId {
        let mut graph = self.graph();
        let id = VoiceId(graph.next_voice);
        graph.next_voice += 1;

        let sample_rate = graph.sample_rate as f64;
        let start_frame = (when.max(0.0) * sample_rate).round() as u64;
        let step = rate * buffer.sample_rate() as f64 / sample_rate;
        graph.voices.push(Voice {
            id,
            buffer,
            rate,
            start_frame,
            position: 0.0,
            step,
        });
        id
    }

    /// Stops and removes a voice. No end notification is sent for it.
    pub fn stop_voice(&self, id: VoiceId) {
        self.graph().voices.retain(|v| v.id != id);
    }

    /// Voices that finished playing since the last call.
    pub fn drain_ended(&self) -> Vec<VoiceId> {
        self.ended_rx.try_iter().collect()
    }

    pub fn voice_count(&self) -> usize {
        self.graph().voices.len()
    }

    pub fn voices(&self) -> Vec<VoiceInfo> {
        let graph = self.graph();
        let sample_rate = graph.sample_rate as f64;
        graph
            .voices
            .iter()
            .map(|v| VoiceInfo {
                id: v.id,
                start: v.start_frame as f64 / sample_rate,
                rate: v.rate,
                duration: v.buffer.duration(),
                playing: graph.frame >= v.start_frame,
            })
            .collect()
    }
}
