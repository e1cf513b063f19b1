//! Convolution reverb.
//!
//! Uniformly partitioned overlap-save convolution: the impulse response is cut
//! into blocks of `block_size` frames, each transformed once up front. Input
//! is collected a block at a time, so output lags input by exactly one block.

use crate::audio::buffer::AudioBuffer;
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;
const MIN_POWER: f32 = 0.000125;

/// Scale applied to a normalized impulse response so that reverbs of different
/// length and loudness come out at a similar level.
pub fn normalization_scale(impulse: &[f32], sample_rate: u32) -> f32 {
    if impulse.is_empty() {
        return 1.0;
    }
    let power = impulse.iter().map(|s| s * s).sum::<f32>() / impulse.len() as f32;
    let power = power.sqrt().max(MIN_POWER);
    GAIN_CALIBRATION / power * (GAIN_CALIBRATION_SAMPLE_RATE / sample_rate.max(1) as f32)
}

pub struct Convolver {
    block_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// Spectra of the impulse partitions.
    partitions: Vec<Vec<Complex32>>,
    /// Spectra of past input frames, newest first.
    history: VecDeque<Vec<Complex32>>,
    previous: Vec<f32>,
    current: Vec<f32>,
    output: Vec<f32>,
    position: usize,
    scratch: Vec<Complex32>,
    scale: f32,
}

impl Convolver {
    /// Creates a convolver for `impulse` with unit scale.
    pub fn new(impulse: &[f32], block_size: usize) -> Self {
        let block_size = block_size.max(1);
        let fft_size = block_size * 2;
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        let partitions: Vec<Vec<Complex32>> = impulse
            .chunks(block_size)
            .map(|chunk| {
                let mut spectrum = vec![Complex32::new(0.0, 0.0); fft_size];
                for (slot, &s) in spectrum.iter_mut().zip(chunk) {
                    *slot = Complex32::new(s, 0.0);
                }
                forward.process(&mut spectrum);
                spectrum
            })
            .collect();

        Self {
            block_size,
            forward,
            inverse,
            history: VecDeque::with_capacity(partitions.len()),
            partitions,
            previous: vec![0.0; block_size],
            current: vec![0.0; block_size],
            output: vec![0.0; block_size],
            position: 0,
            scratch: vec![Complex32::new(0.0, 0.0); fft_size],
            scale: 1.0,
        }
    }

    /// Creates a normalized convolver for an impulse response, resampled to
    /// the rendering sample rate.
    pub fn from_impulse(impulse: &AudioBuffer, sample_rate: u32, block_size: usize) -> Self {
        let resampled = impulse.resampled(sample_rate);
        let scale = normalization_scale(resampled.samples(), sample_rate);
        Self::new(resampled.samples(), block_size).with_scale(scale)
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Output delay in frames.
    pub fn latency(&self) -> usize {
        self.block_size
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let out = self.output[self.position];
        self.current[self.position] = input;
        self.position += 1;
        if self.position == self.block_size {
            self.run_block();
            self.position = 0;
        }
        out * self.scale
    }

    fn run_block(&mut self) {
        let n = self.block_size;

        let mut frame: Vec<Complex32> = self
            .previous
            .iter()
            .chain(self.current.iter())
            .map(|&s| Complex32::new(s, 0.0))
            .collect();
        self.forward.process(&mut frame);

        self.history.push_front(frame);
        if self.history.len() > self.partitions.len() {
            self.history.pop_back();
        }

        for slot in self.scratch.iter_mut() {
            *slot = Complex32::new(0.0, 0.0);
        }
        for (spectrum, partition) in self.history.iter().zip(&self.partitions) {
            for ((acc, x), h) in self.scratch.iter_mut().zip(spectrum).zip(partition) {
                *acc += x * h;
            }
        }
        self.inverse.process(&mut self.scratch);

        let norm = 1.0 / (2 * n) as f32;
        for (out, value) in self.output.iter_mut().zip(&self.scratch[n..]) {
            *out = value.re * norm;
        }

        std::mem::swap(&mut self.previous, &mut self.current);
    }
}
