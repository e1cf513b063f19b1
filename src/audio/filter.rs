//! Biquad high-pass filter applied after the gain stage.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BiquadCoeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

fn compute_hpf_biquad(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoeffs {
    let freq = frequency.min(sample_rate * 0.45).max(10.0);

    let omega = 2.0 * std::f32::consts::PI * freq / sample_rate;
    let sin_omega = omega.sin();
    let cos_omega = omega.cos();
    let alpha = sin_omega / (2.0 * q.max(0.01));

    let b0 = (1.0 + cos_omega) / 2.0;
    let b1 = -(1.0 + cos_omega);
    let b2 = (1.0 + cos_omega) / 2.0;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    BiquadCoeffs {
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
        a1: a1 / a0,
        a2: a2 / a0,
    }
}

/// Second-order high-pass filter (transposed direct form II).
#[derive(Debug, Clone)]
pub struct HighpassFilter {
    coeffs: BiquadCoeffs,
    z1: f32,
    z2: f32,
}

impl HighpassFilter {
    pub fn new(frequency: f32, q: f32, sample_rate: u32) -> Self {
        Self {
            coeffs: compute_hpf_biquad(frequency, q, sample_rate as f32),
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let c = self.coeffs;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }

    /// Clears the filter memory.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
