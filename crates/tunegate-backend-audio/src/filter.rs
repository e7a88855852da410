//! Biquad filter implementations.
//!
//! Coefficients follow the Audio EQ Cookbook formulas. All filters run in
//! `f64` and operate on one channel at a time.

use std::f64::consts::PI;

/// Butterworth Q for a two-pole section.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Biquad filter coefficients, normalised by `a0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Creates lowpass filter coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor, 0.707 is Butterworth
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Creates highpass filter coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 + cos_omega) / 2.0;
        let b1 = -(1.0 + cos_omega);
        let b2 = (1.0 + cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Creates a peak EQ filter.
    ///
    /// # Arguments
    /// * `frequency` - Center frequency in Hz
    /// * `q` - Q factor
    /// * `db_gain` - Gain in dB (positive for boost, negative for cut)
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn peaking_eq(frequency: f64, q: f64, db_gain: f64, sample_rate: f64) -> Self {
        let q = q.max(0.1);
        let a = 10.0_f64.powf(db_gain / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self::normalized(b0, b1, b2, a0, a1, a2)
    }

    /// Creates a peak EQ filter whose width is given in octaves.
    pub fn peaking_eq_octaves(
        frequency: f64,
        octaves: f64,
        db_gain: f64,
        sample_rate: f64,
    ) -> Self {
        Self::peaking_eq(frequency, q_from_octaves(octaves), db_gain, sample_rate)
    }

    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Converts a bandwidth in octaves to a Q factor.
pub fn q_from_octaves(octaves: f64) -> f64 {
    let ratio = 2.0_f64.powf(octaves);
    ratio.sqrt() / (ratio - 1.0)
}

/// Clamps a cutoff below Nyquist so the bilinear transform stays stable.
pub fn clamp_cutoff(cutoff: f64, sample_rate: f64) -> f64 {
    cutoff.min(sample_rate * 0.45)
}

/// Biquad filter state.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    // Delay line for input samples
    x1: f64,
    x2: f64,
    // Delay line for output samples
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Creates a new biquad filter with the given coefficients.
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a lowpass filter.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::lowpass(cutoff, q, sample_rate))
    }

    /// Creates a highpass filter.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::highpass(cutoff, q, sample_rate))
    }

    /// Resets the filter state.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Processes a single sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.coeffs.b1 * self.x1 + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Processes a buffer of samples in place.
    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

/// Runs a fresh filter built from `coeffs` over each channel.
pub fn filter_channels(channels: &mut [Vec<f64>], coeffs: BiquadCoeffs) {
    for channel in channels.iter_mut() {
        BiquadFilter::new(coeffs).process_buffer(channel);
    }
}
