//! Short-time Fourier transform.
//!
//! Frames are centred: the signal is zero-padded by half a window on both
//! sides, so frame `t` is centred on sample `t * hop`. Resynthesis uses
//! weighted overlap-add with the same periodic Hann window.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{AudioError, AudioResult};

/// STFT analysis and synthesis plan for one window size and hop.
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop", &self.hop)
            .finish()
    }
}

impl Stft {
    /// Plans an STFT with the given window size and hop.
    pub fn new(n_fft: usize, hop: usize) -> AudioResult<Self> {
        if n_fft < 2 {
            return Err(AudioError::invalid_param(
                "stft.n_fft",
                format!("must be at least 2, got {}", n_fft),
            ));
        }
        if hop == 0 || hop > n_fft {
            return Err(AudioError::invalid_param(
                "stft.hop",
                format!("must be in 1..={}, got {}", n_fft, hop),
            ));
        }

        let mut planner = FftPlanner::<f64>::new();
        Ok(Self {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        })
    }

    /// Window size in samples.
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Hop size in samples.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of non-negative frequency bins per frame.
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Centre frequency of `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize, sample_rate: f64) -> f64 {
        bin as f64 * sample_rate / self.n_fft as f64
    }

    /// Number of frames produced for a signal of `len` samples.
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop
    }

    /// Computes the complex spectrum of every frame.
    pub fn analyze(&self, samples: &[f64]) -> Vec<Vec<Complex<f64>>> {
        let pad = self.n_fft / 2;
        let frames = self.num_frames(samples.len());
        let mut out = Vec::with_capacity(frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];

        for t in 0..frames {
            let start = (t * self.hop) as isize - pad as isize;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let value = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(value * self.window[i], 0.0);
            }
            self.forward.process(&mut buffer);
            out.push(buffer[..self.num_bins()].to_vec());
        }

        out
    }

    /// Computes the magnitude spectrogram, one row per frame.
    pub fn magnitudes(&self, samples: &[f64]) -> Vec<Vec<f64>> {
        self.analyze(samples)
            .into_iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Resynthesises `length` samples from frames produced by [`Stft::analyze`].
    pub fn synthesize(&self, frames: &[Vec<Complex<f64>>], length: usize) -> Vec<f64> {
        let pad = self.n_fft / 2;
        let total = length + 2 * pad + self.n_fft;
        let mut output = vec![0.0; total];
        let mut weight = vec![0.0; total];
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let scale = 1.0 / self.n_fft as f64;

        for (t, frame) in frames.iter().enumerate() {
            for (k, slot) in buffer.iter_mut().enumerate() {
                *slot = if k < frame.len() {
                    frame[k]
                } else {
                    let mirror = self.n_fft - k;
                    frame.get(mirror).map(|c| c.conj()).unwrap_or_default()
                };
            }
            self.inverse.process(&mut buffer);

            let offset = t * self.hop;
            for i in 0..self.n_fft {
                let pos = offset + i;
                if pos >= total {
                    break;
                }
                let w = self.window[i];
                output[pos] += buffer[i].re * scale * w;
                weight[pos] += w * w;
            }
        }

        (0..length)
            .map(|i| {
                let pos = i + pad;
                if weight[pos] > 1e-8 {
                    output[pos] / weight[pos]
                } else {
                    0.0
                }
            })
            .collect()
    }
}

/// Periodic Hann window.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_hop() {
        assert!(Stft::new(2048, 0).is_err());
        assert!(Stft::new(2048, 4096).is_err());
        assert!(Stft::new(1, 1).is_err());
    }

    #[test]
    fn test_frame_count_is_centred() {
        let stft = Stft::new(2048, 512).unwrap();
        assert_eq!(stft.num_frames(32000), 63);
        assert_eq!(stft.analyze(&vec![0.0; 32000]).len(), 63);
        assert_eq!(stft.num_bins(), 1025);
    }

    #[test]
    fn test_sine_peak_bin() {
        let sr = 32000.0;
        let stft = Stft::new(2048, 512).unwrap();
        let freq = 1000.0;
        let samples: Vec<f64> = (0..16000)
            .map(|i| (2.0 * PI * freq * i as f64 / sr).sin())
            .collect();
        let mags = stft.magnitudes(&samples);
        let frame = &mags[mags.len() / 2];
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        assert!((stft.bin_frequency(peak_bin, sr) - freq).abs() < sr / 2048.0);
    }

    #[test]
    fn test_round_trip_reconstructs_signal() {
        let stft = Stft::new(1024, 256).unwrap();
        let samples: Vec<f64> = (0..8000)
            .map(|i| (i as f64 * 0.013).sin() * 0.5 + (i as f64 * 0.21).cos() * 0.2)
            .collect();
        let frames = stft.analyze(&samples);
        let rebuilt = stft.synthesize(&frames, samples.len());
        let max_err = samples
            .iter()
            .zip(&rebuilt)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(max_err < 1e-6, "max error {}", max_err);
    }
}
