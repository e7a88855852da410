//! Monophonic pitch tracking.
//!
//! Implements the YIN estimator: a squared-difference function computed via
//! FFT cross-correlation, cumulative mean normalisation, absolute-threshold
//! dip picking and parabolic refinement. Confidence is one minus the
//! normalised difference at the chosen lag, so clean periodic frames score
//! near 1 and noise scores low.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::coefficient_of_variation;

/// One analysis frame of a pitch track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame centre in seconds.
    pub time: f64,
    /// Estimated fundamental in Hz, 0 for unvoiced frames.
    pub frequency: f64,
    /// Periodicity confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Pitch tracker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTrackerConfig {
    /// Lowest detectable fundamental in Hz.
    pub fmin: f64,
    /// Highest detectable fundamental in Hz.
    pub fmax: f64,
    /// Hop between frames in samples.
    pub hop: usize,
    /// YIN absolute threshold on the normalised difference.
    pub threshold: f64,
    /// Frames quieter than this RMS are reported unvoiced.
    pub silence_rms: f64,
}

impl Default for PitchTrackerConfig {
    fn default() -> Self {
        Self {
            fmin: 50.0,
            fmax: 1200.0,
            hop: 256,
            threshold: 0.1,
            silence_rms: 1e-4,
        }
    }
}

/// Tracks pitch with the default settings.
pub fn pitch_track(samples: &[f32], sample_rate: u32) -> Vec<PitchFrame> {
    pitch_track_with(samples, sample_rate, &PitchTrackerConfig::default())
}

/// Tracks pitch frame by frame.
///
/// Returns an empty track when the input is shorter than one analysis frame
/// or the settings leave no valid lag range.
pub fn pitch_track_with(
    samples: &[f32],
    sample_rate: u32,
    config: &PitchTrackerConfig,
) -> Vec<PitchFrame> {
    if sample_rate == 0 || samples.is_empty() || config.hop == 0 {
        return Vec::new();
    }
    if !(config.fmin > 0.0 && config.fmax > config.fmin) {
        return Vec::new();
    }

    let sr = sample_rate as f64;
    let tau_min = ((sr / config.fmax).floor() as usize).max(2);
    let tau_max = (sr / config.fmin).ceil() as usize;
    if tau_min >= tau_max {
        return Vec::new();
    }

    // Integration window W equals the longest lag; a frame must hold W + tau_max samples.
    let window = tau_max;
    let frame_len = window + tau_max + 1;
    if samples.len() < frame_len {
        return Vec::new();
    }

    let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let mut cumsq = Vec::with_capacity(signal.len() + 1);
    cumsq.push(0.0);
    let mut acc = 0.0;
    for &s in &signal {
        acc += s * s;
        cumsq.push(acc);
    }

    let n = frame_len.next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);
    let mut head = vec![Complex::new(0.0, 0.0); n];
    let mut full = vec![Complex::new(0.0, 0.0); n];
    let mut diff = vec![0.0; tau_max + 1];
    let mut cmnd = vec![1.0; tau_max + 1];

    let mut track = Vec::new();
    let mut start = 0;
    while start + frame_len <= signal.len() {
        let time = (start + frame_len / 2) as f64 / sr;
        let e0 = cumsq[start + window] - cumsq[start];

        if (e0 / window as f64).sqrt() < config.silence_rms {
            track.push(PitchFrame {
                time,
                frequency: 0.0,
                confidence: 0.0,
            });
            start += config.hop;
            continue;
        }

        let frame = &signal[start..start + frame_len];
        for i in 0..n {
            head[i] = Complex::new(if i < window { frame[i] } else { 0.0 }, 0.0);
            full[i] = Complex::new(if i < frame_len { frame[i] } else { 0.0 }, 0.0);
        }
        forward.process(&mut head);
        forward.process(&mut full);
        for i in 0..n {
            full[i] = head[i].conj() * full[i];
        }
        inverse.process(&mut full);
        let scale = 1.0 / n as f64;

        for (tau, d) in diff.iter_mut().enumerate() {
            let e_tau = cumsq[start + tau + window] - cumsq[start + tau];
            let corr = full[tau].re * scale;
            *d = (e0 + e_tau - 2.0 * corr).max(0.0);
        }

        cmnd[0] = 1.0;
        let mut running = 0.0;
        for tau in 1..=tau_max {
            running += diff[tau];
            cmnd[tau] = if running > 0.0 {
                diff[tau] * tau as f64 / running
            } else {
                1.0
            };
        }

        let best = pick_lag(&cmnd, tau_min, tau_max, config.threshold);
        let period = best as f64 + parabolic_shift(&cmnd, best);
        let confidence = (1.0 - cmnd[best]).clamp(0.0, 1.0);
        let frequency = if period > 0.0 { sr / period } else { 0.0 };

        track.push(PitchFrame {
            time,
            frequency: if frequency.is_finite() { frequency } else { 0.0 },
            confidence,
        });
        start += config.hop;
    }

    track
}

/// First dip below `threshold`, followed to its local minimum; the global
/// minimum when no dip crosses the threshold.
fn pick_lag(cmnd: &[f64], tau_min: usize, tau_max: usize, threshold: f64) -> usize {
    let mut tau = tau_min;
    while tau <= tau_max {
        if cmnd[tau] < threshold {
            while tau < tau_max && cmnd[tau + 1] < cmnd[tau] {
                tau += 1;
            }
            return tau;
        }
        tau += 1;
    }

    (tau_min..=tau_max)
        .min_by(|&a, &b| cmnd[a].total_cmp(&cmnd[b]))
        .unwrap_or(tau_min)
}

fn parabolic_shift(cmnd: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= cmnd.len() {
        return 0.0;
    }
    let (a, b, c) = (cmnd[tau - 1], cmnd[tau], cmnd[tau + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-1.0, 1.0)
}

/// Coefficient of variation of voiced f0 values.
///
/// Frames count as voiced when their confidence exceeds
/// `confidence_threshold`. Returns `None` when fewer than `min_voiced` frames
/// are voiced.
pub fn pitch_stability(
    track: &[PitchFrame],
    confidence_threshold: f64,
    min_voiced: usize,
) -> Option<f64> {
    let voiced: Vec<f64> = track
        .iter()
        .filter(|f| f.confidence > confidence_threshold && f.frequency > 0.0)
        .map(|f| f.frequency)
        .collect();
    if voiced.len() < min_voiced {
        return None;
    }
    coefficient_of_variation(&voiced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn tone(freq: f64, sr: u32, seconds: f64) -> Vec<f32> {
        let len = (sr as f64 * seconds) as usize;
        (0..len)
            .map(|i| (0.5 * (2.0 * PI * freq * i as f64 / sr as f64).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_tracks_steady_tone() {
        let track = pitch_track(&tone(220.0, 32000, 1.0), 32000);
        assert!(!track.is_empty());
        for frame in &track {
            assert!(frame.confidence > 0.9, "confidence {}", frame.confidence);
            assert!((frame.frequency - 220.0).abs() < 2.0, "f0 {}", frame.frequency);
        }
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let track = pitch_track(&vec![0.0; 32000], 32000);
        assert!(track.iter().all(|f| f.confidence == 0.0 && f.frequency == 0.0));
        assert_eq!(pitch_stability(&track, 0.7, 50), None);
    }

    #[test]
    fn test_short_input_gives_empty_track() {
        assert!(pitch_track(&[0.1; 100], 32000).is_empty());
    }

    #[test]
    fn test_steady_tone_is_stable() {
        let track = pitch_track(&tone(330.0, 32000, 2.0), 32000);
        let cv = pitch_stability(&track, 0.7, 50).unwrap();
        assert!(cv < 0.05, "cv {}", cv);
    }

    #[test]
    fn test_wide_leaps_are_unstable() {
        let mut samples = Vec::new();
        for i in 0..4 {
            let freq = if i % 2 == 0 { 150.0 } else { 600.0 };
            samples.extend(tone(freq, 32000, 0.5));
        }
        let track = pitch_track(&samples, 32000);
        let cv = pitch_stability(&track, 0.7, 50).unwrap();
        assert!(cv > 0.35, "cv {}", cv);
    }

    #[test]
    fn test_stability_needs_enough_voiced_frames() {
        let frames: Vec<PitchFrame> = (0..49)
            .map(|i| PitchFrame {
                time: i as f64 * 0.008,
                frequency: 100.0 + i as f64 * 10.0,
                confidence: 0.9,
            })
            .collect();
        assert_eq!(pitch_stability(&frames, 0.7, 50), None);
    }
}
