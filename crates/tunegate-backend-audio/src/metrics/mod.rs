//! Signal metrics.
//!
//! Pure functions over mono sample slices. None of them panic or return NaN
//! on silent, empty or otherwise degenerate input. Metrics that need enough
//! evidence to be meaningful (pitch stability, tempo jitter, harshness, key
//! conformance) return `None` when the evidence is missing, and callers treat
//! `None` as a pass.

pub mod key;
pub mod level;
pub mod pitch;
pub mod spectral;
pub mod tempo;

pub use key::{inferred_scale, out_of_scale_ratio};
pub use level::{clip_ratio, dynamic_range, peak, rms};
pub use pitch::{pitch_stability, pitch_track, PitchFrame, PitchTrackerConfig};
pub use spectral::{chroma_histogram, harshness, spectral_band_energy};
pub use tempo::{beat_times, tempo_jitter, BeatTrackerConfig};

/// Coefficient of variation with an epsilon-guarded denominator.
///
/// Returns `None` for empty input or a non-finite result.
pub(crate) fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / (mean.abs() + 1e-6);
    cv.is_finite().then_some(cv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_of_constant_is_zero() {
        assert_eq!(coefficient_of_variation(&[2.0, 2.0, 2.0]), Some(0.0));
    }

    #[test]
    fn test_cv_empty_is_none() {
        assert_eq!(coefficient_of_variation(&[]), None);
    }

    #[test]
    fn test_cv_known_value() {
        let cv = coefficient_of_variation(&[1.0, 3.0]).unwrap();
        assert!((cv - 0.5).abs() < 1e-5);
    }
}
