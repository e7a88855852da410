//! The built-in perceptual checks.

use tunegate_backend_audio::metrics::{
    self, harshness, inferred_scale, out_of_scale_ratio, pitch_stability, tempo_jitter,
};
use tunegate_spec::{FailureReason, PerceptualThresholds};

use super::PerceptualCheck;
use crate::signal::AnalyzedSignal;

/// Returns the default checks in judging order.
pub fn default_checks() -> Vec<Box<dyn PerceptualCheck>> {
    vec![
        Box::new(SilenceCheck),
        Box::new(ClippingCheck),
        Box::new(HarshnessCheck),
        Box::new(FlatDynamicsCheck),
        Box::new(PitchStabilityCheck),
        Box::new(OffKeyCheck),
        Box::new(TempoStabilityCheck),
    ]
}

/// Fails near-silent renders.
pub struct SilenceCheck;

impl PerceptualCheck for SilenceCheck {
    fn id(&self) -> &'static str {
        "perceptual/silence"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::Silent
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let rms = signal.rms();
        (rms < t.silence_rms).then(|| format!("rms {:.5} below {}", rms, t.silence_rms))
    }
}

/// Fails renders with too many full-scale samples.
pub struct ClippingCheck;

impl PerceptualCheck for ClippingCheck {
    fn id(&self) -> &'static str {
        "perceptual/clipping"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::Clipping
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let ratio = metrics::clip_ratio(signal.samples(), t.clip_level);
        (ratio > t.max_clip_ratio)
            .then(|| format!("clip ratio {:.4} above {}", ratio, t.max_clip_ratio))
    }
}

/// Fails renders whose upper band dominates the lower band.
pub struct HarshnessCheck;

impl PerceptualCheck for HarshnessCheck {
    fn id(&self) -> &'static str {
        "perceptual/harshness"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::Harsh
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let ratio = harshness(
            signal.samples(),
            signal.sample_rate(),
            t.harsh_high_hz,
            t.harsh_low_hz,
        )?;
        (ratio > t.max_harshness)
            .then(|| format!("high/low band ratio {:.2} above {}", ratio, t.max_harshness))
    }
}

/// Fails over-compressed renders.
pub struct FlatDynamicsCheck;

impl PerceptualCheck for FlatDynamicsCheck {
    fn id(&self) -> &'static str {
        "perceptual/flat-dynamics"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::FlatDynamics
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let range = metrics::dynamic_range(signal.samples());
        (range < t.min_dynamic_range)
            .then(|| format!("dynamic range {:.4} below {}", range, t.min_dynamic_range))
    }
}

/// Fails melodies whose fundamental wanders.
pub struct PitchStabilityCheck;

impl PerceptualCheck for PitchStabilityCheck {
    fn id(&self) -> &'static str {
        "perceptual/pitch-stability"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::PitchUnstable
    }

    fn classical_only(&self) -> bool {
        true
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let cv = pitch_stability(signal.pitch_track(), t.pitch_confidence, t.min_voiced_frames)?;
        (cv > t.max_pitch_cv).then(|| format!("f0 variation {:.3} above {}", cv, t.max_pitch_cv))
    }
}

/// Fails melodies with too many notes outside their dominant scale.
///
/// The scale is the `scale_size` most energetic pitch classes of the
/// chroma histogram. Fewer note frames than `min_voiced_frames` pass.
pub struct OffKeyCheck;

impl PerceptualCheck for OffKeyCheck {
    fn id(&self) -> &'static str {
        "perceptual/off-key"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::OffKey
    }

    fn classical_only(&self) -> bool {
        true
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let track = signal.pitch_track();
        let note_frames = track
            .iter()
            .filter(|f| f.confidence > t.pitch_confidence)
            .count();
        if note_frames < t.min_voiced_frames {
            return None;
        }
        let scale = inferred_scale(signal.chroma(), t.scale_size);
        let ratio = out_of_scale_ratio(track, &scale, t.pitch_confidence)?;
        (ratio > t.max_out_of_scale).then(|| {
            format!(
                "{:.0}% of note frames outside the scale, limit {:.0}%",
                ratio * 100.0,
                t.max_out_of_scale * 100.0
            )
        })
    }
}

/// Fails renders whose beat spacing drifts.
pub struct TempoStabilityCheck;

impl PerceptualCheck for TempoStabilityCheck {
    fn id(&self) -> &'static str {
        "perceptual/tempo-stability"
    }

    fn reason(&self) -> FailureReason {
        FailureReason::TempoUnstable
    }

    fn classical_only(&self) -> bool {
        true
    }

    fn evaluate(&self, signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Option<String> {
        let jitter = tempo_jitter(signal.beat_times(), t.min_beats)?;
        (jitter > t.max_tempo_jitter)
            .then(|| format!("beat interval variation {:.3} above {}", jitter, t.max_tempo_jitter))
    }
}
