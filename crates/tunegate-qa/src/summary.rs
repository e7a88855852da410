//! Serializable snapshot of every metric the checks look at.

use serde::{Deserialize, Serialize};
use tunegate_backend_audio::metrics::{
    self, harshness, inferred_scale, out_of_scale_ratio, pitch_stability, tempo_jitter,
};
use tunegate_spec::PerceptualThresholds;

use crate::signal::AnalyzedSignal;

/// Measured values for reporting. `None` marks metrics without enough
/// evidence to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub rms: f64,
    pub peak: f64,
    pub clip_ratio: f64,
    pub dynamic_range: f64,
    pub harshness: Option<f64>,
    pub voiced_frames: usize,
    pub pitch_variation: Option<f64>,
    pub out_of_scale_ratio: Option<f64>,
    pub beats: usize,
    pub tempo_bpm: Option<f64>,
    pub tempo_jitter: Option<f64>,
}

impl MetricSummary {
    /// Measures everything, including the classical-only metrics.
    pub fn measure(signal: &AnalyzedSignal, t: &PerceptualThresholds) -> Self {
        let samples = signal.samples();
        let track = signal.pitch_track();
        let beats = signal.beat_times();
        let voiced_frames = track
            .iter()
            .filter(|f| f.confidence > t.pitch_confidence)
            .count();
        let scale = inferred_scale(signal.chroma(), t.scale_size);
        let tempo_bpm = if beats.len() >= 2 {
            let span = beats[beats.len() - 1] - beats[0];
            (span > 0.0).then(|| 60.0 * (beats.len() - 1) as f64 / span)
        } else {
            None
        };

        Self {
            duration_seconds: samples.len() as f64 / signal.sample_rate() as f64,
            sample_rate: signal.sample_rate(),
            rms: signal.rms(),
            peak: signal.peak(),
            clip_ratio: metrics::clip_ratio(samples, t.clip_level),
            dynamic_range: metrics::dynamic_range(samples),
            harshness: harshness(samples, signal.sample_rate(), t.harsh_high_hz, t.harsh_low_hz),
            voiced_frames,
            pitch_variation: pitch_stability(track, t.pitch_confidence, t.min_voiced_frames),
            out_of_scale_ratio: out_of_scale_ratio(track, &scale, t.pitch_confidence),
            beats: beats.len(),
            tempo_bpm,
            tempo_jitter: tempo_jitter(beats, t.min_beats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunegate_spec::AudioBuffer;

    #[test]
    fn test_silence_summary() {
        let signal = AnalyzedSignal::new(&AudioBuffer::mono(vec![0.0; 32000], 32000)).unwrap();
        let summary = MetricSummary::measure(&signal, &PerceptualThresholds::default());
        assert_eq!(summary.rms, 0.0);
        assert_eq!(summary.voiced_frames, 0);
        assert_eq!(summary.pitch_variation, None);
        assert_eq!(summary.tempo_jitter, None);
        assert!((summary.duration_seconds - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serializes_missing_metrics_as_null() {
        let signal = AnalyzedSignal::new(&AudioBuffer::mono(vec![0.0; 100], 32000)).unwrap();
        let summary = MetricSummary::measure(&signal, &PerceptualThresholds::default());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["harshness"].is_null());
        assert_eq!(json["beats"], 0);
    }
}
