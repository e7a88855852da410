//! Judge behaviour on synthetic renders.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tunegate_backend_audio::metrics;
use tunegate_qa::{AnalyzedSignal, MetricSummary, PerceptualQualityJudge, QualityJudge};
use tunegate_spec::{AudioBuffer, FailureReason, Mode, PerceptualThresholds, QualityReport};

const SR: u32 = 32000;

/// 220 Hz tone under a slow triangle envelope between 0.02 and 0.12.
fn breathing_tone(seconds: f32) -> Vec<f32> {
    let len = (seconds * SR as f32) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / SR as f32;
            let phase = (t / 2.0).fract();
            let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
            let amp = 0.02 + 0.10 * tri;
            amp * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
        })
        .collect()
}

#[test]
fn test_healthy_render_is_clean() {
    let samples = breathing_tone(4.0);
    let rms = metrics::rms(&samples);
    let range = metrics::dynamic_range(&samples);
    assert!(rms > 0.04 && rms < 0.06, "rms {}", rms);
    assert!(range > 0.07 && range < 0.13, "range {}", range);
    assert_eq!(metrics::clip_ratio(&samples, 0.999), 0.0);

    let judge = PerceptualQualityJudge::default();
    let report = judge
        .judge(&AudioBuffer::mono(samples, SR), "soft piano melody", Mode::Cinematic)
        .unwrap();
    assert_eq!(report, QualityReport::clean());
    assert_eq!(report.label(), "clean");
}

#[test]
fn test_silence_outranks_everything() {
    let judge = PerceptualQualityJudge::default();
    let report = judge
        .judge(&AudioBuffer::mono(vec![0.0; SR as usize], SR), "x", Mode::Classical)
        .unwrap();
    assert_eq!(report.reason, Some(FailureReason::Silent));
    assert_eq!(report.label(), "silent");
}

#[test]
fn test_clipping_outranks_harshness() {
    // harsh and clipped at once
    let samples: Vec<f32> = (0..SR as usize)
        .map(|i| {
            let x = 1.4 * (2.0 * std::f32::consts::PI * 6000.0 * i as f32 / SR as f32).sin();
            x.clamp(-1.0, 1.0)
        })
        .collect();
    let report = PerceptualQualityJudge::default()
        .judge(&AudioBuffer::mono(samples, SR), "x", Mode::Cinematic)
        .unwrap();
    assert_eq!(report.reason, Some(FailureReason::Clipping));
}

#[test]
fn test_steady_tone_passes_classical() {
    let samples: Vec<f32> = breathing_tone(4.0);
    let report = PerceptualQualityJudge::default()
        .judge(&AudioBuffer::mono(samples, SR), "veena", Mode::Classical)
        .unwrap();
    assert!(report.passed, "{:?}", report);
}

/// Decaying 440 Hz plucks with onsets spaced by `intervals`, cycled.
fn plucks(intervals: &[f64], seconds: f64) -> Vec<f32> {
    let len = (seconds * SR as f64) as usize;
    let note = (0.5 * SR as f64) as usize;
    let mut samples = vec![0.0f32; len];
    let mut onset = 0.25;
    let mut k = 0;
    while onset < seconds - 0.5 {
        let start = (onset * SR as f64) as usize;
        for i in 0..note.min(len - start) {
            let t = i as f64 / SR as f64;
            samples[start + i] +=
                (0.4 * (-t / 0.1).exp() * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32;
        }
        onset += intervals[k % intervals.len()];
        k += 1;
    }
    samples
}

/// Twelve semitone steps up from middle C, half a second each.
fn chromatic_run() -> Vec<f32> {
    let note = SR as usize / 2;
    let fade = SR as usize / 100;
    (0..12)
        .flat_map(|step| {
            let freq = 261.63 * 2f64.powf(step as f64 / 12.0);
            (0..note).map(move |i| {
                let t = i as f64 / SR as f64;
                let edge = (i.min(note - 1 - i) as f64 / fade as f64).min(1.0);
                (0.3 * edge * (2.0 * std::f64::consts::PI * freq * t).sin()) as f32
            })
        })
        .collect()
}

#[test]
fn test_irregular_rhythm_fails_classical_tempo() {
    let samples = plucks(&[0.6, 1.8], 16.0);
    let judge = PerceptualQualityJudge::default();
    let buffer = AudioBuffer::mono(samples, SR);

    let report = judge.judge(&buffer, "veena", Mode::Classical).unwrap();
    assert_eq!(report.reason, Some(FailureReason::TempoUnstable), "{:?}", report);
    assert_eq!(report.label(), "tempo unstable");

    // tempo is only judged for classical renders
    let report = judge.judge(&buffer, "veena", Mode::Cinematic).unwrap();
    assert!(report.passed, "{:?}", report);
}

#[test]
fn test_steady_plucks_pass_classical() {
    let report = PerceptualQualityJudge::default()
        .judge(&AudioBuffer::mono(plucks(&[0.6], 16.0), SR), "veena", Mode::Classical)
        .unwrap();
    assert!(report.passed, "{:?}", report);
}

#[test]
fn test_chromatic_melody_fails_off_key() {
    let buffer = AudioBuffer::mono(chromatic_run(), SR);
    let report = PerceptualQualityJudge::default()
        .judge(&buffer, "nadaswaram", Mode::Classical)
        .unwrap();
    assert_eq!(report.reason, Some(FailureReason::OffKey), "{:?}", report);

    let report = PerceptualQualityJudge::default()
        .judge(&buffer, "nadaswaram", Mode::Cinematic)
        .unwrap();
    assert!(report.passed, "{:?}", report);
}

#[test]
fn test_summary_matches_judge_inputs() {
    let buffer = AudioBuffer::mono(breathing_tone(4.0), SR);
    let signal = AnalyzedSignal::new(&buffer).unwrap();
    let summary = MetricSummary::measure(&signal, &PerceptualThresholds::default());
    assert!(summary.voiced_frames > 50);
    let cv = summary.pitch_variation.unwrap();
    assert!(cv < 0.05, "cv {}", cv);
    assert_eq!(summary.out_of_scale_ratio, Some(0.0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_quiet_buffers_are_silent(
        amp in 0.0f32..0.0049,
        len in 1usize..20000,
        classical in any::<bool>(),
    ) {
        let samples: Vec<f32> = (0..len)
            .map(|i| if i % 2 == 0 { amp } else { -amp })
            .collect();
        let mode = if classical { Mode::Classical } else { Mode::Cinematic };
        let report = PerceptualQualityJudge::default()
            .judge(&AudioBuffer::mono(samples, SR), "any prompt", mode)
            .unwrap();
        prop_assert_eq!(report.reason, Some(FailureReason::Silent));
    }

    #[test]
    fn prop_clipped_buffers_fail_clipping(
        len in 2000usize..20000,
        extra in 1usize..200,
        level in 0.01f32..0.9,
    ) {
        let clipped = len / 500 + extra;
        let samples: Vec<f32> = (0..len)
            .map(|i| {
                if i < clipped {
                    if i % 2 == 0 { 1.0 } else { -1.0 }
                } else {
                    level * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SR as f32).sin()
                }
            })
            .collect();
        let report = PerceptualQualityJudge::default()
            .judge(&AudioBuffer::mono(samples, SR), "any prompt", Mode::Cinematic)
            .unwrap();
        prop_assert_eq!(report.reason, Some(FailureReason::Clipping));
    }
}
