//! Technical signal-health analyzer and its repair chain.
//!
//! Unlike the perceptual judge, every check runs and all issues are
//! reported, since one repair pass addresses several of them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tunegate_backend_audio::effects::{apply_effect_chain, ChannelBuffer, Effect};
use tunegate_backend_audio::metrics::level;
use tunegate_backend_audio::AudioResult;
use tunegate_spec::{AudioBuffer, TechnicalThresholds};

/// A technical defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalIssue {
    /// Peak at full scale.
    Clipping,
    /// RMS under the audibility floor.
    TooLowVolume,
    /// Peak far above RMS, typical of isolated noise bursts over a quiet bed.
    HissOrNoise,
    /// Sample-to-sample jumps too large for real audio.
    Crackles,
    /// Mean sample value away from zero.
    DcOffset,
    /// NaN or infinite samples; no level check is meaningful.
    NonFinite,
}

impl TechnicalIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalIssue::Clipping => "clipping",
            TechnicalIssue::TooLowVolume => "too_low_volume",
            TechnicalIssue::HissOrNoise => "hiss_or_noise",
            TechnicalIssue::Crackles => "crackles",
            TechnicalIssue::DcOffset => "dc_offset",
            TechnicalIssue::NonFinite => "non_finite",
        }
    }
}

impl fmt::Display for TechnicalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a technical check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalReport {
    pub passed: bool,
    /// Issues in check order.
    pub issues: Vec<TechnicalIssue>,
}

/// Fast, deterministic signal-health checks.
#[derive(Debug, Clone, Default)]
pub struct TechnicalQualityAnalyzer {
    thresholds: TechnicalThresholds,
}

impl TechnicalQualityAnalyzer {
    pub fn new(thresholds: TechnicalThresholds) -> Self {
        Self { thresholds }
    }

    /// Runs every check on the mono downmix.
    ///
    /// A buffer holding NaN or infinite samples reports only `NonFinite`.
    pub fn check(&self, buffer: &AudioBuffer) -> TechnicalReport {
        let t = &self.thresholds;
        if buffer.samples.iter().any(|s| !s.is_finite()) {
            return TechnicalReport {
                passed: false,
                issues: vec![TechnicalIssue::NonFinite],
            };
        }
        let mono = buffer.to_mono();
        let peak = level::peak(&mono);
        let rms = level::rms(&mono);

        let mut issues = Vec::new();
        if peak >= t.clip_peak {
            issues.push(TechnicalIssue::Clipping);
        }
        if rms < t.min_rms {
            issues.push(TechnicalIssue::TooLowVolume);
        }
        if rms > 0.0 && peak / rms > t.max_crest_factor {
            issues.push(TechnicalIssue::HissOrNoise);
        }
        if level::max_step(&mono) > t.max_sample_step {
            issues.push(TechnicalIssue::Crackles);
        }
        if level::mean(&mono).abs() > t.max_dc_offset {
            issues.push(TechnicalIssue::DcOffset);
        }

        TechnicalReport {
            passed: issues.is_empty(),
            issues,
        }
    }

    /// The fixed repair chain, in application order.
    pub fn repair_chain(&self) -> Vec<Effect> {
        vec![
            Effect::Declick {
                max_step: self.thresholds.max_sample_step,
            },
            Effect::Highpass { cutoff_hz: 40.0 },
            Effect::Lowpass { cutoff_hz: 16000.0 },
            Effect::SpectralDenoise {
                noise_floor_db: -25.0,
                reduction_db: 12.0,
            },
            Effect::DynamicNormalize {
                frame_ms: 500.0,
                target_peak: 0.95,
                max_gain: 10.0,
            },
        ]
    }

    /// Applies the repair chain and returns a new buffer with the same layout.
    pub fn repair(&self, buffer: &AudioBuffer) -> AudioResult<AudioBuffer> {
        let mut planar = ChannelBuffer::from_audio(buffer)?;
        apply_effect_chain(&mut planar, &self.repair_chain(), 0)?;
        Ok(planar.into_audio())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sine(amp: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amp * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 32000.0).sin())
            .collect()
    }

    #[test]
    fn test_clean_tone_passes() {
        let report = TechnicalQualityAnalyzer::default().check(&AudioBuffer::mono(sine(0.5, 32000), 32000));
        assert_eq!(report, TechnicalReport { passed: true, issues: vec![] });
    }

    #[test]
    fn test_issues_accumulate_in_order() {
        // quiet bed with one full-scale spike and an offset
        let mut samples = vec![0.015f32; 32000];
        samples[100] = 1.0;
        let report = TechnicalQualityAnalyzer::default().check(&AudioBuffer::mono(samples, 32000));
        assert!(!report.passed);
        assert_eq!(
            report.issues,
            vec![
                TechnicalIssue::Clipping,
                TechnicalIssue::HissOrNoise,
                TechnicalIssue::Crackles,
                TechnicalIssue::DcOffset,
            ]
        );
    }

    #[test]
    fn test_silence_is_quiet_but_not_noisy() {
        let report = TechnicalQualityAnalyzer::default().check(&AudioBuffer::mono(vec![0.0; 1000], 32000));
        assert_eq!(report.issues, vec![TechnicalIssue::TooLowVolume]);
    }

    #[test]
    fn test_non_finite_samples_fail() {
        let analyzer = TechnicalQualityAnalyzer::default();
        let report = analyzer.check(&AudioBuffer::mono(vec![f32::NAN; 1000], 32000));
        assert_eq!(
            report,
            TechnicalReport {
                passed: false,
                issues: vec![TechnicalIssue::NonFinite],
            }
        );

        let mut samples = sine(0.5, 32000);
        samples[500] = f32::INFINITY;
        let report = analyzer.check(&AudioBuffer::stereo(&samples, &samples, 32000));
        assert_eq!(report.issues, vec![TechnicalIssue::NonFinite]);
    }

    #[test]
    fn test_repair_removes_click_and_offset() {
        let mut samples: Vec<f32> = sine(0.3, 64000).iter().map(|s| s + 0.05).collect();
        samples[20000] = samples[19999] + 0.95;
        samples[20001] = samples[19999] + 0.95;
        let buffer = AudioBuffer::mono(samples, 32000);
        let analyzer = TechnicalQualityAnalyzer::default();
        assert!(!analyzer.check(&buffer).passed);

        let repaired = analyzer.repair(&buffer).unwrap();
        assert_eq!(repaired.channels, 1);
        assert_eq!(repaired.frames(), buffer.frames());
        let issues = analyzer.check(&repaired).issues;
        assert!(!issues.contains(&TechnicalIssue::Crackles), "{:?}", issues);
        assert!(!issues.contains(&TechnicalIssue::DcOffset), "{:?}", issues);
    }

    #[test]
    fn test_repair_chain_order() {
        let names: Vec<&str> = TechnicalQualityAnalyzer::default()
            .repair_chain()
            .iter()
            .map(Effect::name)
            .collect();
        assert_eq!(
            names,
            vec!["declick", "highpass", "lowpass", "spectral_denoise", "dynamic_normalize"]
        );
    }
}
