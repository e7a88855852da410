//! Gate configuration: retry bound, sample rates and check thresholds.
//!
//! Every field has a serde default so a partial JSON file only overrides what
//! it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, SpecError, ValidationError};
use crate::request::GenerationParameters;

/// Total synthesis attempts per job.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Top-level gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Parameters used when a request does not carry its own.
    pub default_parameters: GenerationParameters,
    /// Sample rate the synthesizer produces.
    pub synth_sample_rate: u32,
    /// Sample rate of postprocessed output.
    pub output_sample_rate: u32,
    /// Technical (signal level) thresholds.
    pub technical: TechnicalThresholds,
    /// Perceptual judge thresholds.
    pub perceptual: PerceptualThresholds,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            default_parameters: GenerationParameters::BASELINE,
            synth_sample_rate: 32_000,
            output_sample_rate: 44_100,
            technical: TechnicalThresholds::default(),
            perceptual: PerceptualThresholds::default(),
        }
    }
}

impl GateConfig {
    /// Loads a configuration from a JSON file and validates it.
    pub fn from_file(path: &Path) -> Result<Self, SpecError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let config: GateConfig = serde_json::from_str(json)?;
        config.validate().map_err(SpecError::ValidationFailed)?;
        Ok(config)
    }

    /// Checks that the retry bound, rates and thresholds are usable.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.max_retries == 0 {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRetryBound,
                "max_retries must be at least 1",
                "max_retries",
            ));
        }
        for (rate, path) in [
            (self.synth_sample_rate, "synth_sample_rate"),
            (self.output_sample_rate, "output_sample_rate"),
        ] {
            if rate == 0 {
                errors.push(ValidationError::with_path(
                    ErrorCode::InvalidSampleRate,
                    "sample rate must be positive",
                    path,
                ));
            }
        }
        if let Err(mut param_errors) = self.default_parameters.validate() {
            errors.append(&mut param_errors);
        }

        let t = &self.technical;
        let p = &self.perceptual;
        let thresholds = [
            (t.clip_peak, "technical.clip_peak"),
            (t.min_rms, "technical.min_rms"),
            (t.max_crest_factor, "technical.max_crest_factor"),
            (t.max_sample_step, "technical.max_sample_step"),
            (t.max_dc_offset, "technical.max_dc_offset"),
            (p.silence_rms, "perceptual.silence_rms"),
            (p.clip_level, "perceptual.clip_level"),
            (p.max_clip_ratio, "perceptual.max_clip_ratio"),
            (p.max_harshness, "perceptual.max_harshness"),
            (p.harsh_high_hz, "perceptual.harsh_high_hz"),
            (p.harsh_low_hz, "perceptual.harsh_low_hz"),
            (p.min_dynamic_range, "perceptual.min_dynamic_range"),
            (p.pitch_confidence, "perceptual.pitch_confidence"),
            (p.max_pitch_cv, "perceptual.max_pitch_cv"),
            (p.max_out_of_scale, "perceptual.max_out_of_scale"),
            (p.max_tempo_jitter, "perceptual.max_tempo_jitter"),
        ];
        for (value, path) in thresholds {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ValidationError::with_path(
                    ErrorCode::InvalidThreshold,
                    format!("threshold must be a finite positive number, got {}", value),
                    path,
                ));
            }
        }
        if p.harsh_low_hz >= p.harsh_high_hz {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidThreshold,
                "harsh_low_hz must be below harsh_high_hz",
                "perceptual.harsh_low_hz",
            ));
        }
        if p.scale_size == 0 || p.scale_size > 12 {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidThreshold,
                "scale_size must be between 1 and 12",
                "perceptual.scale_size",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Thresholds for the technical signal analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalThresholds {
    /// Peak at or above this counts as clipping.
    pub clip_peak: f64,
    /// RMS below this is too quiet.
    pub min_rms: f64,
    /// Peak to RMS ratio above this suggests hiss or noise.
    pub max_crest_factor: f64,
    /// Largest absolute sample-to-sample step before crackles are reported.
    pub max_sample_step: f64,
    /// Mean absolute offset above this is a DC offset.
    pub max_dc_offset: f64,
}

impl Default for TechnicalThresholds {
    fn default() -> Self {
        Self {
            clip_peak: 0.999,
            min_rms: 0.002,
            max_crest_factor: 50.0,
            max_sample_step: 0.9,
            max_dc_offset: 0.01,
        }
    }
}

/// Thresholds for the perceptual judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptualThresholds {
    /// RMS below this is silent.
    pub silence_rms: f64,
    /// Absolute sample level counted as clipped.
    pub clip_level: f64,
    /// Fraction of clipped samples above which the clip check fails.
    pub max_clip_ratio: f64,
    /// High/low band energy ratio above which audio is harsh.
    pub max_harshness: f64,
    /// Lower edge of the harsh band in Hz.
    pub harsh_high_hz: f64,
    /// Upper edge of the reference band in Hz.
    pub harsh_low_hz: f64,
    /// Minimum spread between 95th and 5th amplitude percentiles.
    pub min_dynamic_range: f64,
    /// Pitch frames above this confidence count as voiced.
    pub pitch_confidence: f64,
    /// Fewest voiced frames needed to judge pitch stability.
    pub min_voiced_frames: usize,
    /// Largest tolerated coefficient of variation of f0.
    pub max_pitch_cv: f64,
    /// Number of dominant pitch classes forming the key.
    pub scale_size: usize,
    /// Largest tolerated fraction of note frames outside the key.
    pub max_out_of_scale: f64,
    /// Fewest beats needed to judge tempo stability.
    pub min_beats: usize,
    /// Largest tolerated coefficient of variation of inter-beat intervals.
    pub max_tempo_jitter: f64,
}

impl Default for PerceptualThresholds {
    fn default() -> Self {
        Self {
            silence_rms: 0.005,
            clip_level: 0.999,
            max_clip_ratio: 0.002,
            max_harshness: 2.5,
            harsh_high_hz: 3500.0,
            harsh_low_hz: 1500.0,
            min_dynamic_range: 0.03,
            pitch_confidence: 0.7,
            min_voiced_frames: 50,
            max_pitch_cv: 0.35,
            scale_size: 7,
            max_out_of_scale: 0.30,
            min_beats: 8,
            max_tempo_jitter: 0.35,
        }
    }
}
