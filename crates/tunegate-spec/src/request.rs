//! Generation mode, tunable parameters and the job request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ValidationError};

/// Generation mode.
///
/// Selects which perceptual checks run, which model variant is loaded and
/// which postprocessing chain is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Scores, ambience and everything that is not classical.
    #[default]
    Cinematic,
    /// Melodic material held to pitch, key and tempo checks.
    Classical,
}

impl Mode {
    /// Returns the lowercase mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Cinematic => "cinematic",
            Mode::Classical => "classical",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cinematic" => Ok(Mode::Cinematic),
            "classical" => Ok(Mode::Classical),
            other => Err(ValidationError::new(
                ErrorCode::UnknownMode,
                format!("unknown mode '{}', expected 'cinematic' or 'classical'", other),
            )),
        }
    }
}

/// Sampling parameters handed to the synthesizer.
///
/// The default is the baseline every repair starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Sampling temperature, in (0, 2].
    pub temperature: f64,
    /// Top-k candidate count, at least 1.
    pub top_k: u32,
    /// Classifier-free guidance coefficient, positive.
    pub cfg_coefficient: f64,
}

impl GenerationParameters {
    /// Baseline parameters restored before every repair.
    pub const BASELINE: GenerationParameters = GenerationParameters {
        temperature: 0.9,
        top_k: 120,
        cfg_coefficient: 3.5,
    };

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if !(self.temperature.is_finite() && self.temperature > 0.0 && self.temperature <= 2.0) {
            errors.push(ValidationError::with_path(
                ErrorCode::TemperatureOutOfRange,
                format!("temperature must be in (0, 2], got {}", self.temperature),
                "generation_parameters.temperature",
            ));
        }
        if self.top_k < 1 {
            errors.push(ValidationError::with_path(
                ErrorCode::TopKOutOfRange,
                "top_k must be at least 1",
                "generation_parameters.top_k",
            ));
        }
        if !(self.cfg_coefficient.is_finite() && self.cfg_coefficient > 0.0) {
            errors.push(ValidationError::with_path(
                ErrorCode::CfgOutOfRange,
                format!("cfg_coefficient must be positive, got {}", self.cfg_coefficient),
                "generation_parameters.cfg_coefficient",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// A request for one generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text prompt. Repairs only ever append to it.
    pub prompt: String,
    /// Requested length in seconds.
    pub duration_seconds: u32,
    /// Generation mode.
    #[serde(default)]
    pub mode: Mode,
    /// Sampling parameters.
    #[serde(default)]
    pub generation_parameters: GenerationParameters,
}

impl GenerationRequest {
    /// Creates a request with baseline parameters.
    pub fn new(prompt: impl Into<String>, duration_seconds: u32, mode: Mode) -> Self {
        Self {
            prompt: prompt.into(),
            duration_seconds,
            mode,
            generation_parameters: GenerationParameters::default(),
        }
    }

    /// Replaces the generation parameters.
    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.generation_parameters = parameters;
        self
    }

    /// Validates the prompt, duration and parameters, collecting every error.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.prompt.trim().is_empty() {
            errors.push(ValidationError::with_path(
                ErrorCode::EmptyPrompt,
                "prompt must not be empty",
                "prompt",
            ));
        }
        if self.duration_seconds == 0 {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidDuration,
                "duration_seconds must be positive",
                "duration_seconds",
            ));
        }
        if let Err(mut param_errors) = self.generation_parameters.validate() {
            errors.append(&mut param_errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_parameters_are_baseline() {
        let params = GenerationParameters::default();
        assert_eq!(params.temperature, 0.9);
        assert_eq!(params.top_k, 120);
        assert_eq!(params.cfg_coefficient, 3.5);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Classical".parse::<Mode>().unwrap(), Mode::Classical);
        assert_eq!(" cinematic ".parse::<Mode>().unwrap(), Mode::Cinematic);
        let err = "jazz".parse::<Mode>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownMode);
    }

    #[test]
    fn test_request_validation_collects_errors() {
        let request = GenerationRequest::new("  ", 0, Mode::Cinematic).with_parameters(
            GenerationParameters {
                temperature: 0.0,
                top_k: 0,
                cfg_coefficient: -1.0,
            },
        );
        let errors = request.validate().unwrap_err();
        let codes: Vec<_> = errors.iter().map(|e| e.code).collect();
        assert_eq!(
            codes,
            vec![
                ErrorCode::EmptyPrompt,
                ErrorCode::InvalidDuration,
                ErrorCode::TemperatureOutOfRange,
                ErrorCode::TopKOutOfRange,
                ErrorCode::CfgOutOfRange,
            ]
        );
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"prompt": "rain on a tin roof", "duration_seconds": 8}"#)
                .unwrap();
        assert_eq!(request.mode, Mode::Cinematic);
        assert_eq!(request.generation_parameters, GenerationParameters::BASELINE);
    }
}
