//! Failure taxonomy, quality verdicts, attempt records and job outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;
use crate::request::GenerationParameters;

/// Why an attempt was rejected.
///
/// The set is closed: perceptual checks produce the named variants, and any
/// error escaping the synthesizer or the analyzer is carried with its message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Overall level below the silence floor.
    Silent,
    /// Too many samples at full scale.
    Clipping,
    /// Too much energy in the upper band relative to the lower band.
    Harsh,
    /// Amplitude distribution too narrow.
    FlatDynamics,
    /// Fundamental frequency wanders too much.
    PitchUnstable,
    /// Too many notes outside the dominant scale.
    OffKey,
    /// Beat spacing too irregular.
    TempoUnstable,
    /// Output did not follow the requested mood or style.
    IntentMismatch,
    /// The synthesizer raised an error.
    SynthesisFailed(String),
    /// The quality analyzer raised an error.
    AnalyzerFailed(String),
}

impl FailureReason {
    /// Returns the short, stable reason label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Silent => "silent",
            FailureReason::Clipping => "clipping",
            FailureReason::Harsh => "harsh",
            FailureReason::FlatDynamics => "flat dynamics",
            FailureReason::PitchUnstable => "pitch unstable",
            FailureReason::OffKey => "off-key",
            FailureReason::TempoUnstable => "tempo unstable",
            FailureReason::IntentMismatch => "intent mismatch",
            FailureReason::SynthesisFailed(_) => "synthesis error",
            FailureReason::AnalyzerFailed(_) => "analyzer error",
        }
    }

    /// Classifies free-form reason text by keyword.
    ///
    /// Matching is case-insensitive and substring based. Pitch keywords win
    /// over tempo keywords, which win over noise keywords. The judge's own
    /// labels for silence and flat dynamics map back to their variants. Any
    /// other text is treated as an intent mismatch.
    pub fn from_reason_text(text: &str) -> FailureReason {
        let lower = text.to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["off-key", "besura"]) {
            FailureReason::OffKey
        } else if has(&["pitch"]) {
            FailureReason::PitchUnstable
        } else if has(&["tempo"]) {
            FailureReason::TempoUnstable
        } else if has(&["clipping"]) {
            FailureReason::Clipping
        } else if has(&["noise", "harsh", "perceptual"]) {
            FailureReason::Harsh
        } else if has(&["silent"]) {
            FailureReason::Silent
        } else if has(&["flat dynamics"]) {
            FailureReason::FlatDynamics
        } else {
            FailureReason::IntentMismatch
        }
    }

    /// Returns true for failures raised by a stage rather than judged from audio.
    pub fn is_internal_error(&self) -> bool {
        matches!(
            self,
            FailureReason::SynthesisFailed(_) | FailureReason::AnalyzerFailed(_)
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SynthesisFailed(msg) | FailureReason::AnalyzerFailed(msg) => {
                write!(f, "{}: {}", self.as_str(), msg)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Verdict of the perceptual judge for one buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Whether the buffer passed every applicable check.
    pub passed: bool,
    /// The first failing check, absent when passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    /// Measured value and limit for the failing check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl QualityReport {
    /// A passing report.
    pub fn clean() -> Self {
        Self {
            passed: true,
            reason: None,
            detail: None,
        }
    }

    /// A failing report.
    pub fn failed(reason: FailureReason) -> Self {
        Self {
            passed: false,
            reason: Some(reason),
            detail: None,
        }
    }

    /// Attaches a measurement detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns "clean" for passing reports, otherwise the failure label.
    pub fn label(&self) -> String {
        match &self.reason {
            Some(reason) if !self.passed => reason.to_string(),
            _ => "clean".to_string(),
        }
    }
}

/// Record of one generation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt number.
    pub index: u32,
    /// Parameters the synthesizer was called with.
    pub parameters_used: GenerationParameters,
    /// Prompt the synthesizer was called with.
    pub prompt_used: String,
    /// Verdict for this attempt.
    pub report: QualityReport,
}

/// Terminal result of a retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// An attempt passed; its audio is carried forward.
    Accepted {
        /// The accepted buffer.
        buffer: AudioBuffer,
        /// 1-based index of the accepted attempt.
        attempt_index: u32,
    },
    /// The retry budget ran out.
    Exhausted {
        /// Reason recorded for the final attempt.
        last_reason: FailureReason,
    },
    /// Cancellation was observed before an attempt started.
    Cancelled {
        /// Attempts completed before cancellation.
        attempts_made: u32,
    },
}

impl GenerationOutcome {
    /// Returns true if an attempt was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, GenerationOutcome::Accepted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reason_text_families() {
        assert_eq!(
            FailureReason::from_reason_text("Pitch unstable"),
            FailureReason::PitchUnstable
        );
        assert_eq!(
            FailureReason::from_reason_text("melody is off-key"),
            FailureReason::OffKey
        );
        assert_eq!(
            FailureReason::from_reason_text("Tempo unstable"),
            FailureReason::TempoUnstable
        );
        assert_eq!(
            FailureReason::from_reason_text("background noise"),
            FailureReason::Harsh
        );
        assert_eq!(
            FailureReason::from_reason_text("Clipping detected"),
            FailureReason::Clipping
        );
        assert_eq!(
            FailureReason::from_reason_text("wrong vibe"),
            FailureReason::IntentMismatch
        );
    }

    #[test]
    fn test_reason_text_follows_keyword_priority() {
        assert_eq!(
            FailureReason::from_reason_text("clipping on every beat"),
            FailureReason::Clipping
        );
        assert_eq!(
            FailureReason::from_reason_text("besura phrase, tempo drifts"),
            FailureReason::OffKey
        );
        assert_eq!(
            FailureReason::from_reason_text("pitch wobble with harsh noise"),
            FailureReason::PitchUnstable
        );
        assert_eq!(
            FailureReason::from_reason_text("loose rhythm"),
            FailureReason::IntentMismatch
        );
        assert_eq!(
            FailureReason::from_reason_text("distorted"),
            FailureReason::IntentMismatch
        );
    }

    #[test]
    fn test_reason_text_round_trips_labels() {
        for reason in [
            FailureReason::Silent,
            FailureReason::Clipping,
            FailureReason::Harsh,
            FailureReason::FlatDynamics,
            FailureReason::PitchUnstable,
            FailureReason::OffKey,
            FailureReason::TempoUnstable,
            FailureReason::IntentMismatch,
        ] {
            assert_eq!(FailureReason::from_reason_text(reason.as_str()), reason);
        }
    }

    #[test]
    fn test_internal_error_display() {
        let reason = FailureReason::SynthesisFailed("out of memory".into());
        assert!(reason.is_internal_error());
        assert_eq!(reason.to_string(), "synthesis error: out of memory");
    }

    #[test]
    fn test_report_label() {
        assert_eq!(QualityReport::clean().label(), "clean");
        assert_eq!(QualityReport::failed(FailureReason::Harsh).label(), "harsh");
    }

    #[test]
    fn test_report_json_omits_empty_fields() {
        let json = serde_json::to_string(&QualityReport::clean()).unwrap();
        assert_eq!(json, r#"{"passed":true}"#);
    }
}
