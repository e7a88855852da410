//! Error types for the engine.

use thiserror::Error;
use tunegate_backend_audio::AudioError;
use tunegate_spec::{BackendError, FailureReason, ValidationError};

use crate::job::{CANCELLED_MESSAGE, EXHAUSTED_MESSAGE, FATAL_MESSAGE};

/// Errors from a synthesizer collaborator.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The model failed to produce audio.
    #[error("synthesis failed: {0}")]
    Failed(String),

    /// A model variant could not be loaded.
    #[error("failed to load {variant} model: {message}")]
    ModelLoad {
        /// Variant name.
        variant: String,
        /// Loader message.
        message: String,
    },

    /// The synthesizer did not finish in time.
    #[error("synthesis timed out after {seconds}s")]
    Timeout {
        /// Time limit in seconds.
        seconds: u64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The rendered audio could not be decoded.
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
}

impl BackendError for SynthError {
    fn code(&self) -> &'static str {
        match self {
            SynthError::Failed(_) => "SYNTH_001",
            SynthError::ModelLoad { .. } => "SYNTH_002",
            SynthError::Timeout { .. } => "SYNTH_003",
            SynthError::Io(_) => "SYNTH_004",
            SynthError::Audio(_) => "SYNTH_005",
        }
    }

    fn category(&self) -> &'static str {
        "synth"
    }
}

/// Errors from postprocessing accepted audio.
#[derive(Debug, Error)]
pub enum PostprocessError {
    /// The accepted buffer holds no samples.
    #[error("accepted audio is empty")]
    EmptyBuffer,

    /// An effect failed.
    #[error("effect chain failed: {0}")]
    Audio(#[from] AudioError),
}

/// Why a job did not produce an artifact.
#[derive(Debug, Error)]
pub enum JobError {
    /// The request failed validation.
    #[error("invalid request: {}", format_validation(.0))]
    InvalidRequest(Vec<ValidationError>),

    /// Every attempt was rejected.
    #[error("retry budget exhausted, last reason: {last_reason}")]
    Exhausted {
        /// Reason recorded for the final attempt.
        last_reason: FailureReason,
    },

    /// The job was cancelled between attempts.
    #[error("cancelled after {attempts_made} attempts")]
    Cancelled {
        /// Attempts completed before cancellation.
        attempts_made: u32,
    },

    /// Postprocessing failed after acceptance.
    #[error(transparent)]
    Postprocess(#[from] PostprocessError),

    /// The artifact could not be written.
    #[error("failed to write output: {0}")]
    Write(#[from] AudioError),
}

impl JobError {
    /// Message handed to the job-state sink.
    pub fn user_message(&self) -> &'static str {
        match self {
            JobError::Exhausted { .. } => EXHAUSTED_MESSAGE,
            JobError::Cancelled { .. } => CANCELLED_MESSAGE,
            _ => FATAL_MESSAGE,
        }
    }

    /// Whether the user can simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Exhausted { .. } | JobError::Cancelled { .. })
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunegate_spec::ErrorCode;

    #[test]
    fn test_user_messages() {
        let exhausted = JobError::Exhausted {
            last_reason: FailureReason::Clipping,
        };
        assert_eq!(exhausted.user_message(), EXHAUSTED_MESSAGE);
        assert!(exhausted.is_retryable());
        assert_eq!(
            exhausted.to_string(),
            "retry budget exhausted, last reason: clipping"
        );

        let fatal = JobError::Postprocess(PostprocessError::EmptyBuffer);
        assert_eq!(fatal.user_message(), FATAL_MESSAGE);
        assert!(!fatal.is_retryable());
    }

    #[test]
    fn test_invalid_request_lists_errors() {
        let err = JobError::InvalidRequest(vec![ValidationError::new(
            ErrorCode::EmptyPrompt,
            "prompt is empty",
        )]);
        assert!(err.to_string().contains("prompt is empty"));
    }

    #[test]
    fn test_synth_error_codes() {
        assert_eq!(SynthError::Timeout { seconds: 5 }.code(), "SYNTH_003");
        assert_eq!(SynthError::Failed("x".into()).category(), "synth");
    }
}
