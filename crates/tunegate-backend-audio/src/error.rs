//! Error types for the audio backend.

use thiserror::Error;
use tunegate_spec::BackendError;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors raised by DSP, effect and WAV operations.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Invalid sample rate.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: u32,
    },

    /// Unsupported channel layout.
    #[error("unsupported channel count: {channels}")]
    InvalidChannels {
        /// The channel count.
        channels: u16,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Buffer holds no samples.
    #[error("audio buffer is empty")]
    EmptyBuffer,

    /// WAV decode or encode failure.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Processing produced an unusable result.
    #[error("processing error: {message}")]
    Processing {
        /// Error message.
        message: String,
    },
}

impl AudioError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a processing error.
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing {
            message: message.into(),
        }
    }
}

impl BackendError for AudioError {
    fn code(&self) -> &'static str {
        match self {
            AudioError::InvalidSampleRate { .. } => "AUDIO_001",
            AudioError::InvalidChannels { .. } => "AUDIO_002",
            AudioError::InvalidParameter { .. } => "AUDIO_003",
            AudioError::EmptyBuffer => "AUDIO_004",
            AudioError::Wav(_) => "AUDIO_005",
            AudioError::Io(_) => "AUDIO_006",
            AudioError::Processing { .. } => "AUDIO_007",
        }
    }

    fn category(&self) -> &'static str {
        "audio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_helper() {
        let err = AudioError::invalid_param("compressor.ratio", "must be 1.0-20.0, got 40");
        assert!(err.to_string().contains("compressor.ratio"));
        assert_eq!(err.code(), "AUDIO_003");
        assert_eq!(err.category(), "audio");
    }

    #[test]
    fn test_processing_helper() {
        let err = AudioError::processing("loudness gain is not finite");
        assert!(err.to_string().contains("not finite"));
    }
}
