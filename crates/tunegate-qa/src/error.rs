//! Errors raised before any check can run.

use thiserror::Error;

/// Input the analyzers refuse to look at.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QaError {
    /// Sample rate of zero.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Buffer declares no channels.
    #[error("buffer has no channels")]
    NoChannels,

    /// A sample is NaN or infinite.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample {
        /// Interleaved sample index.
        index: usize,
    },
}
