//! Error types for request validation and backend reporting.

use thiserror::Error;

/// Error codes for request and configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request errors (E001-E009)
    /// E001: Prompt is empty
    EmptyPrompt,
    /// E002: Duration is zero
    InvalidDuration,
    /// E003: Temperature outside (0, 2]
    TemperatureOutOfRange,
    /// E004: top_k below 1
    TopKOutOfRange,
    /// E005: cfg_coefficient not positive
    CfgOutOfRange,
    /// E006: Unknown generation mode
    UnknownMode,

    // Configuration errors (E010-E019)
    /// E010: Retry bound is zero
    InvalidRetryBound,
    /// E011: Threshold is not a finite positive number
    InvalidThreshold,
    /// E012: Sample rate is zero
    InvalidSampleRate,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptyPrompt => "E001",
            ErrorCode::InvalidDuration => "E002",
            ErrorCode::TemperatureOutOfRange => "E003",
            ErrorCode::TopKOutOfRange => "E004",
            ErrorCode::CfgOutOfRange => "E005",
            ErrorCode::UnknownMode => "E006",
            ErrorCode::InvalidRetryBound => "E010",
            ErrorCode::InvalidThreshold => "E011",
            ErrorCode::InvalidSampleRate => "E012",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "generation_parameters.top_k").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Top-level error type for spec operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Validation failed with one or more errors.
    #[error("validation failed: {}", join_errors(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Trait for errors raised by the processing backends.
///
/// Implementors expose a stable code and a category so that callers can report
/// errors from different crates uniformly.
///
/// # Example
///
/// ```
/// use tunegate_spec::error::BackendError;
///
/// fn describe<E: BackendError>(err: &E) -> String {
///     format!("[{}/{}] {}", err.category(), err.code(), err.message())
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Returns a stable code such as "AUDIO_001".
    fn code(&self) -> &'static str;

    /// Returns a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Returns the error category, e.g. "audio" or "synth".
    fn category(&self) -> &'static str;
}
