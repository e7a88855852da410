//! Tunegate canonical types.
//!
//! This crate holds the data model shared by every stage of the generation
//! quality gate: the audio buffer handed between stages, the generation request
//! and its tunable parameters, the closed failure taxonomy, per-attempt records
//! and the terminal outcome of a job. It also owns the gate configuration with
//! every numeric threshold the analyzers use.
//!
//! # Example
//!
//! ```
//! use tunegate_spec::{GenerationParameters, GenerationRequest, Mode};
//!
//! let request = GenerationRequest::new("soft piano melody", 10, Mode::Classical);
//! assert!(request.validate().is_ok());
//! assert_eq!(request.generation_parameters, GenerationParameters::default());
//! ```
//!
//! # Modules
//!
//! - [`audio`]: Sample buffer owned by whichever stage currently holds it
//! - [`request`]: Mode, generation parameters and the job request
//! - [`report`]: Failure taxonomy, quality verdicts, attempts and outcomes
//! - [`config`]: Gate thresholds and retry bound
//! - [`error`]: Validation errors and the backend error trait

pub mod audio;
pub mod config;
pub mod error;
pub mod report;
pub mod request;

pub use audio::AudioBuffer;
pub use config::{GateConfig, PerceptualThresholds, TechnicalThresholds, DEFAULT_MAX_RETRIES};
pub use error::{BackendError, ErrorCode, SpecError, ValidationError};
pub use report::{Attempt, FailureReason, GenerationOutcome, QualityReport};
pub use request::{GenerationParameters, GenerationRequest, Mode};
