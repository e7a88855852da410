//! Closed-loop generation engine.
//!
//! A [`RetryController`] calls a [`Synthesizer`], asks a
//! [`QualityJudge`](tunegate_qa::QualityJudge) for a verdict and, on
//! failure, lets the [`RepairPolicy`] rewrite the parameters and prompt
//! before trying again. Accepted audio goes through the mode's postprocess
//! chain exactly once. [`run_job`] wires all of it to a job-state sink and a
//! WAV artifact.
//!
//! ```
//! use tunegate_engine::RepairPolicy;
//! use tunegate_spec::{FailureReason, GenerationParameters};
//!
//! let policy = RepairPolicy::default();
//! let (params, prompt) = policy.repair(
//!     &GenerationParameters::default(),
//!     "soft piano melody",
//!     &FailureReason::Clipping,
//!     10,
//! );
//! assert_eq!(params.temperature, 0.8);
//! assert!(prompt.starts_with("soft piano melody"));
//! ```

pub mod cancel;
pub mod controller;
pub mod error;
pub mod guardrails;
pub mod job;
pub mod pipeline;
pub mod postprocess;
pub mod repair;
pub mod synth;

pub use cancel::CancellationToken;
pub use controller::{RetryController, RunReport};
pub use error::{JobError, PostprocessError, SynthError};
pub use guardrails::apply_quality_guardrails;
pub use job::{JobStateSink, CANCELLED_MESSAGE, EXHAUSTED_MESSAGE, FATAL_MESSAGE};
pub use pipeline::{run_job, JobArtifact, JobPipeline, JobReport};
pub use postprocess::{PostprocessSelector, Postprocessor};
pub use repair::{RepairPolicy, RepairRule};
pub use synth::{CachedSynthesizer, FnSynthesizer, ModelCache, ModelLoader, ModelVariant, Synthesizer};
