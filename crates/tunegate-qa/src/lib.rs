//! Quality checks for generated audio.
//!
//! Two layers guard the output of the synthesizer:
//!
//! - [`TechnicalQualityAnalyzer`] runs every signal-health check and reports
//!   all issues at once, with a paired repair chain.
//! - [`PerceptualQualityJudge`] runs an ordered list of [`PerceptualCheck`]s
//!   and stops at the first failure. Musical checks (pitch, key, tempo) only
//!   run in classical mode.
//!
//! # Example
//!
//! ```
//! use tunegate_qa::{PerceptualQualityJudge, QualityJudge};
//! use tunegate_spec::{AudioBuffer, FailureReason, Mode};
//!
//! let judge = PerceptualQualityJudge::default();
//! let silence = AudioBuffer::mono(vec![0.0; 32000], 32000);
//! let report = judge.judge(&silence, "soft piano", Mode::Cinematic).unwrap();
//! assert_eq!(report.reason, Some(FailureReason::Silent));
//! ```

pub mod error;
pub mod perceptual;
pub mod signal;
pub mod summary;
pub mod technical;

pub use error::QaError;
pub use perceptual::{PerceptualCheck, PerceptualQualityJudge, QualityJudge};
pub use signal::AnalyzedSignal;
pub use summary::MetricSummary;
pub use technical::{TechnicalIssue, TechnicalQualityAnalyzer, TechnicalReport};
