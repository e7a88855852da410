//! Ordered perceptual judge.

mod checks;

pub use checks::{
    default_checks, ClippingCheck, FlatDynamicsCheck, HarshnessCheck, OffKeyCheck,
    PitchStabilityCheck, SilenceCheck, TempoStabilityCheck,
};

use tunegate_spec::{AudioBuffer, FailureReason, Mode, PerceptualThresholds, QualityReport};

use crate::error::QaError;
use crate::signal::AnalyzedSignal;

/// One perceptual check.
pub trait PerceptualCheck: Send + Sync {
    /// Stable identifier, e.g. "perceptual/silence".
    fn id(&self) -> &'static str;

    /// Reason reported when the check fails.
    fn reason(&self) -> FailureReason;

    /// Whether the check only runs in classical mode.
    fn classical_only(&self) -> bool {
        false
    }

    /// Runs the check. `Some(detail)` means the buffer fails.
    ///
    /// Checks that lack evidence (too few voiced frames, no beats, empty
    /// bands) pass.
    fn evaluate(&self, signal: &AnalyzedSignal, thresholds: &PerceptualThresholds) -> Option<String>;
}

/// Anything that can deliver a verdict on a rendered buffer.
pub trait QualityJudge: Send + Sync {
    /// Judges `buffer`, rendered from `prompt` in `mode`.
    fn judge(&self, buffer: &AudioBuffer, prompt: &str, mode: Mode) -> Result<QualityReport, QaError>;
}

/// Runs checks in registration order and reports the first failure.
pub struct PerceptualQualityJudge {
    checks: Vec<Box<dyn PerceptualCheck>>,
    thresholds: PerceptualThresholds,
}

impl PerceptualQualityJudge {
    /// Creates a judge with the default checks.
    pub fn new(thresholds: PerceptualThresholds) -> Self {
        let mut judge = Self::empty(thresholds);
        for check in default_checks() {
            judge.register(check);
        }
        judge
    }

    /// Creates a judge with no checks.
    pub fn empty(thresholds: PerceptualThresholds) -> Self {
        Self {
            checks: Vec::new(),
            thresholds,
        }
    }

    /// Appends a check to the end of the order.
    pub fn register(&mut self, check: Box<dyn PerceptualCheck>) {
        self.checks.push(check);
    }

    /// Identifiers of the registered checks, in order.
    pub fn check_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.id()).collect()
    }

    pub fn thresholds(&self) -> &PerceptualThresholds {
        &self.thresholds
    }

    /// Judges a prepared signal.
    pub fn check_signal(&self, signal: &AnalyzedSignal, mode: Mode) -> QualityReport {
        for check in &self.checks {
            if check.classical_only() && mode != Mode::Classical {
                continue;
            }
            if let Some(detail) = check.evaluate(signal, &self.thresholds) {
                return QualityReport::failed(check.reason()).with_detail(detail);
            }
        }
        QualityReport::clean()
    }

    /// Judges a buffer.
    ///
    /// The prompt is accepted for interface parity with judges that score
    /// intent. Signal checks do not read it.
    pub fn check(&self, buffer: &AudioBuffer, _prompt: &str, mode: Mode) -> Result<QualityReport, QaError> {
        let signal = AnalyzedSignal::new(buffer)?;
        Ok(self.check_signal(&signal, mode))
    }
}

impl Default for PerceptualQualityJudge {
    fn default() -> Self {
        Self::new(PerceptualThresholds::default())
    }
}

impl QualityJudge for PerceptualQualityJudge {
    fn judge(&self, buffer: &AudioBuffer, prompt: &str, mode: Mode) -> Result<QualityReport, QaError> {
        self.check(buffer, prompt, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct AlwaysFails(FailureReason, bool);

    impl PerceptualCheck for AlwaysFails {
        fn id(&self) -> &'static str {
            "test/always"
        }
        fn reason(&self) -> FailureReason {
            self.0.clone()
        }
        fn classical_only(&self) -> bool {
            self.1
        }
        fn evaluate(&self, _: &AnalyzedSignal, _: &PerceptualThresholds) -> Option<String> {
            Some("always".to_string())
        }
    }

    fn buffer() -> AudioBuffer {
        AudioBuffer::mono(vec![0.1; 100], 32000)
    }

    #[test]
    fn test_default_order() {
        let judge = PerceptualQualityJudge::default();
        assert_eq!(
            judge.check_ids(),
            vec![
                "perceptual/silence",
                "perceptual/clipping",
                "perceptual/harshness",
                "perceptual/flat-dynamics",
                "perceptual/pitch-stability",
                "perceptual/off-key",
                "perceptual/tempo-stability",
            ]
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let mut judge = PerceptualQualityJudge::empty(PerceptualThresholds::default());
        judge.register(Box::new(AlwaysFails(FailureReason::Harsh, false)));
        judge.register(Box::new(AlwaysFails(FailureReason::Silent, false)));
        let report = judge.check(&buffer(), "", Mode::Cinematic).unwrap();
        assert_eq!(report.reason, Some(FailureReason::Harsh));
        assert_eq!(report.detail.as_deref(), Some("always"));
    }

    #[test]
    fn test_classical_only_checks_are_skipped_in_cinematic() {
        let mut judge = PerceptualQualityJudge::empty(PerceptualThresholds::default());
        judge.register(Box::new(AlwaysFails(FailureReason::OffKey, true)));
        assert!(judge.check(&buffer(), "", Mode::Cinematic).unwrap().passed);
        let report = judge.check(&buffer(), "", Mode::Classical).unwrap();
        assert_eq!(report.reason, Some(FailureReason::OffKey));
    }

    #[test]
    fn test_empty_judge_passes() {
        let judge = PerceptualQualityJudge::empty(PerceptualThresholds::default());
        let report = judge.check(&buffer(), "", Mode::Classical).unwrap();
        assert_eq!(report, QualityReport::clean());
        assert_eq!(report.label(), "clean");
    }

    #[test]
    fn test_invalid_buffer_is_an_error() {
        let judge = PerceptualQualityJudge::default();
        let bad = AudioBuffer::mono(vec![f32::INFINITY], 32000);
        assert!(judge.check(&bad, "", Mode::Cinematic).is_err());
    }
}
