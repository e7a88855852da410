//! Parameter and prompt repair after a rejected attempt.

use tracing::debug;
use tunegate_spec::{FailureReason, GenerationParameters};

/// One row of the repair table.
///
/// `None` fields keep the baseline value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairRule {
    /// Temperature override.
    pub temperature: Option<f64>,
    /// Top-k override.
    pub top_k: Option<u32>,
    /// Guidance override.
    pub cfg_coefficient: Option<f64>,
    /// Text appended to the prompt.
    pub prompt_suffix: &'static str,
}

impl RepairRule {
    /// Applies the overrides on top of `base`.
    pub fn apply(&self, base: GenerationParameters) -> GenerationParameters {
        GenerationParameters {
            temperature: self.temperature.unwrap_or(base.temperature),
            top_k: self.top_k.unwrap_or(base.top_k),
            cfg_coefficient: self.cfg_coefficient.unwrap_or(base.cfg_coefficient),
        }
    }
}

const PITCH_RULE: RepairRule = RepairRule {
    temperature: Some(0.7),
    top_k: Some(70),
    cfg_coefficient: Some(4.0),
    prompt_suffix: ", stable tuning, in key, harmonious melody",
};

const TEMPO_RULE: RepairRule = RepairRule {
    temperature: Some(0.8),
    top_k: Some(90),
    cfg_coefficient: None,
    prompt_suffix: ", steady rhythm, consistent tempo",
};

const NOISE_RULE: RepairRule = RepairRule {
    temperature: Some(0.8),
    top_k: None,
    cfg_coefficient: None,
    prompt_suffix: ", clean studio quality, no distortion, no noise",
};

const INTENT_RULE: RepairRule = RepairRule {
    temperature: None,
    top_k: None,
    cfg_coefficient: Some(5.0),
    prompt_suffix: ", strictly follow the requested mood and style only",
};

/// Maps a failure reason to the next attempt's parameters and prompt.
///
/// Every repair starts from the same baseline, so the result depends only
/// on the reason and never on earlier repairs. The prompt is only ever
/// appended to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairPolicy {
    baseline: GenerationParameters,
}

impl Default for RepairPolicy {
    fn default() -> Self {
        Self::new(GenerationParameters::BASELINE)
    }
}

impl RepairPolicy {
    /// Creates a policy that resets to `baseline` before applying a rule.
    pub fn new(baseline: GenerationParameters) -> Self {
        Self { baseline }
    }

    /// The baseline restored before every rule.
    pub fn baseline(&self) -> GenerationParameters {
        self.baseline
    }

    /// Returns the table row for `reason`.
    pub fn rule_for(reason: &FailureReason) -> RepairRule {
        match reason {
            FailureReason::PitchUnstable | FailureReason::OffKey => PITCH_RULE,
            FailureReason::TempoUnstable => TEMPO_RULE,
            FailureReason::Harsh | FailureReason::Clipping => NOISE_RULE,
            FailureReason::Silent
            | FailureReason::FlatDynamics
            | FailureReason::IntentMismatch
            | FailureReason::SynthesisFailed(_)
            | FailureReason::AnalyzerFailed(_) => INTENT_RULE,
        }
    }

    /// Computes the parameters and prompt for the next attempt.
    ///
    /// The incoming parameters are discarded in favour of the baseline.
    /// Duration is fixed for a job, so no rule changes it.
    pub fn repair(
        &self,
        _parameters: &GenerationParameters,
        prompt: &str,
        reason: &FailureReason,
        duration_seconds: u32,
    ) -> (GenerationParameters, String) {
        let rule = Self::rule_for(reason);
        let parameters = rule.apply(self.baseline);
        let prompt = format!("{}{}", prompt, rule.prompt_suffix);
        debug!(
            reason = %reason,
            duration_seconds,
            temperature = parameters.temperature,
            top_k = parameters.top_k,
            cfg = parameters.cfg_coefficient,
            "repair rule applied"
        );
        (parameters, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(temperature: f64, top_k: u32, cfg_coefficient: f64) -> GenerationParameters {
        GenerationParameters {
            temperature,
            top_k,
            cfg_coefficient,
        }
    }

    #[test]
    fn test_pitch_family() {
        let policy = RepairPolicy::default();
        for reason in [FailureReason::PitchUnstable, FailureReason::OffKey] {
            let (p, prompt) = policy.repair(&GenerationParameters::BASELINE, "raga", &reason, 10);
            assert_eq!(p, params(0.7, 70, 4.0));
            assert_eq!(prompt, "raga, stable tuning, in key, harmonious melody");
        }
    }

    #[test]
    fn test_tempo_keeps_baseline_cfg() {
        let (p, prompt) = RepairPolicy::default().repair(
            &params(0.3, 5, 9.0),
            "groove",
            &FailureReason::TempoUnstable,
            30,
        );
        assert_eq!(p, params(0.8, 90, 3.5));
        assert_eq!(prompt, "groove, steady rhythm, consistent tempo");
    }

    #[test]
    fn test_noise_family_only_changes_temperature() {
        for reason in [FailureReason::Harsh, FailureReason::Clipping] {
            let (p, _) = RepairPolicy::default().repair(&params(0.7, 70, 4.0), "x", &reason, 10);
            assert_eq!(p, params(0.8, 120, 3.5));
        }
    }

    #[test]
    fn test_everything_else_raises_guidance() {
        for reason in [
            FailureReason::Silent,
            FailureReason::FlatDynamics,
            FailureReason::IntentMismatch,
            FailureReason::SynthesisFailed("boom".into()),
            FailureReason::AnalyzerFailed("nan".into()),
        ] {
            let (p, prompt) = RepairPolicy::default().repair(&params(0.7, 70, 4.0), "calm", &reason, 10);
            assert_eq!(p, params(0.9, 120, 5.0));
            assert_eq!(prompt, "calm, strictly follow the requested mood and style only");
        }
    }

    #[test]
    fn test_duration_does_not_change_the_repair() {
        let policy = RepairPolicy::default();
        let short = policy.repair(&params(0.5, 50, 3.0), "alap", &FailureReason::OffKey, 5);
        let long = policy.repair(&params(0.5, 50, 3.0), "alap", &FailureReason::OffKey, 120);
        assert_eq!(short, long);
    }

    #[test]
    fn test_custom_baseline() {
        let policy = RepairPolicy::new(params(1.0, 200, 2.0));
        let (p, _) = policy.repair(&params(0.1, 1, 0.1), "x", &FailureReason::Clipping, 10);
        assert_eq!(p, params(0.8, 200, 2.0));
    }
}
