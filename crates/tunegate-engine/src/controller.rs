//! The bounded generate, judge, repair loop.

use tracing::{debug, info, warn};
use tunegate_qa::QualityJudge;
use tunegate_spec::{
    Attempt, AudioBuffer, FailureReason, GateConfig, GenerationOutcome, GenerationParameters,
    GenerationRequest, QualityReport, DEFAULT_MAX_RETRIES,
};

use crate::cancel::CancellationToken;
use crate::repair::RepairPolicy;
use crate::synth::Synthesizer;

/// Outcome of a run together with every attempt made.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Terminal state.
    pub outcome: GenerationOutcome,
    /// One entry per synthesizer call, in order.
    pub attempts: Vec<Attempt>,
}

/// Drives attempts until one is accepted or the budget runs out.
///
/// Attempts are strictly sequential. A synthesizer or judge error fails
/// only the attempt it happened in and counts toward the budget.
#[derive(Debug, Clone)]
pub struct RetryController {
    max_retries: u32,
    policy: RepairPolicy,
    cancellation: Option<CancellationToken>,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryController {
    /// Creates a controller allowing `max_retries` attempts in total.
    ///
    /// A bound of zero is raised to one.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
            policy: RepairPolicy::default(),
            cancellation: None,
        }
    }

    /// Creates a controller from the gate configuration.
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.max_retries)
    }

    /// Replaces the repair policy.
    pub fn with_policy(mut self, policy: RepairPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks `token` before every attempt.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Total attempts allowed.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Runs the loop for `request`.
    ///
    /// The request is not validated here beyond its parameters; callers
    /// that need prompt and duration checks run
    /// [`GenerationRequest::validate`] first.
    pub fn run(
        &self,
        request: &GenerationRequest,
        synthesizer: &mut dyn Synthesizer,
        judge: &dyn QualityJudge,
    ) -> RunReport {
        let mut parameters = request.generation_parameters;
        let mut prompt = request.prompt.clone();
        let mut attempts = Vec::new();
        let mut last_reason = FailureReason::IntentMismatch;

        for index in 1..=self.max_retries {
            if self.is_cancelled() {
                info!(attempts_made = index - 1, "run cancelled");
                return RunReport {
                    outcome: GenerationOutcome::Cancelled {
                        attempts_made: index - 1,
                    },
                    attempts,
                };
            }

            info!(
                attempt = index,
                max = self.max_retries,
                temperature = parameters.temperature,
                top_k = parameters.top_k,
                cfg = parameters.cfg_coefficient,
                "starting attempt"
            );

            let report = match self.attempt(request, &prompt, &parameters, synthesizer, judge) {
                Ok((buffer, report)) if report.passed => {
                    info!(attempt = index, "attempt accepted");
                    attempts.push(Attempt {
                        index,
                        parameters_used: parameters,
                        prompt_used: prompt,
                        report,
                    });
                    return RunReport {
                        outcome: GenerationOutcome::Accepted {
                            buffer,
                            attempt_index: index,
                        },
                        attempts,
                    };
                }
                Ok((_, report)) => report,
                Err(reason) => QualityReport::failed(reason),
            };

            let reason = report
                .reason
                .clone()
                .unwrap_or(FailureReason::IntentMismatch);
            warn!(attempt = index, reason = %reason, "attempt rejected");
            attempts.push(Attempt {
                index,
                parameters_used: parameters,
                prompt_used: prompt.clone(),
                report,
            });

            if index < self.max_retries {
                let (next_parameters, next_prompt) =
                    self.policy.repair(&parameters, &prompt, &reason, request.duration_seconds);
                debug!(prompt = %next_prompt, "repaired prompt");
                parameters = next_parameters;
                prompt = next_prompt;
            }
            last_reason = reason;
        }

        info!(
            attempts = attempts.len(),
            reason = %last_reason,
            "retry budget exhausted"
        );
        RunReport {
            outcome: GenerationOutcome::Exhausted { last_reason },
            attempts,
        }
    }

    fn attempt(
        &self,
        request: &GenerationRequest,
        prompt: &str,
        parameters: &GenerationParameters,
        synthesizer: &mut dyn Synthesizer,
        judge: &dyn QualityJudge,
    ) -> Result<(AudioBuffer, QualityReport), FailureReason> {
        parameters.validate().map_err(|errors| {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            FailureReason::SynthesisFailed(message)
        })?;

        let buffer = synthesizer
            .synthesize(prompt, parameters, request.duration_seconds)
            .map_err(|e| FailureReason::SynthesisFailed(e.to_string()))?;

        let report = judge
            .judge(&buffer, prompt, request.mode)
            .map_err(|e| FailureReason::AnalyzerFailed(e.to_string()))?;
        debug!(verdict = %report.label(), "quality verdict");
        Ok((buffer, report))
    }
}
