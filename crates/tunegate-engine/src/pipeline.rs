//! One job end to end: lifecycle callbacks, retry loop, postprocess, WAV.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};
use tunegate_backend_audio::rng::seed_from_job_id;
use tunegate_backend_audio::wav::write_wav_pcm16;
use tunegate_qa::{PerceptualQualityJudge, QualityJudge};
use tunegate_spec::{Attempt, GateConfig, GenerationOutcome, GenerationRequest};

use crate::controller::RetryController;
use crate::error::JobError;
use crate::job::JobStateSink;
use crate::postprocess::{PostprocessSelector, Postprocessor};
use crate::synth::Synthesizer;

/// The stages a job runs through.
pub struct JobPipeline {
    /// Retry loop.
    pub controller: RetryController,
    /// Verdict for every attempt.
    pub judge: Box<dyn QualityJudge>,
    /// Finishing chain for the accepted attempt.
    pub postprocessor: Box<dyn Postprocessor>,
}

impl JobPipeline {
    /// Creates a pipeline from its stages.
    pub fn new(
        controller: RetryController,
        judge: Box<dyn QualityJudge>,
        postprocessor: Box<dyn Postprocessor>,
    ) -> Self {
        Self {
            controller,
            judge,
            postprocessor,
        }
    }

    /// Builds the standard pipeline for `config`.
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(
            RetryController::from_config(config),
            Box::new(PerceptualQualityJudge::new(config.perceptual.clone())),
            Box::new(PostprocessSelector::new(config.output_sample_rate)),
        )
    }
}

/// The written artifact of an accepted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobArtifact {
    /// Where the WAV was written.
    pub output_path: PathBuf,
    /// BLAKE3 hash of the PCM data.
    pub pcm_hash: String,
    /// Attempt that was accepted.
    pub attempt_index: u32,
}

/// Everything a job produced.
#[derive(Debug)]
pub struct JobReport {
    /// Job identifier.
    pub job_id: String,
    /// Attempt ledger.
    pub attempts: Vec<Attempt>,
    /// Artifact or the reason there is none.
    pub result: Result<JobArtifact, JobError>,
}

/// Runs one job and reports every transition to `sink`.
///
/// `set_running` is called first. Then exactly one of `set_done` (after the
/// WAV is written) or `set_error` (with a user-facing message) follows.
/// Postprocessing runs at most once, on the accepted attempt only, seeded
/// from `job_id`.
pub fn run_job(
    job_id: &str,
    request: &GenerationRequest,
    pipeline: &JobPipeline,
    synthesizer: &mut dyn Synthesizer,
    sink: &mut dyn JobStateSink,
    output_path: &Path,
) -> JobReport {
    sink.set_running(job_id);
    info!(job_id, mode = %request.mode, duration = request.duration_seconds, "job started");

    let (attempts, result) = match request.validate() {
        Err(errors) => (Vec::new(), Err(JobError::InvalidRequest(errors))),
        Ok(()) => {
            let run = pipeline
                .controller
                .run(request, synthesizer, pipeline.judge.as_ref());
            let result = finish(job_id, request, pipeline, run.outcome, output_path);
            (run.attempts, result)
        }
    };

    match &result {
        Ok(artifact) => {
            info!(
                job_id,
                attempt = artifact.attempt_index,
                path = %artifact.output_path.display(),
                "job done"
            );
            sink.set_done(job_id, &artifact.output_path.to_string_lossy());
        }
        Err(e) => {
            error!(job_id, error = %e, "job failed");
            sink.set_error(job_id, e.user_message());
        }
    }

    JobReport {
        job_id: job_id.to_string(),
        attempts,
        result,
    }
}

fn finish(
    job_id: &str,
    request: &GenerationRequest,
    pipeline: &JobPipeline,
    outcome: GenerationOutcome,
    output_path: &Path,
) -> Result<JobArtifact, JobError> {
    match outcome {
        GenerationOutcome::Accepted {
            buffer,
            attempt_index,
        } => {
            let seed = seed_from_job_id(job_id);
            let finished = pipeline
                .postprocessor
                .postprocess(&buffer, request.mode, seed)?;
            let pcm_hash = write_wav_pcm16(output_path, &finished)?;
            Ok(JobArtifact {
                output_path: output_path.to_path_buf(),
                pcm_hash,
                attempt_index,
            })
        }
        GenerationOutcome::Exhausted { last_reason } => Err(JobError::Exhausted { last_reason }),
        GenerationOutcome::Cancelled { attempts_made } => {
            Err(JobError::Cancelled { attempts_made })
        }
    }
}
