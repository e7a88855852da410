//! `tunegate generate`: a full job through the quality gate.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tunegate_engine::{apply_quality_guardrails, run_job, JobArtifact, JobPipeline};
use tunegate_spec::{Attempt, GateConfig, GenerationRequest, Mode};

use crate::job_store::{new_job_id, output_path, validate_job_id, FileJobStore};
use crate::subprocess::SubprocessSynthesizer;

/// Options for one generation job.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub prompt: String,
    pub duration_seconds: u32,
    pub mode: Mode,
    pub instruments: Vec<String>,
    pub synth_cmd: String,
    pub out_dir: String,
    pub job_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct GenerateOutput<'a> {
    job_id: &'a str,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<&'a JobArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    attempts: &'a [Attempt],
}

/// Runs one job and records it in the job store under `out_dir`.
///
/// Exit code 0 when an attempt was accepted and written.
pub fn run(options: &GenerateOptions, config: &GateConfig, json: bool) -> Result<ExitCode> {
    let job_id = options.job_id.clone().unwrap_or_else(new_job_id);
    validate_job_id(&job_id)?;

    let out_dir = Path::new(&options.out_dir);
    let mut store = FileJobStore::open(out_dir)?;
    store.create(&job_id)?;

    let prompt = apply_quality_guardrails(&options.prompt, &options.instruments, options.mode);
    let request = GenerationRequest::new(prompt, options.duration_seconds, options.mode)
        .with_parameters(config.default_parameters);

    let mut synth = SubprocessSynthesizer::new(&options.synth_cmd, out_dir.join(format!("{}_renders", job_id)))
        .context("Invalid --synth-cmd")?
        .with_timeout(Duration::from_secs(options.timeout_secs));
    let pipeline = JobPipeline::from_config(config);
    let output = output_path(out_dir, &job_id);

    if !json {
        println!("{} {} ({})", "Generating:".cyan().bold(), job_id, options.mode);
        println!("{} {}", "Prompt:".dimmed(), request.prompt);
    }

    let report = run_job(&job_id, &request, &pipeline, &mut synth, &mut store, &output);
    store.record_attempts(&job_id, &report.attempts)?;

    let (accepted, artifact, failure) = match &report.result {
        Ok(artifact) => (true, Some(artifact), None),
        Err(e) => (false, None, Some(e)),
    };

    if json {
        super::print_json(&GenerateOutput {
            job_id: &job_id,
            accepted,
            artifact,
            message: failure.map(|e| e.user_message()),
            error: failure.map(|e| e.to_string()),
            attempts: &report.attempts,
        })?;
    } else {
        for attempt in &report.attempts {
            let verdict = if attempt.report.passed {
                "clean".green()
            } else {
                attempt.report.label().red()
            };
            println!(
                "  #{} t={} k={} cfg={} {}",
                attempt.index,
                attempt.parameters_used.temperature,
                attempt.parameters_used.top_k,
                attempt.parameters_used.cfg_coefficient,
                verdict
            );
        }
        match (artifact, failure) {
            (Some(artifact), _) => {
                println!(
                    "\n{} attempt {} -> {}",
                    "ACCEPTED".green().bold(),
                    artifact.attempt_index,
                    artifact.output_path.display()
                );
                println!("{} {}", "PCM hash:".dimmed(), artifact.pcm_hash);
            }
            (None, Some(e)) => {
                println!("\n{} {}", "FAILED".red().bold(), e.user_message());
                println!("{} {}", "Cause:".dimmed(), e);
            }
            (None, None) => {}
        }
    }

    Ok(if accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
