//! `tunegate status`: print a job record.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;

use crate::job_store::{validate_job_id, FileJobStore, JobStatus};

/// Prints the record for `job_id` stored under `out_dir`.
pub fn run(job_id: &str, out_dir: &str, json: bool) -> Result<ExitCode> {
    validate_job_id(job_id)?;
    let store = FileJobStore::open(Path::new(out_dir))?;
    let Some(record) = store.get(job_id)? else {
        anyhow::bail!("No job '{}' in {}", job_id, out_dir);
    };

    if json {
        super::print_json(&record)?;
        return Ok(ExitCode::SUCCESS);
    }

    let status = match record.status {
        JobStatus::Done => record.status.as_str().green().bold(),
        JobStatus::Error => record.status.as_str().red().bold(),
        _ => record.status.as_str().yellow().bold(),
    };
    println!("{} {} {}", "Job:".cyan().bold(), record.job_id, status);
    println!("{} {}", "Created:".dimmed(), record.created_at.to_rfc3339());
    println!("{} {}", "Updated:".dimmed(), record.updated_at.to_rfc3339());
    if let Some(result) = &record.result {
        println!("{} {}", "Output:".dimmed(), result);
    }
    if let Some(error) = &record.error {
        println!("{} {}", "Message:".dimmed(), error);
    }
    for attempt in &record.attempts {
        println!(
            "  #{} t={} k={} cfg={} {}",
            attempt.index,
            attempt.parameters_used.temperature,
            attempt.parameters_used.top_k,
            attempt.parameters_used.cfg_coefficient,
            attempt.report.label()
        );
    }
    Ok(ExitCode::SUCCESS)
}
