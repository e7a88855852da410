//! JSON file job store.
//!
//! One `<job_id>.json` record per job under a directory. Records move from
//! `queued` to `running` and end in `done` or `error`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use tunegate_engine::JobStateSink;
use tunegate_spec::Attempt;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    /// Lowercase status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

/// Persisted state of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Artifact path once done.
    pub result: Option<String>,
    /// User-facing message once failed.
    pub error: Option<String>,
    /// Attempt ledger, filled in after the run.
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

/// Job records stored as JSON files.
#[derive(Debug, Clone)]
pub struct FileJobStore {
    dir: PathBuf,
}

impl FileJobStore {
    /// Opens a store rooted at `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create job directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the record for `job_id`.
    pub fn record_path(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", job_id))
    }

    /// Writes a fresh `queued` record, replacing any previous one.
    pub fn create(&self, job_id: &str) -> Result<JobRecord> {
        let now = Utc::now();
        let record = JobRecord {
            job_id: job_id.to_string(),
            status: JobStatus::Queued,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
            attempts: Vec::new(),
        };
        self.save(&record)?;
        Ok(record)
    }

    /// Loads the record for `job_id`, `None` if there is none.
    pub fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let path = self.record_path(job_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job record: {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse job record: {}", path.display()))?;
        Ok(Some(record))
    }

    /// Stores the attempt ledger on an existing record.
    pub fn record_attempts(&self, job_id: &str, attempts: &[Attempt]) -> Result<()> {
        self.update(job_id, |record| record.attempts = attempts.to_vec())
    }

    /// Applies `change` to an existing record and bumps `updated_at`.
    ///
    /// Missing records are left alone.
    pub fn update(&self, job_id: &str, change: impl FnOnce(&mut JobRecord)) -> Result<()> {
        let Some(mut record) = self.get(job_id)? else {
            return Ok(());
        };
        change(&mut record);
        record.updated_at = Utc::now();
        self.save(&record)
    }

    fn save(&self, record: &JobRecord) -> Result<()> {
        let path = self.record_path(&record.job_id);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write job record: {}", path.display()))
    }

    fn transition(&self, job_id: &str, change: impl FnOnce(&mut JobRecord)) {
        if let Err(e) = self.update(job_id, change) {
            warn!(job_id, error = %e, "failed to update job record");
        }
    }
}

impl JobStateSink for FileJobStore {
    fn set_running(&mut self, job_id: &str) {
        self.transition(job_id, |r| r.status = JobStatus::Running);
    }

    fn set_done(&mut self, job_id: &str, locator: &str) {
        self.transition(job_id, |r| {
            r.status = JobStatus::Done;
            r.result = Some(locator.to_string());
        });
    }

    fn set_error(&mut self, job_id: &str, message: &str) {
        self.transition(job_id, |r| {
            r.status = JobStatus::Error;
            r.error = Some(message.to_string());
        });
    }
}

/// Checks that `job_id` is usable as a file name.
pub fn validate_job_id(job_id: &str) -> Result<()> {
    let valid = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        anyhow::bail!(
            "Invalid job id '{}': use letters, digits, '-' or '_'",
            job_id
        )
    }
}

/// Job id derived from the current time.
pub fn new_job_id() -> String {
    Utc::now().format("job-%Y%m%d-%H%M%S-%3f").to_string()
}

/// Default location of the job's output WAV.
pub fn output_path(out_dir: &Path, job_id: &str) -> PathBuf {
    out_dir.join(format!("{}.wav", job_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tunegate_spec::{FailureReason, GenerationParameters, QualityReport};

    #[test]
    fn test_lifecycle_done() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileJobStore::open(dir.path()).unwrap();
        let created = store.create("job-1").unwrap();
        assert_eq!(created.status, JobStatus::Queued);

        store.set_running("job-1");
        assert_eq!(store.get("job-1").unwrap().unwrap().status, JobStatus::Running);

        store.set_done("job-1", "/out/job-1.wav");
        let record = store.get("job-1").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Done);
        assert_eq!(record.result.as_deref(), Some("/out/job-1.wav"));
        assert!(record.updated_at >= record.created_at);
    }

    #[test]
    fn test_error_and_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileJobStore::open(dir.path()).unwrap();
        store.create("job-2").unwrap();
        store.set_error("job-2", "Some finetuning of prompt needed, Lets retry");
        let attempts = vec![Attempt {
            index: 1,
            parameters_used: GenerationParameters::BASELINE,
            prompt_used: "x".into(),
            report: QualityReport::failed(FailureReason::Clipping),
        }];
        store.record_attempts("job-2", &attempts).unwrap();

        let record = store.get("job-2").unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.attempts, attempts);
        let json = fs::read_to_string(store.record_path("job-2")).unwrap();
        assert!(json.contains("\"status\": \"error\""));
    }

    #[test]
    fn test_missing_job_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileJobStore::open(dir.path()).unwrap();
        store.set_running("ghost");
        assert_eq!(store.get("ghost").unwrap(), None);
    }

    #[test]
    fn test_job_id_validation() {
        assert!(validate_job_id("job-2024_01").is_ok());
        assert!(validate_job_id("../etc").is_err());
        assert!(validate_job_id("").is_err());
        assert!(validate_job_id(&new_job_id()).is_ok());
    }
}
