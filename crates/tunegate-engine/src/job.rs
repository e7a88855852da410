//! Job lifecycle callbacks and the messages users see.

/// Message recorded when every attempt was rejected.
pub const EXHAUSTED_MESSAGE: &str = "Some finetuning of prompt needed, Lets retry";

/// Message recorded when a job fails for any other reason.
pub const FATAL_MESSAGE: &str = "This prompt needs a small tweak for best results. Please try again.";

/// Message recorded when a job is cancelled between attempts.
pub const CANCELLED_MESSAGE: &str = "Generation was cancelled";

/// Receives job lifecycle transitions.
///
/// For one job the pipeline calls `set_running` once, then exactly one of
/// `set_done` or `set_error`.
pub trait JobStateSink {
    /// The job has started.
    fn set_running(&mut self, job_id: &str);

    /// The job produced an artifact at `locator`.
    fn set_done(&mut self, job_id: &str, locator: &str);

    /// The job ended without an artifact.
    fn set_error(&mut self, job_id: &str, message: &str);
}

impl<S: JobStateSink + ?Sized> JobStateSink for &mut S {
    fn set_running(&mut self, job_id: &str) {
        (**self).set_running(job_id)
    }

    fn set_done(&mut self, job_id: &str, locator: &str) {
        (**self).set_done(job_id, locator)
    }

    fn set_error(&mut self, job_id: &str, message: &str) {
        (**self).set_error(job_id, message)
    }
}
