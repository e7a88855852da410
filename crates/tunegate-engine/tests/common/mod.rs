//! Fakes shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tunegate_engine::{JobStateSink, PostprocessError, PostprocessSelector, Postprocessor};
use tunegate_qa::{PerceptualQualityJudge, QaError, QualityJudge};
use tunegate_spec::{AudioBuffer, FailureReason, Mode, QualityReport};

pub const SR: u32 = 32000;

/// 220 Hz tone under a slow triangle envelope between 0.02 and 0.12.
pub fn breathing_tone(seconds: f32) -> AudioBuffer {
    let len = (seconds * SR as f32) as usize;
    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / SR as f32;
            let phase = (t / 2.0).fract();
            let tri = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
            let amp = 0.02 + 0.10 * tri;
            amp * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
        })
        .collect();
    AudioBuffer::mono(samples, SR)
}

/// The breathing tone with one sample in a hundred pinned to full scale.
pub fn clipped_tone(seconds: f32) -> AudioBuffer {
    let mut buffer = breathing_tone(seconds);
    for (i, sample) in buffer.samples.iter_mut().enumerate() {
        if i % 100 == 0 {
            *sample = 1.0;
        }
    }
    buffer
}

/// Reports `reason` for the first `failures` calls, then defers to the real judge.
pub struct FailFirst {
    reason: FailureReason,
    failures: u32,
    calls: AtomicU32,
    inner: PerceptualQualityJudge,
}

impl FailFirst {
    pub fn new(reason: FailureReason, failures: u32) -> Self {
        Self {
            reason,
            failures,
            calls: AtomicU32::new(0),
            inner: PerceptualQualityJudge::default(),
        }
    }
}

impl QualityJudge for FailFirst {
    fn judge(&self, buffer: &AudioBuffer, prompt: &str, mode: Mode) -> Result<QualityReport, QaError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Ok(QualityReport::failed(self.reason.clone()))
        } else {
            self.inner.judge(buffer, prompt, mode)
        }
    }
}

/// Always rejects with the same reason.
pub struct AlwaysFail(pub FailureReason);

impl QualityJudge for AlwaysFail {
    fn judge(&self, _: &AudioBuffer, _: &str, _: Mode) -> Result<QualityReport, QaError> {
        Ok(QualityReport::failed(self.0.clone()))
    }
}

/// Postprocessor that logs every call before delegating.
#[derive(Clone, Default)]
pub struct RecordingPostprocessor {
    pub calls: Arc<Mutex<Vec<(Mode, u32)>>>,
    inner: PostprocessSelector,
}

impl Postprocessor for RecordingPostprocessor {
    fn postprocess(
        &self,
        buffer: &AudioBuffer,
        mode: Mode,
        seed: u32,
    ) -> Result<AudioBuffer, PostprocessError> {
        self.calls.lock().unwrap().push((mode, seed));
        self.inner.postprocess(buffer, mode, seed)
    }
}

/// Postprocessor that always fails.
pub struct BrokenPostprocessor;

impl Postprocessor for BrokenPostprocessor {
    fn postprocess(&self, _: &AudioBuffer, _: Mode, _: u32) -> Result<AudioBuffer, PostprocessError> {
        Err(PostprocessError::EmptyBuffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Running(String),
    Done(String, String),
    Error(String, String),
}

/// Job sink that records every callback.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl JobStateSink for RecordingSink {
    fn set_running(&mut self, job_id: &str) {
        self.events.push(Event::Running(job_id.to_string()));
    }

    fn set_done(&mut self, job_id: &str, locator: &str) {
        self.events.push(Event::Done(job_id.to_string(), locator.to_string()));
    }

    fn set_error(&mut self, job_id: &str, message: &str) {
        self.events.push(Event::Error(job_id.to_string(), message.to_string()));
    }
}
