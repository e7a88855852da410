//! End-to-end job scenarios with scripted collaborators.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tunegate_backend_audio::rng::seed_from_job_id;
use tunegate_backend_audio::wav::read_wav;
use tunegate_engine::{
    run_job, FnSynthesizer, JobError, JobPipeline, PostprocessSelector, RetryController,
    SynthError, EXHAUSTED_MESSAGE, FATAL_MESSAGE,
};
use tunegate_qa::PerceptualQualityJudge;
use tunegate_spec::{
    AudioBuffer, FailureReason, GenerationOutcome, GenerationParameters, GenerationRequest, Mode,
};

#[test]
fn test_clipping_render_exhausts_after_four_attempts() {
    let mut calls = 0;
    let mut synth = FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| {
        calls += 1;
        Ok(clipped_tone(2.0))
    });
    let request = GenerationRequest::new("soft piano melody", 10, Mode::Cinematic);
    let report = RetryController::new(4).run(
        &request,
        &mut synth,
        &PerceptualQualityJudge::default(),
    );
    drop(synth);

    assert_eq!(calls, 4);
    assert_eq!(
        report.outcome,
        GenerationOutcome::Exhausted {
            last_reason: FailureReason::Clipping
        }
    );
    assert_eq!(report.attempts.len(), 4);
    let temperatures: Vec<f64> = report
        .attempts
        .iter()
        .map(|a| a.parameters_used.temperature)
        .collect();
    assert_eq!(temperatures, vec![0.9, 0.8, 0.8, 0.8]);
    assert!(report
        .attempts
        .iter()
        .all(|a| a.parameters_used.cfg_coefficient == 3.5));
    assert!(report
        .attempts
        .iter()
        .all(|a| a.report.reason == Some(FailureReason::Clipping)));
}

#[test]
fn test_exhausted_job_reports_retry_message() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("job.wav");
    let pipeline = JobPipeline::new(
        RetryController::new(4),
        Box::new(PerceptualQualityJudge::default()),
        Box::new(PostprocessSelector::default()),
    );
    let mut synth = FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| Ok(clipped_tone(2.0)));
    let mut sink = RecordingSink::default();
    let request = GenerationRequest::new("soft piano melody", 10, Mode::Cinematic);

    let report = run_job("job-1", &request, &pipeline, &mut synth, &mut sink, &out);

    assert!(matches!(
        report.result,
        Err(JobError::Exhausted {
            last_reason: FailureReason::Clipping
        })
    ));
    assert_eq!(
        sink.events,
        vec![
            Event::Running("job-1".into()),
            Event::Error("job-1".into(), EXHAUSTED_MESSAGE.into()),
        ]
    );
    assert!(!out.exists());
}

#[test]
fn test_classical_off_key_then_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("raga.wav");
    let post = RecordingPostprocessor::default();
    let calls = post.calls.clone();
    let pipeline = JobPipeline::new(
        RetryController::new(4),
        Box::new(FailFirst::new(FailureReason::OffKey, 1)),
        Box::new(post),
    );
    let mut prompts = Vec::new();
    let mut synth = FnSynthesizer::new(|prompt: &str, _: &GenerationParameters, _| {
        prompts.push(prompt.to_string());
        Ok(breathing_tone(4.0))
    });
    let mut sink = RecordingSink::default();
    let request = GenerationRequest::new("veena in raga mohanam", 4, Mode::Classical);

    let report = run_job("job-raga", &request, &pipeline, &mut synth, &mut sink, &out);
    drop(synth);

    let artifact = report.result.expect("job should be accepted");
    assert_eq!(artifact.attempt_index, 2);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.attempts[1].parameters_used.temperature, 0.7);
    assert_eq!(
        prompts,
        vec![
            "veena in raga mohanam".to_string(),
            "veena in raga mohanam, stable tuning, in key, harmonious melody".to_string(),
        ]
    );
    assert_eq!(
        *calls.lock().unwrap(),
        vec![(Mode::Classical, seed_from_job_id("job-raga"))]
    );
    assert_eq!(
        sink.events,
        vec![
            Event::Running("job-raga".into()),
            Event::Done("job-raga".into(), out.to_string_lossy().into_owned()),
        ]
    );

    let written = read_wav(&out).unwrap();
    assert_eq!(written.channels, 2);
    assert_eq!(written.sample_rate, 44100);
}

#[test]
fn test_same_job_id_gives_same_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = JobPipeline::new(
        RetryController::new(1),
        Box::new(PerceptualQualityJudge::default()),
        Box::new(PostprocessSelector::default()),
    );
    let mut hashes = Vec::new();
    for name in ["a.wav", "b.wav"] {
        let mut synth =
            FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| Ok(breathing_tone(2.0)));
        let request = GenerationRequest::new("calm pads", 2, Mode::Cinematic);
        let report = run_job(
            "job-same",
            &request,
            &pipeline,
            &mut synth,
            &mut RecordingSink::default(),
            &dir.path().join(name),
        );
        hashes.push(report.result.unwrap().pcm_hash);
    }
    assert_eq!(hashes[0], hashes[1]);
}

#[test]
fn test_postprocess_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = JobPipeline::new(
        RetryController::new(4),
        Box::new(PerceptualQualityJudge::default()),
        Box::new(BrokenPostprocessor),
    );
    let mut calls = 0;
    let mut synth = FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| {
        calls += 1;
        Ok(breathing_tone(2.0))
    });
    let mut sink = RecordingSink::default();
    let request = GenerationRequest::new("calm", 2, Mode::Cinematic);

    let report = run_job("job-x", &request, &pipeline, &mut synth, &mut sink, &dir.path().join("x.wav"));
    drop(synth);

    assert_eq!(calls, 1);
    assert!(matches!(report.result, Err(JobError::Postprocess(_))));
    assert_eq!(
        sink.events.last(),
        Some(&Event::Error("job-x".into(), FATAL_MESSAGE.into()))
    );
}

#[test]
fn test_invalid_request_never_synthesizes() {
    let pipeline = JobPipeline::from_config(&Default::default());
    let mut synth = FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| -> Result<AudioBuffer, SynthError> {
        panic!("synthesizer must not run")
    });
    let mut sink = RecordingSink::default();
    let request = GenerationRequest::new("  ", 0, Mode::Cinematic);

    let report = run_job("job-bad", &request, &pipeline, &mut synth, &mut sink, std::path::Path::new("unused.wav"));

    assert!(matches!(report.result, Err(JobError::InvalidRequest(_))));
    assert!(report.attempts.is_empty());
    assert_eq!(sink.events.len(), 2);
    assert_eq!(
        sink.events[1],
        Event::Error("job-bad".into(), FATAL_MESSAGE.into())
    );
}

#[test]
fn test_synth_errors_exhaust_the_budget() {
    let pipeline = JobPipeline::new(
        RetryController::new(3),
        Box::new(AlwaysFail(FailureReason::Harsh)),
        Box::new(PostprocessSelector::default()),
    );
    let mut synth = FnSynthesizer::new(|_: &str, _: &GenerationParameters, _| {
        Err(SynthError::Timeout { seconds: 30 })
    });
    let mut sink = RecordingSink::default();
    let request = GenerationRequest::new("storm", 5, Mode::Cinematic);

    let report = run_job("job-t", &request, &pipeline, &mut synth, &mut sink, std::path::Path::new("unused.wav"));

    assert_eq!(report.attempts.len(), 3);
    match report.result {
        Err(JobError::Exhausted { last_reason }) => {
            assert!(matches!(last_reason, FailureReason::SynthesisFailed(_)))
        }
        other => panic!("unexpected result {:?}", other),
    }
}
