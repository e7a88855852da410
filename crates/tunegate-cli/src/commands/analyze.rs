//! `tunegate analyze`: perceptual verdict and metrics for a WAV file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tunegate_qa::{AnalyzedSignal, MetricSummary, PerceptualQualityJudge};
use tunegate_spec::{GateConfig, Mode, QualityReport};

#[derive(Debug, Serialize)]
struct AnalyzeOutput<'a> {
    input: &'a str,
    mode: Mode,
    label: String,
    report: QualityReport,
    metrics: MetricSummary,
}

/// Runs the perceptual judge on `input`.
///
/// Exit code 0 when the audio is clean, 1 when it is rejected.
pub fn run(input: &str, prompt: &str, mode: Mode, config: &GateConfig, json: bool) -> Result<ExitCode> {
    let buffer = super::load_wav(Path::new(input))?;
    let signal = AnalyzedSignal::new(&buffer)
        .with_context(|| format!("Failed to analyze: {}", input))?;

    let judge = PerceptualQualityJudge::new(config.perceptual.clone());
    let report = judge.check_signal(&signal, mode);
    let metrics = MetricSummary::measure(&signal, &config.perceptual);
    tracing::debug!(input, prompt, verdict = %report.label(), "analyzed");

    let code = if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    };

    if json {
        super::print_json(&AnalyzeOutput {
            input,
            mode,
            label: report.label(),
            report,
            metrics,
        })?;
        return Ok(code);
    }

    println!("{} {}", "Analyzing:".cyan().bold(), input);
    println!("{} {}", "Mode:".dimmed(), mode);
    println!(
        "{} {:.2}s @ {} Hz",
        "Duration:".dimmed(),
        metrics.duration_seconds,
        metrics.sample_rate
    );
    println!();
    println!("  rms            {:.4}", metrics.rms);
    println!("  peak           {:.4}", metrics.peak);
    println!("  clip ratio     {:.4}", metrics.clip_ratio);
    println!("  dynamic range  {:.4}", metrics.dynamic_range);
    println!("  harshness      {}", optional(metrics.harshness));
    if mode == Mode::Classical {
        println!("  voiced frames  {}", metrics.voiced_frames);
        println!("  pitch cv       {}", optional(metrics.pitch_variation));
        println!("  out of scale   {}", optional(metrics.out_of_scale_ratio));
        println!("  beats          {}", metrics.beats);
        println!("  tempo          {}", optional(metrics.tempo_bpm));
        println!("  tempo jitter   {}", optional(metrics.tempo_jitter));
    }
    println!();

    if report.passed {
        println!("{} clean", "PASS".green().bold());
    } else {
        print!("{} {}", "FAIL".red().bold(), report.label());
        match &report.detail {
            Some(detail) => println!(" ({})", detail),
            None => println!(),
        }
    }
    Ok(code)
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}
