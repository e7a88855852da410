//! `tunegate qa`: technical health check with optional repair.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tunegate_backend_audio::wav::write_wav_pcm16;
use tunegate_qa::{TechnicalQualityAnalyzer, TechnicalReport};
use tunegate_spec::GateConfig;

#[derive(Debug, Serialize)]
struct RepairOutput {
    output: String,
    pcm_hash: String,
    after: TechnicalReport,
}

#[derive(Debug, Serialize)]
struct QaOutput<'a> {
    input: &'a str,
    before: TechnicalReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    repair: Option<RepairOutput>,
}

/// Checks `input` and, with `repair_out`, writes a repaired copy.
///
/// Exit code 0 when the final audio (repaired if requested) is clean.
pub fn run(input: &str, repair_out: Option<&str>, config: &GateConfig, json: bool) -> Result<ExitCode> {
    let buffer = super::load_wav(Path::new(input))?;
    let analyzer = TechnicalQualityAnalyzer::new(config.technical.clone());
    let before = analyzer.check(&buffer);

    let repair = match repair_out {
        Some(out) => {
            let repaired = analyzer
                .repair(&buffer)
                .with_context(|| format!("Failed to repair: {}", input))?;
            let pcm_hash = write_wav_pcm16(Path::new(out), &repaired)
                .with_context(|| format!("Failed to write: {}", out))?;
            Some(RepairOutput {
                output: out.to_string(),
                pcm_hash,
                after: analyzer.check(&repaired),
            })
        }
        None => None,
    };

    let passed = repair.as_ref().map_or(before.passed, |r| r.after.passed);
    let code = if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    };

    if json {
        super::print_json(&QaOutput {
            input,
            before,
            repair,
        })?;
        return Ok(code);
    }

    println!("{} {}", "Checking:".cyan().bold(), input);
    print_report(&before);
    if let Some(repair) = repair {
        println!(
            "\n{} {} ({})",
            "Repaired:".green().bold(),
            repair.output,
            &repair.pcm_hash[..16.min(repair.pcm_hash.len())]
        );
        print_report(&repair.after);
    }
    Ok(code)
}

fn print_report(report: &TechnicalReport) {
    if report.passed {
        println!("  {} no issues", "OK".green().bold());
        return;
    }
    for issue in &report.issues {
        println!("  {} {}", "x".red(), issue);
    }
}
