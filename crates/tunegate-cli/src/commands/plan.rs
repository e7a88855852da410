//! `tunegate plan`: show what a repair would change.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use tunegate_engine::RepairPolicy;
use tunegate_spec::{FailureReason, GenerationParameters};

/// Prints the repair for a free-form failure reason.
pub fn run(reason: &str, prompt: &str, duration_seconds: u32, json: bool) -> Result<ExitCode> {
    let reason = FailureReason::from_reason_text(reason);
    let policy = RepairPolicy::default();
    let (parameters, new_prompt) =
        policy.repair(&GenerationParameters::BASELINE, prompt, &reason, duration_seconds);

    if json {
        super::print_json(&serde_json::json!({
            "reason": reason.as_str(),
            "parameters": parameters,
            "prompt": new_prompt,
            "duration_seconds": duration_seconds,
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    let base = policy.baseline();
    println!("{} {}", "Reason:".cyan().bold(), reason);
    println!(
        "  temperature  {} -> {}",
        base.temperature, parameters.temperature
    );
    println!("  top_k        {} -> {}", base.top_k, parameters.top_k);
    println!(
        "  cfg          {} -> {}",
        base.cfg_coefficient, parameters.cfg_coefficient
    );
    println!("  duration     {} s (unchanged)", duration_seconds);
    println!("{} {}", "Prompt:".cyan().bold(), new_prompt);
    Ok(ExitCode::SUCCESS)
}
