//! `tunegate postprocess`: run a mode's finishing chain on a WAV file.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use tunegate_backend_audio::wav::write_wav_pcm16;
use tunegate_engine::PostprocessSelector;
use tunegate_spec::{GateConfig, Mode};

/// Postprocesses `input` into `output`.
pub fn run(
    input: &str,
    output: &str,
    mode: Mode,
    seed: u32,
    config: &GateConfig,
    json: bool,
) -> Result<ExitCode> {
    let buffer = super::load_wav(Path::new(input))?;
    let selector = PostprocessSelector::new(config.output_sample_rate);
    let finished = selector
        .apply(&buffer, mode, seed)
        .with_context(|| format!("Failed to postprocess: {}", input))?;
    let pcm_hash = write_wav_pcm16(Path::new(output), &finished)
        .with_context(|| format!("Failed to write: {}", output))?;

    if json {
        super::print_json(&serde_json::json!({
            "input": input,
            "output": output,
            "mode": mode,
            "seed": seed,
            "effects": PostprocessSelector::chain_for(mode)
                .iter()
                .map(|e| e.name())
                .collect::<Vec<_>>(),
            "pcm_hash": pcm_hash,
        }))?;
    } else {
        println!(
            "{} {} -> {} ({} chain)",
            "Postprocessed:".green().bold(),
            input,
            output,
            mode
        );
        println!("{} {}", "PCM hash:".dimmed(), pcm_hash);
    }
    Ok(ExitCode::SUCCESS)
}
