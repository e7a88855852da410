//! Command implementations for the `tunegate` binary.

pub mod analyze;
pub mod generate;
pub mod plan;
pub mod postprocess;
pub mod qa;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tunegate_backend_audio::wav::read_wav;
use tunegate_spec::{AudioBuffer, GateConfig};

/// Loads the gate configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<GateConfig> {
    match path {
        Some(path) => GateConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(GateConfig::default()),
    }
}

/// Reads a WAV file with a path in the error message.
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    read_wav(path).with_context(|| format!("Failed to read WAV: {}", path.display()))
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
