//! Tunegate CLI - quality-gated music generation from the command line.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use tunegate_cli::commands::{self, generate::GenerateOptions};
use tunegate_cli::logging;
use tunegate_cli::subprocess::DEFAULT_TIMEOUT_SECS;
use tunegate_spec::Mode;

/// Tunegate - generate, judge, repair and finish music renders
#[derive(Parser)]
#[command(name = "tunegate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Gate configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge a WAV file and print its perceptual metrics
    Analyze {
        /// Path to the WAV file
        #[arg(short, long)]
        input: String,

        /// Prompt the audio was rendered from
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// Generation mode (cinematic, classical)
        #[arg(short, long, default_value = "cinematic")]
        mode: Mode,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the technical health check, optionally writing a repaired copy
    Qa {
        /// Path to the WAV file
        #[arg(short, long)]
        input: String,

        /// Write the repaired audio here
        #[arg(long)]
        repair_out: Option<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a mode's postprocess chain to a WAV file
    Postprocess {
        /// Path to the input WAV file
        #[arg(short, long)]
        input: String,

        /// Path to the output WAV file
        #[arg(short, long)]
        output: String,

        /// Generation mode (cinematic, classical)
        #[arg(short, long)]
        mode: Mode,

        /// Seed for generated ambience
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a failure reason would change parameters and prompt
    Plan {
        /// Failure reason text (e.g. "off-key", "Tempo unstable")
        #[arg(short, long)]
        reason: String,

        /// Prompt to repair
        #[arg(short, long)]
        prompt: String,

        /// Duration in seconds (never changed by a repair)
        #[arg(short, long, default_value_t = 10)]
        duration: u32,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a full generation job through the quality gate
    Generate {
        /// Text prompt
        #[arg(short, long)]
        prompt: String,

        /// Duration in seconds
        #[arg(short, long, default_value_t = 10)]
        duration: u32,

        /// Generation mode (cinematic, classical)
        #[arg(short, long, default_value = "cinematic")]
        mode: Mode,

        /// Synthesizer command template ({prompt} {temperature} {top_k} {cfg} {duration} {out})
        #[arg(long)]
        synth_cmd: String,

        /// Output directory for WAVs and job records
        #[arg(short, long)]
        out_dir: String,

        /// Job identifier (default: timestamp based)
        #[arg(long)]
        job_id: Option<String>,

        /// Requested instruments, comma separated
        #[arg(long, value_delimiter = ',')]
        instruments: Vec<String>,

        /// Time limit for one render in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a stored job record
    Status {
        /// Job identifier
        #[arg(long)]
        job_id: String,

        /// Directory holding job records
        #[arg(short, long)]
        out_dir: String,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = commands::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Analyze {
            input,
            prompt,
            mode,
            json,
        } => commands::analyze::run(&input, &prompt, mode, &config, json),
        Commands::Qa {
            input,
            repair_out,
            json,
        } => commands::qa::run(&input, repair_out.as_deref(), &config, json),
        Commands::Postprocess {
            input,
            output,
            mode,
            seed,
            json,
        } => commands::postprocess::run(&input, &output, mode, seed, &config, json),
        Commands::Plan {
            reason,
            prompt,
            duration,
            json,
        } => commands::plan::run(&reason, &prompt, duration, json),
        Commands::Generate {
            prompt,
            duration,
            mode,
            synth_cmd,
            out_dir,
            job_id,
            instruments,
            timeout,
            json,
        } => commands::generate::run(
            &GenerateOptions {
                prompt,
                duration_seconds: duration,
                mode,
                instruments,
                synth_cmd,
                out_dir,
                job_id,
                timeout_secs: timeout,
            },
            &config,
            json,
        ),
        Commands::Status {
            job_id,
            out_dir,
            json,
        } => commands::status::run(&job_id, &out_dir, json),
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "tunegate",
            "generate",
            "--prompt",
            "evening raga",
            "--mode",
            "classical",
            "--synth-cmd",
            "render {prompt} {out}",
            "--out-dir",
            "out",
            "--instruments",
            "veena,tabla",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate {
                mode,
                instruments,
                duration,
                ..
            } => {
                assert_eq!(mode, Mode::Classical);
                assert_eq!(instruments, vec!["veena", "tabla"]);
                assert_eq!(duration, 10);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_plan_duration() {
        let cli = Cli::try_parse_from([
            "tunegate", "plan", "-r", "off-key", "-p", "raga", "-d", "45",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan { duration, .. } => assert_eq!(duration, 45),
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from([
            "tunegate",
            "postprocess",
            "-i",
            "a.wav",
            "-o",
            "b.wav",
            "-m",
            "jazz"
        ])
        .is_err());
    }
}
