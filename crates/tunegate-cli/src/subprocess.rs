//! Synthesizer backed by an external command.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;
use tunegate_backend_audio::wav::read_wav;
use tunegate_engine::{SynthError, Synthesizer};
use tunegate_spec::{AudioBuffer, GenerationParameters};

/// Default time limit for one render.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Bytes of stderr kept for the error message of a failed render.
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs a command template once per attempt and reads the WAV it writes.
///
/// The template is split on whitespace before substitution, so a prompt with
/// spaces stays a single argument. Recognised placeholders: `{prompt}`,
/// `{temperature}`, `{top_k}`, `{cfg}`, `{duration}` and `{out}`.
#[derive(Debug, Clone)]
pub struct SubprocessSynthesizer {
    template: Vec<String>,
    work_dir: PathBuf,
    timeout: Duration,
    renders: u32,
}

impl SubprocessSynthesizer {
    /// Creates a synthesizer writing renders into `work_dir`.
    pub fn new(command: &str, work_dir: impl Into<PathBuf>) -> Result<Self, SynthError> {
        let template: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if template.is_empty() {
            return Err(SynthError::Failed("synthesizer command is empty".to_string()));
        }
        Ok(Self {
            template,
            work_dir: work_dir.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            renders: 0,
        })
    }

    /// Sets the time limit for one render.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expands the template for one render.
    pub fn command_line(
        &self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
        out: &Path,
    ) -> Vec<String> {
        let out = out.to_string_lossy();
        self.template
            .iter()
            .map(|arg| {
                arg.replace("{prompt}", prompt)
                    .replace("{temperature}", &parameters.temperature.to_string())
                    .replace("{top_k}", &parameters.top_k.to_string())
                    .replace("{cfg}", &parameters.cfg_coefficient.to_string())
                    .replace("{duration}", &duration_seconds.to_string())
                    .replace("{out}", &out)
            })
            .collect()
    }
}

impl Synthesizer for SubprocessSynthesizer {
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError> {
        std::fs::create_dir_all(&self.work_dir)?;
        self.renders += 1;
        let out = self.work_dir.join(format!("render_{}.wav", self.renders));
        if out.exists() {
            std::fs::remove_file(&out)?;
        }

        let args = self.command_line(prompt, parameters, duration_seconds, &out);
        let Some((program, rest)) = args.split_first() else {
            return Err(SynthError::Failed("synthesizer command is empty".to_string()));
        };
        debug!(program = %program, out = %out.display(), "running synthesizer");

        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SynthError::Failed(format!("failed to spawn '{}': {}", program, e)))?;

        let (status, stderr) = wait_with_timeout(child, self.timeout)?;
        if !status.success() {
            return Err(SynthError::Failed(format!(
                "'{}' exited with {}: {}",
                program,
                status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        if !out.exists() {
            return Err(SynthError::Failed(format!(
                "'{}' did not write {}",
                program,
                out.display()
            )));
        }
        Ok(read_wav(&out)?)
    }
}

/// Reads `reader` to the end on its own thread, keeping the last
/// `STDERR_TAIL_BYTES` bytes.
///
/// The pipe must be drained while the child runs, or a chatty child blocks
/// on a full pipe and never exits.
fn drain_tail<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut tail = Vec::with_capacity(STDERR_TAIL_BYTES);
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    tail.extend_from_slice(&chunk[..n]);
                    if tail.len() > STDERR_TAIL_BYTES {
                        let excess = tail.len() - STDERR_TAIL_BYTES;
                        tail.drain(..excess);
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        tail
    })
}

/// Waits for `child`, killing it after `timeout`.
///
/// Returns the exit status and the tail of its stderr.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<(ExitStatus, String), SynthError> {
    let stderr = child.stderr.take().map(drain_tail);
    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(SynthError::Timeout {
                seconds: timeout.as_secs(),
            });
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    let tail = stderr
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    Ok((status, String::from_utf8_lossy(&tail).into_owned()))
}
