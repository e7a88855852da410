//! Mode-specific finishing chains applied once to accepted audio.

use tracing::info;
use tunegate_backend_audio::effects::{apply_effect_chain, ChannelBuffer, Effect};
use tunegate_backend_audio::resample::to_stereo_at;
use tunegate_spec::{AudioBuffer, Mode};

use crate::error::PostprocessError;

/// Finishes an accepted buffer.
pub trait Postprocessor {
    /// Returns the finished buffer. `seed` drives any generated noise.
    fn postprocess(&self, buffer: &AudioBuffer, mode: Mode, seed: u32)
        -> Result<AudioBuffer, PostprocessError>;
}

/// Chooses between the classical and cinematic chains.
///
/// Input is converted to stereo at the studio rate before the chain runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostprocessSelector {
    output_sample_rate: u32,
}

impl Default for PostprocessSelector {
    fn default() -> Self {
        Self::new(44_100)
    }
}

impl PostprocessSelector {
    /// Creates a selector producing audio at `output_sample_rate`.
    pub fn new(output_sample_rate: u32) -> Self {
        Self { output_sample_rate }
    }

    /// Studio sample rate of the output.
    pub fn output_sample_rate(&self) -> u32 {
        self.output_sample_rate
    }

    /// The effect chain for `mode`.
    pub fn chain_for(mode: Mode) -> Vec<Effect> {
        match mode {
            Mode::Classical => vec![
                Effect::Highpass { cutoff_hz: 60.0 },
                Effect::PeakingEq {
                    frequency_hz: 7000.0,
                    width_octaves: 2.0,
                    gain_db: -2.0,
                },
                Effect::Compressor {
                    threshold_db: -18.0,
                    ratio: 1.5,
                    attack_ms: 20.0,
                    release_ms: 150.0,
                    makeup_db: 0.0,
                },
                Effect::LoudnessNormalize {
                    target_lufs: -18.0,
                    true_peak_db: -2.0,
                },
            ],
            Mode::Cinematic => vec![
                Effect::AmbienceLayer {
                    drone_hz: 130.0,
                    drone_gain: 0.03,
                    noise_gain: 0.015,
                    weights: [3.0, 1.0, 1.0],
                },
                Effect::LoudnessNormalize {
                    target_lufs: -14.0,
                    true_peak_db: -1.5,
                },
            ],
        }
    }

    /// Converts `buffer` to studio stereo and runs the chain for `mode`.
    pub fn apply(
        &self,
        buffer: &AudioBuffer,
        mode: Mode,
        seed: u32,
    ) -> Result<AudioBuffer, PostprocessError> {
        if buffer.is_empty() {
            return Err(PostprocessError::EmptyBuffer);
        }
        let (left, right) = to_stereo_at(buffer, self.output_sample_rate)?;
        let mut channels = ChannelBuffer::new(vec![left, right], self.output_sample_rate)?;

        let chain = Self::chain_for(mode);
        info!(
            mode = %mode,
            effects = ?chain.iter().map(Effect::name).collect::<Vec<_>>(),
            seed,
            "postprocessing"
        );
        apply_effect_chain(&mut channels, &chain, seed)?;
        Ok(channels.into_audio())
    }
}

impl Postprocessor for PostprocessSelector {
    fn postprocess(
        &self,
        buffer: &AudioBuffer,
        mode: Mode,
        seed: u32,
    ) -> Result<AudioBuffer, PostprocessError> {
        self.apply(buffer, mode, seed)
    }
}
