//! Audio effects for repair and postprocessing.
//!
//! Effects run on a [`ChannelBuffer`] (planar `f64` channels) and are applied
//! in sequence by [`apply_effect_chain`]. Chains are plain data so callers can
//! log, compare and test them.

pub mod ambience;
pub mod declick;
pub mod denoise;
pub mod dynamics;
pub mod loudness;

use tunegate_spec::AudioBuffer;

use crate::error::{AudioError, AudioResult};
use crate::filter::{clamp_cutoff, filter_channels, BiquadCoeffs, BUTTERWORTH_Q};

/// Planar audio for effect processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffer {
    /// One vector per channel, all the same length.
    pub channels: Vec<Vec<f64>>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl ChannelBuffer {
    /// Creates a buffer from planar channels.
    pub fn new(channels: Vec<Vec<f64>>, sample_rate: u32) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }
        if channels.is_empty() || channels.len() > u16::MAX as usize {
            return Err(AudioError::InvalidChannels {
                channels: channels.len().min(u16::MAX as usize) as u16,
            });
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AudioError::invalid_param(
                "channels",
                "all channels must have the same length",
            ));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Splits an interleaved buffer into planar channels.
    pub fn from_audio(buffer: &AudioBuffer) -> AudioResult<Self> {
        if buffer.channels == 0 {
            return Err(AudioError::InvalidChannels {
                channels: buffer.channels,
            });
        }
        let channels = (0..buffer.channels as usize)
            .map(|c| buffer.channel(c).into_iter().map(f64::from).collect())
            .collect();
        Self::new(channels, buffer.sample_rate)
    }

    /// Interleaves back into an [`AudioBuffer`].
    pub fn into_audio(self) -> AudioBuffer {
        let num_channels = self.channels.len();
        let frames = self.frames();
        let mut samples = Vec::with_capacity(frames * num_channels);
        for i in 0..frames {
            for channel in &self.channels {
                samples.push(channel[i] as f32);
            }
        }
        AudioBuffer {
            samples,
            channels: num_channels as u16,
            sample_rate: self.sample_rate,
        }
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f64 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0_f64, |a, &b| a.max(b.abs()))
    }

    /// Multiplies every sample by `gain`.
    pub fn apply_gain(&mut self, gain: f64) {
        for channel in self.channels.iter_mut() {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }
}

/// One step of an effect chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Interpolates over isolated spikes.
    Declick {
        /// Sample-to-sample step treated as a click.
        max_step: f64,
    },
    /// Two-pole Butterworth highpass.
    Highpass {
        /// Cutoff in Hz.
        cutoff_hz: f64,
    },
    /// Two-pole Butterworth lowpass, clamped below Nyquist.
    Lowpass {
        /// Cutoff in Hz.
        cutoff_hz: f64,
    },
    /// Peaking EQ band.
    PeakingEq {
        /// Centre frequency in Hz.
        frequency_hz: f64,
        /// Bandwidth in octaves.
        width_octaves: f64,
        /// Gain in dB.
        gain_db: f64,
    },
    /// STFT spectral gating against an assumed white noise floor.
    SpectralDenoise {
        /// Noise floor level in dBFS.
        noise_floor_db: f64,
        /// Maximum attenuation in dB.
        reduction_db: f64,
    },
    /// Frame-wise gain normalisation with smoothed gains.
    DynamicNormalize {
        /// Analysis frame length in milliseconds.
        frame_ms: f64,
        /// Target frame peak.
        target_peak: f64,
        /// Largest gain applied to quiet frames.
        max_gain: f64,
    },
    /// Feed-forward compressor with linked channels.
    Compressor {
        /// Threshold in dB.
        threshold_db: f64,
        /// Compression ratio.
        ratio: f64,
        /// Attack time in milliseconds.
        attack_ms: f64,
        /// Release time in milliseconds.
        release_ms: f64,
        /// Makeup gain in dB.
        makeup_db: f64,
    },
    /// Layers a sine drone and pink-noise ambience under the source.
    AmbienceLayer {
        /// Drone frequency in Hz.
        drone_hz: f64,
        /// Drone amplitude.
        drone_gain: f64,
        /// Noise amplitude.
        noise_gain: f64,
        /// Mix weights for source, drone and noise.
        weights: [f64; 3],
    },
    /// Integrated loudness normalisation with a true-peak ceiling.
    LoudnessNormalize {
        /// Target integrated loudness in LUFS.
        target_lufs: f64,
        /// True-peak ceiling in dBTP.
        true_peak_db: f64,
    },
}

impl Effect {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Declick { .. } => "declick",
            Effect::Highpass { .. } => "highpass",
            Effect::Lowpass { .. } => "lowpass",
            Effect::PeakingEq { .. } => "peaking_eq",
            Effect::SpectralDenoise { .. } => "spectral_denoise",
            Effect::DynamicNormalize { .. } => "dynamic_normalize",
            Effect::Compressor { .. } => "compressor",
            Effect::AmbienceLayer { .. } => "ambience_layer",
            Effect::LoudnessNormalize { .. } => "loudness_normalize",
        }
    }
}

/// Applies a chain of effects in order.
///
/// # Arguments
/// * `buffer` - Audio to process in place
/// * `effects` - Effect chain to apply
/// * `seed` - Seed for effects that generate noise
pub fn apply_effect_chain(buffer: &mut ChannelBuffer, effects: &[Effect], seed: u32) -> AudioResult<()> {
    for effect in effects {
        apply_single_effect(buffer, effect, seed)?;
    }
    Ok(())
}

/// Applies a single effect.
pub fn apply_single_effect(buffer: &mut ChannelBuffer, effect: &Effect, seed: u32) -> AudioResult<()> {
    let sample_rate = buffer.sample_rate as f64;
    match effect {
        Effect::Declick { max_step } => {
            for channel in buffer.channels.iter_mut() {
                declick::declick(channel, *max_step);
            }
        }
        Effect::Highpass { cutoff_hz } => {
            validate_cutoff("highpass.cutoff_hz", *cutoff_hz)?;
            filter_channels(
                &mut buffer.channels,
                BiquadCoeffs::highpass(*cutoff_hz, BUTTERWORTH_Q, sample_rate),
            );
        }
        Effect::Lowpass { cutoff_hz } => {
            validate_cutoff("lowpass.cutoff_hz", *cutoff_hz)?;
            let cutoff = clamp_cutoff(*cutoff_hz, sample_rate);
            filter_channels(
                &mut buffer.channels,
                BiquadCoeffs::lowpass(cutoff, BUTTERWORTH_Q, sample_rate),
            );
        }
        Effect::PeakingEq {
            frequency_hz,
            width_octaves,
            gain_db,
        } => {
            validate_cutoff("peaking_eq.frequency_hz", *frequency_hz)?;
            if !(*width_octaves > 0.0 && width_octaves.is_finite()) {
                return Err(AudioError::invalid_param(
                    "peaking_eq.width_octaves",
                    format!("must be positive, got {}", width_octaves),
                ));
            }
            let frequency = clamp_cutoff(*frequency_hz, sample_rate);
            filter_channels(
                &mut buffer.channels,
                BiquadCoeffs::peaking_eq_octaves(frequency, *width_octaves, *gain_db, sample_rate),
            );
        }
        Effect::SpectralDenoise {
            noise_floor_db,
            reduction_db,
        } => {
            denoise::spectral_denoise(buffer, *noise_floor_db, *reduction_db)?;
        }
        Effect::DynamicNormalize {
            frame_ms,
            target_peak,
            max_gain,
        } => {
            dynamics::dynamic_normalize(buffer, *frame_ms, *target_peak, *max_gain)?;
        }
        Effect::Compressor {
            threshold_db,
            ratio,
            attack_ms,
            release_ms,
            makeup_db,
        } => {
            dynamics::apply_compressor(
                buffer,
                *threshold_db,
                *ratio,
                *attack_ms,
                *release_ms,
                *makeup_db,
            )?;
        }
        Effect::AmbienceLayer {
            drone_hz,
            drone_gain,
            noise_gain,
            weights,
        } => {
            ambience::layer_ambience(buffer, *drone_hz, *drone_gain, *noise_gain, *weights, seed)?;
        }
        Effect::LoudnessNormalize {
            target_lufs,
            true_peak_db,
        } => {
            loudness::loudness_normalize(buffer, *target_lufs, *true_peak_db)?;
        }
    }
    Ok(())
}

fn validate_cutoff(name: &str, hz: f64) -> AudioResult<()> {
    if hz.is_finite() && hz > 0.0 {
        Ok(())
    } else {
        Err(AudioError::invalid_param(
            name,
            format!("must be a positive frequency, got {}", hz),
        ))
    }
}
