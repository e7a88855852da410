//! Spectral noise reduction.

use crate::error::{AudioError, AudioResult};
use crate::stft::Stft;

use super::ChannelBuffer;

const N_FFT: usize = 2048;
const HOP: usize = 512;

/// Attenuates STFT bins that sit near an assumed white noise floor.
///
/// The floor is white noise at `noise_floor_db` dBFS RMS. Each bin gets a
/// Wiener-style gain `1 - (noise / magnitude)^2`, bounded below by
/// `-reduction_db`. Channels shorter than one window pass through unchanged.
pub fn spectral_denoise(
    buffer: &mut ChannelBuffer,
    noise_floor_db: f64,
    reduction_db: f64,
) -> AudioResult<()> {
    if !(-100.0..=0.0).contains(&noise_floor_db) {
        return Err(AudioError::invalid_param(
            "spectral_denoise.noise_floor_db",
            format!("must be -100 to 0, got {}", noise_floor_db),
        ));
    }
    if !(0.0..=60.0).contains(&reduction_db) {
        return Err(AudioError::invalid_param(
            "spectral_denoise.reduction_db",
            format!("must be 0 to 60, got {}", reduction_db),
        ));
    }

    let stft = Stft::new(N_FFT, HOP)?;
    let window_energy: f64 = crate::stft::hann_window(N_FFT).iter().map(|w| w * w).sum();
    let noise_mag = 10.0_f64.powf(noise_floor_db / 20.0) * window_energy.sqrt();
    let min_gain = 10.0_f64.powf(-reduction_db / 20.0);

    for channel in buffer.channels.iter_mut() {
        if channel.len() < N_FFT {
            continue;
        }
        let mut frames = stft.analyze(channel);
        for frame in frames.iter_mut() {
            for bin in frame.iter_mut() {
                let mag = bin.norm();
                let gain = if mag > 0.0 {
                    (1.0 - (noise_mag / mag).powi(2)).max(min_gain)
                } else {
                    min_gain
                };
                *bin *= gain;
            }
        }
        let length = channel.len();
        *channel = stft.synthesize(&frames, length);
    }
    Ok(())
}
