//! Sample-rate and channel-layout conversion.

use tunegate_spec::AudioBuffer;

use crate::error::{AudioError, AudioResult};
use crate::filter::{BiquadFilter, BUTTERWORTH_Q};

/// Resamples one channel with linear interpolation.
///
/// When downsampling, a two-pole lowpass at 45% of the target rate runs
/// first to limit aliasing.
pub fn resample_linear(samples: &[f64], from_rate: u32, to_rate: u32) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let source: Vec<f64> = if to_rate < from_rate {
        let mut filtered = samples.to_vec();
        BiquadFilter::lowpass(to_rate as f64 * 0.45, BUTTERWORTH_Q, from_rate as f64)
            .process_buffer(&mut filtered);
        filtered
    } else {
        samples.to_vec()
    };

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (source.len() as f64 / ratio).round().max(1.0) as usize;
    let last = source.len() - 1;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let src_idx = src_pos.floor() as usize;
            let frac = src_pos - src_idx as f64;
            if src_idx < last {
                let s0 = source[src_idx];
                let s1 = source[src_idx + 1];
                s0 + (s1 - s0) * frac
            } else {
                source[last]
            }
        })
        .collect()
}

/// Converts a buffer to stereo `f64` channels at `target_rate`.
///
/// Mono input is duplicated to both channels.
pub fn to_stereo_at(buffer: &AudioBuffer, target_rate: u32) -> AudioResult<(Vec<f64>, Vec<f64>)> {
    if buffer.sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            rate: buffer.sample_rate,
        });
    }
    if target_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: target_rate });
    }
    if buffer.channels == 0 || buffer.channels > 2 {
        return Err(AudioError::InvalidChannels {
            channels: buffer.channels,
        });
    }

    let (left, right) = buffer.to_stereo_channels();
    let left: Vec<f64> = left.into_iter().map(f64::from).collect();
    let right: Vec<f64> = right.into_iter().map(f64::from).collect();

    Ok((
        resample_linear(&left, buffer.sample_rate, target_rate),
        resample_linear(&right, buffer.sample_rate, target_rate),
    ))
}
