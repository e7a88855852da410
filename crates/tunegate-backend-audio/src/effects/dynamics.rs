//! Dynamics processing: compressor and dynamic normalisation.

use crate::error::{AudioError, AudioResult};

use super::ChannelBuffer;

/// Converts linear amplitude to decibels.
pub fn amp_to_db(amp: f64) -> f64 {
    20.0 * amp.abs().max(1e-10).log10()
}

/// Converts decibels to linear amplitude.
pub fn db_to_amp(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Applies compression with linked detection across all channels.
pub fn apply_compressor(
    buffer: &mut ChannelBuffer,
    threshold_db: f64,
    ratio: f64,
    attack_ms: f64,
    release_ms: f64,
    makeup_db: f64,
) -> AudioResult<()> {
    if !(-60.0..=0.0).contains(&threshold_db) {
        return Err(AudioError::invalid_param(
            "compressor.threshold_db",
            format!("must be -60 to 0, got {}", threshold_db),
        ));
    }
    if !(1.0..=20.0).contains(&ratio) {
        return Err(AudioError::invalid_param(
            "compressor.ratio",
            format!("must be 1.0-20.0, got {}", ratio),
        ));
    }
    if !(0.1..=100.0).contains(&attack_ms) {
        return Err(AudioError::invalid_param(
            "compressor.attack_ms",
            format!("must be 0.1-100, got {}", attack_ms),
        ));
    }
    if !(10.0..=1000.0).contains(&release_ms) {
        return Err(AudioError::invalid_param(
            "compressor.release_ms",
            format!("must be 10-1000, got {}", release_ms),
        ));
    }

    let sample_rate = buffer.sample_rate as f64;
    let attack_coeff = (-1.0 / (attack_ms * 0.001 * sample_rate)).exp();
    let release_coeff = (-1.0 / (release_ms * 0.001 * sample_rate)).exp();
    let makeup_gain = db_to_amp(makeup_db);
    let num_channels = buffer.channels.len() as f64;

    let mut envelope = 0.0;
    for i in 0..buffer.frames() {
        // RMS across channels
        let input_level = (buffer.channels.iter().map(|c| c[i] * c[i]).sum::<f64>()
            / num_channels)
            .sqrt();

        if input_level > envelope {
            envelope = attack_coeff * envelope + (1.0 - attack_coeff) * input_level;
        } else {
            envelope = release_coeff * envelope + (1.0 - release_coeff) * input_level;
        }

        let envelope_db = amp_to_db(envelope);
        let gain_db = if envelope_db > threshold_db {
            -(envelope_db - threshold_db) * (1.0 - 1.0 / ratio)
        } else {
            0.0
        };
        let gain = db_to_amp(gain_db) * makeup_gain;

        for channel in buffer.channels.iter_mut() {
            channel[i] *= gain;
        }
    }

    Ok(())
}

/// Number of frames in the gain smoothing window.
const GAUSS_SIZE: usize = 31;

/// Evens out loudness by applying a smoothly varying per-frame gain.
///
/// Each frame's gain brings its peak to `target_peak`, capped at `max_gain`.
/// Gains are minimum-filtered so no frame is pushed past its own target,
/// then Gaussian-smoothed over 31 frames and linearly interpolated between
/// frame centres.
pub fn dynamic_normalize(
    buffer: &mut ChannelBuffer,
    frame_ms: f64,
    target_peak: f64,
    max_gain: f64,
) -> AudioResult<()> {
    if !(10.0..=8000.0).contains(&frame_ms) {
        return Err(AudioError::invalid_param(
            "dynamic_normalize.frame_ms",
            format!("must be 10-8000, got {}", frame_ms),
        ));
    }
    if !(0.0 < target_peak && target_peak <= 1.0) {
        return Err(AudioError::invalid_param(
            "dynamic_normalize.target_peak",
            format!("must be in (0, 1], got {}", target_peak),
        ));
    }
    if !(1.0..=100.0).contains(&max_gain) {
        return Err(AudioError::invalid_param(
            "dynamic_normalize.max_gain",
            format!("must be 1-100, got {}", max_gain),
        ));
    }

    let frames = buffer.frames();
    let frame_len = ((frame_ms * 0.001 * buffer.sample_rate as f64).round() as usize).max(1);
    if frames == 0 {
        return Ok(());
    }
    let num_frames = frames.div_ceil(frame_len);

    let raw: Vec<f64> = (0..num_frames)
        .map(|f| {
            let start = f * frame_len;
            let end = (start + frame_len).min(frames);
            let peak = buffer
                .channels
                .iter()
                .flat_map(|c| c[start..end].iter())
                .fold(0.0_f64, |a, &b| a.max(b.abs()));
            if peak > 0.0 {
                (target_peak / peak).min(max_gain)
            } else {
                max_gain
            }
        })
        .collect();

    let radius = GAUSS_SIZE / 2;
    let minimum: Vec<f64> = (0..num_frames)
        .map(|f| {
            let lo = f.saturating_sub(radius);
            let hi = (f + radius).min(num_frames - 1);
            raw[lo..=hi].iter().copied().fold(f64::INFINITY, f64::min)
        })
        .collect();

    let sigma = (radius as f64 - 1.0) / 3.0 + 1.0 / 3.0;
    let smoothed: Vec<f64> = (0..num_frames)
        .map(|f| {
            let lo = f.saturating_sub(radius);
            let hi = (f + radius).min(num_frames - 1);
            let (sum, weight) = (lo..=hi).fold((0.0, 0.0), |(s, w), k| {
                let d = k as f64 - f as f64;
                let g = (-0.5 * (d / sigma).powi(2)).exp();
                (s + minimum[k] * g, w + g)
            });
            sum / weight
        })
        .collect();

    let centre = |f: usize| f as f64 * frame_len as f64 + frame_len as f64 / 2.0;
    for i in 0..frames {
        let pos = i as f64;
        let gain = if num_frames == 1 || pos <= centre(0) {
            smoothed[0]
        } else if pos >= centre(num_frames - 1) {
            smoothed[num_frames - 1]
        } else {
            let f = ((pos - frame_len as f64 / 2.0) / frame_len as f64).floor() as usize;
            let f = f.min(num_frames - 2);
            let t = (pos - centre(f)) / frame_len as f64;
            smoothed[f] + (smoothed[f + 1] - smoothed[f]) * t
        };
        for channel in buffer.channels.iter_mut() {
            channel[i] *= gain;
        }
    }
    Ok(())
}
