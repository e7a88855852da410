//! ITU-R BS.1770 integrated loudness and true-peak limiting.

use crate::error::{AudioError, AudioResult};
use crate::filter::{BiquadCoeffs, BiquadFilter};

use super::dynamics::db_to_amp;
use super::ChannelBuffer;

const ABSOLUTE_GATE_DB: f64 = -70.0;
const RELATIVE_GATE_OFFSET_DB: f64 = -10.0;
const LUFS_REFERENCE_OFFSET: f64 = -0.691;

/// High-shelf stage of the K-weighting filter.
fn k_weighting_shelf(sample_rate: u32) -> BiquadCoeffs {
    let fs = sample_rate as f64;
    if (fs - 48000.0).abs() < 1.0 {
        BiquadCoeffs {
            b0: 1.53512485958697,
            b1: -2.69169618940638,
            b2: 1.19839281085285,
            a1: -1.69065929318241,
            a2: 0.73248077421585,
        }
    } else if (fs - 44100.0).abs() < 1.0 {
        BiquadCoeffs {
            b0: 1.53085156824536,
            b1: -2.65067242430902,
            b2: 1.16911633949740,
            a1: -1.66363194078698,
            a2: 0.71251089073889,
        }
    } else {
        // bilinear transform of the analogue prototype
        let f0 = 1681.974450955533;
        let gain_db = 3.999843853973347_f64;
        let q = 0.7071752369554196;

        let k = (std::f64::consts::PI * f0 / fs).tan();
        let vg = 10.0_f64.powf(gain_db / 20.0);
        let k2 = k * k;
        let a0 = 1.0 + k / q + k2;
        BiquadCoeffs {
            b0: (vg + vg.sqrt() * k / q + k2) / a0,
            b1: 2.0 * (k2 - vg) / a0,
            b2: (vg - vg.sqrt() * k / q + k2) / a0,
            a1: 2.0 * (k2 - 1.0) / a0,
            a2: (1.0 - k / q + k2) / a0,
        }
    }
}

/// Revised low-frequency B-weighting highpass stage.
fn k_weighting_rlb(sample_rate: u32) -> BiquadCoeffs {
    let fs = sample_rate as f64;
    if (fs - 48000.0).abs() < 1.0 {
        BiquadCoeffs {
            b0: 1.0,
            b1: -2.0,
            b2: 1.0,
            a1: -1.99004745483398,
            a2: 0.99007225036621,
        }
    } else if (fs - 44100.0).abs() < 1.0 {
        BiquadCoeffs {
            b0: 0.99977198108520,
            b1: -1.99954396217041,
            b2: 0.99977198108520,
            a1: -1.99891572199493,
            a2: 0.99891622176588,
        }
    } else {
        let fc = 38.13547087602444;
        let q = 0.5003270373238773;

        let k = (std::f64::consts::PI * fc / fs).tan();
        let k2 = k * k;
        let a0 = 1.0 + k / q + k2;
        BiquadCoeffs {
            b0: 1.0 / a0,
            b1: -2.0 / a0,
            b2: 1.0 / a0,
            a1: 2.0 * (k2 - 1.0) / a0,
            a2: (1.0 - k / q + k2) / a0,
        }
    }
}

fn k_weight(samples: &[f64], sample_rate: u32) -> Vec<f64> {
    let mut shelf = BiquadFilter::new(k_weighting_shelf(sample_rate));
    let mut rlb = BiquadFilter::new(k_weighting_rlb(sample_rate));
    samples
        .iter()
        .map(|&x| rlb.process(shelf.process(x)))
        .collect()
}

fn power_to_lufs(power: f64) -> f64 {
    LUFS_REFERENCE_OFFSET + 10.0 * power.log10()
}

fn lufs_to_power(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LUFS_REFERENCE_OFFSET) / 10.0)
}

/// Integrated loudness in LUFS.
///
/// Uses 400 ms blocks with a 100 ms hop, an absolute gate at -70 LUFS and a
/// relative gate 10 dB under the ungated level. Channel powers are summed with
/// unit weights. Returns `None` for audio shorter than one block or audio
/// that is gated away entirely.
pub fn integrated_loudness(channels: &[Vec<f64>], sample_rate: u32) -> Option<f64> {
    let block = (sample_rate as f64 * 0.4).round() as usize;
    let hop = block / 4;
    let frames = channels.first().map_or(0, Vec::len);
    if block == 0 || frames < block {
        return None;
    }

    let weighted: Vec<Vec<f64>> = channels.iter().map(|c| k_weight(c, sample_rate)).collect();

    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos + block <= frames {
        let power: f64 = weighted
            .iter()
            .map(|c| c[pos..pos + block].iter().map(|s| s * s).sum::<f64>() / block as f64)
            .sum();
        blocks.push(power);
        pos += hop;
    }

    let absolute = lufs_to_power(ABSOLUTE_GATE_DB);
    let gated: Vec<f64> = blocks.into_iter().filter(|&p| p > absolute).collect();
    if gated.is_empty() {
        return None;
    }

    let ungated = gated.iter().sum::<f64>() / gated.len() as f64;
    let relative = lufs_to_power(power_to_lufs(ungated) + RELATIVE_GATE_OFFSET_DB);
    let kept: Vec<f64> = gated.into_iter().filter(|&p| p >= relative).collect();
    if kept.is_empty() {
        return None;
    }

    let lufs = power_to_lufs(kept.iter().sum::<f64>() / kept.len() as f64);
    lufs.is_finite().then_some(lufs)
}

/// Linear true peak estimated with 4x Catmull-Rom oversampling.
pub fn true_peak(samples: &[f64]) -> f64 {
    let mut max_peak = samples.iter().fold(0.0_f64, |a, &b| a.max(b.abs()));

    for i in 1..samples.len().saturating_sub(2) {
        let p0 = samples[i - 1];
        let p1 = samples[i];
        let p2 = samples[i + 1];
        let p3 = samples[i + 2];

        for j in 1..4 {
            let t = j as f64 * 0.25;
            let t2 = t * t;
            let t3 = t2 * t;
            let v = 0.5
                * ((2.0 * p1)
                    + (-p0 + p2) * t
                    + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
                    + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3);
            max_peak = max_peak.max(v.abs());
        }
    }
    max_peak
}

/// True peak in dBTP across all channels, `None` for silence.
pub fn true_peak_db(channels: &[Vec<f64>]) -> Option<f64> {
    let peak = channels.iter().map(|c| true_peak(c)).fold(0.0_f64, f64::max);
    (peak > 0.0).then(|| 20.0 * peak.log10())
}

/// Normalises integrated loudness to `target_lufs`, then pulls the level down
/// if the true peak exceeds `ceiling_db`.
///
/// Audio whose loudness cannot be measured skips the loudness gain but still
/// respects the ceiling.
pub fn loudness_normalize(
    buffer: &mut ChannelBuffer,
    target_lufs: f64,
    ceiling_db: f64,
) -> AudioResult<()> {
    if !(-70.0..=0.0).contains(&target_lufs) {
        return Err(AudioError::invalid_param(
            "loudness_normalize.target_lufs",
            format!("must be -70 to 0, got {}", target_lufs),
        ));
    }
    if !(-20.0..=0.0).contains(&ceiling_db) {
        return Err(AudioError::invalid_param(
            "loudness_normalize.true_peak_db",
            format!("must be -20 to 0, got {}", ceiling_db),
        ));
    }

    if let Some(measured) = integrated_loudness(&buffer.channels, buffer.sample_rate) {
        buffer.apply_gain(db_to_amp(target_lufs - measured));
    }

    if let Some(peak_db) = true_peak_db(&buffer.channels) {
        if peak_db > ceiling_db {
            buffer.apply_gain(db_to_amp(ceiling_db - peak_db));
        }
    }
    Ok(())
}
