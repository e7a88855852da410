//! Drone and pink-noise ambience layering.

use std::f64::consts::PI;

use rand::Rng;

use crate::error::{AudioError, AudioResult};
use crate::rng::create_component_rng;

use super::ChannelBuffer;

/// Generates `len` samples of pink noise with a peak of 1.0.
///
/// White noise from the seeded RNG is shaped with Paul Kellet's refined
/// filter, then peak-normalised so `noise_gain` sets its level directly.
pub fn pink_noise(len: usize, seed: u32, key: &str) -> Vec<f64> {
    let mut rng = create_component_rng(seed, key);
    let mut b = [0.0_f64; 7];

    let mut out: Vec<f64> = (0..len)
        .map(|_| {
            let white: f64 = rng.gen_range(-1.0..1.0);
            b[0] = 0.99886 * b[0] + white * 0.0555179;
            b[1] = 0.99332 * b[1] + white * 0.0750759;
            b[2] = 0.96900 * b[2] + white * 0.1538520;
            b[3] = 0.86650 * b[3] + white * 0.3104856;
            b[4] = 0.55000 * b[4] + white * 0.5329522;
            b[5] = -0.7616 * b[5] - white * 0.0168980;
            let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
            b[6] = white * 0.115926;
            pink
        })
        .collect();

    let peak = out.iter().fold(0.0_f64, |a, &s| a.max(s.abs()));
    if peak > 0.0 {
        for sample in out.iter_mut() {
            *sample /= peak;
        }
    }
    out
}

/// Mixes a sine drone and pink noise under the source.
///
/// `out = w0 * source + w1 * drone_gain * sine + w2 * noise_gain * pink`,
/// with no renormalisation of the weights. Every channel gets its own noise
/// stream derived from `seed`.
pub fn layer_ambience(
    buffer: &mut ChannelBuffer,
    drone_hz: f64,
    drone_gain: f64,
    noise_gain: f64,
    weights: [f64; 3],
    seed: u32,
) -> AudioResult<()> {
    let nyquist = buffer.sample_rate as f64 / 2.0;
    if !(drone_hz > 0.0 && drone_hz < nyquist) {
        return Err(AudioError::invalid_param(
            "ambience.drone_hz",
            format!("must be between 0 and {} Hz, got {}", nyquist, drone_hz),
        ));
    }
    for (name, value) in [("ambience.drone_gain", drone_gain), ("ambience.noise_gain", noise_gain)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(AudioError::invalid_param(
                name,
                format!("must be 0-1, got {}", value),
            ));
        }
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(AudioError::invalid_param(
            "ambience.weights",
            format!("must be non-negative, got {:?}", weights),
        ));
    }

    let frames = buffer.frames();
    let sample_rate = buffer.sample_rate as f64;
    let [w_source, w_drone, w_noise] = weights;

    for (index, channel) in buffer.channels.iter_mut().enumerate() {
        let noise = pink_noise(frames, seed, &format!("ambience_{}", index));
        for (i, sample) in channel.iter_mut().enumerate() {
            let drone = drone_gain * (2.0 * PI * drone_hz * i as f64 / sample_rate).sin();
            *sample = w_source * *sample + w_drone * drone + w_noise * noise_gain * noise[i];
        }
    }
    Ok(())
}
