//! Amplitude statistics.

/// Root mean square level. Zero for empty input.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Maximum absolute sample value. Zero for empty input.
pub fn peak(samples: &[f32]) -> f64 {
    samples
        .iter()
        .map(|&s| (s as f64).abs())
        .fold(0.0_f64, f64::max)
}

/// Fraction of samples whose magnitude is at or above `threshold`.
pub fn clip_ratio(samples: &[f32], threshold: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let clipped = samples
        .iter()
        .filter(|&&s| (s as f64).abs() >= threshold)
        .count();
    clipped as f64 / samples.len() as f64
}

/// Spread between the 95th and 5th percentiles of `|sample|`.
pub fn dynamic_range(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut magnitudes: Vec<f64> = samples.iter().map(|&s| (s as f64).abs()).collect();
    magnitudes.sort_by(f64::total_cmp);
    percentile(&magnitudes, 95.0) - percentile(&magnitudes, 5.0)
}

/// Percentile of pre-sorted values with linear interpolation between ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Mean sample value (DC offset).
pub fn mean(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&s| s as f64).sum::<f64>() / samples.len() as f64
}

/// Largest absolute difference between consecutive samples.
pub fn max_step(samples: &[f32]) -> f64 {
    samples
        .windows(2)
        .map(|w| (w[1] as f64 - w[0] as f64).abs())
        .fold(0.0_f64, f64::max)
}

/// Peak to RMS ratio, `None` when the signal has no energy.
pub fn crest_factor(samples: &[f32]) -> Option<f64> {
    let level = rms(samples);
    (level > 0.0).then(|| peak(samples) / level)
}
