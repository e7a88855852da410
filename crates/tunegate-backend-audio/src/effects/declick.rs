//! Click removal by interpolation.

/// Longest run of samples repaired as one click.
const MAX_CLICK_LEN: usize = 64;

/// Replaces clicks with straight lines between their clean neighbours.
///
/// A click starts where the step from the previous sample exceeds
/// `max_step` and ends at the first sample that steps back toward the
/// pre-click level within `max_step` of it. Runs longer than 64 samples are
/// treated as genuine level changes and left alone.
///
/// Returns the number of samples rewritten.
pub fn declick(samples: &mut [f64], max_step: f64) -> usize {
    if samples.len() < 3 || max_step.is_nan() || max_step <= 0.0 {
        return 0;
    }

    let mut repaired = 0;
    let mut i = 1;
    while i < samples.len() {
        if (samples[i] - samples[i - 1]).abs() <= max_step {
            i += 1;
            continue;
        }

        let anchor = samples[i - 1];
        let end = (i..samples.len().min(i + MAX_CLICK_LEN + 1))
            .find(|&j| (samples[j] - anchor).abs() <= max_step);

        match end {
            Some(end) if end > i => {
                let left = anchor;
                let right = samples[end];
                let span = (end - (i - 1)) as f64;
                for (k, sample) in samples[i..end].iter_mut().enumerate() {
                    let t = (k + 1) as f64 / span;
                    *sample = left + (right - left) * t;
                }
                repaired += end - i;
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    repaired
}
