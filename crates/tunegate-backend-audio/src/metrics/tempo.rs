//! Beat tracking and tempo stability.
//!
//! Onsets come from positive spectral flux of a log-magnitude spectrogram.
//! The global tempo is the autocorrelation peak of the onset envelope,
//! weighted by a log-normal prior centred on the start tempo. Beats are then
//! placed by dynamic programming that trades onset strength against
//! deviation from the tempo period, and each placed beat is moved to the
//! strongest onset within half a period. Beats with no prominent onset in
//! reach are dropped, so the returned times follow what was played rather
//! than the tempo grid.

use crate::stft::Stft;

use super::coefficient_of_variation;

/// Beat tracker settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTrackerConfig {
    /// STFT window for the onset envelope.
    pub n_fft: usize,
    /// STFT hop; one onset frame per hop.
    pub hop: usize,
    /// Centre of the tempo prior in BPM.
    pub start_bpm: f64,
    /// Slowest tempo considered.
    pub min_bpm: f64,
    /// Fastest tempo considered.
    pub max_bpm: f64,
    /// Penalty weight for deviating from the tempo period.
    pub tightness: f64,
}

impl Default for BeatTrackerConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop: 512,
            start_bpm: 120.0,
            min_bpm: 40.0,
            max_bpm: 240.0,
            tightness: 100.0,
        }
    }
}

/// Dynamic range kept in the log spectrogram before flux.
const TOP_DB: f64 = 80.0;

/// How far a snapped onset must stand above the mean of its search window.
const ONSET_PROMINENCE: f64 = 2.0;

/// Positive spectral-flux onset envelope, one value per STFT frame.
pub fn onset_strength(samples: &[f32], config: &BeatTrackerConfig) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let Ok(stft) = Stft::new(config.n_fft, config.hop) else {
        return Vec::new();
    };
    let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let mut db: Vec<Vec<f64>> = stft
        .magnitudes(&signal)
        .into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|m| 20.0 * m.max(1e-10).log10())
                .collect()
        })
        .collect();

    let reference = db
        .iter()
        .flat_map(|f| f.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = reference - TOP_DB;
    for frame in db.iter_mut() {
        for v in frame.iter_mut() {
            *v = v.max(floor);
        }
    }

    let mut onset = vec![0.0; db.len()];
    for t in 1..db.len() {
        let bins = db[t].len() as f64;
        onset[t] = db[t]
            .iter()
            .zip(&db[t - 1])
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum::<f64>()
            / bins;
    }
    onset
}

/// Estimates the global tempo in BPM from an onset envelope.
///
/// Returns `None` when the envelope carries no periodic energy.
pub fn estimate_tempo(onset: &[f64], frame_rate: f64, config: &BeatTrackerConfig) -> Option<f64> {
    if onset.len() < 2 || frame_rate <= 0.0 {
        return None;
    }
    let lag_min = ((60.0 * frame_rate / config.max_bpm).round() as usize).max(1);
    let lag_max = ((60.0 * frame_rate / config.min_bpm).round() as usize).min(onset.len() - 1);
    if lag_min > lag_max {
        return None;
    }

    let mean = onset.iter().sum::<f64>() / onset.len() as f64;
    let centred: Vec<f64> = onset.iter().map(|v| v - mean).collect();

    let mut best: Option<(f64, f64)> = None;
    for lag in lag_min..=lag_max {
        let ac: f64 = centred
            .iter()
            .zip(&centred[lag..])
            .map(|(a, b)| a * b)
            .sum();
        let bpm = 60.0 * frame_rate / lag as f64;
        let prior = (-0.5 * (bpm / config.start_bpm).log2().powi(2)).exp();
        let score = ac * prior;
        if score > 0.0 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, bpm));
        }
    }
    best.map(|(_, bpm)| bpm)
}

/// Beat times in seconds with the default settings.
pub fn beat_times(samples: &[f32], sample_rate: u32) -> Vec<f64> {
    beat_times_with(samples, sample_rate, &BeatTrackerConfig::default())
}

/// Beat times in seconds.
///
/// Silent or aperiodic input yields no beats.
pub fn beat_times_with(samples: &[f32], sample_rate: u32, config: &BeatTrackerConfig) -> Vec<f64> {
    if sample_rate == 0 || config.hop == 0 {
        return Vec::new();
    }
    let onset = onset_strength(samples, config);
    let frame_rate = sample_rate as f64 / config.hop as f64;
    let Some(bpm) = estimate_tempo(&onset, frame_rate, config) else {
        return Vec::new();
    };
    let period = 60.0 * frame_rate / bpm;

    let grid = track_beats(&onset, period, config.tightness);
    snap_to_onsets(&grid, &onset, period)
        .into_iter()
        .map(|frame| frame as f64 / frame_rate)
        .collect()
}

/// Moves each beat to the strongest onset frame within half a period.
///
/// A beat whose strongest onset is not `ONSET_PROMINENCE` times the window
/// mean has nothing played under it and is dropped. Beats that land on the
/// same onset collapse into one.
fn snap_to_onsets(beats: &[usize], onset: &[f64], period: f64) -> Vec<usize> {
    if onset.is_empty() {
        return Vec::new();
    }
    let half = (period / 2.0).floor().max(1.0) as usize;
    let mut snapped: Vec<usize> = Vec::with_capacity(beats.len());
    for &beat in beats {
        let lo = beat.saturating_sub(half);
        let hi = (beat + half).min(onset.len() - 1);
        if lo > hi {
            continue;
        }
        let window = &onset[lo..=hi];
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        let Some((offset, &strongest)) = window
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
        else {
            continue;
        };
        if strongest <= 0.0 || strongest < ONSET_PROMINENCE * mean {
            continue;
        }
        let frame = lo + offset;
        if snapped.last().map_or(true, |&last| frame > last) {
            snapped.push(frame);
        }
    }
    snapped
}

/// Dynamic-programming beat placement over an onset envelope.
fn track_beats(onset: &[f64], period: f64, tightness: f64) -> Vec<usize> {
    if onset.is_empty() || period.is_nan() || period <= 0.0 {
        return Vec::new();
    }

    let n = onset.len() as f64;
    let mean = onset.iter().sum::<f64>() / n;
    let variance = onset.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
    let std = variance.sqrt();
    if std.is_nan() || std <= 0.0 {
        return Vec::new();
    }
    let normalized: Vec<f64> = onset.iter().map(|v| v / std).collect();

    let radius = period.round() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 * 32.0 / period).powi(2)).exp())
        .collect();
    let local: Vec<f64> = (0..normalized.len() as isize)
        .map(|t| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(i, w)| {
                    let idx = t + i as isize - radius;
                    (idx >= 0 && (idx as usize) < normalized.len())
                        .then(|| normalized[idx as usize] * w)
                })
                .sum()
        })
        .collect();

    let mut cumscore = vec![0.0; local.len()];
    let mut backlink: Vec<Option<usize>> = vec![None; local.len()];
    for t in 0..local.len() {
        let lo = (t as f64 - 2.0 * period).ceil().max(0.0) as usize;
        let hi = t as f64 - period / 2.0;
        let mut best: Option<(f64, usize)> = None;
        if hi >= 0.0 {
            let hi = (hi.floor() as usize).min(t.saturating_sub(1));
            for prev in lo..=hi {
                if prev >= t {
                    break;
                }
                let gap = (t - prev) as f64 / period;
                let score = cumscore[prev] - tightness * gap.ln().powi(2);
                if best.map_or(true, |(s, _)| score > s) {
                    best = Some((score, prev));
                }
            }
        }
        match best {
            Some((score, prev)) => {
                cumscore[t] = local[t] + score;
                backlink[t] = Some(prev);
            }
            None => cumscore[t] = local[t],
        }
    }

    let Some(last) = last_beat(&cumscore) else {
        return Vec::new();
    };
    let mut beats = vec![last];
    let mut cursor = last;
    while let Some(prev) = backlink[cursor] {
        beats.push(prev);
        cursor = prev;
    }
    beats.reverse();
    trim_weak_beats(beats, &local)
}

/// Latest local maximum of the cumulative score above half the median peak.
fn last_beat(cumscore: &[f64]) -> Option<usize> {
    let len = cumscore.len();
    let is_peak = |t: usize| {
        let left = t == 0 || cumscore[t] > cumscore[t - 1];
        let right = t + 1 == len || cumscore[t] >= cumscore[t + 1];
        left && right
    };
    let peaks: Vec<usize> = (0..len).filter(|&t| is_peak(t)).collect();
    if peaks.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = peaks.iter().map(|&t| cumscore[t]).collect();
    values.sort_by(f64::total_cmp);
    let median = values[values.len() / 2];
    peaks
        .into_iter()
        .rev()
        .find(|&t| cumscore[t] >= 0.5 * median)
}

/// Drops leading and trailing beats whose local score is under half the
/// RMS of the local score at all beats.
fn trim_weak_beats(beats: Vec<usize>, local: &[f64]) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }
    let rms = (beats.iter().map(|&b| local[b].powi(2)).sum::<f64>() / beats.len() as f64).sqrt();
    let threshold = 0.5 * rms;
    let first = beats.iter().position(|&b| local[b] >= threshold);
    let last = beats.iter().rposition(|&b| local[b] >= threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

/// Coefficient of variation of inter-beat intervals.
///
/// Returns `None` when fewer than `min_beats` beats are given.
pub fn tempo_jitter(beat_times: &[f64], min_beats: usize) -> Option<f64> {
    if beat_times.len() < min_beats || beat_times.len() < 2 {
        return None;
    }
    let intervals: Vec<f64> = beat_times.windows(2).map(|w| w[1] - w[0]).collect();
    coefficient_of_variation(&intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn click_train(bpm: f64, sr: u32, seconds: f64) -> Vec<f32> {
        let len = (sr as f64 * seconds) as usize;
        let spacing = (60.0 / bpm * sr as f64) as usize;
        let burst = (0.02 * sr as f64) as usize;
        let mut samples = vec![0.0f32; len];
        let mut start = spacing / 2;
        while start < len {
            for i in 0..burst.min(len - start) {
                let env = (-(i as f64) / (burst as f64 / 5.0)).exp();
                samples[start + i] =
                    (0.8 * env * (2.0 * PI * 1000.0 * i as f64 / sr as f64).sin()) as f32;
            }
            start += spacing;
        }
        samples
    }

    #[test]
    fn test_silence_has_no_beats() {
        assert!(beat_times(&vec![0.0; 64000], 32000).is_empty());
        assert!(beat_times(&[], 32000).is_empty());
    }

    #[test]
    fn test_click_train_tempo() {
        let config = BeatTrackerConfig::default();
        let samples = click_train(120.0, 32000, 8.0);
        let onset = onset_strength(&samples, &config);
        let bpm = estimate_tempo(&onset, 32000.0 / 512.0, &config).unwrap();
        assert!((bpm - 120.0).abs() < 6.0, "bpm {}", bpm);
    }

    #[test]
    fn test_click_train_beats_are_steady() {
        let beats = beat_times(&click_train(120.0, 32000, 8.0), 32000);
        assert!(beats.len() >= 12, "beats {:?}", beats);
        let jitter = tempo_jitter(&beats, 8).unwrap();
        assert!(jitter < 0.1, "jitter {}", jitter);
    }

    /// 440 Hz plucks with sharp attacks, one at each onset time.
    fn plucks(onsets: &[f64], sr: u32, seconds: f64) -> Vec<f32> {
        let len = (sr as f64 * seconds) as usize;
        let mut samples = vec![0.0f32; len];
        for &onset in onsets {
            let start = (onset * sr as f64) as usize;
            for i in 0..(0.15 * sr as f64) as usize {
                if start + i >= len {
                    break;
                }
                let t = i as f64 / sr as f64;
                samples[start + i] += (0.6 * (-t / 0.04).exp() * (2.0 * PI * 440.0 * t).sin()) as f32;
            }
        }
        samples
    }

    fn cycle(intervals: &[f64], seconds: f64) -> Vec<f64> {
        let mut times = vec![0.25];
        let mut k = 0;
        loop {
            let next = times[times.len() - 1] + intervals[k % intervals.len()];
            if next >= seconds - 0.2 {
                return times;
            }
            times.push(next);
            k += 1;
        }
    }

    #[test]
    fn test_irregular_onsets_give_irregular_beats() {
        for intervals in [&[0.6, 1.8][..], &[0.2, 0.35, 0.6, 1.1, 0.4, 1.6][..]] {
            let samples = plucks(&cycle(intervals, 16.0), 32000, 16.0);
            let beats = beat_times(&samples, 32000);
            let jitter = tempo_jitter(&beats, 8)
                .unwrap_or_else(|| panic!("too few beats {:?} for {:?}", beats, intervals));
            assert!(jitter > 0.35, "jitter {} for {:?}", jitter, intervals);
        }
    }

    #[test]
    fn test_beats_land_on_onsets() {
        let samples = click_train(100.0, 32000, 8.0);
        let beats = beat_times(&samples, 32000);
        assert!(!beats.is_empty());
        // clicks start at 0.3 s and repeat every 0.6 s
        for beat in beats {
            let phase = (beat - 0.3).rem_euclid(0.6);
            let distance = phase.min(0.6 - phase);
            assert!(distance < 0.05, "beat {} is {} s from a click", beat, distance);
        }
    }

    #[test]
    fn test_snap_drops_beats_without_onsets() {
        let mut onset = vec![0.0; 100];
        onset[10] = 1.0;
        onset[31] = 1.0;
        // a beat at 50 has nothing within reach, 70 sees only a flat floor
        for v in onset[60..80].iter_mut() {
            *v = 0.1;
        }
        assert_eq!(snap_to_onsets(&[8, 30, 50, 70], &onset, 10.0), vec![10, 31]);
    }

    #[test]
    fn test_snap_merges_beats_on_one_onset() {
        let mut onset = vec![0.0; 40];
        onset[20] = 2.0;
        assert_eq!(snap_to_onsets(&[17, 22], &onset, 10.0), vec![20]);
    }

    #[test]
    fn test_jitter_needs_enough_beats() {
        let beats: Vec<f64> = (0..7).map(|i| i as f64 * 0.5).collect();
        assert_eq!(tempo_jitter(&beats, 8), None);
    }

    #[test]
    fn test_jitter_of_irregular_beats() {
        let beats = [0.0, 0.2, 1.2, 1.4, 2.4, 2.6, 3.6, 3.8, 4.8];
        let jitter = tempo_jitter(&beats, 8).unwrap();
        assert!(jitter > 0.35, "jitter {}", jitter);
    }

    #[test]
    fn test_regular_beats_have_zero_jitter() {
        let beats: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        assert!(tempo_jitter(&beats, 8).unwrap() < 1e-9);
    }
}
