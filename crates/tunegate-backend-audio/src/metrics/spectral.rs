//! Spectral balance and pitch-class energy.

use crate::stft::Stft;

/// Window size for band-energy analysis.
pub const BAND_N_FFT: usize = 2048;
/// Hop size for band-energy analysis.
pub const BAND_HOP: usize = 512;

/// Lowest frequency that contributes to the chroma histogram.
const CHROMA_MIN_HZ: f64 = 55.0;
/// Highest frequency that contributes to the chroma histogram.
const CHROMA_MAX_HZ: f64 = 5000.0;

fn spectrogram(samples: &[f32]) -> Option<(Stft, Vec<Vec<f64>>)> {
    if samples.is_empty() {
        return None;
    }
    let stft = Stft::new(BAND_N_FFT, BAND_HOP).ok()?;
    let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
    let mags = stft.magnitudes(&signal);
    Some((stft, mags))
}

/// Mean STFT magnitude over the bins selected by `in_band`.
fn band_mean(
    stft: &Stft,
    mags: &[Vec<f64>],
    sample_rate: u32,
    in_band: impl Fn(f64) -> bool,
) -> Option<f64> {
    let bins: Vec<usize> = (0..stft.num_bins())
        .filter(|&b| in_band(stft.bin_frequency(b, sample_rate as f64)))
        .collect();
    if bins.is_empty() || mags.is_empty() {
        return None;
    }
    let total: f64 = mags
        .iter()
        .map(|frame| bins.iter().map(|&b| frame[b]).sum::<f64>())
        .sum();
    let mean = total / (bins.len() * mags.len()) as f64;
    mean.is_finite().then_some(mean)
}

/// Mean STFT magnitude for bins with `low_hz <= f < high_hz`.
///
/// Returns `None` when the band holds no bins or the input is empty.
pub fn spectral_band_energy(
    samples: &[f32],
    sample_rate: u32,
    low_hz: f64,
    high_hz: f64,
) -> Option<f64> {
    let (stft, mags) = spectrogram(samples)?;
    band_mean(&stft, &mags, sample_rate, |f| f >= low_hz && f < high_hz)
}

/// Ratio of mean magnitude above `high_from_hz` to mean magnitude below
/// `low_below_hz`.
///
/// Returns `None` when either band is empty or the low band carries no
/// energy, since the ratio is then meaningless.
pub fn harshness(
    samples: &[f32],
    sample_rate: u32,
    high_from_hz: f64,
    low_below_hz: f64,
) -> Option<f64> {
    let (stft, mags) = spectrogram(samples)?;
    let high = band_mean(&stft, &mags, sample_rate, |f| f > high_from_hz)?;
    let low = band_mean(&stft, &mags, sample_rate, |f| f < low_below_hz)?;
    if low <= f64::EPSILON {
        return None;
    }
    let ratio = high / low;
    ratio.is_finite().then_some(ratio)
}

/// Pitch class (0 = C) nearest to `freq_hz`.
pub fn pitch_class(freq_hz: f64) -> Option<usize> {
    if !(freq_hz.is_finite() && freq_hz > 0.0) {
        return None;
    }
    let midi = 69.0 + 12.0 * (freq_hz / 440.0).log2();
    Some((midi.round() as i64).rem_euclid(12) as usize)
}

/// Twelve-bin pitch-class energy histogram.
///
/// Sums squared STFT magnitudes per pitch class over 55 Hz to 5 kHz. The
/// histogram is all zeros for silent input.
pub fn chroma_histogram(samples: &[f32], sample_rate: u32) -> [f64; 12] {
    let mut chroma = [0.0; 12];
    let Some((stft, mags)) = spectrogram(samples) else {
        return chroma;
    };

    let classes: Vec<Option<usize>> = (0..stft.num_bins())
        .map(|b| {
            let f = stft.bin_frequency(b, sample_rate as f64);
            if (CHROMA_MIN_HZ..=CHROMA_MAX_HZ).contains(&f) {
                pitch_class(f)
            } else {
                None
            }
        })
        .collect();

    for frame in &mags {
        for (bin, class) in classes.iter().enumerate() {
            if let Some(pc) = class {
                chroma[*pc] += frame[bin] * frame[bin];
            }
        }
    }
    chroma
}
