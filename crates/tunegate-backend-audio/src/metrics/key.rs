//! Scale inference and key conformance.

use super::pitch::PitchFrame;
use super::spectral::pitch_class;

/// Marks the `size` most energetic pitch classes as the inferred scale.
///
/// Ties break toward the lower pitch class so the result is deterministic.
pub fn inferred_scale(chroma: &[f64; 12], size: usize) -> [bool; 12] {
    let mut order: Vec<usize> = (0..12).collect();
    order.sort_by(|&a, &b| chroma[b].total_cmp(&chroma[a]).then(a.cmp(&b)));
    let mut scale = [false; 12];
    for &pc in order.iter().take(size.min(12)) {
        scale[pc] = true;
    }
    scale
}

/// Fraction of note frames whose pitch class falls outside `scale`.
///
/// Note frames are pitch frames with confidence above
/// `confidence_threshold`. Returns `None` when there are no note frames.
pub fn out_of_scale_ratio(
    track: &[PitchFrame],
    scale: &[bool; 12],
    confidence_threshold: f64,
) -> Option<f64> {
    let classes: Vec<usize> = track
        .iter()
        .filter(|f| f.confidence > confidence_threshold)
        .filter_map(|f| pitch_class(f.frequency))
        .collect();
    if classes.is_empty() {
        return None;
    }
    let outside = classes.iter().filter(|&&pc| !scale[pc]).count();
    Some(outside as f64 / classes.len() as f64)
}
