//! Mono analysis view of a buffer with lazily computed trackers.

use std::cell::OnceCell;

use tunegate_backend_audio::metrics::{self, PitchFrame};
use tunegate_spec::AudioBuffer;

use crate::error::QaError;

/// Mono downmix of a buffer plus cached pitch, beat and chroma analysis.
///
/// Pitch tracking and beat tracking are the expensive steps, so each runs
/// at most once no matter how many checks read it.
#[derive(Debug)]
pub struct AnalyzedSignal {
    samples: Vec<f32>,
    sample_rate: u32,
    pitch: OnceCell<Vec<PitchFrame>>,
    beats: OnceCell<Vec<f64>>,
    chroma: OnceCell<[f64; 12]>,
}

impl AnalyzedSignal {
    /// Validates the buffer and downmixes it.
    pub fn new(buffer: &AudioBuffer) -> Result<Self, QaError> {
        if buffer.sample_rate == 0 {
            return Err(QaError::InvalidSampleRate(buffer.sample_rate));
        }
        if buffer.channels == 0 {
            return Err(QaError::NoChannels);
        }
        if let Some(index) = buffer.samples.iter().position(|s| !s.is_finite()) {
            return Err(QaError::NonFiniteSample { index });
        }
        Ok(Self::from_mono(buffer.to_mono(), buffer.sample_rate))
    }

    fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            pitch: OnceCell::new(),
            beats: OnceCell::new(),
            chroma: OnceCell::new(),
        }
    }

    /// Mono samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn rms(&self) -> f64 {
        metrics::rms(&self.samples)
    }

    pub fn peak(&self) -> f64 {
        metrics::peak(&self.samples)
    }

    /// Pitch track, computed on first use.
    pub fn pitch_track(&self) -> &[PitchFrame] {
        self.pitch
            .get_or_init(|| metrics::pitch_track(&self.samples, self.sample_rate))
    }

    /// Beat times in seconds, computed on first use.
    pub fn beat_times(&self) -> &[f64] {
        self.beats
            .get_or_init(|| metrics::beat_times(&self.samples, self.sample_rate))
    }

    /// Pitch-class energy histogram, computed on first use.
    pub fn chroma(&self) -> &[f64; 12] {
        self.chroma
            .get_or_init(|| metrics::chroma_histogram(&self.samples, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmixes_stereo() {
        let buffer = AudioBuffer::stereo(&[0.5, 0.5], &[0.0, -0.5], 32000);
        let signal = AnalyzedSignal::new(&buffer).unwrap();
        assert_eq!(signal.samples(), &[0.25, 0.0]);
    }

    #[test]
    fn test_rejects_nan() {
        let buffer = AudioBuffer::mono(vec![0.0, f32::NAN], 32000);
        assert_eq!(
            AnalyzedSignal::new(&buffer).unwrap_err(),
            QaError::NonFiniteSample { index: 1 }
        );
    }

    #[test]
    fn test_rejects_zero_rate() {
        let buffer = AudioBuffer::mono(vec![0.0], 0);
        assert_eq!(AnalyzedSignal::new(&buffer).unwrap_err(), QaError::InvalidSampleRate(0));
    }

    #[test]
    fn test_pitch_track_is_cached() {
        let buffer = AudioBuffer::mono(vec![0.0; 8000], 32000);
        let signal = AnalyzedSignal::new(&buffer).unwrap();
        let first = signal.pitch_track().as_ptr();
        assert_eq!(first, signal.pitch_track().as_ptr());
    }
}
