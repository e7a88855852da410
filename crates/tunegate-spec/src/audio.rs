//! Sample buffer passed between pipeline stages.

/// Interleaved floating point audio.
///
/// Samples are nominally in `[-1.0, 1.0]` but are not clamped; clipping
/// detection depends on seeing values at or beyond full scale. A buffer is
/// owned by whichever stage currently processes it and is moved, not shared.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples, `frames * channels` long.
    pub samples: Vec<f32>,
    /// Number of interleaved channels (1 or 2).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a mono buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Creates a stereo buffer by interleaving two channels.
    ///
    /// If the channels differ in length the shorter one is zero-padded.
    pub fn stereo(left: &[f32], right: &[f32], sample_rate: u32) -> Self {
        let frames = left.len().max(right.len());
        let mut samples = Vec::with_capacity(frames * 2);
        for i in 0..frames {
            samples.push(left.get(i).copied().unwrap_or(0.0));
            samples.push(right.get(i).copied().unwrap_or(0.0));
        }
        Self {
            samples,
            channels: 2,
            sample_rate,
        }
    }

    /// Creates a buffer from interleaved samples.
    ///
    /// Returns `None` if `channels` is zero or does not divide the sample count.
    pub fn from_interleaved(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Option<Self> {
        if channels == 0 || samples.len() % channels as usize != 0 {
            return None;
        }
        Some(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Number of sample frames.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / self.sample_rate as f64
        }
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Extracts one channel as a contiguous vector.
    ///
    /// An out of range index yields an empty vector.
    pub fn channel(&self, index: usize) -> Vec<f32> {
        let channels = self.channels as usize;
        if index >= channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index)
            .step_by(channels)
            .copied()
            .collect()
    }

    /// Downmixes to mono by averaging channels.
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels as usize;
        match channels {
            0 => Vec::new(),
            1 => self.samples.clone(),
            _ => self
                .samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect(),
        }
    }

    /// Returns left and right channels, duplicating mono input.
    pub fn to_stereo_channels(&self) -> (Vec<f32>, Vec<f32>) {
        match self.channels {
            1 => (self.samples.clone(), self.samples.clone()),
            2 => (self.channel(0), self.channel(1)),
            _ => {
                let mono = self.to_mono();
                (mono.clone(), mono)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_interleaves_and_pads() {
        let buf = AudioBuffer::stereo(&[1.0, 2.0, 3.0], &[-1.0], 100);
        assert_eq!(buf.samples, vec![1.0, -1.0, 2.0, 0.0, 3.0, 0.0]);
        assert_eq!(buf.frames(), 3);
        assert_eq!(buf.channel(1), vec![-1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_to_mono_averages() {
        let buf = AudioBuffer::stereo(&[1.0, 0.5], &[0.0, 0.5], 100);
        assert_eq!(buf.to_mono(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_from_interleaved_rejects_ragged() {
        assert!(AudioBuffer::from_interleaved(vec![0.0; 3], 2, 44100).is_none());
        assert!(AudioBuffer::from_interleaved(vec![0.0; 4], 0, 44100).is_none());
        assert!(AudioBuffer::from_interleaved(vec![0.0; 4], 2, 44100).is_some());
    }

    #[test]
    fn test_duration() {
        let buf = AudioBuffer::mono(vec![0.0; 16000], 32000);
        assert!((buf.duration_seconds() - 0.5).abs() < 1e-12);
    }
}
