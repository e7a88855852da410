//! WAV decoding through `hound`.

use std::io::{Cursor, Read};
use std::path::Path;

use tunegate_spec::AudioBuffer;

use crate::error::{AudioError, AudioResult};

fn decode<R: Read>(reader: hound::WavReader<R>) -> AudioResult<AudioBuffer> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::InvalidChannels {
            channels: spec.channels,
        });
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    AudioBuffer::from_interleaved(samples, spec.channels, spec.sample_rate).ok_or_else(|| {
        AudioError::processing("sample count is not a multiple of the channel count")
    })
}

/// Reads any integer PCM or float WAV file into an [`AudioBuffer`].
pub fn read_wav(path: &Path) -> AudioResult<AudioBuffer> {
    decode(hound::WavReader::open(path)?)
}

/// Decodes WAV bytes held in memory.
pub fn read_wav_bytes(bytes: &[u8]) -> AudioResult<AudioBuffer> {
    decode(hound::WavReader::new(Cursor::new(bytes))?)
}
