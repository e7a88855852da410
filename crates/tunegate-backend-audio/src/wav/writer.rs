//! 16-bit PCM WAV encoding.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tunegate_spec::AudioBuffer;

use super::format::WavFormat;
use super::pcm::pcm_hash;
use crate::error::{AudioError, AudioResult};

fn header(format: &WavFormat, data_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(44);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out
}

/// Writes a complete WAV file to a writer.
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    let data_size = u32::try_from(pcm_data.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PCM data exceeds 4 GiB"))?;
    writer.write_all(&header(format, data_size))?;
    writer.write_all(pcm_data)
}

/// Builds a WAV file in memory.
///
/// Payloads larger than a RIFF file can address are truncated to the last
/// whole block.
pub fn write_wav_to_vec(format: &WavFormat, pcm_data: &[u8]) -> Vec<u8> {
    let max = (u32::MAX - 36) as usize;
    let block = format.block_align().max(1) as usize;
    let len = pcm_data.len().min(max - max % block);
    let mut out = header(format, len as u32);
    out.extend_from_slice(&pcm_data[..len]);
    out
}

/// Converts samples to little-endian 16-bit PCM, clipping to [-1, 1].
pub fn samples_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let clipped = f64::from(sample).clamp(-1.0, 1.0);
        let value = (clipped * 32767.0).round() as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}

/// Encodes a buffer as a 16-bit WAV file.
pub fn encode_wav_pcm16(buffer: &AudioBuffer) -> AudioResult<Vec<u8>> {
    if buffer.channels == 0 {
        return Err(AudioError::InvalidChannels {
            channels: buffer.channels,
        });
    }
    if buffer.sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            rate: buffer.sample_rate,
        });
    }
    let format = WavFormat::pcm16(buffer.channels, buffer.sample_rate);
    let pcm = samples_to_pcm16(&buffer.samples);
    let mut out = Vec::with_capacity(44 + pcm.len());
    write_wav(&mut out, &format, &pcm)?;
    Ok(out)
}

/// Writes a buffer to `path` as 16-bit PCM and returns the PCM hash.
pub fn write_wav_pcm16(path: &Path, buffer: &AudioBuffer) -> AudioResult<String> {
    let bytes = encode_wav_pcm16(buffer)?;
    fs::write(path, &bytes)?;
    Ok(pcm_hash(&bytes[44..]))
}
