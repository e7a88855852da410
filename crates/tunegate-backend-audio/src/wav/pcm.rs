//! PCM payload extraction and hashing.

/// Returns the `data` chunk of a RIFF/WAVE file, or `None` if the bytes are
/// not a well-formed WAV.
pub fn extract_pcm_data(wav_data: &[u8]) -> Option<&[u8]> {
    if wav_data.len() < 44 {
        return None;
    }
    if &wav_data[0..4] != b"RIFF" || &wav_data[8..12] != b"WAVE" {
        return None;
    }

    let mut pos = 12;
    while pos + 8 <= wav_data.len() {
        let chunk_id = &wav_data[pos..pos + 4];
        let chunk_size = u32::from_le_bytes([
            wav_data[pos + 4],
            wav_data[pos + 5],
            wav_data[pos + 6],
            wav_data[pos + 7],
        ]) as usize;

        if chunk_id == b"data" {
            let start = pos + 8;
            let end = start.checked_add(chunk_size)?;
            return wav_data.get(start..end);
        }

        pos = pos.checked_add(8 + chunk_size)?;
        // chunks are word aligned
        if !chunk_size.is_multiple_of(2) {
            pos += 1;
        }
    }
    None
}

/// BLAKE3 hex digest of raw PCM bytes.
pub fn pcm_hash(pcm: &[u8]) -> String {
    blake3::hash(pcm).to_hex().to_string()
}

/// BLAKE3 hex digest of a WAV file's PCM payload.
pub fn compute_pcm_hash(wav_data: &[u8]) -> Option<String> {
    extract_pcm_data(wav_data).map(pcm_hash)
}
