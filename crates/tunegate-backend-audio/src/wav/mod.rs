//! WAV reading and deterministic 16-bit writing.
//!
//! Written files carry no timestamps or extra chunks, so identical audio
//! always produces identical bytes. The BLAKE3 hash of the PCM payload
//! identifies an output independently of its header.

mod format;
mod pcm;
mod reader;
mod writer;

pub use format::WavFormat;
pub use pcm::{compute_pcm_hash, extract_pcm_data, pcm_hash};
pub use reader::{read_wav, read_wav_bytes};
pub use writer::{encode_wav_pcm16, samples_to_pcm16, write_wav, write_wav_pcm16, write_wav_to_vec};
