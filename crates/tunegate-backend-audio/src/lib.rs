//! Tunegate Audio Backend
//!
//! Signal processing shared by the quality gate:
//!
//! - **Metrics** - level, spectral balance, pitch tracking and beat tracking
//!   used by the technical analyzer and the perceptual judge
//! - **Repair** - de-click, band limiting, spectral denoise and dynamic
//!   normalisation applied to technically flawed renders
//! - **Postprocess effects** - compression, EQ, ambience layering and
//!   loudness normalisation for accepted audio
//! - **WAV I/O** - 16-bit PCM output with a BLAKE3 PCM hash, and a reader for
//!   any PCM or float WAV
//!
//! # Determinism
//!
//! Every function here is deterministic. The only randomness (ambience noise)
//! flows through PCG32 generators seeded via BLAKE3 in [`rng`].
//!
//! # Example
//!
//! ```
//! use tunegate_backend_audio::metrics::level;
//!
//! let samples: Vec<f32> = (0..32000)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 32000.0).sin())
//!     .collect();
//! let rms = level::rms(&samples);
//! assert!((rms - 0.5 / 2f64.sqrt()).abs() < 1e-3);
//! ```
//!
//! # Crate Structure
//!
//! - [`metrics`] - Pure analysis functions over sample slices
//! - [`effects`] - Buffer-transforming effects and chains
//! - [`filter`] - Biquad filters
//! - [`stft`] - Short-time Fourier transform with overlap-add resynthesis
//! - [`resample`] - Sample-rate conversion
//! - [`rng`] - Deterministic RNG with seed derivation
//! - [`wav`] - WAV reading and writing

pub mod effects;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod resample;
pub mod rng;
pub mod stft;
pub mod wav;

pub use error::{AudioError, AudioResult};
