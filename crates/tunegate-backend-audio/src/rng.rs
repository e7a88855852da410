//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! Ambience noise is the only random signal in the gate. Seeds are derived
//! from a job seed and a component key so each layer gets an independent
//! stream and reruns of the same job produce identical output.

use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The seed is duplicated into both halves of the 64-bit PCG state.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Derives a component seed from a base seed and a string key.
///
/// Hashes the little-endian base seed followed by the UTF-8 key with BLAKE3
/// and keeps the first four bytes.
pub fn derive_component_seed(base_seed: u32, key: &str) -> u32 {
    let mut input = Vec::with_capacity(4 + key.len());
    input.extend_from_slice(&base_seed.to_le_bytes());
    input.extend_from_slice(key.as_bytes());

    let hash = blake3::hash(&input);
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Derives a 32-bit seed from an arbitrary job identifier.
pub fn seed_from_job_id(job_id: &str) -> u32 {
    let hash = blake3::hash(job_id.as_bytes());
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Creates an RNG for a named component.
pub fn create_component_rng(base_seed: u32, key: &str) -> Pcg32 {
    create_rng(derive_component_seed(base_seed, key))
}
