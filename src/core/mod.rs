//! Core deterministic primitives.
//!
//! Hashing and seeded randomness shared by the proof and game layers.

pub mod hash;
pub mod rng;

// Re-export core types
pub use hash::{Digest, DigestWriter, ZERO_DIGEST, hash_bytes, hash_with_domain};
pub use rng::DeterministicRng;
