//! Hashing Primitives
//!
//! SHA-256 hashing for everything the trusted node binds itself to:
//! - Identity tree leaves
//! - Role commitments and per-player salts
//! - Action nullifiers and sealed payloads
//! - Shuffle seed derivation
//!
//! Each use goes through its own domain separator so a digest produced for
//! one purpose can never be replayed as another.

use sha2::{Digest as _, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type Digest = [u8; 32];

/// All-zero digest, used to fill unused identity tree slots.
pub const ZERO_DIGEST: Digest = [0; 32];

/// Incremental hasher with a domain separator.
///
/// Order of updates is part of the binding, so callers must always feed
/// fields in the same order.
pub struct DigestWriter {
    hasher: Sha256,
}

impl DigestWriter {
    /// Create a new writer with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a player index, encoded as a u32 so the binding does not
    /// depend on the platform's pointer width.
    #[inline]
    pub fn update_index(&mut self, index: usize) {
        self.update_u32(index as u32);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with another digest.
    #[inline]
    pub fn update_digest(&mut self, digest: &Digest) {
        self.hasher.update(digest);
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest {
        self.hasher.finalize().into()
    }
}

/// Compute a plain hash of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of a digest as hex, for log lines.
pub fn short_hex(digest: &Digest) -> String {
    hex::encode(&digest[..4])
}
