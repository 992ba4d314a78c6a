//! Deterministic fingerprints for tilings.
//!
//! A fingerprint is a SHA-256 digest of the canonical binary encoding, with
//! domain separation and length prefixing so digests from different
//! contexts can never collide by construction. Because tilings are
//! canonical after construction, equal tilings always produce equal
//! fingerprints, making the digest usable as a persistence and
//! deduplication key.
//!
//! # Citations
//! - SHA-256: NIST FIPS 180-4 (2015)
//! - Domain separation & length prefixing: Bernstein et al., "How to hash
//!   into elliptic curves" (2009)

use crate::codec::CodecError;
use crate::tiling::Tiling;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a raw byte array.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// The digest covers `b"PGD:<domain>:v1" || length_prefix(data) || data`
    /// where the length prefix is a 64-bit little-endian byte count.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"PGD:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HashValue({:02x}{:02x}{:02x}{:02x}…)",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Canonical fingerprint of a tiling, derived from its binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TilingFingerprint(HashValue);

impl TilingFingerprint {
    /// Creates a fingerprint from a hash value.
    #[inline]
    pub const fn from_hash(hash: HashValue) -> Self {
        Self(hash)
    }

    /// Returns the underlying hash value.
    #[inline]
    pub const fn hash(&self) -> HashValue {
        self.0
    }
}

impl Tiling {
    /// The canonical fingerprint of this tiling.
    ///
    /// Fails only when the tiling cannot be encoded without a pattern
    /// table, which requires an obstruction or requirement pattern whose
    /// graded rank exceeds 16 bits.
    pub fn fingerprint(&self) -> Result<TilingFingerprint, CodecError> {
        let bytes = self.compress(None)?;
        Ok(TilingFingerprint::from_hash(HashValue::hash_with_domain(
            b"TILING",
            &bytes,
        )))
    }
}
