//! Digests for the verify stage.
//!
//! xxHash3-64 detects accidental corruption only; SHA-256 and BLAKE3 also
//! resist deliberate tampering when the digest itself is protected (or the
//! chunk is additionally authenticated by its cipher). Comparisons are
//! constant-time for every family.

use super::ids;
use crate::error::{DecodeError, Result};
use subtle::ConstantTimeEq;

/// Hash implementations compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    #[cfg(feature = "checksum")]
    Xxh3,
    #[cfg(feature = "checksum")]
    Sha256,
    #[cfg(feature = "blake3")]
    Blake3,
}

impl HashKind {
    /// Every hash available in this build, in id order.
    #[allow(unused_mut)]
    pub fn compiled() -> Vec<HashKind> {
        let mut kinds = Vec::new();
        #[cfg(feature = "checksum")]
        {
            kinds.push(HashKind::Xxh3);
            kinds.push(HashKind::Sha256);
        }
        #[cfg(feature = "blake3")]
        kinds.push(HashKind::Blake3);
        kinds
    }

    pub fn format_id(self) -> u8 {
        match self {
            #[cfg(feature = "checksum")]
            HashKind::Xxh3 => ids::HASH_XXH3_64,
            #[cfg(feature = "checksum")]
            HashKind::Sha256 => ids::HASH_SHA256,
            #[cfg(feature = "blake3")]
            HashKind::Blake3 => ids::HASH_BLAKE3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "checksum")]
            HashKind::Xxh3 => "xxh3-64",
            #[cfg(feature = "checksum")]
            HashKind::Sha256 => "sha-256",
            #[cfg(feature = "blake3")]
            HashKind::Blake3 => "blake3",
        }
    }

    /// Length of the digest trailing the chunk payload.
    pub fn digest_len(self) -> usize {
        match self {
            #[cfg(feature = "checksum")]
            HashKind::Xxh3 => 8,
            #[cfg(feature = "checksum")]
            HashKind::Sha256 => 32,
            #[cfg(feature = "blake3")]
            HashKind::Blake3 => 32,
        }
    }

    #[allow(unused_variables)]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            // Big-endian is the canonical xxhash byte order
            #[cfg(feature = "checksum")]
            HashKind::Xxh3 => xxhash_rust::xxh3::xxh3_64(data).to_be_bytes().to_vec(),
            #[cfg(feature = "checksum")]
            HashKind::Sha256 => {
                use sha2::Digest;
                sha2::Sha256::digest(data).to_vec()
            }
            #[cfg(feature = "blake3")]
            HashKind::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }

    /// Compare the digest of `data` against `expected` in constant time.
    pub fn verify(self, data: &[u8], expected: &[u8]) -> Result<()> {
        let computed = self.digest(data);
        if bool::from(computed.as_slice().ct_eq(expected)) {
            Ok(())
        } else {
            Err(DecodeError::IntegrityMismatch)
        }
    }
}
