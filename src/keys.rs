//! Session key material.

use crate::error::{DecodeError, Result};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length accepted by every cipher in this crate (256 bits).
pub const KEY_LEN: usize = 32;

/// A 256-bit decryption key, wiped from memory on drop.
///
/// Note: `Clone` is intentionally NOT derived to prevent key material from proliferating
/// in memory. Provisioning (files, environment, HSMs) happens outside this crate.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; KEY_LEN],
}

impl KeyMaterial {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a caller-owned slice.
    ///
    /// Anything other than exactly [`KEY_LEN`] bytes is a configuration error.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = slice.try_into().map_err(|_| {
            DecodeError::InvalidConfiguration(format!(
                "key must be {KEY_LEN} bytes, got {}",
                slice.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}
