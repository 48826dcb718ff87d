//! AEAD ciphers for the decrypt stage.
//!
//! All ciphers here are authenticated: a wrong key, nonce, associated data or a
//! single flipped ciphertext bit fails with [`DecodeError::DecryptFailure`]
//! and no plaintext is returned. Scratch buffers are `Zeroizing`, so a failed
//! open leaves nothing readable behind.

use super::ids;
use crate::error::{DecodeError, Result};
use crate::keys::KeyMaterial;
use zeroize::Zeroizing;

/// Poly1305 and GCM authentication tag size (128 bits).
pub const AEAD_TAG_LEN: usize = 16;

/// 96-bit nonce used by AES-256-GCM and ChaCha20-Poly1305.
pub const STANDARD_NONCE_LEN: usize = 12;

/// 192-bit extended nonce used by XChaCha20-Poly1305.
pub const EXTENDED_NONCE_LEN: usize = 24;

/// Cipher implementations compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherKind {
    #[cfg(feature = "encryption")]
    Aes256Gcm,
    #[cfg(feature = "encryption")]
    ChaCha20Poly1305,
    #[cfg(feature = "xchacha20")]
    XChaCha20Poly1305,
}

impl CipherKind {
    /// Every cipher available in this build, in id order.
    #[allow(unused_mut)]
    pub fn compiled() -> Vec<CipherKind> {
        let mut kinds = Vec::new();
        #[cfg(feature = "encryption")]
        {
            kinds.push(CipherKind::Aes256Gcm);
            kinds.push(CipherKind::ChaCha20Poly1305);
        }
        #[cfg(feature = "xchacha20")]
        kinds.push(CipherKind::XChaCha20Poly1305);
        kinds
    }

    /// Id this cipher is registered under by default.
    pub fn format_id(self) -> u8 {
        match self {
            #[cfg(feature = "encryption")]
            CipherKind::Aes256Gcm => ids::CIPHER_AES_256_GCM,
            #[cfg(feature = "encryption")]
            CipherKind::ChaCha20Poly1305 => ids::CIPHER_CHACHA20_POLY1305,
            #[cfg(feature = "xchacha20")]
            CipherKind::XChaCha20Poly1305 => ids::CIPHER_XCHACHA20_POLY1305,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "encryption")]
            CipherKind::Aes256Gcm => "aes-256-gcm",
            #[cfg(feature = "encryption")]
            CipherKind::ChaCha20Poly1305 => "chacha20-poly1305",
            #[cfg(feature = "xchacha20")]
            CipherKind::XChaCha20Poly1305 => "xchacha20-poly1305",
        }
    }

    /// Length of the nonce that prefixes the chunk payload.
    pub fn nonce_len(self) -> usize {
        match self {
            #[cfg(feature = "encryption")]
            CipherKind::Aes256Gcm | CipherKind::ChaCha20Poly1305 => STANDARD_NONCE_LEN,
            #[cfg(feature = "xchacha20")]
            CipherKind::XChaCha20Poly1305 => EXTENDED_NONCE_LEN,
        }
    }

    pub fn tag_len(self) -> usize {
        AEAD_TAG_LEN
    }

    /// Authenticate and decrypt `body` (ciphertext with the tag appended).
    pub fn decrypt(
        self,
        key: &KeyMaterial,
        nonce: &[u8],
        aad: &[u8],
        body: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if nonce.len() != self.nonce_len() || body.len() < self.tag_len() {
            return Err(DecodeError::DecryptFailure);
        }
        match self {
            #[cfg(feature = "encryption")]
            CipherKind::Aes256Gcm => {
                open_ring(&ring::aead::AES_256_GCM, key, nonce, aad, body)
            }
            #[cfg(feature = "encryption")]
            CipherKind::ChaCha20Poly1305 => {
                open_ring(&ring::aead::CHACHA20_POLY1305, key, nonce, aad, body)
            }
            #[cfg(feature = "xchacha20")]
            CipherKind::XChaCha20Poly1305 => open_xchacha(key, nonce, aad, body),
        }
    }
}

#[cfg(feature = "encryption")]
fn open_ring(
    algorithm: &'static ring::aead::Algorithm,
    key: &KeyMaterial,
    nonce: &[u8],
    aad: &[u8],
    body: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey};

    let unbound_key =
        UnboundKey::new(algorithm, key.as_bytes()).map_err(|_| DecodeError::DecryptFailure)?;
    let opening_key = LessSafeKey::new(unbound_key);
    let nonce =
        Nonce::try_assume_unique_for_key(nonce).map_err(|_| DecodeError::DecryptFailure)?;

    // Dropped (and wiped) on the error path before anything can observe it
    let mut buffer = Zeroizing::new(body.to_vec());
    let plaintext_len = opening_key
        .open_in_place(nonce, Aad::from(aad), buffer.as_mut_slice())
        .map(|plaintext| plaintext.len())
        .map_err(|_| DecodeError::DecryptFailure)?;
    buffer.truncate(plaintext_len);

    Ok(buffer)
}

#[cfg(feature = "xchacha20")]
fn open_xchacha(
    key: &KeyMaterial,
    nonce: &[u8],
    aad: &[u8],
    body: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    use chacha20poly1305::aead::{Aead, KeyInit, Payload};
    use chacha20poly1305::{XChaCha20Poly1305, XNonce};

    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| DecodeError::DecryptFailure)?;
    cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: body, aad })
        .map(Zeroizing::new)
        .map_err(|_| DecodeError::DecryptFailure)
}
