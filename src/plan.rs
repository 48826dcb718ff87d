//! Type code decoding and decode plan resolution.
//!
//! The 32-bit chunk type is a packed code:
//!
//! | bits   | field |
//! |:-------|:------|
//! | 0..8   | cipher id (0 = none) |
//! | 8..16  | compressor id |
//! | 16..24 | hash id (0 = none) |
//! | 24     | verify point: 0 = plaintext, 1 = compressed bytes |
//! | 25..32 | reserved, zero |
//!
//! Resolution is pure: the same chunk and registry always produce the same plan.

use crate::algorithms::{CipherKind, CompressorKind, HashKind, ids};
use crate::error::{DecodeError, Result};
use crate::header::{ChunkHeader, ChunkInfo, Span};
use crate::registry::AlgorithmRegistry;
use serde::Serialize;

const VERIFY_COMPRESSED_BIT: u32 = 1 << 24;
const RESERVED_MASK: u32 = !0x01FF_FFFF;

/// Which bytes the chunk digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyPoint {
    /// The final, decompressed plaintext.
    #[default]
    Plaintext,
    /// The decrypted but still compressed bytes.
    Compressed,
}

/// A legal chunk type code, split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode {
    pub cipher: u8,
    pub compressor: u8,
    pub hash: u8,
    pub verify_point: VerifyPoint,
}

impl TypeCode {
    /// Type code with the digest over the plaintext.
    pub const fn new(cipher: u8, compressor: u8, hash: u8) -> Self {
        Self {
            cipher,
            compressor,
            hash,
            verify_point: VerifyPoint::Plaintext,
        }
    }

    pub const fn verify_compressed(mut self) -> Self {
        self.verify_point = VerifyPoint::Compressed;
        self
    }

    /// Decode a raw type, or `None` if it is not a legal code.
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw & RESERVED_MASK != 0 {
            return None;
        }
        let [cipher, compressor, hash, _] = raw.to_le_bytes();
        let verify_point = if raw & VERIFY_COMPRESSED_BIT != 0 {
            VerifyPoint::Compressed
        } else {
            VerifyPoint::Plaintext
        };
        let code = Self {
            cipher,
            compressor,
            hash,
            verify_point,
        };
        code.is_legal().then_some(code)
    }

    pub fn to_raw(&self) -> u32 {
        let verify = match self.verify_point {
            VerifyPoint::Plaintext => 0,
            VerifyPoint::Compressed => VERIFY_COMPRESSED_BIT,
        };
        u32::from_le_bytes([self.cipher, self.compressor, self.hash, 0]) | verify
    }

    /// Known ids, and every payload byte covered by an AEAD tag or a digest
    /// before it reaches a decompressor.
    pub fn is_legal(&self) -> bool {
        self.cipher <= ids::MAX_CIPHER
            && self.compressor <= ids::MAX_COMPRESSOR
            && self.hash <= ids::MAX_HASH
            && (self.cipher != ids::CIPHER_NONE || self.is_self_authenticating())
    }

    /// Without a cipher, only the digest detects tampering. It must cover the
    /// stored body, which for a real compressor means the compressed bytes.
    fn is_self_authenticating(&self) -> bool {
        self.hash != ids::HASH_NONE
            && (self.compressor == ids::COMPRESSOR_STORE
                || self.verify_point == VerifyPoint::Compressed)
    }
}

/// Everything the transformer needs to decode one chunk.
///
/// Spans index into the same source buffer the chunk was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDecodePlan {
    pub header: ChunkHeader,
    pub cipher: Option<CipherKind>,
    pub compressor: CompressorKind,
    pub hash: Option<HashKind>,
    pub verify_point: VerifyPoint,
    pub nonce: Span,
    pub body: Span,
    pub digest: Span,
}

impl ChunkDecodePlan {
    /// Minimum payload length this plan's shape requires.
    pub fn overhead(&self) -> usize {
        self.nonce.len + self.digest.len + self.cipher.map_or(0, |c| c.tag_len())
    }
}

/// Resolve a parsed chunk to a decode plan against `registry`.
pub fn resolve(info: &ChunkInfo, registry: &AlgorithmRegistry) -> Result<ChunkDecodePlan> {
    let raw = info.header.type_code;
    let code = TypeCode::from_raw(raw).ok_or(DecodeError::UnrecognizedType(raw))?;

    let cipher = match code.cipher {
        ids::CIPHER_NONE => None,
        id => Some(registry.cipher(id)?),
    };
    let compressor = registry.compressor(code.compressor)?;
    let hash = match code.hash {
        ids::HASH_NONE => None,
        id => Some(registry.hash(id)?),
    };

    let nonce_len = cipher.map_or(0, |c| c.nonce_len());
    let tag_len = cipher.map_or(0, |c| c.tag_len());
    let digest_len = hash.map_or(0, |h| h.digest_len());

    let available = info.payload.len;
    let needed = nonce_len + tag_len + digest_len;
    if available < needed {
        return Err(DecodeError::TruncatedPayload { needed, available });
    }

    let start = info.payload.start;
    let body_len = available - nonce_len - digest_len;
    let nonce = Span::new(start, nonce_len);
    let body = Span::new(nonce.end(), body_len);
    let digest = Span::new(body.end(), digest_len);
    debug_assert_eq!(digest.end(), info.payload.end());
    debug_assert!(body_len >= tag_len);

    Ok(ChunkDecodePlan {
        header: info.header,
        cipher,
        compressor,
        hash,
        verify_point: code.verify_point,
        nonce,
        body,
        digest,
    })
}
