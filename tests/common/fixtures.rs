//! Test fixtures and a test-only chunk encoder for dakt-decrypt tests.
//!
//! The library only decodes. These helpers build dakt streams with the
//! upstream crates directly (ring, chacha20poly1305, lz4_flex, zstd, sha2,
//! xxhash-rust, blake3) so the decoder is checked against independent encoders.

#![allow(dead_code)]

use dakt_decrypt::algorithms::ids;
use dakt_decrypt::transform::chunk_aad;
use dakt_decrypt::{ChunkHeader, HEADER_LEN, TypeCode};

// ============================================================================
// Common Test Data
// ============================================================================

/// Small data - typical short string for basic validation
pub const SMALL_DATA: &[u8] = b"hello world";

/// Unicode data - validates arbitrary UTF-8 survives the pipeline
pub const UNICODE_DATA: &[u8] = "Hello 世界 🚀 Rust".as_bytes();

/// Session key for decode tests (32 bytes)
pub const TEST_KEY: [u8; 32] = [
    0x3e, 0x5a, 0x89, 0x7f, 0x2c, 0x1d, 0x4b, 0x91, 0xa2, 0x6f, 0x3c, 0xd4, 0x8e, 0x5b, 0x72, 0x19,
    0xf6, 0x4a, 0x21, 0x98, 0xc7, 0x65, 0x3d, 0xb0, 0x84, 0x59, 0x2e, 0xd1, 0xa6, 0x7b, 0x30, 0xe5,
];

/// A different key, for wrong-key tests
pub const OTHER_KEY: [u8; 32] = [0x77; 32];

// ============================================================================
// Chunk Shapes
// ============================================================================

/// Algorithm selection for one encoded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    pub cipher: u8,
    pub compressor: u8,
    pub hash: u8,
    pub verify_compressed: bool,
}

impl ChunkSpec {
    pub const fn new(cipher: u8, compressor: u8, hash: u8) -> Self {
        Self {
            cipher,
            compressor,
            hash,
            verify_compressed: false,
        }
    }

    pub const fn verify_compressed(mut self) -> Self {
        self.verify_compressed = true;
        self
    }

    fn code(&self) -> TypeCode {
        let code = TypeCode::new(self.cipher, self.compressor, self.hash);
        if self.verify_compressed {
            code.verify_compressed()
        } else {
            code
        }
    }

    pub fn type_code(&self) -> u32 {
        self.code().to_raw()
    }

    /// Whether the decoder accepts this shape at all.
    pub fn is_legal(&self) -> bool {
        self.code().is_legal()
    }
}

/// AES-256-GCM + LZ4 + SHA-256 over plaintext: the common case.
pub const STANDARD: ChunkSpec = ChunkSpec::new(
    ids::CIPHER_AES_256_GCM,
    ids::COMPRESSOR_LZ4,
    ids::HASH_SHA256,
);

/// Every legal shape this build can decode.
pub fn all_specs() -> Vec<ChunkSpec> {
    let mut ciphers = vec![ids::CIPHER_NONE];
    if cfg!(feature = "encryption") {
        ciphers.extend([ids::CIPHER_AES_256_GCM, ids::CIPHER_CHACHA20_POLY1305]);
    }
    if cfg!(feature = "xchacha20") {
        ciphers.push(ids::CIPHER_XCHACHA20_POLY1305);
    }
    let mut compressors = vec![ids::COMPRESSOR_STORE];
    if cfg!(feature = "compression") {
        compressors.push(ids::COMPRESSOR_LZ4);
    }
    if cfg!(feature = "zstd") {
        compressors.push(ids::COMPRESSOR_ZSTD);
    }
    let mut hashes = vec![ids::HASH_NONE];
    if cfg!(feature = "checksum") {
        hashes.extend([ids::HASH_XXH3_64, ids::HASH_SHA256]);
    }
    if cfg!(feature = "blake3") {
        hashes.push(ids::HASH_BLAKE3);
    }

    let mut specs = Vec::new();
    for &cipher in &ciphers {
        for &compressor in &compressors {
            for &hash in &hashes {
                let spec = ChunkSpec::new(cipher, compressor, hash);
                let candidates = if hash == ids::HASH_NONE {
                    vec![spec]
                } else {
                    vec![spec, spec.verify_compressed()]
                };
                specs.extend(candidates.into_iter().filter(|s| s.is_legal()));
            }
        }
    }
    specs
}

// ============================================================================
// Encoder
// ============================================================================

pub fn nonce_len(cipher: u8) -> usize {
    match cipher {
        ids::CIPHER_NONE => 0,
        ids::CIPHER_XCHACHA20_POLY1305 => 24,
        _ => 12,
    }
}

/// Deterministic, per-index nonce.
pub fn nonce_for(index: u64, len: usize) -> Vec<u8> {
    let mut nonce = vec![0xA5; len];
    let counter = index.to_le_bytes();
    let n = counter.len().min(len);
    nonce[..n].copy_from_slice(&counter[..n]);
    nonce
}

pub fn compress(compressor: u8, data: &[u8]) -> Vec<u8> {
    match compressor {
        ids::COMPRESSOR_STORE => data.to_vec(),
        #[cfg(feature = "compression")]
        ids::COMPRESSOR_LZ4 => {
            use std::io::Write;
            let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        #[cfg(feature = "zstd")]
        ids::COMPRESSOR_ZSTD => zstd::stream::encode_all(data, 3).unwrap(),
        other => panic!("compressor {other} not available in this build"),
    }
}

pub fn digest(hash: u8, data: &[u8]) -> Vec<u8> {
    match hash {
        ids::HASH_NONE => Vec::new(),
        #[cfg(feature = "checksum")]
        ids::HASH_XXH3_64 => xxhash_rust::xxh3::xxh3_64(data).to_be_bytes().to_vec(),
        #[cfg(feature = "checksum")]
        ids::HASH_SHA256 => {
            use sha2::Digest;
            sha2::Sha256::digest(data).to_vec()
        }
        #[cfg(feature = "blake3")]
        ids::HASH_BLAKE3 => blake3::hash(data).as_bytes().to_vec(),
        other => panic!("hash {other} not available in this build"),
    }
}

#[allow(unused_variables)]
pub fn seal(cipher: u8, key: &[u8; 32], nonce: &[u8], aad: &[u8], data: &[u8]) -> Vec<u8> {
    match cipher {
        ids::CIPHER_NONE => data.to_vec(),
        #[cfg(feature = "encryption")]
        ids::CIPHER_AES_256_GCM | ids::CIPHER_CHACHA20_POLY1305 => {
            use ring::aead::{AES_256_GCM, Aad, CHACHA20_POLY1305, LessSafeKey, Nonce, UnboundKey};
            let algorithm = if cipher == ids::CIPHER_AES_256_GCM {
                &AES_256_GCM
            } else {
                &CHACHA20_POLY1305
            };
            let key = LessSafeKey::new(UnboundKey::new(algorithm, key).unwrap());
            let mut buffer = data.to_vec();
            key.seal_in_place_append_tag(
                Nonce::try_assume_unique_for_key(nonce).unwrap(),
                Aad::from(aad),
                &mut buffer,
            )
            .unwrap();
            buffer
        }
        #[cfg(feature = "xchacha20")]
        ids::CIPHER_XCHACHA20_POLY1305 => {
            use chacha20poly1305::aead::{Aead, KeyInit, Payload};
            use chacha20poly1305::{XChaCha20Poly1305, XNonce};
            XChaCha20Poly1305::new_from_slice(key)
                .unwrap()
                .encrypt(XNonce::from_slice(nonce), Payload { msg: data, aad })
                .unwrap()
        }
        other => panic!("cipher {other} not available in this build"),
    }
}

/// Encode one chunk at stream position `index` with an explicit nonce.
pub fn encode_chunk_with_nonce(
    spec: ChunkSpec,
    plaintext: &[u8],
    index: u64,
    key: &[u8; 32],
    nonce: &[u8],
) -> Vec<u8> {
    let compressed = compress(spec.compressor, plaintext);
    let digest = if spec.verify_compressed {
        digest(spec.hash, &compressed)
    } else {
        digest(spec.hash, plaintext)
    };
    let tag_len = if spec.cipher == ids::CIPHER_NONE { 0 } else { 16 };
    let size = nonce.len() + compressed.len() + tag_len + digest.len();

    let header = ChunkHeader {
        type_code: spec.type_code(),
        size: size as u32,
    };
    let header_bytes = header.to_bytes();
    let aad = chunk_aad(&header_bytes, index);
    let body = seal(spec.cipher, key, nonce, &aad, &compressed);

    let mut chunk = Vec::with_capacity(HEADER_LEN + size);
    chunk.extend_from_slice(&header_bytes);
    chunk.extend_from_slice(nonce);
    chunk.extend_from_slice(&body);
    chunk.extend_from_slice(&digest);
    assert_eq!(chunk.len(), HEADER_LEN + size);
    chunk
}

/// Encode one chunk at stream position `index`.
pub fn encode_chunk(spec: ChunkSpec, plaintext: &[u8], index: u64, key: &[u8; 32]) -> Vec<u8> {
    let nonce = nonce_for(index, nonce_len(spec.cipher));
    encode_chunk_with_nonce(spec, plaintext, index, key, &nonce)
}

/// Raw chunk with arbitrary header fields and payload.
pub fn raw_chunk(type_code: u32, payload: &[u8]) -> Vec<u8> {
    let mut chunk = ChunkHeader {
        type_code,
        size: payload.len() as u32,
    }
    .to_bytes()
    .to_vec();
    chunk.extend_from_slice(payload);
    chunk
}

/// Builds a multi-chunk stream, tracking chunk indices and boundaries.
pub struct StreamBuilder {
    key: [u8; 32],
    bytes: Vec<u8>,
    boundaries: Vec<usize>,
}

impl StreamBuilder {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key,
            bytes: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    fn next_index(&self) -> u64 {
        self.boundaries.len() as u64
    }

    pub fn chunk(self, spec: ChunkSpec, plaintext: &[u8]) -> Self {
        let chunk = encode_chunk(spec, plaintext, self.next_index(), &self.key);
        self.push(chunk)
    }

    pub fn chunk_with_nonce(self, spec: ChunkSpec, plaintext: &[u8], nonce: &[u8]) -> Self {
        let chunk = encode_chunk_with_nonce(spec, plaintext, self.next_index(), &self.key, nonce);
        self.push(chunk)
    }

    /// Append pre-built chunk bytes as the next chunk.
    pub fn raw(self, chunk: Vec<u8>) -> Self {
        self.push(chunk)
    }

    fn push(mut self, chunk: Vec<u8>) -> Self {
        self.boundaries.push(self.bytes.len());
        self.bytes.extend_from_slice(&chunk);
        self
    }

    /// Start offset of chunk `index`.
    pub fn offset_of(&self, index: usize) -> usize {
        self.boundaries[index]
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

// ============================================================================
// Data Generators
// ============================================================================

/// Generate deterministic large data for testing (filled with pattern byte)
pub fn generate_large_data(size: usize, pattern: u8) -> Vec<u8> {
    vec![pattern; size]
}

/// Generate random-looking incompressible data
///
/// Uses a simple PRNG (not cryptographically secure). Deterministic seed
/// ensures reproducibility.
pub fn generate_incompressible_data(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = SimplePcg::new(seed);
    (0..size).map(|_| rng.next_byte()).collect()
}

// Simple PCG random number generator (deterministic, not crypto-secure)
struct SimplePcg {
    state: u64,
}

impl SimplePcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_byte(&mut self) -> u8 {
        // PCG algorithm: https://www.pcg-random.org/
        let old_state = self.state;
        self.state = old_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        (xor_shifted.rotate_right(rot) & 0xff) as u8
    }
}
