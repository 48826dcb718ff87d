//! Closed sets of decode algorithms.
//!
//! Each family is a plain enum whose variants exist only when the backing
//! crate is compiled in. Dispatch is a `match`, never a trait object, so the
//! full list of code paths that can touch a chunk is visible here.
//!
//! | Family | Variant | Feature | Backend |
//! |:-------|:--------|:--------|:--------|
//! | cipher | `Aes256Gcm` | `encryption` | `ring` |
//! | cipher | `ChaCha20Poly1305` | `encryption` | `ring` |
//! | cipher | `XChaCha20Poly1305` | `xchacha20` | `chacha20poly1305` |
//! | compressor | `Store` | always | - |
//! | compressor | `Lz4` | `compression` | `lz4_flex` (frame format) |
//! | compressor | `Zstd` | `zstd` | `zstd` |
//! | hash | `Xxh3` | `checksum` | `xxhash-rust` |
//! | hash | `Sha256` | `checksum` | `sha2` |
//! | hash | `Blake3` | `blake3` | `blake3` |

pub mod cipher;
pub mod compression;
pub mod hash;

pub use cipher::CipherKind;
pub use compression::CompressorKind;
pub use hash::HashKind;

/// Algorithm ids as they appear in the chunk type code.
///
/// These values are part of the wire format. New algorithms get new ids;
/// existing ids are never repurposed.
pub mod ids {
    /// No cipher: the body is stored unencrypted.
    pub const CIPHER_NONE: u8 = 0;
    pub const CIPHER_AES_256_GCM: u8 = 1;
    pub const CIPHER_CHACHA20_POLY1305: u8 = 2;
    pub const CIPHER_XCHACHA20_POLY1305: u8 = 3;

    pub const COMPRESSOR_STORE: u8 = 0;
    pub const COMPRESSOR_LZ4: u8 = 1;
    pub const COMPRESSOR_ZSTD: u8 = 2;

    /// No digest: integrity rests on the AEAD tag alone.
    pub const HASH_NONE: u8 = 0;
    pub const HASH_XXH3_64: u8 = 1;
    pub const HASH_SHA256: u8 = 2;
    pub const HASH_BLAKE3: u8 = 3;

    /// Highest cipher id defined by the current format revision.
    pub const MAX_CIPHER: u8 = CIPHER_XCHACHA20_POLY1305;
    /// Highest compressor id defined by the current format revision.
    pub const MAX_COMPRESSOR: u8 = COMPRESSOR_ZSTD;
    /// Highest hash id defined by the current format revision.
    pub const MAX_HASH: u8 = HASH_BLAKE3;
}
