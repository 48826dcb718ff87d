//! # dakt-decrypt
//!
//! Decoder for the chunked "dakt" container: each chunk is independently
//! encrypted, compressed and integrity-checked.
//!
//! Bytes in, plaintext chunks and a report out. One bad chunk is recorded and
//! skipped; only broken framing ends a stream early.
//!
//! ## Features
//!
//! | Feature | Description | Default |
//! |:--------|:------------|:-------:|
//! | `compression` | LZ4 frame decompression via `lz4_flex` | Yes |
//! | `zstd` | Zstandard decompression | Yes |
//! | `checksum` | xxHash3-64 and SHA-256 digests | Yes |
//! | `blake3` | BLAKE3 digests | Yes |
//! | `encryption` | AES-256-GCM and ChaCha20-Poly1305 via `ring` | Yes |
//! | `xchacha20` | XChaCha20-Poly1305 via `chacha20poly1305` | Yes |
//! | `ffi` | C ABI and header generation | No |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dakt_decrypt::{AlgorithmRegistry, DecoderConfig, DecryptContext, KeyMaterial, StepOutcome};
//! use std::sync::Arc;
//!
//! let stream: Vec<u8> = std::fs::read("archive.dakt").unwrap();
//! let registry = Arc::new(AlgorithmRegistry::with_defaults());
//! let key = KeyMaterial::from_bytes([0u8; 32]); // Use a provisioned key in production!
//!
//! let mut ctx = DecryptContext::open(DecoderConfig::new(key, registry)).unwrap();
//! while let Ok(step) = ctx.process_next(&stream) {
//!     match step {
//!         StepOutcome::ChunkOk(chunk) => { /* consume chunk.plaintext */ }
//!         StepOutcome::ChunkFailed { .. } => continue,
//!         StepOutcome::StreamExhausted | StepOutcome::StreamCorrupted(_) => break,
//!     }
//! }
//!
//! let report = ctx.finalize();
//! assert_eq!(report.total_chunks(), report.succeeded() + report.failed());
//! ```
//!
//! ## Security Properties
//!
//! - **AEAD**: every cipher authenticates; associated data binds the header and chunk index
//! - **Constant-time digests**: comparisons via `subtle`
//! - **Decompression bombs**: hard per-chunk output ceiling, buffers never grow past it
//! - **Nonce reuse**: rejected within a session by default
//! - **Memory safety**: `zeroize` on close and drop for key material and intermediate plaintext

pub mod algorithms;
pub mod context;
pub mod error;
pub mod header;
pub mod keys;
pub mod plan;
pub mod registry;
pub mod report;
pub mod transform;

// Metrics and observability
pub mod metrics;
pub use metrics::DecodeMetrics;

pub use algorithms::{CipherKind, CompressorKind, HashKind};
pub use context::{
    DEFAULT_MAX_OUTPUT_SIZE, DecodeOptions, DecodedChunk, DecoderConfig, DecryptContext,
    SessionState, StepOutcome,
};
pub use error::{DecodeError, ErrorClass, ErrorKind, Result};
pub use header::{ChunkHeader, ChunkHeaderParser, ChunkInfo, HEADER_LEN, Span};
pub use keys::{KEY_LEN, KeyMaterial};
pub use plan::{ChunkDecodePlan, TypeCode, VerifyPoint, resolve};
pub use registry::{Algorithm, AlgorithmKind, AlgorithmRegistry};
pub use report::{
    ChunkOutcome, ChunkStatus, CloseReason, DecryptReport, ReportSummary, StreamFault,
};
pub use transform::{ChunkTransformer, TransformOutput};

// C FFI layer (feature-gated)
#[cfg(feature = "ffi")]
pub mod ffi;
#[cfg(feature = "ffi")]
pub use ffi::DaktDecryptResult;
