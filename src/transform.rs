//! The decrypt, decompress, verify pipeline for a single chunk.
//!
//! Stages run strictly in order and each only if the previous succeeded:
//!
//! 1. decrypt (if the plan has a cipher), AAD = header bytes ‖ chunk index (u64 LE)
//! 2. verify the compressed bytes (if the digest covers them)
//! 3. decompress under the output ceiling
//! 4. verify the plaintext (if the digest covers it)
//!
//! Intermediate buffers are `Zeroizing`, so a chunk that fails at any stage
//! leaves no readable plaintext behind.

use crate::error::{DecodeError, Result};
use crate::header::{HEADER_LEN, Span};
use crate::keys::KeyMaterial;
use crate::metrics::{DecodeMetrics, elapsed_micros};
use crate::plan::{ChunkDecodePlan, VerifyPoint};
use std::time::Instant;
use zeroize::Zeroizing;

/// Associated data length: header plus u64 chunk index.
pub const AAD_LEN: usize = HEADER_LEN + 8;

/// Decoded plaintext and stage timings.
#[derive(Debug)]
pub struct TransformOutput {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub metrics: DecodeMetrics,
}

/// Build the associated data binding a chunk's header and position.
pub fn chunk_aad(header_bytes: &[u8; HEADER_LEN], index: u64) -> [u8; AAD_LEN] {
    let mut aad = [0u8; AAD_LEN];
    aad[..HEADER_LEN].copy_from_slice(header_bytes);
    aad[HEADER_LEN..].copy_from_slice(&index.to_le_bytes());
    aad
}

/// Executes decode plans with a borrowed session key.
pub struct ChunkTransformer<'k> {
    key: &'k KeyMaterial,
    max_output_size: usize,
}

impl<'k> ChunkTransformer<'k> {
    pub fn new(key: &'k KeyMaterial, max_output_size: usize) -> Self {
        Self {
            key,
            max_output_size,
        }
    }

    /// Decode the chunk `plan` describes. Spans in `plan` index into `source`.
    pub fn apply(
        &self,
        plan: &ChunkDecodePlan,
        source: &[u8],
        index: u64,
    ) -> Result<TransformOutput> {
        let body = span_bytes(plan.body, source)?;
        let digest = span_bytes(plan.digest, source)?;
        let mut metrics = DecodeMetrics::new();

        let decrypted = match plan.cipher {
            Some(cipher) => {
                let nonce = span_bytes(plan.nonce, source)?;
                let aad = chunk_aad(&plan.header.to_bytes(), index);
                let start = Instant::now();
                let decrypted = cipher.decrypt(self.key, nonce, &aad, body)?;
                metrics = metrics.with_decrypt(elapsed_micros(start));
                Some(decrypted)
            }
            None => None,
        };
        let compressed: &[u8] = decrypted.as_deref().map_or(body, |d| d.as_slice());

        if let (Some(hash), VerifyPoint::Compressed) = (plan.hash, plan.verify_point) {
            let start = Instant::now();
            hash.verify(compressed, digest)?;
            metrics = metrics.with_verify(elapsed_micros(start));
        }

        let start = Instant::now();
        let plaintext = plan
            .compressor
            .decompress(compressed, self.max_output_size)?;
        metrics = metrics.with_decompress(elapsed_micros(start), compressed.len(), plaintext.len());

        if let (Some(hash), VerifyPoint::Plaintext) = (plan.hash, plan.verify_point) {
            let start = Instant::now();
            hash.verify(&plaintext, digest)?;
            metrics = metrics.with_verify(elapsed_micros(start));
        }

        Ok(TransformOutput { plaintext, metrics })
    }
}

fn span_bytes(span: Span, source: &[u8]) -> Result<&[u8]> {
    span.slice(source).ok_or(DecodeError::TruncatedPayload {
        needed: span.end(),
        available: source.len(),
    })
}
