//! Per-chunk decode metrics
//!
//! Tracks how long each pipeline stage took for the most recent chunk.
//! Hosts can serialize these for their own metrics export.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Stage timings for one decoded chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodeMetrics {
    /// Decryption time in microseconds (None if the chunk has no cipher)
    pub decrypt_time_micros: Option<u64>,

    /// Decompression time in microseconds
    pub decompress_time_micros: u64,

    /// Expansion ratio (plaintext_size / compressed_size, >1.0 means the chunk was compressed)
    pub expansion_ratio: f64,

    /// Digest verification time in microseconds (None if the chunk has no hash)
    pub verify_time_micros: Option<u64>,

    /// Size of the plaintext produced
    pub plaintext_bytes: usize,
}

impl DecodeMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        DecodeMetrics {
            decrypt_time_micros: None,
            decompress_time_micros: 0,
            expansion_ratio: 1.0,
            verify_time_micros: None,
            plaintext_bytes: 0,
        }
    }

    pub fn with_decrypt(mut self, time_micros: u64) -> Self {
        self.decrypt_time_micros = Some(time_micros);
        self
    }

    /// Set decompression metrics
    pub fn with_decompress(
        mut self,
        time_micros: u64,
        compressed_size: usize,
        plaintext_size: usize,
    ) -> Self {
        self.decompress_time_micros = time_micros;
        self.plaintext_bytes = plaintext_size;
        if compressed_size > 0 {
            self.expansion_ratio = plaintext_size as f64 / compressed_size as f64;
        }
        self
    }

    /// Add verification time (a chunk verifies at most once, but stay additive)
    pub fn with_verify(mut self, time_micros: u64) -> Self {
        self.verify_time_micros = Some(self.verify_time_micros.unwrap_or(0) + time_micros);
        self
    }

    /// Total decode time in microseconds
    pub fn total_time_micros(&self) -> u64 {
        self.decrypt_time_micros.unwrap_or(0)
            + self.decompress_time_micros
            + self.verify_time_micros.unwrap_or(0)
    }
}

impl Default for DecodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Microseconds elapsed since `start`, saturating.
pub(crate) fn elapsed_micros(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
