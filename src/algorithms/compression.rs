//! Decompressors for the decompress stage.
//!
//! Provides decompression-bomb protection:
//! - a hard output ceiling checked before every buffer growth
//! - buffer capacity never exceeds the ceiling, whatever the input claims
//! - no trust in size hints carried by the compressed stream itself

use super::ids;
use crate::error::{DecodeError, Result};
#[cfg(any(feature = "compression", feature = "zstd"))]
use std::io::{self, Read};
use zeroize::Zeroizing;

/// Read granularity for streaming decoders.
#[cfg(any(feature = "compression", feature = "zstd"))]
const READ_CHUNK: usize = 16 * 1024;

/// Compressor implementations compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressorKind {
    /// Identity transform; the body is the plaintext.
    Store,
    #[cfg(feature = "compression")]
    Lz4,
    #[cfg(feature = "zstd")]
    Zstd,
}

impl CompressorKind {
    /// Every compressor available in this build, in id order.
    #[allow(unused_mut)]
    pub fn compiled() -> Vec<CompressorKind> {
        let mut kinds = vec![CompressorKind::Store];
        #[cfg(feature = "compression")]
        kinds.push(CompressorKind::Lz4);
        #[cfg(feature = "zstd")]
        kinds.push(CompressorKind::Zstd);
        kinds
    }

    pub fn format_id(self) -> u8 {
        match self {
            CompressorKind::Store => ids::COMPRESSOR_STORE,
            #[cfg(feature = "compression")]
            CompressorKind::Lz4 => ids::COMPRESSOR_LZ4,
            #[cfg(feature = "zstd")]
            CompressorKind::Zstd => ids::COMPRESSOR_ZSTD,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressorKind::Store => "store",
            #[cfg(feature = "compression")]
            CompressorKind::Lz4 => "lz4",
            #[cfg(feature = "zstd")]
            CompressorKind::Zstd => "zstd",
        }
    }

    /// Decode `input`, refusing to produce more than `ceiling` bytes.
    pub fn decompress(self, input: &[u8], ceiling: usize) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            CompressorKind::Store => {
                if input.len() > ceiling {
                    return Err(DecodeError::OutputTooLarge { ceiling });
                }
                Ok(Zeroizing::new(input.to_vec()))
            }
            #[cfg(feature = "compression")]
            CompressorKind::Lz4 => read_bounded(lz4_flex::frame::FrameDecoder::new(input), ceiling),
            #[cfg(feature = "zstd")]
            CompressorKind::Zstd => {
                let decoder = zstd::stream::read::Decoder::with_buffer(input)
                    .map_err(|e| DecodeError::DecompressFailure(e.to_string()))?;
                read_bounded(decoder, ceiling)
            }
        }
    }
}

/// Drain `reader` into a buffer whose capacity never exceeds `ceiling`.
#[cfg(any(feature = "compression", feature = "zstd"))]
fn read_bounded<R: Read>(mut reader: R, ceiling: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut output = Zeroizing::new(Vec::new());
    let mut scratch = Zeroizing::new([0u8; READ_CHUNK]);

    loop {
        let read = match reader.read(scratch.as_mut_slice()) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::DecompressFailure(e.to_string())),
        };

        let needed = output
            .len()
            .checked_add(read)
            .filter(|&len| len <= ceiling)
            .ok_or(DecodeError::OutputTooLarge { ceiling })?;

        if needed > output.capacity() {
            // Grow geometrically, clamped to the ceiling
            let target = output.capacity().saturating_mul(2).max(needed).min(ceiling);
            grow_wiped(&mut output, target);
        }
        output.extend_from_slice(&scratch[..read]);
    }

    Ok(output)
}

/// Move `buffer` into a fresh allocation of exactly `capacity` bytes.
///
/// The old allocation is wiped when its `Zeroizing` wrapper drops.
#[cfg(any(feature = "compression", feature = "zstd"))]
fn grow_wiped(buffer: &mut Zeroizing<Vec<u8>>, capacity: usize) {
    let mut grown = Zeroizing::new(Vec::with_capacity(capacity.max(buffer.len())));
    grown.extend_from_slice(buffer.as_slice());
    *buffer = grown;
}
