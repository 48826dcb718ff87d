//! FFI result codes for C-compatible error handling across the FFI boundary.

use crate::error::{DecodeError, ErrorKind};

/// C-compatible result codes for FFI boundary
///
/// Codes 0..=4 are the coarse C result family; later codes refine it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaktDecryptResult {
    /// Operation succeeded
    Ok = 0,
    /// Stream framing is broken (malformed header or impossible size)
    ErrIo = 1,
    /// Chunk type, algorithm id or payload shape not recognized
    ErrUnrecognized = 2,
    /// Authentication failed or nonce reused
    ErrDecrypt = 3,
    /// Decompression failed
    ErrDecompress = 4,
    /// Digest mismatch
    ErrIntegrity = 5,
    /// Decompressed output would exceed the ceiling
    ErrOutputTooLarge = 6,
    /// Invalid session configuration (key length, registry, ceiling)
    ErrInvalidConfig = 7,
    /// Session already closed
    ErrSessionClosed = 8,
    /// Null pointer provided
    ErrNullPointer = 9,
    /// Invalid or already-freed handle
    ErrInvalidHandle = 10,
    /// Output buffer too small
    ErrBufferTooSmall = 11,
    /// A panic was caught at the boundary
    ErrInternal = 12,
}

impl From<ErrorKind> for DaktDecryptResult {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::MalformedHeader | ErrorKind::InvalidSize => DaktDecryptResult::ErrIo,
            ErrorKind::UnrecognizedType
            | ErrorKind::UnsupportedAlgorithm
            | ErrorKind::TruncatedPayload => DaktDecryptResult::ErrUnrecognized,
            ErrorKind::DecryptFailure => DaktDecryptResult::ErrDecrypt,
            ErrorKind::DecompressFailure => DaktDecryptResult::ErrDecompress,
            ErrorKind::IntegrityMismatch => DaktDecryptResult::ErrIntegrity,
            ErrorKind::OutputTooLarge => DaktDecryptResult::ErrOutputTooLarge,
            ErrorKind::InvalidConfiguration => DaktDecryptResult::ErrInvalidConfig,
            ErrorKind::SessionClosed => DaktDecryptResult::ErrSessionClosed,
        }
    }
}

impl From<DecodeError> for DaktDecryptResult {
    fn from(e: DecodeError) -> Self {
        e.kind().into()
    }
}

/// Write `code` through an optional out-pointer.
///
/// # Safety
/// `out` must be null or valid for writes.
pub(crate) unsafe fn write_result(out: *mut DaktDecryptResult, code: DaktDecryptResult) {
    if !out.is_null() {
        unsafe { *out = code };
    }
}
