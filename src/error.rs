//! Error taxonomy for the chunk decode pipeline.
//!
//! Every failure carries an [`ErrorKind`] with a stable numeric code so hosts
//! across language boundaries can branch on outcome without structured errors.
//! The [`ErrorClass`] of a kind decides how the session reacts to it.

use crate::registry::AlgorithmKind;
use serde::Serialize;
use thiserror::Error;

/// Errors produced while decoding a dakt stream.
///
/// Messages never include key bytes or plaintext.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed chunk header at offset {offset}: {available} bytes remain, header needs {needed}")]
    MalformedHeader {
        offset: usize,
        available: usize,
        needed: usize,
    },

    #[error("invalid chunk size {declared} at offset {offset}: {remaining} payload bytes remain")]
    InvalidSize {
        offset: usize,
        declared: u32,
        remaining: usize,
    },

    #[error("unrecognized chunk type {0:#010x}")]
    UnrecognizedType(u32),

    #[error("unsupported {kind} algorithm id {id}")]
    UnsupportedAlgorithm { kind: AlgorithmKind, id: u8 },

    #[error("chunk payload too short: plan needs {needed} bytes, payload has {available}")]
    TruncatedPayload { needed: usize, available: usize },

    #[error("decryption failed")]
    DecryptFailure,

    #[error("decompression failed: {0}")]
    DecompressFailure(String),

    #[error("decompressed output exceeds ceiling of {ceiling} bytes")]
    OutputTooLarge { ceiling: usize },

    #[error("integrity check failed")]
    IntegrityMismatch,

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("decode session is closed")]
    SessionClosed,
}

impl DecodeError {
    /// Stable kind of this error, detached from its diagnostic payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            DecodeError::InvalidSize { .. } => ErrorKind::InvalidSize,
            DecodeError::UnrecognizedType(_) => ErrorKind::UnrecognizedType,
            DecodeError::UnsupportedAlgorithm { .. } => ErrorKind::UnsupportedAlgorithm,
            DecodeError::TruncatedPayload { .. } => ErrorKind::TruncatedPayload,
            DecodeError::DecryptFailure => ErrorKind::DecryptFailure,
            DecodeError::DecompressFailure(_) => ErrorKind::DecompressFailure,
            DecodeError::OutputTooLarge { .. } => ErrorKind::OutputTooLarge,
            DecodeError::IntegrityMismatch => ErrorKind::IntegrityMismatch,
            DecodeError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            DecodeError::SessionClosed => ErrorKind::SessionClosed,
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.kind().class()
    }
}

/// Stable, payload-free error kinds recorded in reports.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MalformedHeader = 1,
    InvalidSize = 2,
    UnrecognizedType = 3,
    UnsupportedAlgorithm = 4,
    TruncatedPayload = 5,
    DecryptFailure = 6,
    DecompressFailure = 7,
    OutputTooLarge = 8,
    IntegrityMismatch = 9,
    InvalidConfiguration = 10,
    SessionClosed = 11,
}

impl ErrorKind {
    /// Stable numeric code. Codes are never reused for a different kind.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn class(self) -> ErrorClass {
        match self {
            ErrorKind::MalformedHeader | ErrorKind::InvalidSize => ErrorClass::Structural,
            ErrorKind::UnrecognizedType
            | ErrorKind::UnsupportedAlgorithm
            | ErrorKind::TruncatedPayload => ErrorClass::Resolution,
            ErrorKind::DecryptFailure
            | ErrorKind::DecompressFailure
            | ErrorKind::OutputTooLarge
            | ErrorKind::IntegrityMismatch => ErrorClass::Transform,
            ErrorKind::InvalidConfiguration | ErrorKind::SessionClosed => ErrorClass::Usage,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MalformedHeader => "malformed_header",
            ErrorKind::InvalidSize => "invalid_size",
            ErrorKind::UnrecognizedType => "unrecognized_type",
            ErrorKind::UnsupportedAlgorithm => "unsupported_algorithm",
            ErrorKind::TruncatedPayload => "truncated_payload",
            ErrorKind::DecryptFailure => "decrypt_failure",
            ErrorKind::DecompressFailure => "decompress_failure",
            ErrorKind::OutputTooLarge => "output_too_large",
            ErrorKind::IntegrityMismatch => "integrity_mismatch",
            ErrorKind::InvalidConfiguration => "invalid_configuration",
            ErrorKind::SessionClosed => "session_closed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far the damage of an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorClass {
    /// Framing can no longer be trusted; the session ends.
    Structural,
    /// This chunk cannot be decoded, but its size is known.
    Resolution,
    /// This chunk's content is invalid or tampered.
    Transform,
    /// Caller misuse; returned immediately.
    Usage,
}

impl ErrorClass {
    /// Whether the error is confined to a single chunk.
    pub fn is_chunk_level(self) -> bool {
        matches!(self, ErrorClass::Resolution | ErrorClass::Transform)
    }
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, DecodeError>;
