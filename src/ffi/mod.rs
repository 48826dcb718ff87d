//! C FFI layer for dakt-decrypt
//!
//! Provides C-compatible interfaces for decode sessions and their reports.
//! All functions use #[repr(C)] types and panic-safe wrappers.

pub mod context;
pub mod error;
pub mod handles;
pub mod report;

pub use error::DaktDecryptResult;
pub use handles::*;

// Re-export FFI functions for C clients
pub use context::{
    DaktStepKind, DaktStepOutcome, dakt_decrypt_context_finalize, dakt_decrypt_context_free,
    dakt_decrypt_context_next, dakt_decrypt_context_open, dakt_decrypt_context_take_plaintext,
    dakt_registry_free, dakt_registry_new_default,
};
pub use report::{
    DaktChunkOutcome, dakt_report_bytes_consumed, dakt_report_failed, dakt_report_free,
    dakt_report_outcome_at, dakt_report_plaintext_bytes, dakt_report_stream_fault,
    dakt_report_succeeded, dakt_report_total_chunks,
};
