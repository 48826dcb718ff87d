//! C FFI accessors for frozen decode reports.
//!
//! Counter accessors return 0 for null or invalid handles. Use
//! `dakt_report_outcome_at` when the distinction matters.

use crate::ffi::error::DaktDecryptResult;
use crate::ffi::handles::DaktDecryptReport;
use crate::report::{ChunkStatus, DecryptReport};
use std::panic::catch_unwind;

/// Flat, C-readable view of one chunk outcome.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaktChunkOutcome {
    pub index: u64,
    /// Stream offset of the chunk header
    pub offset: usize,
    /// Encoded length, header included
    pub encoded_len: usize,
    /// `Ok` for decoded chunks, the failure code otherwise
    pub error: DaktDecryptResult,
    pub plaintext_len: usize,
}

fn read_counter(handle: *const DaktDecryptReport, field: fn(&DecryptReport) -> u64) -> u64 {
    catch_unwind(|| {
        // SAFETY: validity tracked by the handle registry
        unsafe { DaktDecryptReport::as_ref(handle) }.map_or(0, field)
    })
    .unwrap_or(0)
}

/// Number of chunks whose framing was parsed.
///
/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_total_chunks(handle: *const DaktDecryptReport) -> u64 {
    read_counter(handle, DecryptReport::total_chunks)
}

/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_succeeded(handle: *const DaktDecryptReport) -> u64 {
    read_counter(handle, DecryptReport::succeeded)
}

/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_failed(handle: *const DaktDecryptReport) -> u64 {
    read_counter(handle, DecryptReport::failed)
}

/// Total plaintext bytes produced by successful chunks.
///
/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_plaintext_bytes(handle: *const DaktDecryptReport) -> u64 {
    read_counter(handle, DecryptReport::plaintext_bytes)
}

/// Bytes covered by parsed chunks, headers included.
///
/// Equals the stream length when the stream was decoded to its end without a fault.
///
/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_bytes_consumed(handle: *const DaktDecryptReport) -> u64 {
    read_counter(handle, DecryptReport::bytes_consumed)
}

/// Fetch the framing fault that ended the stream, if any.
///
/// # Returns
/// - `Ok`, with `*code_out` set to the fault code (`ErrIo`) and `*offset_out`
///   to the offset of the broken header; for a stream without a fault,
///   `*code_out` is `Ok` and `*offset_out` is 0
/// - `ErrNullPointer` if any argument is null
/// - `ErrInvalidHandle` if the handle is invalid
///
/// # Safety
/// - `offset_out` and `code_out` must be valid for writes
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_stream_fault(
    handle: *const DaktDecryptReport,
    offset_out: *mut usize,
    code_out: *mut DaktDecryptResult,
) -> DaktDecryptResult {
    let result = catch_unwind(|| {
        if handle.is_null() || offset_out.is_null() || code_out.is_null() {
            return DaktDecryptResult::ErrNullPointer;
        }
        // SAFETY: validity tracked by the handle registry
        let Some(report) = (unsafe { DaktDecryptReport::as_ref(handle) }) else {
            return DaktDecryptResult::ErrInvalidHandle;
        };

        let (offset, code) = report
            .stream_fault()
            .map_or((0, DaktDecryptResult::Ok), |fault| (fault.offset, fault.kind.into()));
        // SAFETY: checked non-null above
        unsafe {
            *offset_out = offset;
            *code_out = code;
        }
        DaktDecryptResult::Ok
    });

    result.unwrap_or(DaktDecryptResult::ErrInternal)
}

/// Fetch the outcome of chunk `index`.
///
/// # Returns
/// - `Ok` and fills `outcome_out`
/// - `ErrNullPointer` if `handle` or `outcome_out` is null
/// - `ErrInvalidHandle` if the handle is invalid or `index` is out of range
///
/// # Safety
/// - `outcome_out` must be valid for writes
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_outcome_at(
    handle: *const DaktDecryptReport,
    index: u64,
    outcome_out: *mut DaktChunkOutcome,
) -> DaktDecryptResult {
    let result = catch_unwind(|| {
        if handle.is_null() || outcome_out.is_null() {
            return DaktDecryptResult::ErrNullPointer;
        }
        // SAFETY: validity tracked by the handle registry
        let Some(report) = (unsafe { DaktDecryptReport::as_ref(handle) }) else {
            return DaktDecryptResult::ErrInvalidHandle;
        };
        let Some(outcome) = report.outcome(index) else {
            return DaktDecryptResult::ErrInvalidHandle;
        };

        let (error, plaintext_len) = match outcome.status {
            ChunkStatus::Ok { plaintext_len } => (DaktDecryptResult::Ok, plaintext_len),
            ChunkStatus::Failed { kind } => (kind.into(), 0),
        };
        // SAFETY: checked non-null above
        unsafe {
            *outcome_out = DaktChunkOutcome {
                index: outcome.index,
                offset: outcome.range.start,
                encoded_len: outcome.range.len(),
                error,
                plaintext_len,
            };
        }
        DaktDecryptResult::Ok
    });

    result.unwrap_or(DaktDecryptResult::ErrInternal)
}

/// Free a report handle.
///
/// # Safety
/// - `handle` must not be used after this call
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_report_free(handle: *mut DaktDecryptReport) {
    let _ = catch_unwind(|| {
        // SAFETY: from_opaque_ptr rejects null, freed and unknown handles
        unsafe {
            let _report = DaktDecryptReport::from_opaque_ptr(handle);
        }
    });
}
