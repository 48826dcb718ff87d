//! C FFI wrappers for registries and decode sessions.
//!
//! - Panic safety via catch_unwind
//! - Null pointer checks on every argument
//! - Registered handles, so double-free and use-after-free are reported, not undefined
//!
//! A C session looks like:
//!
//! ```c
//! DaktRegistry *reg = dakt_registry_new_default();
//! DaktDecryptContext *ctx = dakt_decrypt_context_open(reg, key, 32, 0, false, &rc);
//! DaktStepOutcome step;
//! while (dakt_decrypt_context_next(ctx, buf, len, &step) == DAKT_DECRYPT_RESULT_OK) {
//!     if (step.kind == DAKT_STEP_KIND_CHUNK_OK) {
//!         dakt_decrypt_context_take_plaintext(ctx, out, &out_len);
//!     }
//!     if (step.kind == DAKT_STEP_KIND_STREAM_EXHAUSTED || step.kind == DAKT_STEP_KIND_STREAM_CORRUPTED) break;
//! }
//! DaktDecryptReport *report = dakt_decrypt_context_finalize(ctx, &rc);
//! ```

use crate::context::{
    DEFAULT_MAX_OUTPUT_SIZE, DecodeOptions, DecoderConfig, DecryptContext, StepOutcome,
};
use crate::ffi::error::{DaktDecryptResult, write_result};
use crate::ffi::handles::{DaktDecryptContext, DaktDecryptReport, DaktRegistry, FfiSession};
use crate::keys::KeyMaterial;
use crate::registry::AlgorithmRegistry;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::{ptr, slice};

/// What a call to `dakt_decrypt_context_next` did.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaktStepKind {
    ChunkOk = 0,
    ChunkFailed = 1,
    StreamExhausted = 2,
    StreamCorrupted = 3,
}

/// Flat, C-readable view of a step.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaktStepOutcome {
    pub kind: DaktStepKind,
    /// Chunk index (0 for stream-level steps)
    pub index: u64,
    /// Failure reason for failed chunks and corrupted streams, `Ok` otherwise
    pub error: DaktDecryptResult,
    /// Plaintext waiting in the context (0 unless the chunk decoded)
    pub plaintext_len: usize,
}

impl DaktStepOutcome {
    fn new(kind: DaktStepKind) -> Self {
        Self {
            kind,
            index: 0,
            error: DaktDecryptResult::Ok,
            plaintext_len: 0,
        }
    }
}

/// Create a registry with every algorithm compiled into the library.
///
/// # Returns
/// Registry handle, or null on failure. Must be freed with `dakt_registry_free`.
#[unsafe(no_mangle)]
pub extern "C" fn dakt_registry_new_default() -> *mut DaktRegistry {
    catch_unwind(|| DaktRegistry::into_opaque_ptr(Arc::new(AlgorithmRegistry::with_defaults())))
        .unwrap_or(ptr::null_mut())
}

/// Free a registry handle. Contexts opened from it stay usable.
///
/// # Safety
/// - `handle` must not be used after this call
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_registry_free(handle: *mut DaktRegistry) {
    let _ = catch_unwind(|| {
        // SAFETY: from_opaque_ptr rejects null, freed and unknown handles
        unsafe {
            let _registry = DaktRegistry::from_opaque_ptr(handle);
        }
    });
}

/// Open a decode session.
///
/// # Parameters
/// - `registry`: Registry handle (must not be null)
/// - `key`, `key_len`: Session key, must be exactly 32 bytes. Copied; the caller keeps ownership.
/// - `max_output_size`: Per-chunk decompressed ceiling in bytes, 0 for the library default
/// - `stop_on_first_error`: Close the session on the first failed chunk
/// - `error_out`: Optional pointer to receive the result code (may be null)
///
/// # Returns
/// Context handle, or null on failure. Must be freed with `dakt_decrypt_context_free`.
///
/// # Safety
/// - `key` must point to `key_len` readable bytes
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_decrypt_context_open(
    registry: *const DaktRegistry,
    key: *const u8,
    key_len: usize,
    max_output_size: usize,
    stop_on_first_error: bool,
    error_out: *mut DaktDecryptResult,
) -> *mut DaktDecryptContext {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if registry.is_null() || key.is_null() {
            return Err(DaktDecryptResult::ErrNullPointer);
        }
        // SAFETY: validity tracked by the handle registry
        let registry = unsafe { DaktRegistry::as_ref(registry) }
            .ok_or(DaktDecryptResult::ErrInvalidHandle)?;
        // SAFETY: caller guarantees key points to key_len bytes
        let key_slice = unsafe { slice::from_raw_parts(key, key_len) };
        let key = KeyMaterial::try_from_slice(key_slice)?;

        let ceiling = if max_output_size == 0 {
            DEFAULT_MAX_OUTPUT_SIZE
        } else {
            max_output_size
        };
        let options = DecodeOptions::default()
            .with_max_output_size(ceiling)
            .with_stop_on_first_error(stop_on_first_error);
        let session =
            DecryptContext::open(DecoderConfig::new(key, Arc::clone(registry)).with_options(options))?;

        Ok(DaktDecryptContext::into_opaque_ptr(FfiSession {
            session,
            pending: None,
        }))
    }));

    let (code, handle) = match result {
        Ok(Ok(handle)) => (DaktDecryptResult::Ok, handle),
        Ok(Err(code)) => (code, ptr::null_mut()),
        Err(_) => (DaktDecryptResult::ErrInternal, ptr::null_mut()),
    };
    // SAFETY: error_out is null or valid per caller contract
    unsafe { write_result(error_out, code) };
    handle
}

/// Decode the next chunk.
///
/// # Parameters
/// - `handle`: Context handle (must not be null)
/// - `source`, `source_len`: The whole stream. Pass the same buffer on every call.
/// - `outcome_out`: Receives what happened (must not be null)
///
/// # Returns
/// - `Ok` when a step was taken; chunk failures are reported in `outcome_out.error`
/// - `ErrSessionClosed` once the session has ended
/// - `ErrNullPointer`, `ErrInvalidHandle` for bad arguments
///
/// A decoded chunk's plaintext replaces any not yet taken.
///
/// # Safety
/// - `source` must point to `source_len` readable bytes
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_decrypt_context_next(
    handle: *mut DaktDecryptContext,
    source: *const u8,
    source_len: usize,
    outcome_out: *mut DaktStepOutcome,
) -> DaktDecryptResult {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if handle.is_null() || outcome_out.is_null() || (source.is_null() && source_len > 0) {
            return DaktDecryptResult::ErrNullPointer;
        }
        // SAFETY: validity tracked by the handle registry
        let Some(state) = (unsafe { DaktDecryptContext::as_mut(handle) }) else {
            return DaktDecryptResult::ErrInvalidHandle;
        };
        let source: &[u8] = if source_len == 0 {
            &[]
        } else {
            // SAFETY: caller guarantees source points to source_len bytes
            unsafe { slice::from_raw_parts(source, source_len) }
        };

        let outcome = match state.session.process_next(source) {
            Ok(StepOutcome::ChunkOk(chunk)) => {
                let mut outcome = DaktStepOutcome::new(DaktStepKind::ChunkOk);
                outcome.index = chunk.index;
                outcome.plaintext_len = chunk.plaintext.len();
                state.pending = Some(chunk.plaintext);
                outcome
            }
            Ok(StepOutcome::ChunkFailed { index, kind }) => {
                state.pending = None;
                let mut outcome = DaktStepOutcome::new(DaktStepKind::ChunkFailed);
                outcome.index = index;
                outcome.error = kind.into();
                outcome
            }
            Ok(StepOutcome::StreamExhausted) => DaktStepOutcome::new(DaktStepKind::StreamExhausted),
            Ok(StepOutcome::StreamCorrupted(kind)) => {
                let mut outcome = DaktStepOutcome::new(DaktStepKind::StreamCorrupted);
                outcome.error = kind.into();
                outcome
            }
            Err(e) => return e.into(),
        };
        // SAFETY: checked non-null above
        unsafe { *outcome_out = outcome };
        DaktDecryptResult::Ok
    }));

    result.unwrap_or(DaktDecryptResult::ErrInternal)
}

/// Copy out the plaintext of the last decoded chunk.
///
/// # Parameters
/// - `output`: Destination buffer (must not be null)
/// - `output_len`: On input the buffer size, on output the plaintext size
///
/// # Returns
/// - `Ok` on success; the plaintext is wiped from the context
/// - `ErrBufferTooSmall` with the needed size in `output_len`; the plaintext stays
/// - `ErrInvalidHandle` if there is no pending plaintext or the handle is invalid
///
/// # Safety
/// - `output` must be writable for `*output_len` bytes
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_decrypt_context_take_plaintext(
    handle: *mut DaktDecryptContext,
    output: *mut u8,
    output_len: *mut usize,
) -> DaktDecryptResult {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if handle.is_null() || output.is_null() || output_len.is_null() {
            return DaktDecryptResult::ErrNullPointer;
        }
        // SAFETY: validity tracked by the handle registry
        let Some(state) = (unsafe { DaktDecryptContext::as_mut(handle) }) else {
            return DaktDecryptResult::ErrInvalidHandle;
        };
        let Some(plaintext) = state.pending.as_ref() else {
            return DaktDecryptResult::ErrInvalidHandle;
        };

        // SAFETY: checked non-null above
        let capacity = unsafe { *output_len };
        unsafe { *output_len = plaintext.len() };
        if capacity < plaintext.len() {
            return DaktDecryptResult::ErrBufferTooSmall;
        }
        // SAFETY: output has at least capacity >= plaintext.len() writable bytes
        unsafe { ptr::copy_nonoverlapping(plaintext.as_ptr(), output, plaintext.len()) };
        state.pending = None;
        DaktDecryptResult::Ok
    }));

    result.unwrap_or(DaktDecryptResult::ErrInternal)
}

/// Close the session and snapshot its frozen report.
///
/// Idempotent: every call returns a new handle to the same frozen report.
/// The context handle stays valid until `dakt_decrypt_context_free`.
///
/// # Returns
/// Report handle, or null on failure. Must be freed with `dakt_report_free`.
///
/// # Safety
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_decrypt_context_finalize(
    handle: *mut DaktDecryptContext,
    error_out: *mut DaktDecryptResult,
) -> *mut DaktDecryptReport {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if handle.is_null() {
            return Err(DaktDecryptResult::ErrNullPointer);
        }
        // SAFETY: validity tracked by the handle registry
        let state = unsafe { DaktDecryptContext::as_mut(handle) }
            .ok_or(DaktDecryptResult::ErrInvalidHandle)?;
        state.session.close();
        state.pending = None;
        Ok(DaktDecryptReport::into_opaque_ptr(state.session.report().clone()))
    }));

    let (code, report) = match result {
        Ok(Ok(report)) => (DaktDecryptResult::Ok, report),
        Ok(Err(code)) => (code, ptr::null_mut()),
        Err(_) => (DaktDecryptResult::ErrInternal, ptr::null_mut()),
    };
    // SAFETY: error_out is null or valid per caller contract
    unsafe { write_result(error_out, code) };
    report
}

/// Free a context handle, wiping its key and any pending plaintext.
///
/// # Safety
/// - `handle` must not be used after this call
/// - Function is panic-safe and will never unwind across FFI boundary
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dakt_decrypt_context_free(handle: *mut DaktDecryptContext) {
    let _ = catch_unwind(|| {
        // SAFETY: from_opaque_ptr rejects null, freed and unknown handles
        unsafe {
            let _session = DaktDecryptContext::from_opaque_ptr(handle);
        }
    });
}
