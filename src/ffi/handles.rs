//! Opaque FFI handle types for dakt-decrypt
//!
//! Provides type-safe opaque pointers for passing Rust structs across FFI boundaries.
//! Handles must be created with constructor functions and freed with destructor functions.
//!
//! # Handle Validity Tracking
//!
//! All handles are tracked in a global registry to detect:
//! - Double-free attempts (calling free on already-freed handle)
//! - Use-after-free attempts (using a handle after it was freed)
//!
//! Invalid handle operations return `DaktDecryptResult::ErrInvalidHandle` instead of causing
//! undefined behavior.

use crate::context::DecryptContext;
use crate::registry::AlgorithmRegistry;
use crate::report::DecryptReport;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex};
use zeroize::Zeroizing;

static REGISTRY_HANDLES: LazyLock<Mutex<HashSet<usize>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

static CONTEXT_HANDLES: LazyLock<Mutex<HashSet<usize>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

static REPORT_HANDLES: LazyLock<Mutex<HashSet<usize>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Session state behind a context handle.
///
/// C callers read plaintext in a second call, so the last chunk waits here.
pub struct FfiSession {
    pub(crate) session: DecryptContext,
    pub(crate) pending: Option<Zeroizing<Vec<u8>>>,
}

/// Generates an opaque FFI handle type with validity tracking.
///
/// This macro creates:
/// - A `#[repr(C)]` struct with zero-sized private field
/// - `into_opaque_ptr`: Convert inner type to handle, registering in global registry
/// - `from_opaque_ptr`: Convert handle back to inner type, unregistering (returns `Option`)
/// - `is_valid`: Check if handle is registered
/// - `as_ref`: Borrow inner type (returns `Option`)
/// - `as_mut`: Mutably borrow inner type (returns `Option`)
macro_rules! opaque_handle {
    (
        $(#[$meta:meta])*
        $handle:ident,
        $inner:ty,
        $registry:ident
    ) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $handle {
            _private: [u8; 0],
        }

        #[allow(dead_code)]
        impl $handle {
            /// Box `inner` and register the pointer.
            pub(crate) fn into_opaque_ptr(inner: $inner) -> *mut Self {
                let ptr = Box::into_raw(Box::new(inner)) as *mut Self;
                if let Ok(mut handles) = $registry.lock() {
                    handles.insert(ptr as usize);
                }
                ptr
            }

            /// Unregister and unbox. `None` for null, freed or foreign pointers.
            ///
            /// # Safety
            /// - If `Some` is returned, the pointer is consumed and must not be used again
            pub(crate) unsafe fn from_opaque_ptr(ptr: *mut Self) -> Option<$inner> {
                if ptr.is_null() {
                    return None;
                }
                let addr = ptr as usize;
                let registered = $registry
                    .lock()
                    .map(|mut handles| handles.remove(&addr))
                    .unwrap_or(false);
                if !registered {
                    return None;
                }
                // SAFETY: Handle was registered, so it came from into_opaque_ptr
                Some(unsafe { *Box::from_raw(ptr as *mut $inner) })
            }

            pub(crate) fn is_valid(ptr: *const Self) -> bool {
                if ptr.is_null() {
                    return false;
                }
                $registry
                    .lock()
                    .map(|handles| handles.contains(&(ptr as usize)))
                    .unwrap_or(false)
            }

            /// # Safety
            /// - Pointer must remain valid for the lifetime of the returned reference
            pub(crate) unsafe fn as_ref<'a>(ptr: *const Self) -> Option<&'a $inner> {
                if !Self::is_valid(ptr) {
                    return None;
                }
                // SAFETY: Handle is registered, so pointer is valid and aligned
                Some(unsafe { &*(ptr as *const $inner) })
            }

            /// # Safety
            /// - Pointer must remain valid for the lifetime of the returned reference
            /// - No other references (mutable or immutable) may exist
            pub(crate) unsafe fn as_mut<'a>(ptr: *mut Self) -> Option<&'a mut $inner> {
                if !Self::is_valid(ptr) {
                    return None;
                }
                // SAFETY: Handle is registered, so pointer is valid, aligned, and exclusively accessed
                Some(unsafe { &mut *(ptr as *mut $inner) })
            }
        }
    };
}

opaque_handle!(
    /// Opaque handle for a shared algorithm registry
    ///
    /// # Safety
    /// - Create with `dakt_registry_new_default`
    /// - Free with `dakt_registry_free`; open contexts keep their own reference
    DaktRegistry,
    Arc<AlgorithmRegistry>,
    REGISTRY_HANDLES
);

opaque_handle!(
    /// Opaque handle for a decode session
    ///
    /// # Safety
    /// - Create with `dakt_decrypt_context_open`
    /// - Free with `dakt_decrypt_context_free`
    /// - Never share between threads without external synchronization
    DaktDecryptContext,
    FfiSession,
    CONTEXT_HANDLES
);

opaque_handle!(
    /// Opaque handle for a frozen decode report
    ///
    /// # Safety
    /// - Create with `dakt_decrypt_context_finalize`
    /// - Free with `dakt_report_free`
    DaktDecryptReport,
    DecryptReport,
    REPORT_HANDLES
);
