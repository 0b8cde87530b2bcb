//! FFI layer – each sub-module exposes one domain area of the C API.
//!
//! Types and helper functions shared across sub-modules live here (macros,
//! `OwnedVec`, pointer helpers). Every owned value handed to the host has
//! exactly one matching `kb_*_free`.

use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::ptr;

pub mod engine;
pub mod service;


pub use engine::*;
pub use service::*;

// --- Generic owned-pointer helpers for FFI resource management ---

/// Allocate a value on the heap and return a raw pointer suitable for FFI.
/// The caller is responsible for eventually passing the pointer to [`owned_drop`].
pub(crate) fn owned_new<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// Free a heap-allocated value previously created by [`owned_new`].
/// No-op if `ptr` is null.
///
/// # Safety
/// `ptr` must have been produced by [`owned_new`] (i.e. `Box::into_raw`)
/// and must not have been freed already.
pub(crate) unsafe fn owned_drop<T>(ptr: *mut T) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Safely convert a C string pointer to a `&str`.
/// Returns `None` if the pointer is null or contains invalid UTF-8.
pub(crate) unsafe fn cptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Validate one or more FFI arguments and bind them as safe Rust values,
/// returning `$on_err` from the **calling** function if any check fails.
///
/// | Syntax | What it does |
/// |--------|--------------|
/// | `str: $name = $ptr` | Null-check `$ptr: *const c_char`, convert via [`cptr_to_str`] to `&str`, bind as `$name`. |
/// | `ref: $name = $ptr` | Null-check `$ptr: *const T`, dereference to `&T`, bind as `$name`. |
/// | `mut: $name = $ptr` | Null-check `$ptr: *mut T`, dereference to `&mut T`, bind as `$name`. |
macro_rules! ffi_guard {
    ($on_err:expr ; ) => {};

    ($on_err:expr ; str: $name:ident = $ptr:expr , $($rest:tt)*) => {
        let Some($name) = (unsafe { $crate::ffi::cptr_to_str($ptr) }) else {
            return $on_err;
        };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };

    ($on_err:expr ; ref: $name:ident = $ptr:expr , $($rest:tt)*) => {
        if $ptr.is_null() {
            return $on_err;
        }
        let $name = unsafe { &*$ptr };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };

    ($on_err:expr ; mut: $name:ident = $ptr:expr , $($rest:tt)*) => {
        if $ptr.is_null() {
            return $on_err;
        }
        let $name = unsafe { &mut *$ptr };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };
}

/// Define an `extern "C"` function that closes (frees) a heap-allocated resource.
macro_rules! ffi_close {
    ($fn_name:ident, $T:ty) => {
        #[no_mangle]
        pub extern "C" fn $fn_name(ptr: *mut $T) {
            unsafe { $crate::ffi::owned_drop(ptr) };
        }
    };
}

// Make macros available to sub-modules.
pub(crate) use ffi_close;
pub(crate) use ffi_guard;

// --- Shared FFI types ---

/// Generic FFI-owned buffer: keeps a `Vec<T>` (whose pointer is exposed to C)
/// alive together with the `CString`s that back any `*const c_char` inside `T`.
pub(crate) struct OwnedVec<T> {
    pub(crate) items: Vec<T>,
    pub(crate) _strings: Vec<CString>,
}

impl<T> OwnedVec<T> {
    /// Box the items + strings, return (data_ptr, len, owned_ptr).
    /// Returns null pointers when `items` is empty.
    pub(crate) fn pack(items: Vec<T>, strings: Vec<CString>) -> (*const T, u32, *mut Self) {
        if items.is_empty() {
            return (ptr::null(), 0, ptr::null_mut());
        }
        let owned = Box::new(Self {
            items,
            _strings: strings,
        });
        // Capture pointer and length before consuming the Box.
        // This is safe because Box::into_raw does not move or reallocate
        // the Vec's heap buffer — it only converts the Box into a raw pointer.
        let data_ptr = owned.items.as_ptr();
        let len = owned.items.len() as u32;
        let owned_ptr = Box::into_raw(owned);
        (data_ptr, len, owned_ptr)
    }
}

// --- Top-level FFI functions ---

#[no_mangle]
pub extern "C" fn kb_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// Free a string returned by any `kb_*` entry point that documents
/// string-ownership transfer. No-op if `ptr` is null.
#[no_mangle]
pub extern "C" fn kb_string_free(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

/// Available compute backends as a bitmask: bit 0 cpu, bit 1 cuda,
/// bit 2 vulkan.
#[no_mangle]
pub extern "C" fn kb_check_capability() -> u32 {
    crate::capability::probe().bits()
}

#[no_mangle]
#[allow(clippy::unused_unit)]
pub extern "C" fn kb_trace_init(log_dir: *const c_char) {
    ffi_guard!(();
        str: dir_str = log_dir,
    );
    crate::trace_init::init_tracing(Path::new(dir_str));
}
