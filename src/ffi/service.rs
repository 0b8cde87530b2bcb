//! Service FFI: the entry points the host process calls.
//!
//! The service is handle-based: `kb_service_new` returns an opaque pointer
//! that every entry point takes, and the host frees with `kb_service_free`.
//! Calls must be serialized by the host (single dedicated thread or an
//! external mutex); the handle is a monitor for exactly one caller, not a
//! thread-safe structure.
//!
//! Ownership contract: strings returned as `*mut c_char` are freed with
//! `kb_string_free`; a `KbCandidateList` is freed, whole, with the single
//! `kb_candidates_free`.

use std::ffi::{c_char, CString};
use std::path::Path;
use std::ptr;

use super::engine::KbEngine;
use super::{ffi_close, ffi_guard, owned_new, OwnedVec};
use crate::service::{Candidate, Service};

/// Opaque service handle: one composing session + one configuration
/// snapshot + the engine.
pub struct KbService {
    pub(crate) inner: Service,
}

/// Fixed-layout candidate record. All three strings live inside the owning
/// list; they are not individually freed.
#[repr(C)]
pub struct KbCandidate {
    pub text: *const c_char,
    pub subtext: *const c_char,
    pub source_reading: *const c_char,
    pub corresponding_count: i32,
}

/// Contiguous candidate block with explicit length. An empty result is
/// `{ items: null, len: 0 }` — well-formed, and safe to pass to
/// `kb_candidates_free`.
#[repr(C)]
pub struct KbCandidateList {
    pub items: *const KbCandidate,
    pub len: u32,
    _owned: *mut OwnedVec<KbCandidate>,
}

impl KbCandidateList {
    fn empty() -> Self {
        Self {
            items: ptr::null(),
            len: 0,
            _owned: ptr::null_mut(),
        }
    }
}

fn pack_candidates(candidates: Vec<Candidate>) -> KbCandidateList {
    let mut strings = Vec::with_capacity(candidates.len() * 3);
    let mut items = Vec::with_capacity(candidates.len());

    for candidate in &candidates {
        let (Ok(text), Ok(subtext), Ok(reading)) = (
            CString::new(candidate.text.as_str()),
            CString::new(candidate.subtext.as_str()),
            CString::new(candidate.source_reading.as_str()),
        ) else {
            continue; // skip candidates with interior null bytes
        };
        items.push(KbCandidate {
            text: text.as_ptr(),
            subtext: subtext.as_ptr(),
            source_reading: reading.as_ptr(),
            corresponding_count: candidate.corresponding_count as i32,
        });
        strings.push(text);
        strings.push(subtext);
        strings.push(reading);
    }

    let (items_ptr, len, owned) = OwnedVec::pack(items, strings);
    KbCandidateList {
        items: items_ptr,
        len,
        _owned: owned,
    }
}

/// Allocate an owned copy of the session buffer for the host, writing the
/// cursor through `cursor_out` when provided.
fn buffer_out(text: String, cursor: usize, cursor_out: *mut i32) -> *mut c_char {
    if !cursor_out.is_null() {
        unsafe { *cursor_out = cursor as i32 };
    }
    match CString::new(text) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// --- Lifecycle ---

/// Create a service over `engine`, loading configuration from
/// `base_path/settings.json` and running the warm-up conversion.
///
/// Takes ownership of `engine`: the handle must not be used or passed to
/// `kb_engine_free` afterwards. Returns null if any argument is invalid.
#[no_mangle]
pub extern "C" fn kb_service_new(engine: *mut KbEngine, base_path: *const c_char) -> *mut KbService {
    ffi_guard!(ptr::null_mut();
        str: path_str = base_path,
    );
    if engine.is_null() {
        return ptr::null_mut();
    }
    let engine = unsafe { Box::from_raw(engine) };
    let inner = Service::new(engine, Path::new(path_str));
    owned_new(KbService { inner })
}

ffi_close!(kb_service_free, KbService);

// --- Composing-session entry points ---

/// Append raw input (transliterated by the engine) at the cursor.
/// Returns the new buffer (owned; free with `kb_string_free`) and writes the
/// new cursor to `cursor_out`.
#[no_mangle]
pub extern "C" fn kb_append_text(
    service: *mut KbService,
    input: *const c_char,
    cursor_out: *mut i32,
) -> *mut c_char {
    ffi_guard!(ptr::null_mut();
        mut: service = service,
        str: input_str = input,
    );
    let (text, cursor) = service.inner.append_text(input_str);
    buffer_out(text, cursor, cursor_out)
}

/// Delete one unit before the cursor (no-op at position 0).
#[no_mangle]
pub extern "C" fn kb_remove_text(service: *mut KbService, cursor_out: *mut i32) -> *mut c_char {
    ffi_guard!(ptr::null_mut();
        mut: service = service,
    );
    let (text, cursor) = service.inner.remove_text();
    buffer_out(text, cursor, cursor_out)
}

/// Move the cursor by `offset` units, clamped to the buffer.
/// Returns the new cursor position.
#[no_mangle]
pub extern "C" fn kb_move_cursor(service: *mut KbService, offset: i32) -> i32 {
    ffi_guard!(0;
        mut: service = service,
    );
    service.inner.move_cursor(offset) as i32
}

#[no_mangle]
pub extern "C" fn kb_clear_text(service: *mut KbService) {
    ffi_guard!(();
        mut: service = service,
    );
    service.inner.clear_text();
}

/// Drop the first `accepted` units after the host commits a candidate.
/// Returns the remaining buffer (owned; free with `kb_string_free`).
#[no_mangle]
pub extern "C" fn kb_shrink_text(service: *mut KbService, accepted: i32) -> *mut c_char {
    ffi_guard!(ptr::null_mut();
        mut: service = service,
    );
    let text = service.inner.shrink_text(accepted.max(0) as usize);
    match CString::new(text) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// --- Configuration entry points ---

#[no_mangle]
pub extern "C" fn kb_set_context(service: *mut KbService, context: *const c_char) {
    ffi_guard!(();
        mut: service = service,
        str: context_str = context,
    );
    service.inner.set_context(context_str);
}

#[no_mangle]
pub extern "C" fn kb_set_profile(service: *mut KbService, profile: *const c_char) {
    ffi_guard!(();
        mut: service = service,
        str: profile_str = profile,
    );
    service.inner.set_profile(profile_str);
}

#[no_mangle]
pub extern "C" fn kb_set_enabled(service: *mut KbService, enabled: u8) {
    ffi_guard!(();
        mut: service = service,
    );
    service.inner.set_enabled(enabled != 0);
}

/// Select the personalization backend by name ("cpu", "cuda", "vulkan").
/// Unknown names leave the configuration unchanged.
#[no_mangle]
pub extern "C" fn kb_set_backend(service: *mut KbService, backend: *const c_char) {
    ffi_guard!(();
        mut: service = service,
        str: backend_str = backend,
    );
    service.inner.set_backend(backend_str);
}

/// 1 when the settings document could not be read at startup and defaults
/// were substituted.
#[no_mangle]
pub extern "C" fn kb_using_default_config(service: *const KbService) -> u8 {
    ffi_guard!(0;
        ref: service = service,
    );
    service.inner.using_defaults() as u8
}

// --- Conversion ---

/// Run one conversion over the current buffer and return the marshaled
/// candidates, engine-ranked order preserved. Blocks until the engine
/// returns. Free the result with `kb_candidates_free`.
#[no_mangle]
pub extern "C" fn kb_get_candidates(service: *mut KbService) -> KbCandidateList {
    ffi_guard!(KbCandidateList::empty();
        mut: service = service,
    );
    pack_candidates(service.inner.get_candidates())
}

#[no_mangle]
pub extern "C" fn kb_candidates_free(list: KbCandidateList) {
    if !list._owned.is_null() {
        unsafe {
            drop(Box::from_raw(list._owned));
        }
    }
}
