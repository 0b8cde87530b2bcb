//! Host-callback bridge for the external conversion engine.
//!
//! The engine itself lives in the host process. The host hands us a table of
//! function pointers; results are copied out immediately and released back
//! through the host's matching release callbacks, so nothing host-allocated
//! outlives the call that produced it.

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use super::{cptr_to_str, ffi_close, owned_new};
use crate::engine::{CandidateSegment, ConversionEngine, EngineCandidate};
use crate::request::{ConversionRequest, PersonalizationMode};

/// Borrowed C view of one conversion request, valid only for the duration of
/// the `convert` callback.
#[repr(C)]
pub struct KbConvertRequest {
    pub reading: *const c_char,
    pub dictionary_dir: *const c_char,
    pub text_replacer: *const c_char,
    pub scratch_dir: *const c_char,
    pub version: *const c_char,
    /// 1 when personalization is on; the four fields below are null/zero
    /// when it is off.
    pub personalization_enabled: u8,
    pub model_weight: *const c_char,
    pub inference_limit: u32,
    pub rich_candidates: u8,
    pub profile: *const c_char,
    pub left_context: *const c_char,
}

/// One segment of a host-returned candidate.
#[repr(C)]
pub struct KbEngineSegment {
    pub reading_len: u32,
    pub surface: *const c_char,
}

/// One host-returned candidate: ordered segments plus the total reading
/// length of the whole candidate.
#[repr(C)]
pub struct KbEngineCandidate {
    pub segments: *const KbEngineSegment,
    pub segments_len: u32,
    pub corresponding_count: i32,
}

/// Engine callback table. `ctx` is passed back verbatim on every call.
/// Missing callbacks degrade to empty results; they never crash.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct KbEngineCallbacks {
    pub ctx: *mut c_void,
    /// Expand raw keystrokes to phonetic units. The returned string is
    /// released through `release_text` once copied out.
    pub transliterate: Option<extern "C" fn(*mut c_void, *const c_char) -> *mut c_char>,
    /// Generate candidates for a request. Writes the candidate count to
    /// `out_len`; the returned block is released through `release_candidates`.
    pub convert:
        Option<extern "C" fn(*mut c_void, *const KbConvertRequest, *mut u32) -> *const KbEngineCandidate>,
    pub release_text: Option<extern "C" fn(*mut c_void, *mut c_char)>,
    pub release_candidates: Option<extern "C" fn(*mut c_void, *const KbEngineCandidate, u32)>,
}

/// Opaque engine handle backed by host callbacks.
pub struct KbEngine {
    callbacks: KbEngineCallbacks,
}

// CString views of a request, kept alive while the convert callback runs.
struct RequestView {
    _strings: Vec<CString>,
    raw: KbConvertRequest,
}

fn cstring_lossy(s: &str) -> CString {
    CString::new(s).unwrap_or_else(|_| CString::new(s.replace('\0', "")).unwrap_or_default())
}

fn path_cstring(p: &std::path::Path) -> CString {
    cstring_lossy(&p.to_string_lossy())
}

impl RequestView {
    fn build(reading: &str, request: &ConversionRequest) -> Self {
        let mut strings = Vec::with_capacity(9);
        let mut keep = |cs: CString| -> *const c_char {
            let ptr = cs.as_ptr();
            strings.push(cs);
            ptr
        };

        let reading_ptr = keep(cstring_lossy(reading));
        let dict_ptr = keep(path_cstring(&request.dictionary_dir));
        let replacer_ptr = keep(path_cstring(&request.text_replacer));
        let scratch_ptr = keep(path_cstring(&request.scratch_dir));
        let version_ptr = keep(cstring_lossy(request.metadata.version_string));

        let raw = match &request.personalization {
            PersonalizationMode::On {
                weight,
                inference_limit,
                rich_candidates,
                profile,
                left_context,
            } => KbConvertRequest {
                reading: reading_ptr,
                dictionary_dir: dict_ptr,
                text_replacer: replacer_ptr,
                scratch_dir: scratch_ptr,
                version: version_ptr,
                personalization_enabled: 1,
                model_weight: keep(path_cstring(weight)),
                inference_limit: *inference_limit,
                rich_candidates: *rich_candidates as u8,
                profile: keep(cstring_lossy(profile)),
                left_context: keep(cstring_lossy(left_context)),
            },
            PersonalizationMode::Off => KbConvertRequest {
                reading: reading_ptr,
                dictionary_dir: dict_ptr,
                text_replacer: replacer_ptr,
                scratch_dir: scratch_ptr,
                version: version_ptr,
                personalization_enabled: 0,
                model_weight: ptr::null(),
                inference_limit: 0,
                rich_candidates: 0,
                profile: ptr::null(),
                left_context: ptr::null(),
            },
        };

        Self {
            _strings: strings,
            raw,
        }
    }
}

/// Copy one host candidate into owned form. Segments with null surfaces are
/// skipped rather than failing the whole candidate.
unsafe fn copy_candidate(raw: &KbEngineCandidate) -> EngineCandidate {
    let mut segments = Vec::new();
    if !raw.segments.is_null() {
        for i in 0..raw.segments_len as usize {
            let seg = &*raw.segments.add(i);
            if let Some(surface) = cptr_to_str(seg.surface) {
                segments.push(CandidateSegment {
                    reading_len: seg.reading_len as usize,
                    surface: surface.to_owned(),
                });
            }
        }
    }
    EngineCandidate {
        segments,
        corresponding_count: raw.corresponding_count.max(0) as usize,
    }
}

impl ConversionEngine for KbEngine {
    fn transliterate(&self, raw: &str) -> String {
        let Some(transliterate) = self.callbacks.transliterate else {
            return String::new();
        };
        let Ok(input) = CString::new(raw) else {
            return String::new();
        };
        let out = transliterate(self.callbacks.ctx, input.as_ptr());
        if out.is_null() {
            return String::new();
        }
        let units = unsafe { cptr_to_str(out) }.unwrap_or("").to_owned();
        if let Some(release) = self.callbacks.release_text {
            release(self.callbacks.ctx, out);
        }
        units
    }

    fn convert(&self, reading: &str, request: &ConversionRequest) -> Vec<EngineCandidate> {
        let Some(convert) = self.callbacks.convert else {
            return Vec::new();
        };
        let view = RequestView::build(reading, request);

        let mut len: u32 = 0;
        let raw = convert(self.callbacks.ctx, &view.raw, &mut len);
        if raw.is_null() || len == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(len as usize);
        for i in 0..len as usize {
            result.push(unsafe { copy_candidate(&*raw.add(i)) });
        }
        if let Some(release) = self.callbacks.release_candidates {
            release(self.callbacks.ctx, raw, len);
        }
        result
    }
}

/// Build an opaque engine handle from a host callback table. Hand the handle
/// to `kb_service_new` (which takes ownership) or release it with
/// `kb_engine_free`.
#[no_mangle]
pub extern "C" fn kb_engine_from_callbacks(callbacks: KbEngineCallbacks) -> *mut KbEngine {
    owned_new(KbEngine { callbacks })
}

ffi_close!(kb_engine_free, KbEngine);
