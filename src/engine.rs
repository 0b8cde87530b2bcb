//! Seam to the external conversion engine.
//!
//! The engine owns the dictionary, the language model, and the
//! keystroke-to-kana transliteration tables; this crate only drives it and
//! reshapes what comes back. Production hosts plug an implementation in over
//! the FFI callback bridge (`ffi::engine`); tests use a scripted stub.

use crate::request::ConversionRequest;

/// One reading/word pair inside an engine candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSegment {
    /// Phonetic units consumed by this segment's reading.
    pub reading_len: usize,
    /// Surface string emitted for the segment.
    pub surface: String,
}

/// A ranked conversion result as returned by the engine.
///
/// `corresponding_count` is the total reading length of the whole candidate,
/// which may exceed what the user has typed so far (predictive candidates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCandidate {
    pub segments: Vec<CandidateSegment>,
    pub corresponding_count: usize,
}

/// External conversion engine: transliteration plus candidate generation.
///
/// Both calls are synchronous and may block (model inference when
/// personalization is on). A request passed to `convert` may be discarded by
/// the caller; implementations must not depend on its results being used.
pub trait ConversionEngine {
    /// Expand raw keystrokes into phonetic units (e.g. romaji to kana).
    fn transliterate(&self, raw: &str) -> String;

    /// Generate ranked candidates for `reading` under `request`.
    /// An empty vec is a valid answer and is how failures surface.
    fn convert(&self, reading: &str, request: &ConversionRequest) -> Vec<EngineCandidate>;
}
