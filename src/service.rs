//! The service ties one composing session, one configuration snapshot, and
//! the external engine together behind the entry points the boundary layer
//! exposes.
//!
//! Everything here is synchronous and single-caller: the host serializes
//! calls, so there is no locking below the FFI handle. `get_candidates`
//! blocks for the duration of the engine's conversion.

use std::path::{Path, PathBuf};

use tracing::{debug, debug_span};

use crate::config::{self, ConfigSnapshot};
use crate::engine::ConversionEngine;
use crate::reconstruct;
use crate::request;
use crate::session::ComposingSession;

/// Settings document name under the base resource path.
const SETTINGS_FILE: &str = "settings.json";

/// Throwaway input for the warm-up conversion issued at construction.
const WARMUP_INPUT: &str = "a";

/// One marshaled conversion result, ready for the boundary layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Display string reconstructed against the typed prefix.
    pub text: String,
    /// Phonetic units left to compose if this candidate is accepted.
    pub subtext: String,
    /// The phonetic buffer at request time, echoed for host bookkeeping.
    pub source_reading: String,
    /// Total reading length of the candidate, from the engine.
    pub corresponding_count: usize,
}

pub struct Service {
    engine: Box<dyn ConversionEngine>,
    session: ComposingSession,
    config: ConfigSnapshot,
    base_path: PathBuf,
    using_defaults: bool,
}

impl Service {
    /// Load configuration, seed the session context, and run one warm-up
    /// conversion so the engine faults in its dictionary and model before
    /// the first real keystroke.
    pub fn new(engine: Box<dyn ConversionEngine>, base_path: &Path) -> Self {
        let loaded = config::load_or_default(&base_path.join(SETTINGS_FILE));
        let mut session = ComposingSession::new();
        session.set_context(&loaded.context);

        let mut service = Self {
            engine,
            session,
            config: loaded.snapshot,
            base_path: base_path.to_owned(),
            using_defaults: loaded.using_defaults,
        };
        service.warm_up();
        service
    }

    /// Issue one discarded conversion. Must leave no externally visible
    /// state behind: buffer empty, cursor at 0, context untouched.
    fn warm_up(&mut self) {
        let _span = debug_span!("warm_up").entered();
        let units = self.engine.transliterate(WARMUP_INPUT);
        self.session.insert_at_cursor(&units);
        let req = request::build(&self.config, &self.base_path, self.session.context());
        let discarded = self.engine.convert(&self.session.text(), &req);
        debug!(candidates = discarded.len(), "warm-up conversion done");
        self.session.clear();
    }

    // --- Composing-session entry points ---

    /// Transliterate `input` and insert the resulting units at the cursor.
    /// Returns the new buffer content and cursor position.
    pub fn append_text(&mut self, input: &str) -> (String, usize) {
        let _span = debug_span!("append_text", input).entered();
        let units = self.engine.transliterate(input);
        self.session.insert_at_cursor(&units);
        (self.session.text(), self.session.cursor())
    }

    /// Delete one unit before the cursor.
    pub fn remove_text(&mut self) -> (String, usize) {
        self.session.remove_before_cursor();
        (self.session.text(), self.session.cursor())
    }

    /// Move the cursor by `offset`, clamped. Returns the new position.
    pub fn move_cursor(&mut self, offset: i32) -> usize {
        self.session.move_cursor(offset)
    }

    pub fn clear_text(&mut self) {
        self.session.clear();
    }

    /// Drop the reading consumed by a committed candidate. Returns the
    /// remaining buffer content.
    pub fn shrink_text(&mut self, accepted: usize) -> String {
        self.session.shrink(accepted);
        self.session.text()
    }

    // --- Configuration entry points ---

    pub fn set_context(&mut self, text: &str) {
        self.session.set_context(text);
    }

    pub fn set_profile(&mut self, profile: &str) {
        self.config.profile = profile.to_owned();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    /// Update the backend from its string form. Unknown names are ignored;
    /// there is no error channel at the boundary.
    pub fn set_backend(&mut self, backend: &str) {
        match backend.parse() {
            Ok(b) => self.config.backend = b,
            Err(()) => debug!(backend, "ignoring unknown backend"),
        }
    }

    /// True when the settings document could not be read at construction
    /// and defaults were substituted.
    pub fn using_defaults(&self) -> bool {
        self.using_defaults
    }

    pub fn session(&self) -> &ComposingSession {
        &self.session
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.config
    }

    // --- Conversion ---

    /// Build a fresh request, run the engine, and reconstruct every returned
    /// candidate against the currently typed prefix. Order is preserved; an
    /// engine that returns nothing yields an empty (never absent) list.
    pub fn get_candidates(&mut self) -> Vec<Candidate> {
        let _span = debug_span!("get_candidates", reading = %self.session.text()).entered();
        let reading = self.session.text();
        let typed = self.session.units().to_vec();
        let req = request::build(&self.config, &self.base_path, self.session.context());

        self.engine
            .convert(&reading, &req)
            .into_iter()
            .map(|candidate| Candidate {
                text: reconstruct::reconstruct(&candidate, &typed),
                subtext: reconstruct::remaining_after(&typed, candidate.corresponding_count),
                source_reading: reading.clone(),
                corresponding_count: candidate.corresponding_count,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use crate::engine::testutil::{cand, seg, ScriptedEngine};
    use crate::request::PersonalizationMode;

    fn service_with(engine: ScriptedEngine) -> Service {
        let dir = tempfile::tempdir().unwrap();
        Service::new(Box::new(engine), dir.path())
    }

    #[test]
    fn warm_up_leaves_no_visible_state() {
        let engine = ScriptedEngine::empty();
        let requests = engine.requests.clone();
        let svc = service_with(engine);

        // Exactly one discarded request was issued during construction.
        assert_eq!(requests.borrow().len(), 1);
        assert!(svc.session().is_empty());
        assert_eq!(svc.session().cursor(), 0);
    }

    #[test]
    fn warm_up_then_convert_on_empty_buffer() {
        let mut svc = service_with(ScriptedEngine::empty());
        let candidates = svc.get_candidates();
        assert!(candidates.is_empty());
        assert!(svc.session().is_empty());
    }

    #[test]
    fn append_remove_move_roundtrip() {
        let mut svc = service_with(ScriptedEngine::empty());
        let (text, cursor) = svc.append_text("かんじ");
        assert_eq!((text.as_str(), cursor), ("かんじ", 3));

        assert_eq!(svc.move_cursor(-100), 0);
        let (text, cursor) = svc.remove_text();
        assert_eq!((text.as_str(), cursor), ("かんじ", 0)); // no-op at 0

        svc.move_cursor(100);
        let (text, cursor) = svc.remove_text();
        assert_eq!((text.as_str(), cursor), ("かん", 2));
    }

    #[test]
    fn shrink_after_commit() {
        let mut svc = service_with(ScriptedEngine::empty());
        svc.append_text("かんじ");
        assert_eq!(svc.shrink_text(2), "じ");
        assert_eq!(svc.session().cursor(), 1);
    }

    #[test]
    fn candidates_are_reconstructed_and_ordered() {
        let engine = ScriptedEngine::returning(vec![
            cand(vec![seg(2, "漢"), seg(1, "字")]),
            cand(vec![seg(4, "漢字変換")]), // predictive, longer than typed
        ]);
        let mut svc = service_with(engine);
        svc.append_text("かんじ");

        let candidates = svc.get_candidates();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].text, "漢字");
        assert_eq!(candidates[0].subtext, "");
        assert_eq!(candidates[0].source_reading, "かんじ");
        assert_eq!(candidates[0].corresponding_count, 3);

        // Predictive candidate: literal fallback, subtext empty (count >= typed).
        assert_eq!(candidates[1].text, "かんじ");
        assert_eq!(candidates[1].subtext, "");
        assert_eq!(candidates[1].corresponding_count, 4);
    }

    #[test]
    fn partial_candidate_has_subtext_preview() {
        let engine = ScriptedEngine::returning(vec![cand(vec![seg(2, "感")])]);
        let mut svc = service_with(engine);
        svc.append_text("かんじ");

        let candidates = svc.get_candidates();
        assert_eq!(candidates[0].text, "感");
        assert_eq!(candidates[0].subtext, "じ");
        // Previewing must not touch the real session.
        assert_eq!(svc.session().text(), "かんじ");
    }

    #[test]
    fn request_reflects_configuration_per_call() {
        let engine = ScriptedEngine::empty();
        let requests = engine.requests.clone();
        let mut svc = service_with(engine);

        svc.append_text("か");
        svc.get_candidates();
        assert_eq!(
            requests.borrow().last().unwrap().personalization,
            PersonalizationMode::Off
        );

        svc.set_enabled(true);
        svc.set_profile("poet");
        svc.set_context("山は");
        svc.get_candidates();
        match &requests.borrow().last().unwrap().personalization {
            PersonalizationMode::On {
                profile,
                left_context,
                inference_limit,
                rich_candidates,
                ..
            } => {
                assert_eq!(profile, "poet");
                assert_eq!(left_context, "山は");
                assert_eq!(*inference_limit, 1);
                assert!(rich_candidates);
            }
            PersonalizationMode::Off => panic!("expected personalization on"),
        }

        // Toggling off drops the payload again, stale fields and all.
        svc.set_enabled(false);
        svc.get_candidates();
        assert_eq!(
            requests.borrow().last().unwrap().personalization,
            PersonalizationMode::Off
        );
    }

    #[test]
    fn unknown_backend_is_ignored() {
        let mut svc = service_with(ScriptedEngine::empty());
        svc.set_backend("cuda");
        assert_eq!(svc.config().backend, Backend::Cuda);
        svc.set_backend("quantum");
        assert_eq!(svc.config().backend, Backend::Cuda);
    }

    #[test]
    fn stored_context_seeds_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{ "personalization": { "enabled": false }, "context": "駅で" }"#,
        )
        .unwrap();
        let svc = Service::new(Box::new(ScriptedEngine::empty()), dir.path());
        assert_eq!(svc.session().context(), "駅で");
        assert!(!svc.using_defaults());
    }

    #[test]
    fn missing_settings_reports_defaults() {
        let svc = service_with(ScriptedEngine::empty());
        assert!(svc.using_defaults());
    }
}
