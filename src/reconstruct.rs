//! Candidate reconstruction against the typed phonetic prefix.
//!
//! The engine may return candidates whose total reading runs past what the
//! user has typed (predictive completion). The display string must never
//! show surface text for units the user has not entered, so reconstruction
//! consumes the typed buffer segment by segment and falls back to the raw
//! remaining units once a segment's reading no longer fits.

use crate::engine::EngineCandidate;

/// Build the display string for `candidate` given the units typed at request
/// time. Segments are consumed in order; the first segment whose reading is
/// longer than what remains ends the walk, with the leftover units appended
/// literally.
pub fn reconstruct(candidate: &EngineCandidate, typed: &[char]) -> String {
    let mut remaining = typed;
    let mut result = String::new();

    for segment in &candidate.segments {
        if remaining.len() < segment.reading_len {
            result.extend(remaining.iter());
            break;
        }
        remaining = &remaining[segment.reading_len..];
        result.push_str(&segment.surface);
    }

    result
}

/// The phonetic units still unconsumed if a candidate covering
/// `corresponding_count` units were accepted: a shrink preview that leaves
/// the real session untouched.
pub fn remaining_after(typed: &[char], corresponding_count: usize) -> String {
    typed
        .iter()
        .skip(corresponding_count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{cand, seg};

    fn units(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn full_match_consumes_buffer_exactly() {
        let candidate = cand(vec![seg(2, "漢"), seg(1, "字")]);
        assert_eq!(reconstruct(&candidate, &units("かんじ")), "漢字");
    }

    #[test]
    fn exact_length_appends_no_fallback_tail() {
        let candidate = cand(vec![seg(3, "漢字")]);
        let out = reconstruct(&candidate, &units("かんじ"));
        assert_eq!(out, "漢字");
        assert!(!out.contains('か'));
    }

    #[test]
    fn predictive_candidate_falls_back_to_typed_units() {
        // Reading is 4 units but only 3 were typed: show the raw buffer.
        let candidate = cand(vec![seg(4, "漢字変換")]);
        assert_eq!(reconstruct(&candidate, &units("かんじ")), "かんじ");
    }

    #[test]
    fn partial_then_overlong_segment() {
        let candidate = cand(vec![seg(2, "漢"), seg(3, "字引き")]);
        // First segment fits, second overruns: surface + literal tail.
        assert_eq!(reconstruct(&candidate, &units("かんじ")), "漢じ");
    }

    #[test]
    fn shorter_reading_leaves_tail_unrendered() {
        // Candidate covers 2 of 3 typed units; the tail stays un-displayed
        // here (the subtext preview carries it instead).
        let candidate = cand(vec![seg(2, "感")]);
        assert_eq!(reconstruct(&candidate, &units("かんじ")), "感");
    }

    #[test]
    fn empty_buffer_yields_empty_string() {
        let candidate = cand(vec![seg(1, "あ")]);
        assert_eq!(reconstruct(&candidate, &[]), "");
    }

    #[test]
    fn no_segments_yields_empty_string() {
        let candidate = cand(vec![]);
        assert_eq!(reconstruct(&candidate, &units("かんじ")), "");
    }

    #[test]
    fn remaining_after_previews_shrink() {
        assert_eq!(remaining_after(&units("かんじ"), 2), "じ");
        assert_eq!(remaining_after(&units("かんじ"), 3), "");
        assert_eq!(remaining_after(&units("かんじ"), 10), "");
        assert_eq!(remaining_after(&[], 1), "");
    }
}
