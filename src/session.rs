//! Composing-session state: the phonetic buffer, the cursor inside it, and
//! the committed left-side context.
//!
//! Edits are total functions: out-of-range cursors and counts clamp instead
//! of failing, because cursor events arrive from the host faster than it can
//! validate them against our state.

/// Mutable text state for one composition. One instance per service.
#[derive(Debug, Default)]
pub struct ComposingSession {
    /// Phonetic units (kana) built from transliterated keystrokes.
    buffer: Vec<char>,
    /// Insertion point, in units. Invariant: `cursor <= buffer.len()`.
    cursor: usize,
    /// Text already committed to the left of the composition.
    context: String,
}

impl ComposingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The phonetic buffer as a string.
    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn units(&self) -> &[char] {
        &self.buffer
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Insert already-transliterated units at the cursor and advance past them.
    pub fn insert_at_cursor(&mut self, units: &str) {
        let mut inserted = 0;
        for (i, ch) in units.chars().enumerate() {
            self.buffer.insert(self.cursor + i, ch);
            inserted += 1;
        }
        self.cursor += inserted;
    }

    /// Delete one unit immediately before the cursor. No-op at position 0.
    pub fn remove_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.buffer.remove(self.cursor - 1);
        self.cursor -= 1;
    }

    /// Move the cursor by `offset` units, clamped to `[0, len]`.
    /// Returns the new cursor position.
    pub fn move_cursor(&mut self, offset: i32) -> usize {
        let target = self.cursor as i64 + offset as i64;
        self.cursor = target.clamp(0, self.buffer.len() as i64) as usize;
        self.cursor
    }

    /// Drop the first `accepted` units (the reading consumed by a committed
    /// candidate) and re-clamp the cursor against the shortened buffer.
    pub fn shrink(&mut self, accepted: usize) {
        let n = accepted.min(self.buffer.len());
        self.buffer.drain(..n);
        self.cursor = self.cursor.saturating_sub(n).min(self.buffer.len());
    }

    /// Reset the buffer and cursor. The context is left untouched.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn set_context(&mut self, text: &str) {
        self.context = text.to_owned();
    }
}
