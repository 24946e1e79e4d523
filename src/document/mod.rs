//! Wiki document buffer with incremental highlighting.
//!
//! The text lives in a rope. Highlighting keeps a checkpoint per line: the
//! tokenizer state at the start of that line. Checkpoints form a valid
//! prefix; an edit to line `n` only invalidates checkpoints after `n`, so
//! re-highlighting resumes from the nearest state still known to be good.

use ropey::Rope;

use crate::mode::{TokenSpan, WikiMode, WikiState, highlight_line};

pub struct WikiDocument {
    rope: Rope,
    /// `checkpoints[i]` is the state at the start of line `i`.
    checkpoints: Vec<WikiState>,
}

impl WikiDocument {
    /// Create a document from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            checkpoints: Vec::new(),
        }
    }

    /// Total number of lines in the document.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// The full text content of the document.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of line-start states currently cached.
    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Replace the content of a line, keeping its line ending.
    pub fn replace_line(&mut self, line_idx: usize, text: &str) -> bool {
        let Some(old) = self.line_at(line_idx) else {
            return false;
        };
        let start = self.rope.line_to_char(line_idx);
        let end = start + old.chars().count();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.invalidate_from(line_idx);
        true
    }

    /// Insert a new line before `line_idx`; `line_count()` appends.
    pub fn insert_line(&mut self, line_idx: usize, text: &str) -> bool {
        let count = self.line_count();
        if line_idx > count {
            return false;
        }
        if line_idx == count {
            let end = self.rope.len_chars();
            self.rope.insert(end, &format!("\n{text}"));
        } else {
            let start = self.rope.line_to_char(line_idx);
            self.rope.insert(start, &format!("{text}\n"));
        }
        self.invalidate_from(line_idx);
        true
    }

    /// Remove a line together with its line break.
    pub fn remove_line(&mut self, line_idx: usize) -> bool {
        let count = self.line_count();
        if line_idx >= count {
            return false;
        }
        let start = self.rope.line_to_char(line_idx);
        if line_idx + 1 < count {
            let next = self.rope.line_to_char(line_idx + 1);
            self.rope.remove(start..next);
        } else if line_idx > 0 {
            // Last line: drop the break that precedes it.
            let end = self.rope.len_chars();
            self.rope.remove(start - 1..end);
        } else {
            let end = self.rope.len_chars();
            self.rope.remove(0..end);
        }
        self.invalidate_from(line_idx);
        true
    }

    /// Drop every checkpoint, e.g. after a foreign tokenizer finished
    /// loading and earlier lines would now highlight differently.
    pub fn reflow(&mut self) {
        self.checkpoints.clear();
    }

    /// Reflow if the mode's loader raised its signal since the last poll.
    pub fn poll_reflow(&mut self, mode: &WikiMode) -> bool {
        let reflow = mode.loader().take_reflow();
        if reflow {
            tracing::debug!(lines = self.line_count(), "reflowing document");
            self.reflow();
        }
        reflow
    }

    /// Tokenize one line, resuming from the nearest valid checkpoint.
    pub fn highlight_line(&mut self, mode: &WikiMode, line_idx: usize) -> Option<Vec<TokenSpan>> {
        let line = self.line_at(line_idx)?;
        self.fill_checkpoints(mode, line_idx);
        let mut state = self.checkpoints[line_idx].clone();
        let spans = highlight_line(mode, &line, &mut state);
        if self.checkpoints.len() == line_idx + 1 {
            self.checkpoints.push(state);
        }
        Some(spans)
    }

    /// Tokenize every line of the document.
    pub fn highlight_all(&mut self, mode: &WikiMode) -> Vec<Vec<TokenSpan>> {
        let _scope = crate::perf::scope("document.highlight_all");
        (0..self.line_count())
            .filter_map(|idx| self.highlight_line(mode, idx))
            .collect()
    }

    fn invalidate_from(&mut self, line_idx: usize) {
        self.checkpoints.truncate(line_idx + 1);
    }

    fn fill_checkpoints(&mut self, mode: &WikiMode, line_idx: usize) {
        if self.checkpoints.is_empty() {
            self.checkpoints.push(mode.start_state());
        }
        while self.checkpoints.len() <= line_idx {
            let prev = self.checkpoints.len() - 1;
            let mut state = self.checkpoints[prev].clone();
            let line = self.line_at(prev).unwrap_or_default();
            highlight_line(mode, &line, &mut state);
            self.checkpoints.push(state);
        }
    }
}

impl std::fmt::Debug for WikiDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiDocument")
            .field("lines", &self.line_count())
            .field("checkpoints", &self.checkpoints.len())
            .finish()
    }
}
