//! Line driver: runs the tokenizer over whole lines the way an editor
//! component does.

use serde::Serialize;

use super::{WikiMode, WikiState};
use crate::stream::LineStream;

/// Consecutive zero-progress calls tolerated before the driver skips a
/// character on the tokenizer's behalf.
pub const MAX_STALLED_CALLS: usize = 10;

/// One styled span of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSpan {
    pub text: String,
    pub style: Option<String>,
}

impl TokenSpan {
    pub fn new(text: impl Into<String>, style: Option<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Merge neighbouring spans that share a style.
    pub fn coalesce(spans: Vec<Self>) -> Vec<Self> {
        let mut merged: Vec<Self> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if last.style == span.style => last.text.push_str(&span.text),
                _ => merged.push(span),
            }
        }
        merged
    }
}

/// Tokenize one line, advancing `state` to the start of the next line.
///
/// Empty lines are routed to [`WikiMode::blank_line`] and yield no spans.
pub fn highlight_line(mode: &WikiMode, line: &str, state: &mut WikiState) -> Vec<TokenSpan> {
    if line.is_empty() {
        mode.blank_line(state);
        return Vec::new();
    }

    let mut stream = LineStream::new(line);
    let mut spans = Vec::new();
    let mut stalled = 0;
    while !stream.eol() {
        let before = stream.pos();
        let style = mode.token(&mut stream, state);
        if stream.pos() > before {
            stalled = 0;
            spans.push(TokenSpan::new(&line[before..stream.pos()], style));
            continue;
        }

        stalled += 1;
        if stalled > MAX_STALLED_CALLS {
            tracing::warn!(line, pos = before, "tokenizer made no progress, skipping one character");
            stream.next_char();
            let style = mode.styles(state, None);
            spans.push(TokenSpan::new(&line[before..stream.pos()], style));
            stalled = 0;
        }
    }
    spans
}

/// Tokenize a whole text from the start state.
pub fn tokenize_text(mode: &WikiMode, text: &str) -> Vec<Vec<TokenSpan>> {
    let _scope = crate::perf::scope("mode.tokenize_text");
    let mut state = mode.start_state();
    text.lines()
        .map(|line| highlight_line(mode, line, &mut state))
        .collect()
}
