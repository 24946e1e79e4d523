//! Single-line character stream handed to the tokenizer.
//!
//! Mirrors the stream contract of browser editor components: the host
//! creates one stream per physical line and calls the tokenizer until the
//! line is exhausted. Every position is a byte offset on a char boundary.

use fancy_regex::Regex as FancyRegex;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct LineStream<'a> {
    string: &'a str,
    pos: usize,
    start: usize,
    line_start: usize,
}

impl<'a> LineStream<'a> {
    /// Create a stream positioned at the start of `line`.
    pub const fn new(line: &'a str) -> Self {
        Self {
            string: line,
            pos: 0,
            start: 0,
            line_start: 0,
        }
    }

    /// The full text of the line.
    pub const fn string(&self) -> &'a str {
        self.string
    }

    /// Current byte offset within the line.
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Byte offset where the current token started.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// True when nothing has been consumed on this line yet.
    pub const fn sol(&self) -> bool {
        self.pos == self.line_start
    }

    pub const fn eol(&self) -> bool {
        self.pos >= self.string.len()
    }

    /// Unconsumed remainder of the line.
    pub fn rest(&self) -> &'a str {
        &self.string[self.pos..]
    }

    /// Text consumed since the start of the line (used for lookbehind).
    pub fn consumed(&self) -> &'a str {
        &self.string[self.line_start..self.pos]
    }

    /// Text consumed since the current token started.
    pub fn current(&self) -> &'a str {
        &self.string[self.start..self.pos]
    }

    /// Begin a new token at the current position.
    pub const fn start_token(&mut self) {
        self.start = self.pos;
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume exactly one character.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    pub const fn skip_to_end(&mut self) {
        self.pos = self.string.len();
    }

    /// Advance by `len` bytes, clamped to the end of the line.
    pub fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.string.len());
    }

    /// Consume `literal` if the remainder starts with it.
    pub fn match_str(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume a match of `regex` anchored at the current position.
    pub fn match_regex(&mut self, regex: &Regex) -> Option<&'a str> {
        let rest = self.rest();
        let found = regex.find(rest).filter(|m| m.start() == 0)?;
        self.pos += found.end();
        Some(&rest[..found.end()])
    }

    /// Like [`match_regex`](Self::match_regex) for patterns that need
    /// lookaround. Backtracking limit failures count as no match.
    pub fn match_fancy(&mut self, regex: &FancyRegex) -> Option<&'a str> {
        let rest = self.rest();
        let found = match regex.find(rest) {
            Ok(found) => found.filter(|m| m.start() == 0)?,
            Err(err) => {
                tracing::warn!(pattern = regex.as_str(), %err, "pattern failed at runtime");
                return None;
            }
        };
        self.pos += found.end();
        Some(&rest[..found.end()])
    }

    /// Consume characters while `pred` holds. Returns true if any were eaten.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let begin = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        self.pos > begin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_char_steps_over_multibyte() {
        let mut stream = LineStream::new("é!");
        assert_eq!(stream.next_char(), Some('é'));
        assert_eq!(stream.pos(), 2);
        assert_eq!(stream.current(), "é");
        assert_eq!(stream.next_char(), Some('!'));
        assert!(stream.eol());
        assert_eq!(stream.next_char(), None);
    }

    #[test]
    fn test_match_regex_requires_anchor_at_position() {
        let re = Regex::new(r"\d+").unwrap();
        let mut stream = LineStream::new("ab12");
        assert_eq!(stream.match_regex(&re), None);
        stream.advance(2);
        assert_eq!(stream.match_regex(&re), Some("12"));
    }

    #[test]
    fn test_match_fancy_honours_lookahead() {
        let re = FancyRegex::new(r"^<code(?=\s|>|$)").unwrap();
        let mut stream = LineStream::new("<codex>");
        assert_eq!(stream.match_fancy(&re), None);
        let mut stream = LineStream::new("<code js>");
        assert_eq!(stream.match_fancy(&re), Some("<code"));
    }

    #[test]
    fn test_sol_and_consumed_track_line_start() {
        let mut stream = LineStream::new("  text");
        assert!(stream.sol());
        assert!(stream.match_str("  "));
        assert!(!stream.sol());
        assert_eq!(stream.consumed(), "  ");
        stream.start_token();
        assert!(stream.eat_while(char::is_alphabetic));
        assert_eq!(stream.current(), "text");
    }
}
