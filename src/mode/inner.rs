//! Embedded (foreign) tokenizers.
//!
//! Protected blocks such as `<code rust>` or `<html>` hand their body to a
//! tokenizer for another language. Tokenizers are obtained from a
//! [`ModeLoader`]; a loader that cannot supply one yet answers with
//! [`ModeSlot::Unloaded`], which behaves as a passthrough, and raises its
//! reflow signal once the real tokenizer becomes available.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::languages::LanguageSpec;
use crate::stream::LineStream;

/// Comment syntax of an embedded language, mirrored onto the wiki state so
/// hosts can toggle comments inside code blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line_comment: Option<String>,
    pub block_comment_start: Option<String>,
    pub block_comment_end: Option<String>,
    /// Characters that should trigger re-indentation when typed.
    pub electric_chars: Option<String>,
}

impl CommentSyntax {
    pub fn line(marker: &str) -> Self {
        Self {
            line_comment: Some(marker.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn block(mut self, start: &str, end: &str) -> Self {
        self.block_comment_start = Some(start.to_string());
        self.block_comment_end = Some(end.to_string());
        self
    }

    #[must_use]
    pub fn electric(mut self, chars: &str) -> Self {
        self.electric_chars = Some(chars.to_string());
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.line_comment.is_none()
            && self.block_comment_start.is_none()
            && self.block_comment_end.is_none()
            && self.electric_chars.is_none()
    }
}

/// Per-position state of an embedded tokenizer.
///
/// Implemented for every `Clone + Debug + Send` type, so tokenizers can use
/// plain structs and downcast through [`as_any_mut`](Self::as_any_mut).
pub trait InnerModeState: Any + fmt::Debug + Send {
    fn clone_box(&self) -> Box<dyn InnerModeState>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> InnerModeState for T
where
    T: Any + Clone + fmt::Debug + Send,
{
    fn clone_box(&self) -> Box<dyn InnerModeState> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owned, cloneable embedded-tokenizer state.
#[derive(Debug)]
pub struct InnerState(Box<dyn InnerModeState>);

impl InnerState {
    pub fn new<T: InnerModeState>(state: T) -> Self {
        Self(Box::new(state))
    }

    pub fn as_dyn(&self) -> &dyn InnerModeState {
        self.0.as_ref()
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn InnerModeState {
        self.0.as_mut()
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut()
    }
}

impl Clone for InnerState {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

/// A tokenizer for a language embedded in wiki text.
pub trait InnerMode: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn start_state(&self) -> InnerState {
        InnerState::new(())
    }

    /// Consume at least one character and return its style.
    fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn InnerModeState) -> Option<String>;

    fn blank_line(&self, _state: &mut dyn InnerModeState) {}

    fn indent(&self, _state: &dyn InnerModeState, _text_after: &str) -> Option<usize> {
        None
    }

    fn comment_syntax(&self) -> CommentSyntax {
        CommentSyntax::default()
    }
}

/// Consumes one character per call and styles nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl InnerMode for Passthrough {
    fn name(&self) -> &str {
        LanguageSpec::NULL
    }

    fn token(&self, stream: &mut LineStream<'_>, _state: &mut dyn InnerModeState) -> Option<String> {
        stream.next_char();
        None
    }
}

/// An embedded-language slot: either still loading or ready.
#[derive(Debug, Clone)]
pub enum ModeSlot {
    /// Not available (yet); tokenizes as [`Passthrough`].
    Unloaded(String),
    Loaded(Arc<dyn InnerMode>),
}

impl ModeSlot {
    pub fn name(&self) -> &str {
        match self {
            Self::Unloaded(name) => name,
            Self::Loaded(mode) => mode.name(),
        }
    }

    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn start_state(&self) -> InnerState {
        match self {
            Self::Unloaded(_) => InnerState::new(()),
            Self::Loaded(mode) => mode.start_state(),
        }
    }

    pub fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn InnerModeState) -> Option<String> {
        match self {
            Self::Unloaded(_) => Passthrough.token(stream, state),
            Self::Loaded(mode) => mode.token(stream, state),
        }
    }

    pub fn blank_line(&self, state: &mut dyn InnerModeState) {
        if let Self::Loaded(mode) = self {
            mode.blank_line(state);
        }
    }

    pub fn indent(&self, state: &dyn InnerModeState, text_after: &str) -> Option<usize> {
        match self {
            Self::Unloaded(_) => None,
            Self::Loaded(mode) => mode.indent(state, text_after),
        }
    }

    pub fn comment_syntax(&self) -> CommentSyntax {
        match self {
            Self::Unloaded(_) => CommentSyntax::default(),
            Self::Loaded(mode) => mode.comment_syntax(),
        }
    }
}

/// Supplies embedded tokenizers by language descriptor.
pub trait ModeLoader: fmt::Debug + Send + Sync {
    /// Return the tokenizer for `spec`, or [`ModeSlot::Unloaded`] while it
    /// is unavailable. Must not block on background work.
    fn load(&self, spec: &LanguageSpec) -> ModeSlot;

    /// True once after a background load finished; the host should then
    /// discard cached states and re-highlight.
    fn take_reflow(&self) -> bool {
        false
    }
}

/// Loader that never supplies a tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl ModeLoader for NullLoader {
    fn load(&self, spec: &LanguageSpec) -> ModeSlot {
        ModeSlot::Unloaded(spec.name.to_string())
    }
}

/// Loader over a fixed set of registered tokenizers.
///
/// Lookups try the descriptor's mime variant first, then its tokenizer name.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    modes: HashMap<String, Arc<dyn InnerMode>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mode` under a tokenizer name or mime type.
    #[must_use]
    pub fn with_mode(mut self, key: impl Into<String>, mode: Arc<dyn InnerMode>) -> Self {
        self.register(key, mode);
        self
    }

    pub fn register(&mut self, key: impl Into<String>, mode: Arc<dyn InnerMode>) {
        self.modes.insert(key.into(), mode);
    }
}

impl ModeLoader for StaticLoader {
    fn load(&self, spec: &LanguageSpec) -> ModeSlot {
        if spec.is_null() {
            return ModeSlot::Loaded(Arc::new(Passthrough));
        }
        spec.mime
            .and_then(|mime| self.modes.get(mime))
            .or_else(|| self.modes.get(spec.name))
            .map_or_else(
                || ModeSlot::Unloaded(spec.name.to_string()),
                |mode| ModeSlot::Loaded(Arc::clone(mode)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter(usize);

    #[derive(Debug)]
    struct Counting;

    impl InnerMode for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn start_state(&self) -> InnerState {
            InnerState::new(Counter(0))
        }

        fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn InnerModeState) -> Option<String> {
            let counter = state.as_any_mut().downcast_mut::<Counter>()?;
            counter.0 += 1;
            stream.next_char();
            Some(format!("n{}", counter.0))
        }
    }

    #[test]
    fn test_boxed_state_clone_is_independent() {
        let mode = Counting;
        let mut original = mode.start_state();
        let mut stream = LineStream::new("ab");
        mode.token(&mut stream, original.as_dyn_mut());

        let mut copy = original.clone();
        mode.token(&mut stream, copy.as_dyn_mut());

        let original = original.get::<Counter>().unwrap();
        let copy = copy.get::<Counter>().unwrap();
        assert_eq!(original, &Counter(1));
        assert_eq!(copy, &Counter(2));
    }

    #[test]
    fn test_unloaded_slot_passes_through_one_char() {
        let slot = ModeSlot::Unloaded("javascript".to_string());
        let mut state = slot.start_state();
        let mut stream = LineStream::new("x=1");
        assert_eq!(slot.token(&mut stream, state.as_dyn_mut()), None);
        assert_eq!(stream.pos(), 1);
        assert!(!slot.is_loaded());
        assert!(slot.comment_syntax().is_empty());
    }

    #[test]
    fn test_static_loader_prefers_mime_variant() {
        let loader = StaticLoader::new()
            .with_mode("javascript", Arc::new(Passthrough))
            .with_mode("application/json", Arc::new(Counting));
        let json = LanguageSpec::new("json", "javascript").mime("application/json");
        let js = LanguageSpec::new("javascript", "javascript");

        assert_eq!(loader.load(&json).name(), "counting");
        assert_eq!(loader.load(&js).name(), LanguageSpec::NULL);
        assert!(!loader.load(&LanguageSpec::new("go", "go")).is_loaded());
        assert!(!loader.take_reflow());
    }

    #[test]
    fn test_null_language_always_loads_passthrough() {
        let slot = StaticLoader::new().load(&LanguageSpec::new("text", LanguageSpec::NULL));
        assert!(slot.is_loaded());
    }

    #[test]
    fn test_comment_syntax_builders() {
        let syntax = CommentSyntax::line("//").block("/*", "*/").electric("{}");
        assert_eq!(syntax.line_comment.as_deref(), Some("//"));
        assert_eq!(syntax.block_comment_end.as_deref(), Some("*/"));
        assert!(!syntax.is_empty());
    }
}
