//! The wiki tokenizer.
//!
//! [`WikiMode`] is an incremental, stack-based state machine over the rule
//! table. The host feeds it one [`LineStream`] per line and calls
//! [`WikiMode::token`] until the line is consumed; each call returns the
//! space-joined style tags of the span it consumed. All position-dependent
//! data lives in [`WikiState`], which is cheap to clone, so hosts can cache
//! a state at every line boundary and resume from there after edits.

mod custom;
mod inner;
mod run;

use std::iter;
use std::sync::Arc;

pub use inner::{
    CommentSyntax, InnerMode, InnerModeState, InnerState, ModeLoader, ModeSlot, NullLoader,
    Passthrough, StaticLoader,
};
pub use run::{MAX_STALLED_CALLS, TokenSpan, highlight_line, tokenize_text};

use crate::config::TokenizerConfig;
use crate::error::Result;
use crate::languages::LanguageRegistry;
use crate::rules::{RuleId, RuleTable, match_patterns};
use crate::stream::LineStream;

/// A configured wiki tokenizer. Cloning shares the immutable tables.
#[derive(Debug, Clone)]
pub struct WikiMode {
    table: Arc<RuleTable>,
    languages: Arc<LanguageRegistry>,
    loader: Arc<dyn ModeLoader>,
}

#[derive(Debug, Clone)]
struct ActiveInner {
    slot: ModeSlot,
    state: InnerState,
}

/// Fields of the `<code>`/`<file>` header parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeHeader {
    lang: Option<String>,
    filename: bool,
    done: bool,
}

impl CodeHeader {
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub const fn has_filename(&self) -> bool {
        self.filename
    }

    /// True once the closing `>` of the header was seen.
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

/// Tokenizer state at one document position.
#[derive(Debug, Clone)]
pub struct WikiState {
    current: RuleId,
    stack: Vec<RuleId>,
    exit: bool,
    inner: Option<ActiveInner>,
    comments: CommentSyntax,
    code: CodeHeader,
    link_title: bool,
    link_param: bool,
}

impl WikiState {
    pub const fn current(&self) -> RuleId {
        self.current
    }

    /// Open ancestor rules, outermost first.
    pub fn stack(&self) -> &[RuleId] {
        &self.stack
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// True when the previous call matched an exit pattern.
    pub const fn exit_pending(&self) -> bool {
        self.exit
    }

    pub const fn has_inner(&self) -> bool {
        self.inner.is_some()
    }

    /// Comment syntax of the active embedded language.
    pub const fn comments(&self) -> &CommentSyntax {
        &self.comments
    }

    pub const fn code_header(&self) -> &CodeHeader {
        &self.code
    }

    pub const fn link_title(&self) -> bool {
        self.link_title
    }

    pub const fn link_param(&self) -> bool {
        self.link_param
    }

    /// True when two states would tokenize identically from here on,
    /// ignoring embedded-tokenizer internals.
    pub fn same_position(&self, other: &Self) -> bool {
        self.current == other.current
            && self.stack == other.stack
            && self.exit == other.exit
            && self.code == other.code
            && self.link_title == other.link_title
            && self.link_param == other.link_param
            && self.inner.as_ref().map(|inner| inner.slot.name())
                == other.inner.as_ref().map(|inner| inner.slot.name())
    }
}

impl WikiMode {
    /// Build a tokenizer over the built-in language registry.
    ///
    /// # Errors
    /// Returns an error if a rule assembled from `config` fails to compile.
    pub fn new(config: &TokenizerConfig, loader: Arc<dyn ModeLoader>) -> Result<Self> {
        Ok(Self {
            table: Arc::new(RuleTable::build(config)?),
            languages: Arc::new(LanguageRegistry::builtin()),
            loader,
        })
    }

    #[must_use]
    pub fn with_languages(mut self, languages: LanguageRegistry) -> Self {
        self.languages = Arc::new(languages);
        self
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    pub fn loader(&self) -> &dyn ModeLoader {
        self.loader.as_ref()
    }

    pub fn start_state(&self) -> WikiState {
        WikiState {
            current: self.table.base(),
            stack: Vec::new(),
            exit: false,
            inner: None,
            comments: CommentSyntax::default(),
            code: CodeHeader::default(),
            link_title: false,
            link_param: false,
        }
    }

    /// Consume one span from `stream` and return its style.
    ///
    /// Always advances the stream unless an exit was just flagged, the
    /// line is exhausted, or an embedded tokenizer declined to advance.
    pub fn token(&self, stream: &mut LineStream<'_>, state: &mut WikiState) -> Option<String> {
        stream.start_token();
        if state.exit {
            self.pop(state);
        }

        let mut style = self.match_rules(stream, state);

        if stream.current().is_empty() && !state.exit {
            match state.inner.as_mut() {
                Some(inner) => style = inner.slot.token(stream, inner.state.as_dyn_mut()),
                None => {
                    stream.next_char();
                }
            }
        }
        style
    }

    /// Called instead of [`token`](Self::token) for empty lines.
    pub fn blank_line(&self, state: &mut WikiState) {
        if state.exit {
            self.pop(state);
        }
        if self.table.rule(state.current).exits_on_blank_line() {
            state.exit = true;
            return;
        }
        if let Some(inner) = state.inner.as_mut() {
            inner.slot.blank_line(inner.state.as_dyn_mut());
        }
    }

    /// Indentation suggested by the embedded tokenizer, if any.
    pub fn indent(&self, state: &WikiState, text_after: &str) -> Option<usize> {
        state
            .inner
            .as_ref()
            .and_then(|inner| inner.slot.indent(inner.state.as_dyn(), text_after))
    }

    /// The embedded tokenizer controlling the current position, if any.
    pub fn inner_mode<'s>(&self, state: &'s WikiState) -> Option<&'s ModeSlot> {
        state.inner.as_ref().map(|inner| &inner.slot)
    }

    /// Space-joined styles of every open rule, outermost first, followed by
    /// `extra`.
    pub fn styles(&self, state: &WikiState, extra: Option<&str>) -> Option<String> {
        let parts: Vec<&str> = state
            .stack
            .iter()
            .chain(iter::once(&state.current))
            .filter_map(|id| self.table.rule(*id).style_tag())
            .chain(extra)
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn match_rules(&self, stream: &mut LineStream<'_>, state: &mut WikiState) -> Option<String> {
        if let Some(custom) = self.table.rule(state.current).custom_token() {
            let style = custom::run(self, custom, stream, state);
            if !stream.current().is_empty() {
                return style;
            }
        }

        // A rule's own start-of-line marker outranks its children, so `>>`
        // on a quote line stays a quote marker rather than an entity.
        let mut matched = None;
        if stream.sol() {
            matched = self
                .table
                .rule(state.current)
                .patterns()
                .iter()
                .filter(|pattern| pattern.is_line_marker())
                .find(|pattern| pattern.try_match(stream));
        }
        if matched.is_none() {
            for &child in self.table.children(state.current) {
                if let Some(pattern) = match_patterns(self.table.rule(child).entries(), stream) {
                    self.push(state, child);
                    if let Some(tag) = pattern.mode_tag() {
                        self.enter_inner(state, tag);
                    }
                    matched = Some(pattern);
                    break;
                }
            }
        }
        let matched =
            matched.or_else(|| match_patterns(self.table.rule(state.current).patterns(), stream));

        let extra = matched.and_then(|pattern| {
            if pattern.is_exit() {
                state.exit = true;
            }
            pattern.style_tag()
        });
        self.styles(state, extra)
    }

    fn push(&self, state: &mut WikiState, rule: RuleId) {
        tracing::trace!(
            from = self.table.rule(state.current).name(),
            to = self.table.rule(rule).name(),
            depth = state.stack.len() + 1,
            "push"
        );
        state.stack.push(state.current);
        state.current = rule;
    }

    fn pop(&self, state: &mut WikiState) {
        let parent = state.stack.pop().unwrap_or_else(|| self.table.base());
        tracing::trace!(
            from = self.table.rule(state.current).name(),
            to = self.table.rule(parent).name(),
            "pop"
        );
        state.current = parent;
        state.exit = false;
        state.inner = None;
        state.comments = CommentSyntax::default();
        state.code = CodeHeader::default();
        state.link_title = false;
        state.link_param = false;
    }

    /// Activate the embedded tokenizer registered under `tag`.
    fn enter_inner(&self, state: &mut WikiState, tag: &str) {
        let Some(spec) = self.languages.get(tag) else {
            tracing::debug!(language = tag, "no embedded tokenizer registered");
            return;
        };
        let slot = self.loader.load(spec);
        tracing::debug!(
            language = tag,
            tokenizer = slot.name(),
            loaded = slot.is_loaded(),
            "embedded tokenizer activated"
        );
        state.comments = slot.comment_syntax();
        let inner_state = slot.start_state();
        state.inner = Some(ActiveInner {
            slot,
            state: inner_state,
        });
    }
}
