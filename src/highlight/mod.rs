//! Syntax highlighting for embedded code blocks.
//!
//! Uses syntect with the bundled Sublime Text syntax definitions. The
//! definitions take a while to deserialize, so [`SyntectLoader`] loads them
//! on a background thread and answers with passthrough slots until they are
//! ready, then raises its reflow signal.

pub mod palette;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};

use crate::languages::LanguageSpec;
use crate::mode::{
    CommentSyntax, InnerMode, InnerModeState, InnerState, ModeLoader, ModeSlot, Passthrough,
};
use crate::stream::LineStream;

/// Scope prefixes mapped to style tags. Scopes are matched innermost first
/// and prefixes only match on whole dot-separated segments.
const SCOPE_CLASSES: &[(&str, &str)] = &[
    ("comment", "comment"),
    ("string", "string"),
    ("constant.numeric", "number"),
    ("constant", "atom"),
    ("entity.name.tag", "tag"),
    ("punctuation.definition.tag", "tag"),
    ("entity.name", "def"),
    ("entity.other.attribute-name", "variable"),
    ("keyword", "keyword"),
    ("storage", "keyword"),
    ("variable.language", "builtin"),
    ("variable", "variable"),
    ("support", "builtin"),
    ("invalid", "error"),
];

fn has_segment_prefix(scope: &str, prefix: &str) -> bool {
    scope
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// Style tag for a single scope name.
pub fn classify_scope(scope: &str) -> Option<&'static str> {
    SCOPE_CLASSES
        .iter()
        .find(|(prefix, _)| has_segment_prefix(scope, prefix))
        .map(|(_, tag)| *tag)
}

fn classify(scopes: &ScopeStack) -> Option<&'static str> {
    scopes
        .as_slice()
        .iter()
        .rev()
        .find_map(|scope| classify_scope(&scope.build_string()))
}

fn comment_syntax_for(name: &str) -> CommentSyntax {
    match name {
        "clike" | "javascript" | "go" | "rust" | "swift" | "kotlin" | "dart" | "groovy" | "php"
        | "haxe" | "d" => CommentSyntax::line("//").block("/*", "*/").electric("{}"),
        "css" => CommentSyntax::default().block("/*", "*/").electric("}"),
        "python" | "shell" | "ruby" | "perl" | "r" | "yaml" | "toml" | "properties" | "cmake"
        | "dockerfile" | "nginx" | "julia" | "coffeescript" | "tcl" | "puppet" => {
            CommentSyntax::line("#")
        }
        "sql" | "lua" | "haskell" | "elm" => CommentSyntax::line("--"),
        "commonlisp" | "clojure" | "scheme" => CommentSyntax::line(";"),
        "erlang" | "stex" | "octave" => CommentSyntax::line("%"),
        "htmlmixed" | "htmlembedded" | "xml" => CommentSyntax::default().block("<!--", "-->"),
        _ => CommentSyntax::default(),
    }
}

fn load_syntaxes() -> SyntaxSet {
    let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
    SyntaxSet::load_defaults_newlines()
}

fn find_syntax<'s>(syntaxes: &'s SyntaxSet, spec: &LanguageSpec) -> Option<&'s SyntaxReference> {
    syntaxes
        .find_syntax_by_token(spec.tag)
        .or_else(|| syntaxes.find_syntax_by_token(spec.name))
        .or_else(|| syntaxes.find_syntax_by_name(spec.name))
}

#[derive(Debug, Default)]
struct Shared {
    syntaxes: OnceLock<Arc<SyntaxSet>>,
    loading: AtomicBool,
    reflow: AtomicBool,
}

/// Loader backed by syntect's default syntax set.
#[derive(Debug, Default)]
pub struct SyntectLoader {
    shared: Arc<Shared>,
    modes: Mutex<HashMap<&'static str, Arc<dyn InnerMode>>>,
}

impl SyntectLoader {
    /// Loader that loads syntax definitions lazily in the background.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader with syntax definitions loaded up front, for batch use.
    pub fn preloaded() -> Self {
        let loader = Self::new();
        let _ = loader.shared.syntaxes.set(Arc::new(load_syntaxes()));
        loader
    }

    pub fn is_ready(&self) -> bool {
        self.shared.syntaxes.get().is_some()
    }

    /// Poll until a background load finishes or `timeout` passes.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_ready() || self.shared.loading.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
        true
    }

    fn start_background_load(&self) {
        if self.shared.loading.swap(true, Ordering::AcqRel) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("wikimark-syntaxes".to_string())
            .spawn(move || {
                let syntaxes = load_syntaxes();
                if shared.syntaxes.set(Arc::new(syntaxes)).is_ok() {
                    shared.reflow.store(true, Ordering::Release);
                }
                shared.loading.store(false, Ordering::Release);
                tracing::debug!("syntax definitions loaded");
            });
        if let Err(err) = spawned {
            tracing::warn!(%err, "failed to spawn syntax loader thread");
            self.shared.loading.store(false, Ordering::Release);
        }
    }
}

impl ModeLoader for SyntectLoader {
    fn load(&self, spec: &LanguageSpec) -> ModeSlot {
        if spec.is_null() {
            return ModeSlot::Loaded(Arc::new(Passthrough));
        }
        let Some(syntaxes) = self.shared.syntaxes.get() else {
            self.start_background_load();
            return ModeSlot::Unloaded(spec.name.to_string());
        };

        if let Ok(modes) = self.modes.lock() {
            if let Some(mode) = modes.get(spec.tag) {
                return ModeSlot::Loaded(Arc::clone(mode));
            }
        }

        let mode: Arc<dyn InnerMode> = match find_syntax(syntaxes, spec) {
            Some(syntax) => Arc::new(SyntectMode::new(spec.name, Arc::clone(syntaxes), syntax.clone())),
            None => {
                tracing::debug!(language = spec.tag, "no syntax definition, using passthrough");
                Arc::new(Passthrough)
            }
        };
        if let Ok(mut modes) = self.modes.lock() {
            modes.insert(spec.tag, Arc::clone(&mode));
        }
        ModeSlot::Loaded(mode)
    }

    fn take_reflow(&self) -> bool {
        self.shared.reflow.swap(false, Ordering::AcqRel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    end: usize,
    style: Option<&'static str>,
}

/// Per-position state of a [`SyntectMode`].
#[derive(Debug, Clone)]
pub struct SyntectState {
    parse: ParseState,
    scopes: ScopeStack,
    pending: VecDeque<Span>,
    line: String,
}

impl SyntectState {
    fn covers(&self, stream: &LineStream<'_>) -> bool {
        self.line == stream.string()
            && self
                .pending
                .front()
                .is_some_and(|span| span.end > stream.pos())
    }
}

/// An embedded tokenizer driven by a syntect grammar.
///
/// Each line is parsed once; the resulting spans are handed out one call at
/// a time. Spans never run across a `<`, so a closing tag of the enclosing
/// wiki block always starts a fresh token.
pub struct SyntectMode {
    name: String,
    syntaxes: Arc<SyntaxSet>,
    syntax: SyntaxReference,
    comments: CommentSyntax,
}

impl fmt::Debug for SyntectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntectMode")
            .field("name", &self.name)
            .field("syntax", &self.syntax.name)
            .finish_non_exhaustive()
    }
}

impl SyntectMode {
    pub fn new(name: &str, syntaxes: Arc<SyntaxSet>, syntax: SyntaxReference) -> Self {
        Self {
            comments: comment_syntax_for(name),
            name: name.to_string(),
            syntaxes,
            syntax,
        }
    }

    pub fn syntax_name(&self) -> &str {
        &self.syntax.name
    }

    fn parse_rest(&self, stream: &LineStream<'_>, state: &mut SyntectState) {
        let rest = stream.rest();
        let text = format!("{rest}\n");
        let ops = match state.parse.parse_line(&text, &self.syntaxes) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::warn!(syntax = %self.syntax.name, ?err, "syntax parse failed");
                Vec::new()
            }
        };

        let base = stream.pos();
        let mut last = 0;
        state.pending.clear();
        for (offset, op) in ops {
            let offset = offset.min(rest.len());
            if offset > last {
                push_span(&mut state.pending, base + offset, classify(&state.scopes));
                last = offset;
            }
            if let Err(err) = state.scopes.apply(&op) {
                tracing::trace!(?err, "scope stack mismatch");
            }
        }
        if last < rest.len() {
            push_span(&mut state.pending, base + rest.len(), classify(&state.scopes));
        }
        state.line = stream.string().to_string();
    }
}

fn push_span(spans: &mut VecDeque<Span>, end: usize, style: Option<&'static str>) {
    match spans.back_mut() {
        Some(last) if last.style == style => last.end = end,
        _ => spans.push_back(Span { end, style }),
    }
}

impl InnerMode for SyntectMode {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_state(&self) -> InnerState {
        InnerState::new(SyntectState {
            parse: ParseState::new(&self.syntax),
            scopes: ScopeStack::new(),
            pending: VecDeque::new(),
            line: String::new(),
        })
    }

    fn token(&self, stream: &mut LineStream<'_>, state: &mut dyn InnerModeState) -> Option<String> {
        let Some(state) = state.as_any_mut().downcast_mut::<SyntectState>() else {
            stream.next_char();
            return None;
        };
        if !state.covers(stream) {
            self.parse_rest(stream, state);
        }

        let pos = stream.pos();
        while state.pending.front().is_some_and(|span| span.end <= pos) {
            state.pending.pop_front();
        }
        let Some(span) = state.pending.front().copied() else {
            stream.next_char();
            return None;
        };

        let rest = &stream.rest()[..span.end - pos];
        let first = rest.chars().next().map_or(0, char::len_utf8);
        let len = rest[first..].find('<').map_or(rest.len(), |i| first + i);
        stream.advance(len);
        if stream.pos() >= span.end {
            state.pending.pop_front();
        }
        span.style.map(str::to_string)
    }

    fn blank_line(&self, state: &mut dyn InnerModeState) {
        let Some(state) = state.as_any_mut().downcast_mut::<SyntectState>() else {
            return;
        };
        state.pending.clear();
        state.line.clear();
        match state.parse.parse_line("\n", &self.syntaxes) {
            Ok(ops) => {
                for (_, op) in ops {
                    if let Err(err) = state.scopes.apply(&op) {
                        tracing::trace!(?err, "scope stack mismatch");
                    }
                }
            }
            Err(err) => tracing::warn!(syntax = %self.syntax.name, ?err, "syntax parse failed"),
        }
    }

    fn comment_syntax(&self) -> CommentSyntax {
        self.comments.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::config::TokenizerConfig;
    use crate::languages::LanguageRegistry;
    use crate::mode::{TokenSpan, WikiMode, highlight_line};

    static LOADER: LazyLock<Arc<SyntectLoader>> =
        LazyLock::new(|| Arc::new(SyntectLoader::preloaded()));

    fn rust_mode() -> Arc<dyn InnerMode> {
        let registry = LanguageRegistry::builtin();
        match LOADER.load(registry.get("rust").unwrap()) {
            ModeSlot::Loaded(mode) => mode,
            ModeSlot::Unloaded(name) => panic!("{name} not loaded"),
        }
    }

    fn run_inner(mode: &dyn InnerMode, state: &mut InnerState, line: &str) -> Vec<(String, Option<String>)> {
        let mut stream = LineStream::new(line);
        let mut out = Vec::new();
        while !stream.eol() {
            stream.start_token();
            let style = mode.token(&mut stream, state.as_dyn_mut());
            out.push((stream.current().to_string(), style));
        }
        out
    }

    #[test]
    fn test_classify_scope_matches_whole_segments() {
        assert_eq!(classify_scope("comment.line.double-slash.rust"), Some("comment"));
        assert_eq!(classify_scope("constant.numeric.integer.decimal"), Some("number"));
        assert_eq!(classify_scope("constant.language.boolean"), Some("atom"));
        assert_eq!(classify_scope("storage.type.rust"), Some("keyword"));
        assert_eq!(classify_scope("entity.name.tag.html"), Some("tag"));
        assert_eq!(classify_scope("entity.name.function"), Some("def"));
        assert_eq!(classify_scope("stringy"), None);
        assert_eq!(classify_scope("source.rust"), None);
    }

    #[test]
    fn test_highlight_rust_produces_styled_spans() {
        let mode = rust_mode();
        let mut state = mode.start_state();
        let spans = run_inner(mode.as_ref(), &mut state, "let x = 42; // note");

        let text: String = spans.iter().map(|(text, _)| text.as_str()).collect();
        assert_eq!(text, "let x = 42; // note");
        let style_of = |needle: &str| {
            spans
                .iter()
                .find(|(text, _)| text.contains(needle))
                .and_then(|(_, style)| style.clone())
        };
        assert_eq!(style_of("let").as_deref(), Some("keyword"));
        assert_eq!(style_of("42").as_deref(), Some("number"));
        assert_eq!(style_of("note").as_deref(), Some("comment"));
    }

    #[test]
    fn test_block_comment_state_carries_across_lines() {
        let mode = rust_mode();
        let mut state = mode.start_state();
        run_inner(mode.as_ref(), &mut state, "/* open");
        let spans = run_inner(mode.as_ref(), &mut state, "still */ fn");
        assert_eq!(spans[0].1.as_deref(), Some("comment"));
    }

    #[test]
    fn test_spans_stop_before_angle_bracket() {
        let mode = rust_mode();
        let mut state = mode.start_state();
        let spans = run_inner(mode.as_ref(), &mut state, "// a</code>");
        assert!(spans.iter().any(|(text, _)| text.starts_with("</code>") || text == "<"));
        assert!(spans.iter().all(|(text, _)| !text[1..].contains('<')));
    }

    #[test]
    fn test_wiki_code_block_exits_through_embedded_string() {
        let wiki = WikiMode::new(&TokenizerConfig::default(), LOADER.clone()).unwrap();
        let mut state = wiki.start_state();
        highlight_line(&wiki, "<code rust>", &mut state);
        assert_eq!(wiki.inner_mode(&state).map(ModeSlot::name), Some("rust"));
        assert_eq!(state.comments().line_comment.as_deref(), Some("//"));

        let spans = highlight_line(&wiki, "let s = \"a</code>", &mut state);
        assert_eq!(spans.last(), Some(&TokenSpan::new("</code>", Some("tag".to_string()))));
        assert!(state.exit_pending());
    }

    #[test]
    fn test_unknown_syntax_falls_back_to_passthrough() {
        let slot = LOADER.load(&LanguageSpec::new("nosuch", "nosuch"));
        assert!(slot.is_loaded());
        assert_eq!(slot.name(), LanguageSpec::NULL);
    }

    #[test]
    fn test_background_load_raises_reflow_once() {
        let loader = SyntectLoader::new();
        let rust = LanguageSpec::new("rust", "rust");
        assert!(!loader.load(&rust).is_loaded());
        assert!(loader.wait_ready(Duration::from_secs(120)));
        assert!(loader.take_reflow());
        assert!(!loader.take_reflow());
        assert!(loader.load(&rust).is_loaded());
    }

    #[test]
    fn test_preloaded_loader_never_requests_reflow() {
        assert!(LOADER.is_ready());
        assert!(!LOADER.take_reflow());
    }
}
