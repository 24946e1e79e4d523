//! Markup rule definitions.
//!
//! A [`Rule`] describes one wiki construct: how it is entered, what may be
//! nested inside it, how it continues and exits, and which style tag it
//! contributes while open. Rules live in a [`RuleTable`] whose order is the
//! precedence used when several entries could match at the same position.

mod graph;
mod table;

pub use graph::RuleGraph;
pub use table::RuleTable;

use fancy_regex::Regex as FancyRegex;
use regex::Regex;

use crate::stream::LineStream;

/// Capability class of a rule; parents list the classes they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Container,
    BaseOnly,
    Formatting,
    Substitution,
    Protected,
    Disabled,
}

impl RuleKind {
    pub const ALL: [Self; 6] = [
        Self::Container,
        Self::BaseOnly,
        Self::Formatting,
        Self::Substitution,
        Self::Protected,
        Self::Disabled,
    ];
}

/// Index of a rule inside its [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Stateful mini-parsers for constructs that are not flat entry/exit pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomToken {
    /// `<code lang file>` / `<file lang file>` header.
    CodeHeader,
    /// `[[target|title]]`.
    InternalLink,
    /// `{{media|caption?params}}`.
    Media,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(&'static str),
    Regex(FancyRegex),
}

impl Matcher {
    fn consume(&self, stream: &mut LineStream<'_>) -> bool {
        match self {
            Self::Literal(literal) => stream.match_str(literal),
            Self::Regex(regex) => stream.match_fancy(regex).is_some(),
        }
    }
}

/// One entry, continuation or exit pattern.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    sol: bool,
    behind: Option<Regex>,
    matcher: Option<Matcher>,
    style: Option<&'static str>,
    exit: bool,
    mode: Option<&'static str>,
}

impl Pattern {
    pub const fn literal(literal: &'static str) -> Self {
        Self {
            sol: false,
            behind: None,
            matcher: Some(Matcher::Literal(literal)),
            style: None,
            exit: false,
            mode: None,
        }
    }

    pub fn regex(regex: FancyRegex) -> Self {
        Self {
            matcher: Some(Matcher::Regex(regex)),
            ..Self::default()
        }
    }

    /// Pattern that consumes nothing; only meaningful with `at_sol`.
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn at_sol(mut self) -> Self {
        self.sol = true;
        self
    }

    #[must_use]
    pub fn behind(mut self, regex: Regex) -> Self {
        self.behind = Some(regex);
        self
    }

    #[must_use]
    pub const fn style(mut self, style: &'static str) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub const fn exit(mut self) -> Self {
        self.exit = true;
        self
    }

    /// Activate the embedded language with this registry tag on entry.
    #[must_use]
    pub const fn mode(mut self, tag: &'static str) -> Self {
        self.mode = Some(tag);
        self
    }

    pub const fn style_tag(&self) -> Option<&'static str> {
        self.style
    }

    pub const fn is_exit(&self) -> bool {
        self.exit
    }

    pub const fn mode_tag(&self) -> Option<&'static str> {
        self.mode
    }

    /// True for a start-of-line exit that consumes nothing.
    pub const fn is_line_exit(&self) -> bool {
        self.sol && self.exit && self.matcher.is_none()
    }

    /// True for a start-of-line continuation marker such as a quote's `>`.
    pub const fn is_line_marker(&self) -> bool {
        self.sol && !self.exit && self.matcher.is_some()
    }

    /// Test the pattern at the stream position, consuming on success.
    pub fn try_match(&self, stream: &mut LineStream<'_>) -> bool {
        if self.sol && !stream.sol() {
            return false;
        }
        if let Some(behind) = &self.behind {
            if !behind.is_match(stream.consumed()) {
                return false;
            }
        }
        self.matcher
            .as_ref()
            .is_none_or(|matcher| matcher.consume(stream))
    }
}

/// A named markup construct.
#[derive(Debug, Clone)]
pub struct Rule {
    name: &'static str,
    kind: Option<RuleKind>,
    allowed: Vec<RuleKind>,
    entries: Vec<Pattern>,
    patterns: Vec<Pattern>,
    style: Option<&'static str>,
    custom: Option<CustomToken>,
}

impl Rule {
    pub const fn new(name: &'static str, kind: RuleKind) -> Self {
        Self {
            name,
            kind: Some(kind),
            allowed: Vec::new(),
            entries: Vec::new(),
            patterns: Vec::new(),
            style: None,
            custom: None,
        }
    }

    /// The document root: no type of its own, never entered.
    pub fn root(name: &'static str) -> Self {
        Self {
            kind: None,
            allowed: RuleKind::ALL.to_vec(),
            ..Self::new(name, RuleKind::Container)
        }
    }

    #[must_use]
    pub fn allows(mut self, kinds: &[RuleKind]) -> Self {
        self.allowed = kinds.to_vec();
        self
    }

    #[must_use]
    pub fn entry(mut self, pattern: Pattern) -> Self {
        self.entries.push(pattern);
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub const fn style(mut self, style: &'static str) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub const fn custom(mut self, custom: CustomToken) -> Self {
        self.custom = Some(custom);
        self
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> Option<RuleKind> {
        self.kind
    }

    pub fn allowed(&self) -> &[RuleKind] {
        &self.allowed
    }

    pub fn allows_kind(&self, kind: RuleKind) -> bool {
        self.allowed.contains(&kind)
    }

    pub fn entries(&self) -> &[Pattern] {
        &self.entries
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub const fn style_tag(&self) -> Option<&'static str> {
        self.style
    }

    pub const fn custom_token(&self) -> Option<CustomToken> {
        self.custom
    }

    /// Whether an empty line ends this rule.
    pub fn exits_on_blank_line(&self) -> bool {
        self.patterns.iter().any(Pattern::is_line_exit)
    }
}

/// First pattern in `patterns` that matches at the stream position.
pub fn match_patterns<'p>(
    patterns: &'p [Pattern],
    stream: &mut LineStream<'_>,
) -> Option<&'p Pattern> {
    patterns.iter().find(|pattern| pattern.try_match(stream))
}
