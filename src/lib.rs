// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. rules::RuleKind)
    clippy::module_name_repetitions
)]

//! # Wikimark
//!
//! An incremental syntax tokenizer for DokuWiki markup.
//!
//! Wikimark tokenizes wiki text one line at a time with:
//! - A declarative rule table with nesting permissions
//! - Resumable, cloneable tokenizer state
//! - Embedded language tokenizers for code, file, html and php blocks
//! - Background loading of syntect grammars
//!
//! ## Architecture
//!
//! Wikimark follows the CodeMirror mode contract:
//! - **Rules**: Patterns, styles and which rule kinds may nest inside
//! - **State**: The open rule stack, cloned at line boundaries
//! - **Token**: Consume one token from a line stream and name its style
//! - **Host**: Drive lines, cache states, render spans
//!
//! ## Modules
//!
//! - [`rules`]: Rule table and nesting graph
//! - [`mode`]: The tokenizer engine and line driver
//! - [`stream`]: Line cursor the tokenizer reads from
//! - [`languages`]: Code block language registry
//! - [`highlight`]: Syntect-backed embedded tokenizers and terminal palette
//! - [`document`]: Rope buffer with incremental highlighting
//! - [`config`]: Tokenizer and command line configuration

pub mod config;
pub mod document;
pub mod error;
pub mod highlight;
pub mod languages;
pub mod mode;
pub mod perf;
pub mod rules;
pub mod stream;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TokenizerConfig;
    pub use crate::document::WikiDocument;
    pub use crate::error::{Result, WikiError};
    pub use crate::highlight::SyntectLoader;
    pub use crate::mode::{TokenSpan, WikiMode, WikiState, highlight_line, tokenize_text};
    pub use crate::stream::LineStream;
}
