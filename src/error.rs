//! Error types for tokenizer construction and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("invalid pattern in rule `{rule}`: {source}")]
    Pattern {
        rule: &'static str,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("invalid lookbehind in rule `{rule}`: {source}")]
    Lookbehind {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("invalid tokenizer configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WikiError>;
