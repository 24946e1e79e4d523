//! Mini-parsers for constructs with internal structure.

use std::sync::LazyLock;

use regex::Regex;

use super::{WikiMode, WikiState};
use crate::rules::CustomToken;
use crate::stream::LineStream;

static MEDIA_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *\}\}").expect("media close pattern"));
static MEDIA_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|").expect("media title pattern"));
static MEDIA_LINK_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:nolink|direct|linkonly)").expect("media link pattern"));
static MEDIA_CACHE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:nocache|recache)").expect("media cache pattern"));
static MEDIA_SIZE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[xX]\d+)?").expect("media size pattern"));

/// Run the mini-parser of the current rule. The caller ignores the result
/// unless the stream advanced.
pub(super) fn run(
    mode: &WikiMode,
    custom: CustomToken,
    stream: &mut LineStream<'_>,
    state: &mut WikiState,
) -> Option<String> {
    match custom {
        CustomToken::CodeHeader => code_header(mode, stream, state),
        CustomToken::InternalLink => internal_link(mode, stream, state),
        CustomToken::Media => media(mode, stream, state),
    }
}

/// `<code [lang [filename]]>`; the body belongs to the embedded tokenizer.
fn code_header(mode: &WikiMode, stream: &mut LineStream<'_>, state: &mut WikiState) -> Option<String> {
    if state.inner.is_some() || state.code.done {
        return None;
    }

    if stream.match_str(">") {
        state.code.done = true;
        if let Some(lang) = state.code.lang.take() {
            if mode.languages.contains(&lang) {
                mode.enter_inner(state, &lang);
            }
        }
        state.code.filename = false;
        return mode.styles(state, Some("tag"));
    }

    if stream.eat_while(char::is_whitespace) {
        return mode.styles(state, None);
    }

    if !stream.eat_while(|ch| !ch.is_whitespace() && ch != '>') {
        return None;
    }
    let style = if state.code.lang.is_none() {
        let lang = stream.current();
        state.code.lang = Some(lang.to_string());
        if mode.languages.contains(lang) {
            "keyword"
        } else {
            "error"
        }
    } else if !state.code.filename {
        state.code.filename = true;
        "string"
    } else {
        "error"
    };
    mode.styles(state, Some(style))
}

/// `[[target|title]]`.
fn internal_link(mode: &WikiMode, stream: &mut LineStream<'_>, state: &mut WikiState) -> Option<String> {
    if stream.match_str("]]") {
        state.link_title = false;
        state.exit = true;
        return mode.styles(state, Some("link"));
    }
    if !state.link_title && stream.match_str("|") {
        state.link_title = true;
        return mode.styles(state, None);
    }
    stream.next_char()?;
    let style = if state.link_title { "string" } else { "link" };
    mode.styles(state, Some(style))
}

/// `{{target|caption?params}}`.
fn media(mode: &WikiMode, stream: &mut LineStream<'_>, state: &mut WikiState) -> Option<String> {
    if stream.match_regex(&MEDIA_CLOSE).is_some() {
        state.link_param = false;
        state.link_title = false;
        state.exit = true;
        return mode.styles(state, Some("link"));
    }

    let style = if state.link_title {
        stream.next_char()?;
        Some("string")
    } else if stream.match_regex(&MEDIA_TITLE).is_some() {
        state.link_title = true;
        None
    } else if state.link_param {
        media_param(stream)
    } else if stream.peek() == Some('?') && !stream.rest()[1..].contains('?') {
        stream.advance(1);
        state.link_param = true;
        None
    } else {
        stream.next_char()?;
        Some("link")
    };
    mode.styles(state, style)
}

fn media_param(stream: &mut LineStream<'_>) -> Option<&'static str> {
    if stream.match_regex(&MEDIA_LINK_PARAM).is_some() {
        Some("keyword")
    } else if stream.match_regex(&MEDIA_CACHE_PARAM).is_some() {
        Some("meta")
    } else if stream.match_regex(&MEDIA_SIZE_PARAM).is_some() {
        Some("number")
    } else if stream.eat_while(char::is_whitespace) {
        None
    } else {
        stream.next_char().map(|_| "error")
    }
}
