use std::sync::{Arc, LazyLock};

use wikimark::config::TokenizerConfig;
use wikimark::document::WikiDocument;
use wikimark::highlight::SyntectLoader;
use wikimark::mode::{ModeSlot, NullLoader, TokenSpan, WikiMode, highlight_line, tokenize_text};

static LOADER: LazyLock<Arc<SyntectLoader>> =
    LazyLock::new(|| Arc::new(SyntectLoader::preloaded()));

const PAGE: &str = "\
====== Release notes ======

Some **bold** and //italic// text with a [[wiki:page|link]].

  * first item
  * second item

<code rust>
fn main() {
    let answer = 42;
}
</code>

^ Name ^ Value ^
| a    | 1     |
";

fn syntect_mode() -> WikiMode {
    WikiMode::new(&TokenizerConfig::default(), LOADER.clone()).unwrap()
}

fn merged_line(spans: &[TokenSpan]) -> Vec<(String, Option<String>)> {
    TokenSpan::coalesce(spans.to_vec())
        .into_iter()
        .map(|span| (span.text, span.style))
        .collect()
}

fn style_of(spans: &[TokenSpan], needle: &str) -> Option<String> {
    TokenSpan::coalesce(spans.to_vec())
        .into_iter()
        .find(|span| span.text.contains(needle))
        .and_then(|span| span.style)
}

#[test]
fn test_page_spans_reassemble_every_line() {
    let mode = syntect_mode();
    let lines = tokenize_text(&mode, PAGE);
    assert_eq!(lines.len(), PAGE.lines().count());
    for (spans, line) in lines.iter().zip(PAGE.lines()) {
        let text: String = spans.iter().map(|span| span.text.as_str()).collect();
        assert_eq!(text, line);
    }
}

#[test]
fn test_page_highlights_wiki_and_embedded_code() {
    let mode = syntect_mode();
    let lines = tokenize_text(&mode, PAGE);

    assert_eq!(
        merged_line(&lines[0]),
        vec![("====== Release notes ======".to_string(), Some("header".to_string()))]
    );
    assert_eq!(style_of(&lines[2], "bold").as_deref(), Some("strong"));
    assert_eq!(style_of(&lines[2], "italic").as_deref(), Some("em"));
    assert_eq!(style_of(&lines[2], "[[").as_deref(), Some("link"));

    assert_eq!(style_of(&lines[9], "let").as_deref(), Some("keyword"));
    assert_eq!(style_of(&lines[9], "42").as_deref(), Some("number"));
    assert_eq!(style_of(&lines[11], "</code>").as_deref(), Some("tag"));

    assert_eq!(style_of(&lines[13], "^").as_deref(), Some("def"));
}

#[test]
fn test_code_block_reports_embedded_tokenizer() {
    let mode = syntect_mode();
    let mut state = mode.start_state();
    for line in PAGE.lines().take(9) {
        highlight_line(&mode, line, &mut state);
    }
    assert_eq!(mode.inner_mode(&state).map(ModeSlot::name), Some("rust"));
    assert_eq!(state.comments().line_comment.as_deref(), Some("//"));
    assert_eq!(mode.indent(&state, "}"), None);
}

#[test]
fn test_document_matches_batch_tokenize() {
    let mode = syntect_mode();
    let mut document = WikiDocument::from_text(PAGE);
    let from_doc = document.highlight_all(&mode);
    let from_text = tokenize_text(&mode, PAGE);
    assert_eq!(&from_doc[..from_text.len()], &from_text[..]);
}

#[test]
fn test_document_edit_opens_code_block_for_later_lines() {
    let mode = syntect_mode();
    let mut document = WikiDocument::from_text("intro\nlet x = 1;\n");
    document.highlight_all(&mode);
    let before = document.highlight_line(&mode, 1).unwrap();
    assert!(before.iter().all(|span| span.style.is_none()));

    document.replace_line(0, "<code rust>");
    let after = document.highlight_line(&mode, 1).unwrap();
    assert_eq!(style_of(&after, "let").as_deref(), Some("keyword"));
}

#[test]
fn test_custom_config_disables_default_smileys() {
    let config = TokenizerConfig::from_json(r#"{"smileys": [], "camelcase": true}"#).unwrap();
    let mode = WikiMode::new(&config, Arc::new(NullLoader)).unwrap();
    let mut state = mode.start_state();
    let spans = highlight_line(&mode, "LOL WikiPage", &mut state);
    assert_eq!(style_of(&spans, "LOL").as_deref(), None);
    assert_eq!(style_of(&spans, "WikiPage").as_deref(), Some("link"));
}
