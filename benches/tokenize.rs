//! Benchmarks for wiki tokenizing.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wikimark::config::TokenizerConfig;
use wikimark::document::WikiDocument;
use wikimark::mode::{NullLoader, WikiMode, tokenize_text};

const PAGE: &str = "\
====== Heading ======
Some **bold**, //italic// and __underlined__ text with a [[wiki:page|link]] :-)
  * item with ''monospace'' and http://example.com/path
  * {{media.png?200x100|caption}}
^ Head ^ Head ^
| cell | ::: |
> quoted **text**
<code>
plain code
</code>
";

fn create_mode() -> WikiMode {
    WikiMode::new(&TokenizerConfig::default(), Arc::new(NullLoader)).unwrap()
}

fn bench_build_mode(c: &mut Criterion) {
    let config = TokenizerConfig::default();
    c.bench_function("build_mode", |b| {
        b.iter(|| WikiMode::new(black_box(&config), Arc::new(NullLoader)).unwrap())
    });
}

fn bench_tokenize_page(c: &mut Criterion) {
    let mode = create_mode();
    let text = PAGE.repeat(20);
    c.bench_function("tokenize_page", |b| {
        b.iter(|| tokenize_text(&mode, black_box(&text)))
    });
}

fn bench_edit_and_resume(c: &mut Criterion) {
    let mode = create_mode();
    let text = PAGE.repeat(20);
    let mut doc = WikiDocument::from_text(&text);
    doc.highlight_all(&mode);
    let last = doc.line_count() - 1;

    c.bench_function("edit_and_resume", |b| {
        b.iter(|| {
            doc.replace_line(black_box(100), "  * edited **line**");
            doc.highlight_line(&mode, last)
        })
    });
}

criterion_group!(benches, bench_build_mode, bench_tokenize_page, bench_edit_and_resume);
criterion_main!(benches);
