//! Wikimark - a DokuWiki markup highlighter for the terminal.
//!
//! # Usage
//!
//! ```bash
//! wikimark page.txt
//! wikimark --format json page.txt
//! wikimark --theme light --camelcase page.txt
//! ```

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use wikimark::config::{
    ConfigFlags, OutputFormat, ThemeMode, TokenizerConfig, clear_config_flags,
    global_config_path, load_config_flags, local_override_path, parse_flag_tokens,
    save_config_flags,
};
use wikimark::document::WikiDocument;
use wikimark::highlight::SyntectLoader;
use wikimark::highlight::palette::{BackgroundMode, Palette};
use wikimark::mode::{TokenSpan, WikiMode};
use wikimark::perf;

/// Highlight DokuWiki markup in the terminal
#[derive(Parser, Debug)]
#[command(name = "wikimark", version, about, long_about = None)]
struct Cli {
    /// Wiki page to highlight
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Force palette background (light or dark)
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// JSON file with schemes, smileys, acronyms, entities and camelcase
    #[arg(long, value_name = "PATH")]
    syntax_config: Option<PathBuf>,

    /// Highlight CamelCase words as links
    #[arg(long, conflicts_with = "no_camelcase")]
    camelcase: bool,

    /// Do not highlight CamelCase words
    #[arg(long)]
    no_camelcase: bool,

    /// Report timing of tokenizer phases
    #[arg(long)]
    perf: bool,

    /// Save current command-line flags as defaults in .wikimarkrc
    #[arg(long)]
    save: bool,

    /// Clear saved defaults in .wikimarkrc
    #[arg(long)]
    clear: bool,
}

#[derive(Serialize)]
struct LineTokens<'a> {
    line: usize,
    spans: &'a [TokenSpan],
}

fn init_logging(perf_enabled: bool) -> Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if perf_enabled {
        filter = filter.add_directive("perf=info".parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn tokenizer_config(flags: &ConfigFlags) -> Result<TokenizerConfig> {
    let mut config = match &flags.syntax_config {
        Some(path) => TokenizerConfig::load(path)?,
        None => TokenizerConfig::default(),
    };
    if let Some(camelcase) = flags.camelcase {
        config.camelcase = camelcase;
    }
    Ok(config)
}

fn write_ansi(out: &mut impl Write, lines: &[Vec<TokenSpan>], palette: Palette) -> io::Result<()> {
    for spans in lines {
        for span in spans {
            let style = palette.style_for(span.style.as_deref());
            write!(out, "{}", style.apply(span.text.as_str()))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, lines: &[Vec<TokenSpan>]) -> Result<()> {
    for (line, spans) in lines.iter().enumerate() {
        let spans = TokenSpan::coalesce(spans.clone());
        serde_json::to_writer(&mut *out, &LineTokens { line, spans: &spans })
            .context("Failed to encode tokens")?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_plain(out: &mut impl Write, lines: &[Vec<TokenSpan>]) -> io::Result<()> {
    for spans in lines {
        for span in spans {
            writeln!(out, "{}\t{}", span.text, span.style.as_deref().unwrap_or("-"))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    init_logging(effective.perf)?;
    perf::set_enabled(effective.perf);

    // Verify file exists
    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;

    let config = tokenizer_config(&effective)?;
    let loader = {
        let _scope = perf::scope("main.load_syntaxes");
        Arc::new(SyntectLoader::preloaded())
    };
    let mode = WikiMode::new(&config, loader).context("Failed to build tokenizer")?;

    let mut document = WikiDocument::from_text(&text);
    let mut lines = document.highlight_all(&mode);
    lines.truncate(text.lines().count());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match effective.format.unwrap_or(OutputFormat::Ansi) {
        OutputFormat::Ansi => {
            let background = BackgroundMode::resolve(effective.theme.unwrap_or(ThemeMode::Auto));
            write_ansi(&mut out, &lines, Palette::new(background))?;
        }
        OutputFormat::Json => write_json(&mut out, &lines)?,
        OutputFormat::Plain => write_plain(&mut out, &lines)?,
    }
    out.flush().context("Failed to write output")
}
