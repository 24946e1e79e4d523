use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::WikiError;

/// Construction-time tokenizer configuration.
///
/// Field names match the configuration object the wiki injects into edit
/// pages, so that object can be deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// URI schemes recognized as external links, in order.
    pub schemes: Vec<String>,
    pub smileys: Vec<String>,
    pub acronyms: Vec<String>,
    /// Typographic entity sources such as `->` or `(c)`.
    pub entities: Vec<String>,
    /// Highlight `CamelCase` words as links.
    pub camelcase: bool,
}

const DEFAULT_SCHEMES: &[&str] = &[
    "http", "https", "telnet", "gopher", "wais", "ftp", "ed2k", "irc", "ldap",
];

const DEFAULT_SMILEYS: &[&str] = &[
    "8-)", "8-O", "8-o", ":-(", ":-)", "=)", ":-/", ":-\\", ":-?", ":-D", ":-P", ":-O", ":-X",
    ":-|", ";-)", "^_^", "m(", ":?:", ":!:", "LOL", "FIXME", "DELETEME",
];

const DEFAULT_ACRONYMS: &[&str] = &[
    "AFAICT", "AFAIK", "API", "ASAP", "CSS", "FAQ", "HTML", "HTTP", "PHP", "URL", "WYSIWYG",
    "XML",
];

const DEFAULT_ENTITIES: &[&str] = &[
    "<->", "->", "<-", "<=>", "=>", "<=", ">>", "<<", "---", "--", "(c)", "(tm)", "(r)", "...",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            schemes: owned(DEFAULT_SCHEMES),
            smileys: owned(DEFAULT_SMILEYS),
            acronyms: owned(DEFAULT_ACRONYMS),
            entities: owned(DEFAULT_ENTITIES),
            camelcase: false,
        }
    }
}

impl TokenizerConfig {
    /// Configuration with no word lists, no schemes and no camel case.
    pub const fn minimal() -> Self {
        Self {
            schemes: Vec::new(),
            smileys: Vec::new(),
            acronyms: Vec::new(),
            entities: Vec::new(),
            camelcase: false,
        }
    }

    /// Decode a JSON configuration object; missing fields keep defaults.
    ///
    /// # Errors
    /// Returns an error if `json` is not a valid configuration object.
    pub fn from_json(json: &str) -> Result<Self, WikiError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read syntax config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse syntax config {}", path.display()))
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Ansi,
    Json,
    Plain,
}

/// CLI defaults persisted in rc files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub perf: bool,
    pub camelcase: Option<bool>,
    pub theme: Option<ThemeMode>,
    pub format: Option<OutputFormat>,
    pub syntax_config: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            perf: self.perf || other.perf,
            camelcase: other.camelcase.or(self.camelcase),
            theme: other.theme.or(self.theme),
            format: other.format.or(self.format),
            syntax_config: other
                .syntax_config
                .clone()
                .or_else(|| self.syntax_config.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("wikimark").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("wikimark")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("wikimark").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("wikimark")
                .join("config");
        }
    }

    PathBuf::from(".wikimarkrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".wikimarkrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# wikimark defaults (saved with --save)".to_string()];
    if flags.perf {
        lines.push("--perf".to_string());
    }
    match flags.camelcase {
        Some(true) => lines.push("--camelcase".to_string()),
        Some(false) => lines.push("--no-camelcase".to_string()),
        None => {}
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme_name(theme)));
    }
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format_name(format)));
    }
    if let Some(path) = &flags.syntax_config {
        lines.push(format!("--syntax-config {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        match token {
            "--perf" => flags.perf = true,
            "--camelcase" => flags.camelcase = Some(true),
            "--no-camelcase" => flags.camelcase = Some(false),
            "--theme" | "--format" | "--syntax-config" => {
                if let Some(next) = tokens.get(i + 1) {
                    apply_valued(&mut flags, token, next);
                    i += 1;
                }
            }
            _ => {
                if let Some((name, value)) = token.split_once('=') {
                    apply_valued(&mut flags, name, value);
                }
            }
        }
        i += 1;
    }
    flags
}

fn apply_valued(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--theme" => flags.theme = parse_theme(value),
        "--format" => flags.format = parse_format(value),
        "--syntax-config" => flags.syntax_config = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

const fn theme_name(theme: ThemeMode) -> &'static str {
    match theme {
        ThemeMode::Auto => "auto",
        ThemeMode::Light => "light",
        ThemeMode::Dark => "dark",
    }
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s {
        "ansi" => Some(OutputFormat::Ansi),
        "json" => Some(OutputFormat::Json),
        "plain" => Some(OutputFormat::Plain),
        _ => None,
    }
}

const fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Ansi => "ansi",
        OutputFormat::Json => "json",
        OutputFormat::Plain => "plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = vec![
            "wikimark".to_string(),
            "--perf".to_string(),
            "--no-camelcase".to_string(),
            "--theme".to_string(),
            "dark".to_string(),
            "--format=json".to_string(),
            "--syntax-config=wiki.json".to_string(),
            "page.txt".to_string(),
        ];
        let flags = parse_flag_tokens(&args);
        assert!(flags.perf);
        assert_eq!(flags.camelcase, Some(false));
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.format, Some(OutputFormat::Json));
        assert_eq!(flags.syntax_config, Some(PathBuf::from("wiki.json")));
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            theme: Some(ThemeMode::Light),
            camelcase: Some(true),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert_eq!(merged.camelcase, Some(true));
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".wikimarkrc");
        let flags = ConfigFlags {
            perf: true,
            camelcase: Some(true),
            theme: Some(ThemeMode::Light),
            format: Some(OutputFormat::Plain),
            syntax_config: Some(PathBuf::from("syntax.json")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_tokenizer_config_defaults_fill_missing_fields() {
        let config = TokenizerConfig::from_json(r#"{"camelcase": true, "smileys": []}"#).unwrap();
        assert!(config.camelcase);
        assert!(config.smileys.is_empty());
        assert_eq!(config.schemes, TokenizerConfig::default().schemes);
    }

    #[test]
    fn test_tokenizer_config_rejects_wrong_types() {
        let err = TokenizerConfig::from_json(r#"{"schemes": "http"}"#).unwrap_err();
        assert!(matches!(err, WikiError::Config(_)));
    }

    #[test]
    fn test_tokenizer_config_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("syntax.json");
        std::fs::write(&path, r#"{"schemes": ["gopher"], "entities": ["->"]}"#).unwrap();
        let config = TokenizerConfig::load(&path).unwrap();
        assert_eq!(config.schemes, vec!["gopher".to_string()]);
        assert_eq!(config.entities, vec!["->".to_string()]);
    }
}
