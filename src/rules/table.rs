//! The wiki rule table.

use fancy_regex::Regex as FancyRegex;
use regex::Regex;

use super::{CustomToken, Pattern, Rule, RuleGraph, RuleId, RuleKind};
use crate::config::TokenizerConfig;
use crate::error::{Result, WikiError};
use super::RuleKind::{Container, Disabled, Formatting, Protected, Substitution};

/// Punctuation allowed at the end of a bare URL but trimmed from it.
const URL_PUNCT: &str = r".:?\-;,";
/// Characters that may appear in a bare URL.
const URL_ANY: &str = r"0-9A-Za-z_/#~:.?+=&%@!\-\[\];,";
const URL_HOST: &str = r"0-9A-Za-z_.:?\-;,";
/// Word boundaries are ASCII-only: `é` counts as punctuation.
const NOT_WORD_AHEAD: &str = r"(?![0-9A-Za-z_])";

/// Immutable rule list plus its nesting graph.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    graph: RuleGraph,
}

impl RuleTable {
    /// Build the table for `config`.
    ///
    /// # Errors
    /// Returns an error if a pattern assembled from the configuration does
    /// not compile.
    pub fn build(config: &TokenizerConfig) -> Result<Self> {
        let mut rules = fixed_rules()?;
        append_conditional(&mut rules, config)?;
        let graph = RuleGraph::build(&rules);
        tracing::debug!(rules = rules.len(), "built wiki rule table");
        Ok(Self { rules, graph })
    }

    pub const fn base(&self) -> RuleId {
        RuleId(0)
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub fn children(&self, id: RuleId) -> &[RuleId] {
        self.graph.children(id)
    }

    pub const fn graph(&self) -> &RuleGraph {
        &self.graph
    }

    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|rule| rule.name() == name)
            .map(RuleId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, rule)| (RuleId(i), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn re(rule: &'static str, source: &str) -> Result<FancyRegex> {
    FancyRegex::new(source).map_err(|source| WikiError::Pattern {
        rule,
        source: Box::new(source),
    })
}

/// Lookbehind requiring the consumed text to be empty or to end in an
/// ASCII non-word character.
fn not_after_word(rule: &'static str) -> Result<Regex> {
    Regex::new(r"(?:^|[^0-9A-Za-z_])$").map_err(|source| WikiError::Lookbehind { rule, source })
}

fn formatting(name: &'static str) -> Rule {
    Rule::new(name, Formatting).allows(&[Formatting, Substitution, Disabled])
}

fn tag_pair(name: &'static str, kind: RuleKind, open: &'static str, close: &'static str) -> Rule {
    Rule::new(name, kind)
        .entry(Pattern::literal(open).style("tag"))
        .pattern(Pattern::literal(close).style("tag").exit())
}

fn fixed_rules() -> Result<Vec<Rule>> {
    let block = [Formatting, Substitution, Disabled, Protected];
    Ok(vec![
        Rule::root("base"),
        Rule::new("listblock", Container)
            .allows(&block)
            .entry(Pattern::regex(re("listblock", r"^ {2,}[\-\*]")?).at_sol().style("def"))
            .entry(Pattern::regex(re("listblock", r"^\t+[\-\*]")?).at_sol().style("def"))
            .pattern(Pattern::regex(re("listblock", r"^ {2,}[\-\*]")?).at_sol().style("def"))
            .pattern(Pattern::regex(re("listblock", r"^\t+[\-\*]")?).at_sol().style("def"))
            .pattern(Pattern::empty().at_sol().exit()),
        Rule::new("preformatted", Protected)
            .entry(Pattern::regex(re("preformatted", r"^  (?![\*\-])")?).at_sol())
            .entry(Pattern::regex(re("preformatted", r"^\t(?![\*\-])")?).at_sol())
            .pattern(Pattern::literal("  ").at_sol())
            .pattern(Pattern::literal("\t").at_sol())
            .pattern(Pattern::empty().at_sol().exit())
            .style("string"),
        Rule::new("notoc", Substitution)
            .entry(Pattern::literal("~~NOTOC~~").exit())
            .style("meta"),
        Rule::new("nocache", Substitution)
            .entry(Pattern::literal("~~NOCACHE~~").exit())
            .style("meta"),
        Rule::new("header", RuleKind::BaseOnly)
            .entry(Pattern::regex(re("header", r"^[ \t]*={2}.+={2,}[ \t]*$")?).exit())
            .style("header"),
        Rule::new("table", Container)
            .allows(&block)
            .entry(Pattern::literal("^").at_sol().style("def"))
            .entry(Pattern::literal("|").at_sol().style("def"))
            .pattern(Pattern::literal("^").style("def"))
            .pattern(Pattern::literal("|").style("def"))
            .pattern(Pattern::regex(re("table", r"^[\t ]*:::[\t ]*(?=[\|\^])")?).style("def"))
            .pattern(Pattern::regex(re("table", r"^[\t ]+")?))
            .pattern(Pattern::empty().at_sol().exit()),
        formatting("strong")
            .entry(Pattern::literal("**"))
            .pattern(Pattern::literal("**").exit())
            .style("strong"),
        formatting("emphasis")
            .entry(Pattern::regex(re("emphasis", r"^//(?=[^\x00]*[^:])")?))
            .pattern(Pattern::literal("//").exit())
            .style("em"),
        formatting("underline")
            .entry(Pattern::literal("__"))
            .pattern(Pattern::literal("__").exit())
            .style("underline"),
        formatting("monospace")
            .entry(Pattern::literal("''"))
            .pattern(Pattern::literal("''").exit())
            .style("quote"),
        tag_pair("subscript", Formatting, "<sub>", "</sub>")
            .allows(&[Formatting, Substitution, Disabled]),
        tag_pair("superscript", Formatting, "<sup>", "</sup>")
            .allows(&[Formatting, Substitution, Disabled]),
        tag_pair("deleted", Formatting, "<del>", "</del>")
            .allows(&[Formatting, Substitution, Disabled]),
        Rule::new("linebreak", Substitution)
            .entry(Pattern::regex(re("linebreak", r"^\\\\(?:[ \t]|$)")?).exit())
            .style("tag"),
        tag_pair("footnote", Formatting, "((", "))")
            .allows(&[Container, Formatting, Substitution, Protected, Disabled]),
        Rule::new("hr", Container)
            .entry(Pattern::regex(re("hr", r"^[ \t]*-{4,}[ \t]*$")?).at_sol().exit())
            .style("hr"),
        tag_pair("unformatted", Disabled, "<nowiki>", "</nowiki>"),
        Rule::new("unformattedalt", Disabled)
            .entry(Pattern::literal("%%"))
            .pattern(Pattern::literal("%%").exit())
            .style("string"),
        Rule::new("php", Protected)
            .entry(Pattern::literal("<php>").style("tag").mode("php"))
            .pattern(Pattern::literal("</php>").style("tag").exit()),
        Rule::new("phpblock", Protected)
            .entry(Pattern::literal("<PHP>").style("tag").mode("php"))
            .pattern(Pattern::literal("</PHP>").style("tag").exit()),
        Rule::new("html", Protected)
            .entry(Pattern::literal("<html>").style("tag").mode("html"))
            .pattern(Pattern::literal("</html>").style("tag").exit()),
        Rule::new("htmlblock", Protected)
            .entry(Pattern::literal("<HTML>").style("tag").mode("html"))
            .pattern(Pattern::literal("</HTML>").style("tag").exit()),
        Rule::new("code", Protected)
            .entry(Pattern::regex(re("code", r"^<code(?=\s|>|$)")?).style("tag"))
            .pattern(Pattern::literal("</code>").style("tag").exit())
            .custom(CustomToken::CodeHeader),
        Rule::new("file", Protected)
            .entry(Pattern::regex(re("file", r"^<file(?=\s|>|$)")?).style("tag"))
            .pattern(Pattern::literal("</file>").style("tag").exit())
            .custom(CustomToken::CodeHeader),
        Rule::new("quote", Container)
            .allows(&block)
            .entry(Pattern::regex(re("quote", r"^>+")?).at_sol().style("def"))
            .pattern(Pattern::regex(re("quote", r"^>+")?).at_sol().style("def"))
            .pattern(Pattern::empty().at_sol().exit()),
    ])
}

/// Alternation of escaped literals, longest first so that the longest
/// literal wins at a given position.
fn words_pattern(words: &[String], end: &str) -> Option<String> {
    let mut words: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    let escaped: Vec<String> = words
        .iter()
        .map(|w| fancy_regex::escape(w).into_owned())
        .collect();
    Some(format!("^(?:{}){end}", escaped.join("|")))
}

fn url_tail() -> String {
    format!("[{URL_ANY}]+?(?=[{URL_PUNCT}]*[^{URL_ANY}]|$)")
}

fn external_link_pattern(schemes: &[String]) -> String {
    let mut alternatives: Vec<String> = schemes
        .iter()
        .filter(|scheme| !scheme.is_empty())
        .map(|scheme| format!("{}://{}", fancy_regex::escape(scheme), url_tail()))
        .collect();
    for host in ["www?", "ftp?"] {
        alternatives.push(format!(
            r"{host}\.[{URL_HOST}]+?\.[{URL_HOST}]+?{}",
            url_tail()
        ));
    }
    format!("(?i)^(?:{})", alternatives.join("|"))
}

fn email_link_pattern() -> String {
    let text = r"[0-9a-zA-Z!#$%&'*+/=?^_`{|}~\-]+";
    format!(r"(?i)^<{text}(?:\.{text})*@(?:[0-9a-z][0-9a-z\-]*\.)+(?:[a-z]{{2,4}}|museum|travel)>")
}

fn append_conditional(rules: &mut Vec<Rule>, config: &TokenizerConfig) -> Result<()> {
    for (name, words) in [("smiley", &config.smileys), ("acronym", &config.acronyms)] {
        if let Some(source) = words_pattern(words, NOT_WORD_AHEAD) {
            rules.push(
                Rule::new(name, Substitution)
                    .entry(
                        Pattern::regex(re(name, &source)?)
                            .behind(not_after_word(name)?)
                            .exit(),
                    )
                    .style("keyword"),
            );
        }
    }

    if let Some(source) = words_pattern(&config.entities, "") {
        rules.push(
            Rule::new("entity", Substitution)
                .entry(Pattern::regex(re("entity", &source)?).exit())
                .style("keyword"),
        );
    }

    rules.push(
        Rule::new("multiplyentity", Substitution)
            .entry(
                Pattern::regex(re(
                    "multiplyentity",
                    &format!("^(?:[1-9]|[0-9]{{2,}})(?=[xX][0-9]+{NOT_WORD_AHEAD})"),
                )?)
                .behind(not_after_word("multiplyentity")?),
            )
            .pattern(Pattern::regex(re("multiplyentity", r"^[xX]")?).style("keyword"))
            .pattern(
                Pattern::regex(re("multiplyentity", &format!("^[0-9]+{NOT_WORD_AHEAD}"))?).exit(),
            ),
    );

    if config.camelcase {
        rules.push(
            Rule::new("camelcaselink", Substitution)
                .entry(
                    Pattern::regex(re(
                        "camelcaselink",
                        &format!("^[A-Z]+[a-z]+[A-Z][A-Za-z]*{NOT_WORD_AHEAD}"),
                    )?)
                        .behind(not_after_word("camelcaselink")?)
                        .exit(),
                )
                .style("link"),
        );
    }

    rules.push(
        Rule::new("internallink", Substitution)
            .entry(Pattern::literal("[[").style("link"))
            .custom(CustomToken::InternalLink),
    );
    rules.push(tag_pair("rss", Substitution, "{{rss>", "}}"));
    rules.push(
        Rule::new("media", Substitution)
            .entry(Pattern::regex(re("media", r"^\{\{ *")?).style("link"))
            .custom(CustomToken::Media),
    );
    rules.push(
        Rule::new("externallink", Substitution)
            .entry(
                Pattern::regex(re("externallink", &external_link_pattern(&config.schemes))?)
                    .behind(not_after_word("externallink")?)
                    .exit(),
            )
            .style("link"),
    );
    rules.push(
        Rule::new("emaillink", Substitution)
            .entry(Pattern::regex(re("emaillink", &email_link_pattern())?).exit())
            .style("link"),
    );
    rules.push(
        Rule::new("windowssharelink", Substitution)
            .entry(Pattern::regex(re("windowssharelink", r"^\\\\[0-9A-Za-z_]+?(?:\\[0-9A-Za-z_$\-]+)+")?).exit())
            .style("link"),
    );
    rules.push(
        Rule::new("filelink", Substitution)
            .entry(
                Pattern::regex(re("filelink", &format!("(?i)^file://{}", url_tail()))?)
                    .behind(not_after_word("filelink")?)
                    .exit(),
            )
            .style("link"),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::LineStream;

    fn table() -> RuleTable {
        RuleTable::build(&TokenizerConfig::default()).unwrap()
    }

    /// Length matched by the first entry of `rule` at the start of `text`.
    fn entry_len(table: &RuleTable, rule: &str, text: &str) -> Option<usize> {
        let id = table.find(rule).unwrap();
        let mut stream = LineStream::new(text);
        table
            .rule(id)
            .entries()
            .iter()
            .any(|p| p.try_match(&mut stream))
            .then(|| stream.pos())
    }

    #[test]
    fn test_base_is_first_and_untyped() {
        let table = table();
        assert_eq!(table.rule(table.base()).name(), "base");
        assert_eq!(table.rule(table.base()).kind(), None);
    }

    #[test]
    fn test_listblock_precedes_preformatted_in_base_children() {
        let table = table();
        let children = table.children(table.base());
        let list = table.find("listblock").unwrap();
        let pre = table.find("preformatted").unwrap();
        let list_pos = children.iter().position(|id| *id == list).unwrap();
        let pre_pos = children.iter().position(|id| *id == pre).unwrap();
        assert!(list_pos < pre_pos);
    }

    #[test]
    fn test_formatting_never_nests_under_protected_or_disabled() {
        let table = table();
        for (id, rule) in table.iter() {
            for child in table.children(id) {
                let child_rule = table.rule(*child);
                let kind = child_rule.kind().unwrap();
                assert!(rule.allows_kind(kind), "{} -> {}", rule.name(), child_rule.name());
                if kind == Formatting {
                    assert!(
                        !matches!(rule.kind(), Some(Protected | Disabled)),
                        "{} nested under {}",
                        child_rule.name(),
                        rule.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_protected_and_disabled_rules_are_leaves() {
        let table = table();
        for (id, rule) in table.iter() {
            if matches!(rule.kind(), Some(Protected | Disabled)) {
                assert!(table.children(id).is_empty(), "{} has children", rule.name());
            }
        }
    }

    #[test]
    fn test_optional_rules_follow_config() {
        let minimal = RuleTable::build(&TokenizerConfig::minimal()).unwrap();
        assert!(minimal.find("smiley").is_none());
        assert!(minimal.find("acronym").is_none());
        assert!(minimal.find("entity").is_none());
        assert!(minimal.find("camelcaselink").is_none());
        assert!(minimal.find("multiplyentity").is_some());

        let config = TokenizerConfig {
            camelcase: true,
            ..TokenizerConfig::default()
        };
        let full = RuleTable::build(&config).unwrap();
        let smiley = full.find("smiley").unwrap();
        let camel = full.find("camelcaselink").unwrap();
        assert!(smiley < camel, "appended rules keep their order");
    }

    #[test]
    fn test_words_prefer_longest_literal() {
        let table = table();
        assert_eq!(entry_len(&table, "entity", "<->x"), Some(3));
        assert_eq!(entry_len(&table, "entity", "---"), Some(3));
        assert_eq!(entry_len(&table, "smiley", ":-) yes"), Some(3));
        assert_eq!(entry_len(&table, "smiley", "LOLcat"), None);
    }

    #[test]
    fn test_external_link_trims_trailing_punctuation() {
        let table = table();
        assert_eq!(entry_len(&table, "externallink", "http://example.com. Next"), Some(18));
        assert_eq!(entry_len(&table, "externallink", "http://example.com/a?b=1"), Some(24));
        assert_eq!(entry_len(&table, "externallink", "www.example.com, more"), Some(15));
        assert_eq!(entry_len(&table, "externallink", "mailto://x"), None);
    }

    #[test]
    fn test_schemes_are_escaped() {
        let config = TokenizerConfig {
            schemes: vec!["svn+ssh".to_string()],
            ..TokenizerConfig::minimal()
        };
        let table = RuleTable::build(&config).unwrap();
        assert_eq!(entry_len(&table, "externallink", "svn+ssh://host/repo"), Some(19));
        assert_eq!(entry_len(&table, "externallink", "svnnssh://host"), None);
    }

    #[test]
    fn test_email_and_share_links() {
        let table = table();
        assert_eq!(entry_len(&table, "emaillink", "<joe@example.org> hi"), Some(17));
        assert_eq!(entry_len(&table, "emaillink", "<joe@example>"), None);
        assert_eq!(entry_len(&table, "windowssharelink", r"\\server\share x"), Some(14));
    }

    #[test]
    fn test_emphasis_requires_non_colon_after_marker() {
        let table = table();
        assert_eq!(entry_len(&table, "emphasis", "//text//"), Some(2));
        assert_eq!(entry_len(&table, "emphasis", "//::"), None);
    }

    #[test]
    fn test_code_entry_needs_delimiter_after_tag() {
        let table = table();
        assert_eq!(entry_len(&table, "code", "<code>"), Some(5));
        assert_eq!(entry_len(&table, "code", "<code js>"), Some(5));
        assert_eq!(entry_len(&table, "code", "<code"), Some(5));
        assert_eq!(entry_len(&table, "code", "<codes>"), None);
    }

    #[test]
    fn test_blank_line_exits() {
        let table = table();
        for name in ["listblock", "preformatted", "table", "quote"] {
            let rule = table.rule(table.find(name).unwrap());
            assert!(rule.exits_on_blank_line(), "{name}");
        }
        let strong = table.rule(table.find("strong").unwrap());
        assert!(!strong.exits_on_blank_line());
    }

    #[test]
    fn test_word_classes_are_ascii() {
        let table = table();
        assert_eq!(entry_len(&table, "smiley", "LOLé"), Some(3));
        assert_eq!(entry_len(&table, "smiley", "LOL_"), None);
        assert_eq!(entry_len(&table, "multiplyentity", "640x480é"), Some(3));
    }
}
