//! Registry of languages that may be embedded in code and file blocks.
//!
//! Each wiki language tag maps to a descriptor naming the tokenizer that
//! highlights it, an optional variant (mime type), the tokenizers it
//! depends on, and an optional dialect version.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSpec {
    /// Tag as written after `<code` in wiki text.
    pub tag: &'static str,
    /// Tokenizer name.
    pub name: &'static str,
    /// Variant of the tokenizer, as a mime type.
    pub mime: Option<&'static str>,
    /// Tokenizers that must be available before this one.
    pub deps: &'static [&'static str],
    pub version: Option<u8>,
}

impl LanguageSpec {
    pub const fn new(tag: &'static str, name: &'static str) -> Self {
        Self {
            tag,
            name,
            mime: None,
            deps: &[],
            version: None,
        }
    }

    pub const fn mime(self, mime: &'static str) -> Self {
        Self {
            mime: Some(mime),
            ..self
        }
    }

    pub const fn deps(self, deps: &'static [&'static str]) -> Self {
        Self { deps, ..self }
    }

    pub const fn version(self, version: u8) -> Self {
        Self {
            version: Some(version),
            ..self
        }
    }

    /// Tokenizer name that never highlights anything.
    pub const NULL: &'static str = "null";

    /// True for descriptors that resolve to the plain-text tokenizer.
    pub fn is_null(&self) -> bool {
        self.name == Self::NULL
    }
}

const fn lang(tag: &'static str, name: &'static str) -> LanguageSpec {
    LanguageSpec::new(tag, name)
}

static BUILTIN: &[LanguageSpec] = &[
    lang("apl", "apl"),
    lang("asciiarmor", "asciiarmor"),
    lang("asn.1", "asn.1").mime("text/x-ttcn-asn"),
    lang("aspx", "htmlembedded").mime("application/x-aspx").deps(&["clike"]),
    lang("asterisk", "asterisk"),
    lang("bash", "shell"),
    lang("brainfuck", "brainfuck"),
    lang("c", "clike").mime("text/x-csrc"),
    lang("cassandra", "sql").mime("text/x-cassandra"),
    lang("ceylon", "clike").mime("text/x-ceylon"),
    lang("clojure", "clojure"),
    lang("cmake", "cmake"),
    lang("cobol", "cobol"),
    lang("coffeescript", "coffeescript"),
    lang("cpp", "clike").mime("text/x-c++src"),
    lang("crystal", "crystal"),
    lang("csharp", "clike").mime("text/x-csharp"),
    lang("css", "css").mime("text/css"),
    lang("cypher", "cypher"),
    lang("cython", "python").mime("text/x-cython"),
    lang("d", "d").mime("text/x-d"),
    lang("dart", "dart"),
    lang("diff", "diff"),
    lang("django", "django").deps(&["htmlmixed"]),
    lang("dockerfile", "dockerfile"),
    lang("dtd", "dtd"),
    lang("dylan", "dylan"),
    lang("ebnf", "ebnf"),
    lang("ecl", "ecl"),
    lang("ecmascript", "javascript").mime("application/ecmascript"),
    lang("eiffel", "eiffel"),
    lang("ejs", "htmlembedded").mime("application/x-ejs").deps(&["javascript"]),
    lang("elm", "elm"),
    lang("erb", "htmlembedded").mime("application/x-erb").deps(&["ruby"]),
    lang("erlang", "erlang"),
    lang("factor", "factor"),
    lang("fcl", "fcl"),
    lang("forth", "forth"),
    lang("fortran", "fortran"),
    lang("fsharp", "mllike").mime("text/x-fsharp"),
    lang("gfm", "gfm"),
    lang("gherkin", "gherkin"),
    lang("glsl", "clike").mime("x-shader/x-vertex"),
    lang("go", "go"),
    lang("gql", "sql").mime("text/x-gql"),
    lang("groovy", "groovy"),
    lang("gss", "css").mime("text/x-gss"),
    lang("haml", "haml"),
    lang("handlebars", "handlebars"),
    lang("haskell", "haskell"),
    lang("haskell-literate", "haskell-literate"),
    lang("haxe", "haxe").mime("text/x-haxe"),
    lang("hive", "sql").mime("text/x-hive"),
    lang("html", "htmlmixed"),
    lang("html5", "htmlmixed"),
    lang("http", "http"),
    lang("hxml", "haxe").mime("text/x-hxml"),
    lang("idl", "idl"),
    lang("ini", "properties"),
    lang("jade", "jade").deps(&["javascript"]),
    lang("java", "clike").mime("text/x-java"),
    lang("java5", "clike").mime("text/x-java"),
    lang("javascript", "javascript").mime("application/javascript"),
    lang("jinja2", "jinja2"),
    lang("json", "javascript").mime("application/json"),
    lang("jsonld", "javascript").mime("application/ld+json"),
    lang("jsp", "htmlembedded").mime("application/x-jsp").deps(&["clike"]),
    lang("jsx", "jsx"),
    lang("julia", "julia"),
    lang("kotlin", "clike").mime("text/x-kotlin"),
    lang("latex", "stex"),
    lang("less", "css").mime("text/x-less"),
    lang("lisp", "commonlisp"),
    lang("livescript", "livescript"),
    lang("lua", "lua"),
    lang("mariadb", "sql").mime("text/x-mariadb"),
    lang("markdown", "markdown"),
    lang("matlab", "octave"),
    lang("mbox", "mbox"),
    lang("modelica", "modelica").mime("text/x-modelica"),
    lang("mscgen", "mscgen"),
    lang("mscgenny", "mscgen").mime("text/x-msgenny"),
    lang("mssql", "sql").mime("text/x-mssql"),
    lang("mumps", "mumps"),
    lang("mysql", "sql").mime("text/x-sql"),
    lang("nginx", "nginx"),
    lang("nsis", "nsis"),
    lang("ntriples", "ntriples"),
    lang("objc", "clike").mime("text/x-objectivec"),
    lang("ocaml", "mllike").mime("text/x-ocaml"),
    lang("octave", "octave"),
    lang("oz", "oz"),
    lang("pascal", "pascal"),
    lang("pegjs", "pegjs"),
    lang("perl", "perl"),
    lang("pgp", "asciiarmor"),
    lang("pgsql", "sql").mime("text/x-pgsql"),
    lang("php", "php").mime("application/x-httpd-php-open").deps(&["htmlmixed"]),
    lang("pig", "pig").mime("text/x-pig"),
    lang("plsql", "sql").mime("text/x-plsql"),
    lang("postgresql", "sql").mime("text/x-pgsql"),
    lang("powershell", "powershell"),
    lang("properties", "properties"),
    lang("protobuf", "protobuf"),
    lang("puppet", "puppet"),
    lang("python", "python").mime("text/x-python"),
    lang("q", "q"),
    lang("r", "r"),
    lang("rpmchanges", "rpm").mime("text/x-rpm-changes"),
    lang("rpmspec", "rpm").mime("text/x-rpm-spec"),
    lang("rst", "rst"),
    lang("ruby", "ruby"),
    lang("rust", "rust"),
    lang("sas", "sas"),
    lang("sass", "sass"),
    lang("scala", "clike").mime("text/x-scala"),
    lang("scheme", "scheme"),
    lang("scss", "css").mime("text/x-scss"),
    lang("sieve", "sieve"),
    lang("slim", "slim"),
    lang("smalltalk", "smalltalk"),
    lang("smarty", "smarty").version(2),
    lang("smarty3", "smarty").version(3),
    lang("solr", "solr"),
    lang("soy", "soy"),
    lang("sparql", "sparql"),
    lang("spreadsheet", "spreadsheet"),
    lang("sql", "sql").mime("text/x-sql"),
    lang("squirrel", "clike").mime("text/x-squirrel"),
    lang("stylus", "stylus"),
    lang("swift", "swift"),
    lang("tcl", "tcl"),
    lang("text", LanguageSpec::NULL),
    lang("textile", "textile"),
    lang("tiddlywiki", "tiddlywiki"),
    lang("tiki", "tiki"),
    lang("toml", "toml"),
    lang("tornado", "tornado").deps(&["htmlmixed"]),
    lang("troff", "troff"),
    lang("ttcn", "ttcn").mime("text/x-ttcn"),
    lang("ttcn-cfg", "ttcn-cfg").mime("text/x-ttcn-cfg"),
    lang("turtle", "turtle"),
    lang("twig", "twig"),
    lang("typescript", "javascript").mime("application/typescript"),
    lang("vbnet", "vb"),
    lang("vbscript", "vbscript"),
    lang("velocity", "velocity"),
    lang("verilog", "verilog"),
    lang("vhdl", "vhdl"),
    lang("vue", "vue"),
    lang("webidl", "webidl"),
    lang("xml", "xml"),
    lang("xquery", "xquery"),
    lang("xu", "mscgen").mime("text/x-xu"),
    lang("yacas", "yacas"),
    lang("yaml", "yaml"),
    lang("yaml-frontmatter", "yaml-frontmatter").deps(&["gfm"]),
    lang("z80", "z80"),
];

/// Lookup table from wiki language tags to tokenizer descriptors.
///
/// Built once per tokenizer; hosts may register extra tags before handing
/// the registry to [`WikiMode`](crate::mode::WikiMode).
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    by_tag: HashMap<&'static str, LanguageSpec>,
}

impl LanguageRegistry {
    /// Registry with every built-in language.
    pub fn builtin() -> Self {
        Self {
            by_tag: BUILTIN.iter().map(|spec| (spec.tag, *spec)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            by_tag: HashMap::new(),
        }
    }

    /// Register (or replace) a language.
    pub fn insert(&mut self, spec: LanguageSpec) {
        self.by_tag.insert(spec.tag, spec);
    }

    pub fn get(&self, tag: &str) -> Option<&LanguageSpec> {
        self.by_tag.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }

    /// All registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.by_tag.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
