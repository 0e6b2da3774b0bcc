use std::collections::BTreeMap;

/// Token grammar parameters for one registered language. One generic
/// scanner interprets these; adding a language means adding a row here.
#[derive(Debug, Clone, Copy)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comments: &'static [(&'static str, &'static str)],
    pub string_quotes: &'static [char],
    /// Backtick-delimited strings that may span lines (JS templates, Go raw
    /// strings).
    pub backtick_strings: bool,
    /// Triple-quoted strings (`"""` / `'''`).
    pub triple_quotes: bool,
    /// Keywords compare case-insensitively and `ignore_case` defaults make
    /// sense for this language.
    pub case_insensitive: bool,
}

const C_LIKE_QUOTES: &[char] = &['"', '\''];
const DOUBLE_QUOTE: &[char] = &['"'];
const SINGLE_QUOTE: &[char] = &['\''];
const NO_QUOTES: &[char] = &[];

const SLASH_LINE: &[&str] = &["//"];
const HASH_LINE: &[&str] = &["#"];
const SLASH_STAR: &[(&str, &str)] = &[("/*", "*/")];
const NO_BLOCK: &[(&str, &str)] = &[];

static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: true,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "typescript",
        extensions: &["ts", "tsx", "mts", "cts"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: true,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "python",
        extensions: &["py", "pyi"],
        line_comments: HASH_LINE,
        block_comments: NO_BLOCK,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: true,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "rust",
        extensions: &["rs"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        // no '\'' here: lifetimes would be eaten as unterminated chars
        string_quotes: DOUBLE_QUOTE,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "go",
        extensions: &["go"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: true,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "java",
        extensions: &["java"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "kotlin",
        extensions: &["kt", "kts"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: true,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "csharp",
        extensions: &["cs"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "c",
        extensions: &["c", "h"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "cpp",
        extensions: &["cpp", "cc", "cxx", "hpp", "hh"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "ruby",
        extensions: &["rb", "rake"],
        line_comments: HASH_LINE,
        block_comments: &[("=begin", "=end")],
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "php",
        extensions: &["php"],
        line_comments: &["//", "#"],
        block_comments: SLASH_STAR,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "swift",
        extensions: &["swift"],
        line_comments: SLASH_LINE,
        block_comments: SLASH_STAR,
        string_quotes: DOUBLE_QUOTE,
        backtick_strings: false,
        triple_quotes: true,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "pascal",
        extensions: &["pas", "pp"],
        line_comments: SLASH_LINE,
        block_comments: &[("{", "}"), ("(*", "*)")],
        string_quotes: SINGLE_QUOTE,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: true,
    },
    LanguageSpec {
        name: "sql",
        extensions: &["sql"],
        line_comments: &["--"],
        block_comments: SLASH_STAR,
        string_quotes: SINGLE_QUOTE,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: true,
    },
    LanguageSpec {
        name: "shell",
        extensions: &["sh", "bash", "zsh"],
        line_comments: HASH_LINE,
        block_comments: NO_BLOCK,
        string_quotes: C_LIKE_QUOTES,
        backtick_strings: true,
        triple_quotes: false,
        case_insensitive: false,
    },
    LanguageSpec {
        name: "text",
        extensions: &["txt"],
        line_comments: &[],
        block_comments: NO_BLOCK,
        string_quotes: NO_QUOTES,
        backtick_strings: false,
        triple_quotes: false,
        case_insensitive: false,
    },
];

/// Resolve a format id (language name or file extension, any case) to its
/// grammar.
pub fn lookup(format: &str) -> Option<&'static LanguageSpec> {
    let folded = format.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|spec| spec.name == folded || spec.extensions.contains(&folded.as_str()))
}

pub fn supported_formats() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|spec| spec.name)
}

/// Default format -> extension mapping, as consumed by discovery.
pub fn default_format_exts() -> BTreeMap<String, Vec<String>> {
    LANGUAGES
        .iter()
        .map(|spec| {
            (
                spec.name.to_string(),
                spec.extensions.iter().map(|ext| ext.to_string()).collect(),
            )
        })
        .collect()
}
