use crate::error::DetectError;

mod languages;


pub use languages::{LanguageSpec, default_format_exts, lookup, supported_formats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Number,
    Str,
    Comment,
    Whitespace,
    Punctuation,
    Unknown,
}

impl TokenKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Number => "number",
            TokenKind::Str => "string",
            TokenKind::Comment => "comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Unknown => "unknown",
        }
    }
}

/// One lexeme with byte-range and line/column provenance. The token
/// sequence partitions the source: ordered by `start`, contiguous,
/// non-overlapping. Lines and columns are 1-based; `end_line`/`end_column`
/// point just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

// Shared across languages so control-flow words keep their identity even
// when identifiers collapse under weak masking.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "begin", "break", "case", "catch", "class", "const", "continue",
    "def", "default", "do", "elif", "else", "end", "enum", "finally", "fn", "for", "func",
    "function", "if", "impl", "import", "in", "interface", "let", "loop", "match", "mod", "new",
    "private", "protected", "public", "return", "static", "struct", "switch", "throw", "trait",
    "try", "type", "use", "var", "while", "yield",
];

fn is_keyword(ident: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(ident))
    } else {
        KEYWORDS.binary_search(&ident).is_ok()
    }
}

/// Split `source` into tokens according to the registered grammar for
/// `format`. Greedy longest-match; on ambiguity the earliest alternative
/// wins (block comment, line comment, string, number, identifier,
/// punctuation, unknown). Comments and whitespace are always emitted; the
/// mask layer decides whether they participate in matching.
pub fn tokenize<'a>(source: &'a str, format: &str) -> Result<Vec<Token<'a>>, DetectError> {
    let spec = lookup(format).ok_or_else(|| DetectError::UnknownFormat(format.to_string()))?;
    let mut scanner = Scanner {
        source,
        spec,
        pos: 0,
        line: 1,
        column: 1,
        tokens: Vec::new(),
    };
    scanner.run()?;
    Ok(scanner.tokens)
}

struct Scanner<'a> {
    source: &'a str,
    spec: &'static LanguageSpec,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token<'a>>,
}

impl<'a> Scanner<'a> {
    fn run(&mut self) -> Result<(), DetectError> {
        while let Some(ch) = self.peek() {
            let start = self.pos;
            let (line, column) = (self.line, self.column);

            if ch.is_whitespace() {
                self.take_while(|c| c.is_whitespace());
                self.push(TokenKind::Whitespace, start, line, column);
                continue;
            }

            if let Some((open, close)) = self.block_comment_open() {
                self.advance(open.len());
                let Some(rel) = self.rest().find(close) else {
                    return Err(DetectError::Tokenizer(format!(
                        "unterminated block comment opened on line {line}"
                    )));
                };
                self.advance(rel + close.len());
                self.push(TokenKind::Comment, start, line, column);
                continue;
            }

            if let Some(marker) = self.line_comment_open() {
                self.advance(marker.len());
                self.take_while(|c| c != '\n');
                self.push(TokenKind::Comment, start, line, column);
                continue;
            }

            if self.is_string_open(ch) {
                self.scan_string(ch);
                self.push(TokenKind::Str, start, line, column);
                continue;
            }

            if ch.is_ascii_digit() {
                self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                self.push(TokenKind::Number, start, line, column);
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                self.take_while(|c| c.is_alphanumeric() || c == '_');
                let kind = if is_keyword(&self.source[start..self.pos], self.spec.case_insensitive) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                self.push(kind, start, line, column);
                continue;
            }

            if ch.is_ascii_punctuation() {
                self.advance(ch.len_utf8());
                self.push(TokenKind::Punctuation, start, line, column);
                continue;
            }

            self.advance(ch.len_utf8());
            self.push(TokenKind::Unknown, start, line, column);
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Move `len` bytes forward, updating line/column over the skipped text.
    fn advance(&mut self, len: usize) {
        for ch in self.source[self.pos..self.pos + len].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance(ch.len_utf8());
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: u32, column: u32) {
        self.tokens.push(Token {
            kind,
            text: &self.source[start..self.pos],
            start,
            end: self.pos,
            line,
            column,
            end_line: self.line,
            end_column: self.column,
        });
    }

    fn block_comment_open(&self) -> Option<(&'static str, &'static str)> {
        self.spec
            .block_comments
            .iter()
            .copied()
            .find(|(open, _)| self.rest().starts_with(open))
    }

    fn line_comment_open(&self) -> Option<&'static str> {
        self.spec
            .line_comments
            .iter()
            .copied()
            .find(|marker| self.rest().starts_with(marker))
    }

    fn is_string_open(&self, ch: char) -> bool {
        self.spec.string_quotes.contains(&ch) || (self.spec.backtick_strings && ch == '`')
    }

    fn scan_string(&mut self, quote: char) {
        if self.spec.triple_quotes && (quote == '"' || quote == '\'') {
            let triple = if quote == '"' { "\"\"\"" } else { "'''" };
            if self.rest().starts_with(triple) {
                self.advance(3);
                match self.rest().find(triple) {
                    Some(rel) => self.advance(rel + 3),
                    // unterminated: tolerate to end of input
                    None => self.advance(self.rest().len()),
                }
                return;
            }
        }

        let multiline = quote == '`';
        self.advance(quote.len_utf8());
        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance(ch.len_utf8());
                return;
            }
            // unterminated: tolerate to end of line
            if ch == '\n' && !multiline {
                return;
            }
            if ch == '\\' {
                self.advance(1);
                if let Some(next) = self.peek() {
                    self.advance(next.len_utf8());
                }
                continue;
            }
            self.advance(ch.len_utf8());
        }
    }
}
