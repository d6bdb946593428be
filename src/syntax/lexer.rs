//! Tokenizer front end.
//!
//! sqlparser's tokenizer does the lexing; this module groups its output into
//! significant lexemes that each carry the whitespace and comments in front
//! of them, so the parse tree can reproduce the input text exactly.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::tokenizer::{Token as SqlToken, Tokenizer, Word};

use crate::error::{SsqlError, SsqlResult};
use crate::sql::dialect::{Dialect, SqlDialect};

static SAMPLING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*<|>\*/").unwrap());

/// Replace `/*<` and `>*/` markers with a space so text hidden from plain SQL
/// tools becomes visible to the sampling grammar.
pub fn strip_sampling_comments(sql: &str) -> String {
    SAMPLING_COMMENT.replace_all(sql, " ").into_owned()
}

/// Coarse lexeme classes the grammar cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexKind {
    /// Unquoted word: keyword or identifier.
    Word,
    /// Quoted identifier.
    Quoted,
    /// `->`
    Arrow,
    LParen,
    RParen,
    Comma,
    Period,
    Semicolon,
    /// Literals, operators and anything else.
    Other,
}

/// A significant token and the trivia preceding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub trivia: String,
    pub kind: LexKind,
    pub text: String,
    pub line: u64,
    pub column: u64,
}

impl Lexeme {
    pub fn is(&self, kind: LexKind) -> bool {
        self.kind == kind
    }

    /// Unquoted word matching `keyword`, ignoring case.
    pub fn is_word(&self, keyword: &str) -> bool {
        self.kind == LexKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_any_word(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.is_word(k))
    }

    /// Word or quoted identifier.
    pub fn is_name(&self) -> bool {
        matches!(self.kind, LexKind::Word | LexKind::Quoted)
    }
}

/// Lexed statement.
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub lexemes: Vec<Lexeme>,
    /// Whitespace and comments after the last lexeme.
    pub trailing: String,
    /// Position just past the end of the input.
    pub end_line: u64,
    pub end_column: u64,
}

impl Lexed {
    /// Unquoted words in source order.
    pub fn words(&self) -> impl Iterator<Item = &Lexeme> {
        self.lexemes.iter().filter(|l| l.kind == LexKind::Word)
    }

    pub fn first(&self) -> Option<&Lexeme> {
        self.lexemes.first()
    }
}

struct Cursor {
    line: u64,
    column: u64,
}

impl Cursor {
    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn quoted_word(word: &Word, quote: char) -> String {
    let close = match quote {
        '[' => ']',
        other => other,
    };
    let escaped = word.value.replace(close, &format!("{close}{close}"));
    format!("{quote}{escaped}{close}")
}

fn classify(token: &SqlToken) -> (LexKind, String) {
    match token {
        SqlToken::Word(word) => match word.quote_style {
            Some(quote) => (LexKind::Quoted, quoted_word(word, quote)),
            None => (LexKind::Word, word.value.clone()),
        },
        SqlToken::Arrow => (LexKind::Arrow, "->".to_string()),
        SqlToken::LParen => (LexKind::LParen, "(".to_string()),
        SqlToken::RParen => (LexKind::RParen, ")".to_string()),
        SqlToken::Comma => (LexKind::Comma, ",".to_string()),
        SqlToken::Period => (LexKind::Period, ".".to_string()),
        SqlToken::SemiColon => (LexKind::Semicolon, ";".to_string()),
        other => (LexKind::Other, other.to_string()),
    }
}

/// Tokenize `sql` for `dialect`, keeping every byte of trivia.
pub fn lex(sql: &str, dialect: Dialect) -> SsqlResult<Lexed> {
    let parser_dialect = dialect.parser_dialect();
    let tokens = Tokenizer::new(&*parser_dialect, sql)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| SsqlError::syntax(e.location.line, e.location.column, e.message))?;

    let mut cursor = Cursor { line: 1, column: 1 };
    let mut trivia = String::new();
    let mut lexemes: Vec<Lexeme> = Vec::new();

    for token in &tokens {
        match token {
            SqlToken::EOF => continue,
            SqlToken::Whitespace(ws) => {
                let text = ws.to_string();
                cursor.advance(&text);
                trivia.push_str(&text);
                continue;
            }
            _ => {}
        }

        let (kind, text) = classify(token);
        let (line, column) = (cursor.line, cursor.column);
        cursor.advance(&text);

        // Some dialects lex `->` as `-` followed by `>`
        if text == ">" && trivia.is_empty() {
            if let Some(prev) = lexemes.last_mut() {
                if prev.kind == LexKind::Other && prev.text == "-" {
                    prev.kind = LexKind::Arrow;
                    prev.text = "->".to_string();
                    continue;
                }
            }
        }

        lexemes.push(Lexeme {
            trivia: std::mem::take(&mut trivia),
            kind,
            text,
            line,
            column,
        });
    }

    Ok(Lexed {
        lexemes,
        trailing: trivia,
        end_line: cursor.line,
        end_column: cursor.column,
    })
}
