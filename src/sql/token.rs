//! SQL Tokens - the atomic units of generated SQL.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings. Identifiers taken from user input are
//! carried verbatim so their quoting survives the rewrite.

use super::dialect::{Dialect, SqlDialect};

/// SQL Token - every element the sampling compilers emit.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Query Keywords ===
    Select,
    From,
    Where,
    As,
    With,
    Case,
    When,
    Then,
    Else,
    End,
    Cast,

    // === DDL Keywords ===
    Create,
    Table,
    Index,
    Cluster,
    Using,
    On,
    Primary,
    Key,
    SortKey,

    // === DML Keywords ===
    Insert,
    Into,
    Values,

    // === Functions ===
    Floor,
    Log,

    // === Data Types ===
    SmallInt,
    Integer,
    BigInt,
    DoublePrecision,
    Varchar(u32),

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    Lte,
    Plus,
    Mul,
    Div,
    Mod,
    BitAnd,
    /// Bitwise XOR of two expressions, spelled per dialect
    Xor(TokenStream, TokenStream),

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),

    // === Dynamic Content ===
    /// Identifier exactly as written in the source statement
    Ident(String),
    /// Integer literal
    LitInt(i64),
    /// Float literal
    LitFloat(f64),
    /// String literal
    LitString(String),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// Only used for fragments copied out of the parsed statement, which
    /// are already valid SQL text.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string for the given dialect.
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            // Query keywords
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::As => "AS".into(),
            Token::With => "WITH".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::Cast => "CAST".into(),

            // DDL keywords
            Token::Create => "CREATE".into(),
            Token::Table => "TABLE".into(),
            Token::Index => "INDEX".into(),
            Token::Cluster => "CLUSTER".into(),
            Token::Using => "USING".into(),
            Token::On => "ON".into(),
            Token::Primary => "PRIMARY".into(),
            Token::Key => "KEY".into(),
            Token::SortKey => "SORTKEY".into(),

            // DML keywords
            Token::Insert => "INSERT".into(),
            Token::Into => "INTO".into(),
            Token::Values => "VALUES".into(),

            // Functions
            Token::Floor => "FLOOR".into(),
            Token::Log => "LOG".into(),

            // Data types
            Token::SmallInt => "SMALLINT".into(),
            Token::Integer => "INTEGER".into(),
            Token::BigInt => "BIGINT".into(),
            Token::DoublePrecision => "DOUBLE PRECISION".into(),
            Token::Varchar(n) => format!("VARCHAR({n})"),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Lte => "<=".into(),
            Token::Plus => "+".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),
            Token::Mod => "%".into(),
            Token::BitAnd => "&".into(),
            Token::Xor(left, right) => {
                dialect.bitwise_xor(&left.serialize(dialect), &right.serialize(dialect))
            }

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => " ".repeat(*n),

            // Dynamic
            Token::Ident(name) => name.clone(),
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                if f.is_nan() {
                    panic!("Cannot serialize NaN to SQL")
                }
                if f.is_infinite() {
                    panic!("Cannot serialize Infinity to SQL")
                }
                // Use ryu for fast, accurate float formatting
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => dialect.quote_string(s),

            // Escape hatch
            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Push `items` separated by `sep`.
    pub fn join<I>(&mut self, items: I, sep: &[Token]) -> &mut Self
    where
        I: IntoIterator<Item = TokenStream>,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.extend(sep.iter().cloned());
            }
            self.append(&item);
        }
        self
    }

    /// Whether nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize all tokens to a SQL string.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn ident(&mut self, name: impl Into<String>) -> &mut Self {
        self.push(Token::Ident(name.into()))
    }
}

impl From<Token> for TokenStream {
    fn from(token: Token) -> Self {
        Self {
            tokens: vec![token],
        }
    }
}
