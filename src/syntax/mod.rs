//! Sampling SQL front end.
//!
//! - [`lexer`] - Tokenizing with trivia preserved
//! - [`tree`] - Concrete syntax tree and rendering folds
//! - [`parser`] - Grammar for sampling queries and sampling tables

pub mod lexer;
pub mod parser;
pub mod tree;

pub use lexer::{lex, strip_sampling_comments, LexKind, Lexed, Lexeme};
pub use parser::{parse_create_table, parse_query};
pub use tree::{render, Branch, Emit, Fold, Kind, Node, Verbatim};
