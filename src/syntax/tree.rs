//! Concrete syntax tree and text-reassembling fold.
//!
//! Every lexeme of the input lives in exactly one leaf together with the
//! trivia in front of it, so rendering the tree without changes reproduces
//! the statement byte for byte. Rewrites are expressed as a [`Fold`] that
//! keeps, replaces or drops nodes while the rest of the text flows through.

use super::lexer::{LexKind, Lexeme};
use crate::error::SsqlResult;

/// Grammar construct a branch stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Statement,
    Terminator,

    // Queries
    Query,
    WithClause,
    SamplingHeader,
    SampleClause,
    SampleItem,
    SampleColumn,
    SampleTable,
    SampleTableName,
    SampleTableAlias,
    UntilClause,
    UntilContent,
    SelectBody,
    SelectCore,
    FromClause,
    FromItem,
    TableName,
    TableAlias,
    ColumnAliases,
    WhereClause,
    Parens,
    Subquery,

    // CREATE TABLE
    CreateTable,
    CreateTableName,
    TableBody,
    TableElement,
    ColumnDef,
    ColumnName,
    DataType,
    ColumnOption,
    SampleKeyClause,
    SampleKeyItem,
    KeyExpr,
    KeyAlias,
    SortKeyClause,
    SourceClause,
    SourceTableName,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Lexeme),
    Branch(Branch),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub kind: Kind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn branch(kind: Kind, children: Vec<Node>) -> Node {
        Node::Branch(Branch { kind, children })
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Node::Branch(b) => Some(b),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Lexeme> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(_) => None,
        }
    }

    pub fn kind(&self) -> Option<Kind> {
        self.as_branch().map(|b| b.kind)
    }

    pub fn first_leaf(&self) -> Option<&Lexeme> {
        match self {
            Node::Leaf(l) => Some(l),
            Node::Branch(b) => b.first_leaf(),
        }
    }

    /// Trivia in front of the first lexeme.
    pub fn leading_trivia(&self) -> &str {
        self.first_leaf().map(|l| l.trivia.as_str()).unwrap_or("")
    }

    /// Source text, including leading trivia.
    pub fn source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    /// Source text without leading trivia.
    pub fn code(&self) -> String {
        let source = self.source();
        source[self.leading_trivia().len()..].to_string()
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Node::Leaf(l) => {
                out.push_str(&l.trivia);
                out.push_str(&l.text);
            }
            Node::Branch(b) => b.children.iter().for_each(|c| c.write_source(out)),
        }
    }
}

impl Branch {
    pub fn first_leaf(&self) -> Option<&Lexeme> {
        self.children.iter().find_map(Node::first_leaf)
    }

    /// First direct child branch of `kind`.
    pub fn child(&self, kind: Kind) -> Option<&Branch> {
        self.children_of(kind).next()
    }

    /// Direct child branches of `kind`.
    pub fn children_of(&self, kind: Kind) -> impl Iterator<Item = &Branch> {
        self.children
            .iter()
            .filter_map(Node::as_branch)
            .filter(move |b| b.kind == kind)
    }

    /// First descendant branch of `kind`, depth first, excluding `self`.
    pub fn find(&self, kind: Kind) -> Option<&Branch> {
        for child in self.children.iter().filter_map(Node::as_branch) {
            if child.kind == kind {
                return Some(child);
            }
            if let Some(found) = child.find(kind) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant branch of `kind` with the kinds of its ancestors
    /// below `self`.
    pub fn find_all(&self, kind: Kind) -> Vec<(&Branch, Vec<Kind>)> {
        let mut found = Vec::new();
        let mut path = vec![self.kind];
        self.collect(kind, &mut path, &mut found);
        found
    }

    fn collect<'a>(&'a self, kind: Kind, path: &mut Vec<Kind>, found: &mut Vec<(&'a Branch, Vec<Kind>)>) {
        for child in self.children.iter().filter_map(Node::as_branch) {
            if child.kind == kind {
                found.push((child, path.clone()));
            }
            path.push(child.kind);
            child.collect(kind, path, found);
            path.pop();
        }
    }

    /// All lexemes below this branch in source order.
    pub fn leaves(&self) -> Vec<&Lexeme> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Lexeme>) {
        for child in &self.children {
            match child {
                Node::Leaf(l) => out.push(l),
                Node::Branch(b) => b.collect_leaves(out),
            }
        }
    }

    /// Whether any unquoted word below this branch matches `keyword`.
    pub fn mentions(&self, keyword: &str) -> bool {
        self.leaves().iter().any(|l| l.is_word(keyword))
    }

    /// Direct leaf children of `kind`.
    pub fn leaves_of(&self, kind: LexKind) -> impl Iterator<Item = &Lexeme> {
        self.children
            .iter()
            .filter_map(Node::as_leaf)
            .filter(move |l| l.kind == kind)
    }

    pub fn source(&self) -> String {
        self.children.iter().map(Node::source).collect()
    }

    /// Source text without leading trivia.
    pub fn code(&self) -> String {
        let source = self.source();
        let trivia = self.first_leaf().map(|l| l.trivia.len()).unwrap_or(0);
        source[trivia..].to_string()
    }
}

/// What a fold wants done with a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Emit {
    /// Render the node as written, visiting children.
    Keep,
    /// Emit this text after the node's leading trivia.
    Replace(String),
    /// Emit nothing, trivia included.
    Drop,
}

/// Per-node rewrite decisions. `path` lists the kinds of the enclosing
/// branches, outermost first.
pub trait Fold {
    fn branch(&self, _branch: &Branch, _path: &[Kind]) -> SsqlResult<Emit> {
        Ok(Emit::Keep)
    }

    fn leaf(&self, _leaf: &Lexeme, _path: &[Kind]) -> SsqlResult<Emit> {
        Ok(Emit::Keep)
    }
}

/// Fold that changes nothing.
pub struct Verbatim;

impl Fold for Verbatim {}

/// Render `node` through `fold`.
pub fn render<F: Fold + ?Sized>(node: &Node, fold: &F) -> SsqlResult<String> {
    render_in(node, fold, &[])
}

/// Render `node` through `fold` as if it sat below `path`.
pub fn render_in<F: Fold + ?Sized>(node: &Node, fold: &F, path: &[Kind]) -> SsqlResult<String> {
    let mut out = String::new();
    let mut path = path.to_vec();
    write(node, fold, &mut path, &mut out)?;
    Ok(out)
}

/// Render the children of `branch` without consulting the fold about the
/// branch itself.
pub fn render_children<F: Fold + ?Sized>(
    branch: &Branch,
    fold: &F,
    path: &[Kind],
) -> SsqlResult<String> {
    let mut out = String::new();
    let mut path = path.to_vec();
    path.push(branch.kind);
    for child in &branch.children {
        write(child, fold, &mut path, &mut out)?;
    }
    Ok(out)
}

fn write<F: Fold + ?Sized>(
    node: &Node,
    fold: &F,
    path: &mut Vec<Kind>,
    out: &mut String,
) -> SsqlResult<()> {
    match node {
        Node::Leaf(leaf) => match fold.leaf(leaf, path)? {
            Emit::Keep => {
                out.push_str(&leaf.trivia);
                out.push_str(&leaf.text);
            }
            Emit::Replace(text) => {
                out.push_str(&leaf.trivia);
                out.push_str(&text);
            }
            Emit::Drop => {}
        },
        Node::Branch(branch) => match fold.branch(branch, path)? {
            Emit::Keep => {
                path.push(branch.kind);
                for child in &branch.children {
                    write(child, fold, path, out)?;
                }
                path.pop();
            }
            Emit::Replace(text) => {
                out.push_str(node.leading_trivia());
                out.push_str(&text);
            }
            Emit::Drop => {}
        },
    }
    Ok(())
}
