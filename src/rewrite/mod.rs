//! Sampling query compiler.
//!
//! A sampling query names which tables to sample by which unit key and
//! when the sample is big enough:
//!
//! ```text
//! SELECT SAMPLE(id -> sales AS s) UNTIL((SELECT COUNT(*) FROM s) >= 1000)
//! SELECT region, SUM(amount) * _FACTOR FROM s GROUP BY region
//! ```
//!
//! For a target level the compiler produces a [`QueryPair`]: a condition
//! query that evaluates the `UNTIL` predicate over the sample and an
//! aggregate query that runs the select over the same sample. Sampled tables
//! are exposed either as CTEs or, in inline-view mode, by replacing each
//! reference with a filtered subquery.

pub mod inline_view;

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::{SemanticError, SsqlError, SsqlResult};
use crate::sampling::{self, FACTOR_BASE};
use crate::sql::dialect::Dialect;
use crate::sql::ident;
use crate::sql::token::{Token, TokenStream};
use crate::syntax::lexer::{Lexed, Lexeme};
use crate::syntax::tree::{render, render_children, render_in, Branch, Emit, Fold, Kind, Node};
use crate::syntax::{lex, parse_query, strip_sampling_comments};

pub use inline_view::InlineView;

/// Keywords that cannot be combined with sampling.
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "INSERT",
    "UPDATE",
    "DELETE",
    "MERGE",
    "INTO",
    "RECURSIVE",
    "TABLESAMPLE",
];

/// Refers to the select owning a nested `UNTIL`.
const THIS_KEYWORD: &str = "THIS";

/// Replaced by the scale-up multiplier of the target level.
const FACTOR_WORD: &str = "_FACTOR";

/// Path of the top-level query below the statement.
const TOP_QUERY: &[Kind] = &[Kind::Statement, Kind::Query];

/// Condition and aggregate queries for one target level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPair {
    pub level: u32,
    /// Query returning one boolean; `None` means the level needs no check.
    pub condition_query: Option<String>,
    pub aggregate_query: String,
}

/// How sampled tables are exposed to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmissionMode {
    /// `WITH alias AS (SELECT * FROM t WHERE ...)`
    #[default]
    Cte,
    /// Each `FROM alias` becomes `(SELECT * FROM t WHERE ...) AS alias`.
    InlineView,
}

/// A parsed sampling query, ready to be rewritten at any level.
#[derive(Debug, Clone)]
pub struct SamplingCompiler {
    dialect: Dialect,
    num_levels: u32,
    mode: EmissionMode,
    /// `None` when the statement uses no sampling syntax.
    statement: Option<Node>,
}

impl SamplingCompiler {
    /// Parse `sql` and check how it uses the sampling keywords.
    pub fn new(sql: &str, dialect: Dialect, num_levels: u32, inline_view: bool) -> SsqlResult<Self> {
        let sql = strip_sampling_comments(sql);
        let lexed = lex(&sql, dialect)?;
        let statement = if uses_sampling(&lexed)? {
            let statement = parse_query(&lexed)?;
            Layout::of(&statement)?;
            Some(statement)
        } else {
            None
        };
        let mode = if inline_view {
            EmissionMode::InlineView
        } else {
            EmissionMode::Cte
        };
        Ok(Self {
            dialect,
            num_levels,
            mode,
            statement,
        })
    }

    /// Whether the statement carries a `SAMPLE` clause to rewrite.
    pub fn has_sample_clause(&self) -> bool {
        self.statement.is_some()
    }

    pub fn mode(&self) -> EmissionMode {
        self.mode
    }

    pub fn num_levels(&self) -> u32 {
        self.num_levels
    }

    /// Rewrite for target `level`. Returns `None` when there is nothing to
    /// rewrite.
    pub fn rewrite(&self, level: u32, catalog: &Catalog) -> SsqlResult<Option<QueryPair>> {
        let Some(statement) = &self.statement else {
            return Ok(None);
        };
        if level >= self.num_levels {
            return Err(SsqlError::InvalidLevel {
                level,
                num_levels: self.num_levels,
            });
        }

        let layout = Layout::of(statement)?;
        let targets = sample_targets(layout.sample, catalog)?;
        let factor = Token::LitFloat(sampling::factor(FACTOR_BASE, level)).serialize(self.dialect);

        let views = match self.mode {
            EmissionMode::InlineView => self.inline_views(&targets, level),
            EmissionMode::Cte => HashMap::new(),
        };
        let fold = QueryFold {
            drop_top_with: self.mode == EmissionMode::Cte,
            factor: &factor,
            views: &views,
            this: None,
        };

        let condition = until_body(&layout, &fold)?;
        let body = render(statement, &fold)?.trim().to_string();

        let pair = match self.mode {
            EmissionMode::Cte => {
                let mut with = targets
                    .iter()
                    .map(|t| self.cte(t, level))
                    .collect::<Vec<_>>()
                    .join(",");
                if let Some(top_with) = layout.top.child(Kind::WithClause) {
                    with.push(',');
                    with.push_str(&with_content(top_with, &fold)?);
                }
                QueryPair {
                    level,
                    condition_query: Some(format!("WITH {with} SELECT {condition}")),
                    aggregate_query: format!("WITH {with} {body}"),
                }
            }
            EmissionMode::InlineView => {
                let mut query = String::new();
                if let Some(top_with) = layout.top.child(Kind::WithClause) {
                    query.push_str(render_children(top_with, &fold, TOP_QUERY)?.trim());
                    query.push(' ');
                }
                query.push_str("SELECT ");
                query.push_str(&condition);
                QueryPair {
                    level,
                    condition_query: Some(query),
                    aggregate_query: body,
                }
            }
        };
        Ok(Some(pair))
    }

    /// `SELECT * FROM table WHERE table.level <= !level`
    fn sampled_select(&self, target: &SampleTarget, level: u32) -> String {
        let mut ts = TokenStream::new();
        ts.push(Token::Select)
            .space()
            .push(Token::Star)
            .space()
            .push(Token::From)
            .space()
            .ident(target.table.clone())
            .space()
            .push(Token::Where)
            .space()
            .append(&sampling::level_filter_sql(
                &target.table,
                &target.level_column,
                level,
            ));
        ts.serialize(self.dialect)
    }

    fn cte(&self, target: &SampleTarget, level: u32) -> String {
        format!("{} AS ({})", target.alias, self.sampled_select(target, level))
    }

    fn inline_views(&self, targets: &[SampleTarget], level: u32) -> HashMap<String, InlineView> {
        let mut views = HashMap::new();
        for target in targets {
            let view = InlineView::new(
                format!("({})", self.sampled_select(target, level)),
                target.alias.clone(),
            );
            if !target.explicit_alias {
                views.insert(ident::normalize(&target.table), view.clone());
            }
            views.insert(ident::normalize(&target.alias), view);
        }
        views
    }
}

/// Count the sampling keywords and reject illegal combinations. Returns
/// whether a rewrite is needed.
fn uses_sampling(lexed: &Lexed) -> SsqlResult<bool> {
    let mut samples = 0;
    let mut untils = 0;
    let mut unsupported: Option<&Lexeme> = None;
    for word in lexed.words() {
        if word.is_word("SAMPLE") {
            samples += 1;
        } else if word.is_word("UNTIL") {
            untils += 1;
        } else if unsupported.is_none() && word.is_any_word(UNSUPPORTED_KEYWORDS) {
            unsupported = Some(word);
        }
    }

    let err = match (samples, untils) {
        (0, 0) => return Ok(false),
        (0, _) => SemanticError::UntilWithoutSample,
        (_, 0) => SemanticError::SampleWithoutUntil,
        (1, 1) => match unsupported {
            Some(word) => SemanticError::UnsupportedKeyword(word.text.clone()),
            None => return Ok(true),
        },
        (1, _) => SemanticError::RepeatedUntil,
        _ => SemanticError::RepeatedSample,
    };
    Err(err.into())
}

/// Where the sampling clauses sit in a parsed query.
struct Layout<'a> {
    top: &'a Branch,
    sample: &'a Branch,
    until: &'a Branch,
    /// Query owning a nested `UNTIL`; `None` when it is on the top query.
    owner: Option<&'a Branch>,
}

impl<'a> Layout<'a> {
    fn of(statement: &'a Node) -> SsqlResult<Self> {
        let root = statement
            .as_branch()
            .ok_or_else(|| SsqlError::syntax(1, 1, "expected a query"))?;
        let top = root
            .child(Kind::Query)
            .ok_or_else(|| SsqlError::syntax(1, 1, "expected a query"))?;

        for (header, path) in root.find_all(Kind::SamplingHeader) {
            if path != TOP_QUERY && header.child(Kind::SampleClause).is_some() {
                return Err(SemanticError::NestedSample.into());
            }
        }

        let top_header = top.child(Kind::SamplingHeader);
        let sample = top_header
            .and_then(|h| h.child(Kind::SampleClause))
            .ok_or(SemanticError::UntilWithoutSample)?;

        if let Some(until) = top_header.and_then(|h| h.child(Kind::UntilClause)) {
            if until.mentions(THIS_KEYWORD) {
                return Err(SemanticError::ThisInTopLevelUntil.into());
            }
            return Ok(Self {
                top,
                sample,
                until,
                owner: None,
            });
        }

        for (query, path) in root.find_all(Kind::Query) {
            let Some(until) = query
                .child(Kind::SamplingHeader)
                .and_then(|h| h.child(Kind::UntilClause))
            else {
                continue;
            };
            if path.contains(&Kind::UntilContent) && until.mentions(THIS_KEYWORD) {
                return Err(SemanticError::UnresolvedThis.into());
            }
            return Ok(Self {
                top,
                sample,
                until,
                owner: Some(query),
            });
        }
        Err(SemanticError::SampleWithoutUntil.into())
    }
}

/// A sampled table resolved against the catalog.
#[derive(Debug, Clone)]
struct SampleTarget {
    table: String,
    alias: String,
    explicit_alias: bool,
    level_column: String,
}

fn sample_targets(sample: &Branch, catalog: &Catalog) -> SsqlResult<Vec<SampleTarget>> {
    let mut targets = Vec::new();
    for item in sample.children_of(Kind::SampleItem) {
        let key = item
            .child(Kind::SampleColumn)
            .map(Branch::code)
            .unwrap_or_default();
        for table in item.children_of(Kind::SampleTable) {
            let name = table
                .child(Kind::SampleTableName)
                .map(Branch::code)
                .unwrap_or_default();
            let unit_key = catalog
                .resolve(&name)
                .and_then(|def| def.unit_key(ident::last_component(&key)))
                .ok_or_else(|| SemanticError::NotAUnitKey {
                    key: key.clone(),
                    table: name.clone(),
                })?;
            let alias = table.child(Kind::SampleTableAlias).map(Branch::code);
            targets.push(SampleTarget {
                explicit_alias: alias.is_some(),
                alias: alias.unwrap_or_else(|| ident::last_component(&name).to_string()),
                level_column: unit_key.level_column.clone(),
                table: name,
            });
        }
    }
    Ok(targets)
}

/// Rendering rules shared by every output query.
#[derive(Clone, Copy)]
struct QueryFold<'a> {
    drop_top_with: bool,
    factor: &'a str,
    views: &'a HashMap<String, InlineView>,
    /// Replacement for `THIS` while rendering a nested `UNTIL` body.
    this: Option<&'a str>,
}

impl QueryFold<'_> {
    fn inline_view(&self, item: &Branch) -> Option<InlineView> {
        if self.views.is_empty() {
            return None;
        }
        let table = item.child(Kind::TableName)?;
        let view = self.views.get(&ident::normalize(&table.code()))?;
        Some(match item.child(Kind::TableAlias) {
            Some(alias) => view.renamed(
                alias.code(),
                item.child(Kind::ColumnAliases).map(Branch::code),
            ),
            None => view.clone(),
        })
    }
}

impl Fold for QueryFold<'_> {
    fn branch(&self, branch: &Branch, path: &[Kind]) -> SsqlResult<Emit> {
        Ok(match branch.kind {
            Kind::SamplingHeader | Kind::Terminator => Emit::Drop,
            Kind::WithClause if self.drop_top_with && path == TOP_QUERY => Emit::Drop,
            Kind::FromItem => match self.inline_view(branch) {
                Some(view) => Emit::Replace(view.to_string()),
                None => Emit::Keep,
            },
            _ => Emit::Keep,
        })
    }

    fn leaf(&self, leaf: &Lexeme, _path: &[Kind]) -> SsqlResult<Emit> {
        if leaf.is_word(FACTOR_WORD) {
            return Ok(Emit::Replace(self.factor.to_string()));
        }
        if let Some(this) = self.this {
            if leaf.is_word(THIS_KEYWORD) {
                return Ok(Emit::Replace(this.to_string()));
            }
        }
        Ok(Emit::Keep)
    }
}

/// Body of the `UNTIL` clause with `THIS` expanded for a nested clause.
fn until_body(layout: &Layout<'_>, fold: &QueryFold<'_>) -> SsqlResult<String> {
    let content = layout
        .until
        .child(Kind::UntilContent)
        .ok_or(SemanticError::SampleWithoutUntil)?;

    let this = match layout.owner {
        Some(owner) if content.mentions(THIS_KEYWORD) => Some(this_subquery(owner, fold)?),
        _ => None,
    };
    let fold = QueryFold {
        this: this.as_deref(),
        ..*fold
    };
    Ok(render_children(content, &fold, &[])?.trim().to_string())
}

/// `(SELECT * <from> <where>) AS THIS` for the first select of `owner`.
fn this_subquery(owner: &Branch, fold: &QueryFold<'_>) -> SsqlResult<String> {
    let core = owner
        .child(Kind::SelectBody)
        .and_then(|body| body.child(Kind::SelectCore))
        .ok_or(SemanticError::UnresolvedThis)?;

    let mut subquery = String::from("(SELECT *");
    for kind in [Kind::FromClause, Kind::WhereClause] {
        if let Some(clause) = core.child(kind) {
            subquery.push(' ');
            subquery.push_str(render_children(clause, fold, &[])?.trim());
        }
    }
    subquery.push_str(") AS ");
    subquery.push_str(THIS_KEYWORD);
    Ok(subquery)
}

/// Contents of a `WITH` clause after the keyword.
fn with_content(with: &Branch, fold: &QueryFold<'_>) -> SsqlResult<String> {
    let mut out = String::new();
    for child in with.children.iter().skip(1) {
        out.push_str(&render_in(
            child,
            fold,
            &[Kind::Statement, Kind::Query, Kind::WithClause],
        )?);
    }
    Ok(out.trim().to_string())
}
