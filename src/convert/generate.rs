//! Second conversion pass: emit the statement sequence.
//!
//! Generation only reads the inspection and the parse tree, so compiling the
//! same statement twice yields the same text.

use crate::catalog::CATALOG_TABLE;
use crate::error::SsqlResult;
use crate::sampling;
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::ident;
use crate::sql::token::{Token, TokenStream};
use crate::syntax::lexer::LexKind;
use crate::syntax::tree::{render, render_in, Branch, Emit, Fold, Kind, Node};

use super::inspect::TableInspection;

/// Column summing the levels of a multi-key table.
pub const LEVEL_SUM_COLUMN: &str = "_LEVEL_SUM";

/// Alias of the innermost migration layer.
const HASH_INLINE: &str = "_HASH_INLINE";

/// Alias of the middle migration layer.
const LEVEL_INLINE: &str = "_LEVEL_INLINE";

/// Width of the catalog's text columns.
const CATALOG_TEXT_WIDTH: u32 = 250;

/// Statements that turn a `CREATE TABLE ... SAMPLEKEY` into a sampling table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionPlan {
    pub table_name: String,
    pub staging_create: String,
    pub catalog_create: String,
    pub catalog_insert: String,
    pub migration: String,
    /// Clustering and index statements run after the data is in place.
    pub post: Vec<String>,
}

impl ConversionPlan {
    /// All statements in execution order.
    pub fn statements(&self) -> Vec<String> {
        let mut all = vec![
            self.staging_create.clone(),
            self.catalog_create.clone(),
            self.catalog_insert.clone(),
            self.migration.clone(),
        ];
        all.extend(self.post.iter().cloned());
        all
    }
}

/// Build the conversion statements.
pub fn generate(
    inspection: &TableInspection,
    statement: &Node,
    dialect: Dialect,
) -> SsqlResult<ConversionPlan> {
    Ok(ConversionPlan {
        table_name: inspection.table_name.clone(),
        staging_create: staging_create(inspection, statement, dialect)?,
        catalog_create: catalog_create(dialect),
        catalog_insert: catalog_insert(inspection, dialect),
        migration: migration(inspection, dialect)?,
        post: post_statements(inspection, dialect),
    })
}

/// Level columns followed by declared sort keys, used for ordering the table.
fn sort_list(inspection: &TableInspection) -> Vec<String> {
    let levels = inspection.level_columns();
    let mut list = Vec::with_capacity(levels.len() + inspection.sort_keys.len() + 1);
    if inspection.has_level_sum() {
        list.push(LEVEL_SUM_COLUMN.to_string());
    }
    list.extend(levels);
    list.extend(inspection.sort_keys.iter().cloned());
    list
}

fn ident_list(names: &[String]) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.join(
        names.iter().map(|n| TokenStream::from(Token::Ident(n.clone()))),
        &[Token::Comma],
    );
    ts
}

// =============================================================================
// Staging CREATE TABLE
// =============================================================================

/// Strips the sampling extensions out of the input statement.
struct StagingFold<'a> {
    level_decls: &'a str,
}

impl StagingFold<'_> {
    fn table_body(&self, body: &Branch, path: &[Kind]) -> SsqlResult<String> {
        let mut path = path.to_vec();
        path.push(Kind::TableBody);

        let mut kept = Vec::new();
        for element in body.children_of(Kind::TableElement) {
            let extension = element.child(Kind::SampleKeyClause).is_some()
                || element.child(Kind::SortKeyClause).is_some();
            if extension {
                continue;
            }
            let mut text = String::new();
            for child in &element.children {
                if child.as_leaf().is_some_and(|l| l.is(LexKind::Comma)) {
                    continue;
                }
                let mut child_path = path.clone();
                child_path.push(Kind::TableElement);
                text.push_str(&render_in(child, self, &child_path)?);
            }
            kept.push(text);
        }

        let close_trivia = body
            .children
            .last()
            .and_then(Node::as_leaf)
            .map(|l| l.trivia.as_str())
            .unwrap_or("");

        let mut out = String::from("(");
        let mut elements = kept.into_iter();
        match elements.next() {
            Some(first) => {
                let code = first.trim_start();
                out.push_str(&first[..first.len() - code.len()]);
                out.push_str(self.level_decls);
                out.push_str(", ");
                out.push_str(code);
            }
            None => out.push_str(self.level_decls),
        }
        for element in elements {
            out.push(',');
            out.push_str(&element);
        }
        out.push_str(close_trivia);
        out.push(')');
        Ok(out)
    }
}

impl Fold for StagingFold<'_> {
    fn branch(&self, branch: &Branch, path: &[Kind]) -> SsqlResult<Emit> {
        Ok(match branch.kind {
            Kind::TableBody => Emit::Replace(self.table_body(branch, path)?),
            Kind::SortKeyClause | Kind::SourceClause | Kind::Terminator => Emit::Drop,
            Kind::ColumnOption
                if branch.first_leaf().is_some_and(|l| l.is_word("SORTKEY")) =>
            {
                Emit::Drop
            }
            _ => Emit::Keep,
        })
    }
}

fn staging_create(
    inspection: &TableInspection,
    statement: &Node,
    dialect: Dialect,
) -> SsqlResult<String> {
    let mut decls = Vec::new();
    if inspection.has_level_sum() {
        decls.push(LEVEL_SUM_COLUMN.to_string());
    }
    decls.extend(inspection.level_columns());
    let mut level_decls = TokenStream::new();
    level_decls.join(
        decls.iter().map(|name| {
            let mut ts = TokenStream::new();
            ts.ident(name.clone()).space().push(Token::SmallInt);
            ts
        }),
        &[Token::Comma, Token::Space],
    );
    let level_decls = level_decls.serialize(dialect);

    let fold = StagingFold {
        level_decls: &level_decls,
    };
    let mut sql = render(statement, &fold)?.trim().to_string();

    if dialect.supports_sort_key_clause() {
        let mut ts = TokenStream::new();
        ts.newline()
            .push(Token::SortKey)
            .space()
            .lparen()
            .append(&ident_list(&sort_list(inspection)))
            .rparen();
        sql.push_str(&ts.serialize(dialect));
    }
    Ok(sql)
}

// =============================================================================
// Catalog
// =============================================================================

fn catalog_create(dialect: Dialect) -> String {
    let text = || Token::Varchar(CATALOG_TEXT_WIDTH);
    let columns = [
        ("TABLE_NAME", text()),
        ("KEY_NAME", text()),
        ("KEY_ORDER", Token::Integer),
        ("LEVEL_NAME", text()),
        ("BASE_EXPR", text()),
        ("BASE_TYPE", text()),
    ];

    let mut ts = TokenStream::new();
    ts.push(Token::Create)
        .space()
        .push(Token::Table)
        .space()
        .ident(CATALOG_TABLE)
        .space()
        .lparen()
        .newline();
    for (name, ty) in columns {
        ts.indent(1).ident(name).space().push(ty).comma().newline();
    }
    ts.indent(1)
        .push(Token::Primary)
        .space()
        .push(Token::Key)
        .space()
        .lparen()
        .ident("TABLE_NAME")
        .comma()
        .ident("KEY_ORDER")
        .rparen()
        .newline()
        .rparen()
        .newline();
    ts.serialize(dialect)
}

/// One catalog row per unit key. `BASE_TYPE` lists the declared type of each
/// component; a component naming no declared column contributes an empty
/// entry. Key expressions are always column lists in this grammar, so there
/// is no anonymous expression whose type would fall back to a sole column.
fn catalog_insert(inspection: &TableInspection, dialect: Dialect) -> String {
    let rows = inspection.unit_keys.iter().enumerate().map(|(i, key)| {
        let types: Vec<&str> = key
            .components
            .iter()
            .map(|c| inspection.column_type(c).unwrap_or(""))
            .collect();
        let mut row = TokenStream::new();
        row.lparen()
            .push(Token::LitString(inspection.table_name.clone()))
            .comma()
            .push(Token::LitString(key.name.clone()))
            .comma()
            .push(Token::LitInt(i as i64 + 1))
            .comma()
            .push(Token::LitString(key.level_column()))
            .comma()
            .push(Token::LitString(key.components.join(",")))
            .comma()
            .push(Token::LitString(types.join(",")))
            .rparen();
        row
    });

    let mut ts = TokenStream::new();
    ts.push(Token::Insert)
        .space()
        .push(Token::Into)
        .space()
        .ident(CATALOG_TABLE)
        .space()
        .push(Token::Values)
        .newline()
        .join(rows, &[Token::Comma, Token::Newline]);
    ts.serialize(dialect)
}

// =============================================================================
// Data migration
// =============================================================================

/// `indent item,\n` for every item but the last, which ends in `\n` only.
fn select_items(items: Vec<TokenStream>, indent: usize) -> TokenStream {
    let mut ts = TokenStream::new();
    let count = items.len();
    for (i, item) in items.into_iter().enumerate() {
        ts.indent(indent).append(&item);
        if i + 1 < count {
            ts.comma();
        }
        ts.newline();
    }
    ts
}

fn aliased(expr: TokenStream, alias: &str) -> TokenStream {
    let mut ts = expr;
    ts.space().push(Token::As).space().ident(alias);
    ts
}

fn column_items(inspection: &TableInspection) -> impl Iterator<Item = TokenStream> + '_ {
    inspection
        .columns
        .iter()
        .map(|c| TokenStream::from(Token::Ident(c.name.clone())))
}

fn migration(inspection: &TableInspection, dialect: Dialect) -> SsqlResult<String> {
    let levels = inspection.level_columns();

    // innermost: hashes
    let mut hash_items = Vec::new();
    for (ordinal, key) in inspection.unit_keys.iter().enumerate() {
        let expr = sampling::hash_sql(ordinal, &key.components)?;
        hash_items.push(aliased(expr, &key.hash_column()));
    }
    hash_items.extend(column_items(inspection));

    // middle: levels
    let mut level_items: Vec<TokenStream> = inspection
        .unit_keys
        .iter()
        .map(|key| aliased(sampling::level_sql(&key.hash_column()), &key.level_column()))
        .collect();
    level_items.extend(column_items(inspection));

    // outer: level sum, levels, columns
    let mut outer_items = Vec::new();
    if inspection.has_level_sum() {
        let mut sum = TokenStream::new();
        sum.join(
            levels.iter().map(|l| TokenStream::from(Token::Ident(l.clone()))),
            &[Token::Plus],
        );
        outer_items.push(aliased(sum, LEVEL_SUM_COLUMN));
    }
    outer_items.extend(levels.iter().map(|l| TokenStream::from(Token::Ident(l.clone()))));
    outer_items.extend(column_items(inspection));

    let mut ts = TokenStream::new();
    ts.push(Token::Insert)
        .space()
        .push(Token::Into)
        .space()
        .ident(inspection.table_name.clone())
        .newline()
        .indent(1)
        .push(Token::Select)
        .newline()
        .append(&select_items(outer_items, 1))
        .indent(1)
        .push(Token::From)
        .space()
        .lparen()
        .newline()
        .indent(2)
        .push(Token::Select)
        .newline()
        .append(&select_items(level_items, 2))
        .indent(2)
        .push(Token::From)
        .space()
        .lparen()
        .newline()
        .indent(3)
        .push(Token::Select)
        .newline()
        .append(&select_items(hash_items, 3))
        .indent(3)
        .push(Token::From)
        .space()
        .ident(inspection.source_table.clone())
        .newline()
        .indent(2)
        .rparen()
        .space()
        .push(Token::As)
        .space()
        .ident(HASH_INLINE)
        .newline()
        .indent(1)
        .rparen()
        .space()
        .push(Token::As)
        .space()
        .ident(LEVEL_INLINE)
        .newline();
    Ok(ts.serialize(dialect))
}

// =============================================================================
// Post-creation
// =============================================================================

fn create_index(name: &str, table: &str, columns: &[String]) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Create)
        .space()
        .push(Token::Index)
        .space()
        .ident(name)
        .space()
        .push(Token::On)
        .space()
        .ident(table)
        .lparen()
        .append(&ident_list(columns))
        .rparen();
    ts
}

fn post_statements(inspection: &TableInspection, dialect: Dialect) -> Vec<String> {
    if !dialect.clusters_sampling_table() {
        return Vec::new();
    }
    let table = inspection.table_name.as_str();
    let cluster_index = ident::prefixed(ident::last_component(table), "cidx_");

    let mut statements = vec![create_index(&cluster_index, table, &sort_list(inspection))];

    let mut cluster = TokenStream::new();
    cluster
        .push(Token::Cluster)
        .space()
        .ident(table)
        .space()
        .push(Token::Using)
        .space()
        .ident(cluster_index.clone());
    statements.push(cluster);

    if inspection.has_level_sum() {
        for level in inspection.level_columns() {
            let index = ident::prefixed(&level, "lidx");
            statements.push(create_index(&index, table, std::slice::from_ref(&level)));
        }
    }
    statements.iter().map(|ts| ts.serialize(dialect)).collect()
}
