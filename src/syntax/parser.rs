//! Recursive-descent parser for the sampling grammar.
//!
//! Only the parts of SQL that the rewrites touch get their own branches:
//! query structure, FROM items, WHERE clauses and the sampling extensions.
//! Everything else is kept as flat leaves, with parenthesized groups nested
//! so subqueries anywhere in an expression are recognized.

use super::lexer::{LexKind, Lexed, Lexeme};
use super::tree::{Kind, Node};
use crate::error::{SemanticError, SsqlError, SsqlResult};

/// Words that end the projection list of a SELECT.
const CORE_CLAUSES: &[&str] = &[
    "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "INTERSECT",
    "EXCEPT", "WINDOW", "FETCH", "QUALIFY", "FOR",
];

/// Words that end a FROM or WHERE clause.
const AFTER_FROM: &[&str] = &[
    "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "INTERSECT", "EXCEPT",
    "WINDOW", "FETCH", "QUALIFY", "FOR",
];

/// Words that end a select core.
const CORE_END: &[&str] = &[
    "UNION", "INTERSECT", "EXCEPT", "ORDER", "LIMIT", "OFFSET", "FETCH", "FOR",
];

const JOIN_WORDS: &[&str] = &[
    "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "LATERAL",
];

const JOIN_CONDITION: &[&str] = &["ON", "USING"];

const CONSTRAINT_WORDS: &[&str] = &[
    "CONSTRAINT", "PRIMARY", "UNIQUE", "FOREIGN", "CHECK", "EXCLUDE", "LIKE", "INDEX", "KEY",
];

/// Words that start a column option.
const OPTION_WORDS: &[&str] = &[
    "NOT", "NULL", "DEFAULT", "PRIMARY", "UNIQUE", "REFERENCES", "CHECK", "CONSTRAINT",
    "COLLATE", "GENERATED", "IDENTITY", "ENCODE", "DISTKEY", "SORTKEY", "AUTO_INCREMENT",
    "COMMENT",
];

const SORT_KEY_STYLES: &[&str] = &["COMPOUND", "INTERLEAVED"];

/// Parse a query statement: `[WITH ...] [SELECT SAMPLE(...) UNTIL(...)] select [;]`.
pub fn parse_query(lexed: &Lexed) -> SsqlResult<Node> {
    let mut parser = Parser::new(lexed);
    let query = parser.query()?;
    parser.finish(query)
}

/// Parse a `CREATE TABLE` statement with the sampling extensions.
pub fn parse_create_table(lexed: &Lexed) -> SsqlResult<Node> {
    let mut parser = Parser::new(lexed);
    if !parser.at_word("CREATE") {
        return Err(parser.expected("CREATE"));
    }
    let create = parser.create_table()?;
    parser.finish(create)
}

struct Parser<'a> {
    lexed: &'a Lexed,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(lexed: &'a Lexed) -> Self {
        Self { lexed, pos: 0 }
    }

    // =========================================================================
    // Cursor
    // =========================================================================

    fn peek(&self) -> Option<&'a Lexeme> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Lexeme> {
        self.lexed.lexemes.get(self.pos + offset)
    }

    fn at(&self, kind: LexKind) -> bool {
        self.peek().is_some_and(|l| l.is(kind))
    }

    fn at_word(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|l| l.is_word(keyword))
    }

    fn at_any_word(&self, keywords: &[&str]) -> bool {
        self.peek().is_some_and(|l| l.is_any_word(keywords))
    }

    fn bump(&mut self) -> Node {
        let lexeme = self.lexed.lexemes[self.pos].clone();
        self.pos += 1;
        Node::Leaf(lexeme)
    }

    fn expect(&mut self, kind: LexKind, what: &str) -> SsqlResult<Node> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.expected(what))
        }
    }

    fn expect_word(&mut self, keyword: &str) -> SsqlResult<Node> {
        if self.at_word(keyword) {
            Ok(self.bump())
        } else {
            Err(self.expected(keyword))
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn error_at(&self, message: String) -> SsqlError {
        match self.peek() {
            Some(l) => SsqlError::syntax(l.line, l.column, message),
            None => SsqlError::syntax(self.lexed.end_line, self.lexed.end_column, message),
        }
    }

    fn expected(&self, what: &str) -> SsqlError {
        let message = match self.peek() {
            Some(l) => format!("expected {what} but found '{}'", l.text),
            None => format!("expected {what} but reached end of input"),
        };
        self.error_at(message)
    }

    fn unexpected(&self) -> SsqlError {
        let message = match self.peek() {
            Some(l) => format!("unexpected '{}'", l.text),
            None => "unexpected end of input".to_string(),
        };
        self.error_at(message)
    }

    fn finish(&mut self, body: Node) -> SsqlResult<Node> {
        let mut children = vec![body];
        if self.at(LexKind::Semicolon) {
            children.push(Node::branch(Kind::Terminator, vec![self.bump()]));
            if self.peek().is_some() {
                return Err(SemanticError::MultipleStatements.into());
            }
        }
        if self.peek().is_some() {
            return Err(self.unexpected());
        }
        Ok(Node::branch(Kind::Statement, children))
    }

    // =========================================================================
    // Shared pieces
    // =========================================================================

    /// `SAMPLE (` or `UNTIL (` at the cursor offset.
    fn at_sampling_clause(&self, offset: usize) -> bool {
        self.peek_at(offset)
            .is_some_and(|l| l.is_any_word(&["SAMPLE", "UNTIL"]))
            && self.peek_at(offset + 1).is_some_and(|l| l.is(LexKind::LParen))
    }

    fn misplaced_sampling_clause(&self) -> SsqlError {
        let word = self.peek().map(|l| l.text.to_uppercase()).unwrap_or_default();
        self.error_at(format!(
            "{word} clause must directly follow the first SELECT of a query"
        ))
    }

    /// Consume lexemes and parenthesized groups until `stop` matches, a
    /// closing parenthesis, a semicolon or the end of input.
    fn generic_until(
        &mut self,
        out: &mut Vec<Node>,
        stop: &dyn Fn(&Lexeme) -> bool,
    ) -> SsqlResult<()> {
        while let Some(lex) = self.peek() {
            if lex.is(LexKind::RParen) || lex.is(LexKind::Semicolon) || stop(lex) {
                break;
            }
            if lex.is(LexKind::LParen) {
                out.push(self.parens()?);
                continue;
            }
            if self.at_sampling_clause(0) {
                return Err(self.misplaced_sampling_clause());
            }
            out.push(self.bump());
        }
        Ok(())
    }

    /// `( ... )`, parsed as a subquery when it starts with SELECT or WITH.
    fn parens(&mut self) -> SsqlResult<Node> {
        let open = self.expect(LexKind::LParen, "'('")?;
        if self.at_any_word(&["SELECT", "WITH"]) {
            let query = self.query()?;
            let close = self.expect(LexKind::RParen, "')'")?;
            return Ok(Node::branch(Kind::Subquery, vec![open, query, close]));
        }
        let mut children = vec![open];
        self.generic_until(&mut children, &|_| false)?;
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::Parens, children))
    }

    /// `name { . name }`
    fn qualified_name(&mut self, what: &str) -> SsqlResult<Vec<Node>> {
        if !self.peek().is_some_and(Lexeme::is_name) {
            return Err(self.expected(what));
        }
        let mut parts = vec![self.bump()];
        while self.at(LexKind::Period) && self.peek_at(1).is_some_and(Lexeme::is_name) {
            parts.push(self.bump());
            parts.push(self.bump());
        }
        Ok(parts)
    }

    fn name_branch(&mut self, kind: Kind, what: &str) -> SsqlResult<Node> {
        if !self.peek().is_some_and(Lexeme::is_name) {
            return Err(self.expected(what));
        }
        Ok(Node::branch(kind, vec![self.bump()]))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn query(&mut self) -> SsqlResult<Node> {
        let mut children = Vec::new();
        if self.at_word("WITH") {
            children.push(self.with_clause()?);
        }
        if self.at_word("SELECT") && self.at_sampling_clause(1) {
            children.push(self.sampling_header()?);
        }
        children.push(self.select_body()?);
        Ok(Node::branch(Kind::Query, children))
    }

    fn with_clause(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump()];
        self.generic_until(&mut children, &|l| l.is_word("SELECT"))?;
        if children.len() == 1 {
            return Err(self.expected("a common table expression"));
        }
        Ok(Node::branch(Kind::WithClause, children))
    }

    fn sampling_header(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump()];
        loop {
            if self.at_word("SAMPLE") && self.at_sampling_clause(0) {
                children.push(self.sample_clause()?);
            } else if self.at_word("UNTIL") && self.at_sampling_clause(0) {
                children.push(self.until_clause()?);
            } else {
                break;
            }
        }
        if !self.at_word("SELECT") && !self.at(LexKind::LParen) {
            return Err(self.expected("SELECT after the sampling clauses"));
        }
        Ok(Node::branch(Kind::SamplingHeader, children))
    }

    fn sample_clause(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump(), self.expect(LexKind::LParen, "'('")?];
        loop {
            children.push(self.sample_item()?);
            if self.at(LexKind::Comma) {
                children.push(self.bump());
                continue;
            }
            break;
        }
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::SampleClause, children))
    }

    /// Whether `name [. name ...] ->` starts at the cursor offset.
    fn starts_sample_item(&self, offset: usize) -> bool {
        let mut i = offset;
        if !self.peek_at(i).is_some_and(Lexeme::is_name) {
            return false;
        }
        i += 1;
        while self.peek_at(i).is_some_and(|l| l.is(LexKind::Period))
            && self.peek_at(i + 1).is_some_and(Lexeme::is_name)
        {
            i += 2;
        }
        self.peek_at(i).is_some_and(|l| l.is(LexKind::Arrow))
    }

    fn sample_item(&mut self) -> SsqlResult<Node> {
        let column = self.qualified_name("a sample key")?;
        let mut children = vec![Node::branch(Kind::SampleColumn, column)];
        children.push(self.expect(LexKind::Arrow, "'->'")?);
        children.push(self.sample_table()?);
        while self.at(LexKind::Comma) && !self.starts_sample_item(1) {
            children.push(self.bump());
            children.push(self.sample_table()?);
        }
        Ok(Node::branch(Kind::SampleItem, children))
    }

    fn sample_table(&mut self) -> SsqlResult<Node> {
        let name = self.qualified_name("a sample table name")?;
        let mut children = vec![Node::branch(Kind::SampleTableName, name)];
        if self.at_word("AS") {
            children.push(self.bump());
            children.push(self.name_branch(Kind::SampleTableAlias, "a table alias")?);
        } else if self.peek().is_some_and(Lexeme::is_name) {
            children.push(self.name_branch(Kind::SampleTableAlias, "a table alias")?);
        }
        Ok(Node::branch(Kind::SampleTable, children))
    }

    fn until_clause(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump(), self.expect(LexKind::LParen, "'('")?];
        let mut content = Vec::new();
        self.generic_until(&mut content, &|_| false)?;
        if content.is_empty() {
            return Err(self.expected("a stopping condition"));
        }
        children.push(Node::branch(Kind::UntilContent, content));
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::UntilClause, children))
    }

    fn select_body(&mut self) -> SsqlResult<Node> {
        if !self.at_word("SELECT") && !self.at(LexKind::LParen) {
            return Err(self.expected("SELECT"));
        }
        let mut children = Vec::new();
        while let Some(lex) = self.peek() {
            match lex.kind {
                LexKind::RParen | LexKind::Semicolon => break,
                LexKind::LParen => children.push(self.parens()?),
                _ if lex.is_word("SELECT") => {
                    if self.at_sampling_clause(1) {
                        self.pos += 1;
                        return Err(self.misplaced_sampling_clause());
                    }
                    children.push(self.select_core()?);
                }
                _ if self.at_sampling_clause(0) => return Err(self.misplaced_sampling_clause()),
                _ => children.push(self.bump()),
            }
        }
        Ok(Node::branch(Kind::SelectBody, children))
    }

    fn select_core(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump()];
        self.generic_until(&mut children, &|l| l.is_any_word(CORE_CLAUSES))?;
        if self.at_word("FROM") {
            children.push(self.from_clause()?);
        }
        if self.at_word("WHERE") {
            let mut clause = vec![self.bump()];
            self.generic_until(&mut clause, &|l| {
                l.is_any_word(AFTER_FROM) && !l.is_word("WHERE")
            })?;
            children.push(Node::branch(Kind::WhereClause, clause));
        }
        self.generic_until(&mut children, &|l| l.is_any_word(CORE_END))?;
        Ok(Node::branch(Kind::SelectCore, children))
    }

    fn from_clause(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump()];
        while let Some(lex) = self.peek() {
            if lex.is(LexKind::RParen) || lex.is(LexKind::Semicolon) || lex.is_any_word(AFTER_FROM)
            {
                break;
            }
            if lex.is(LexKind::Comma) || lex.is_any_word(JOIN_WORDS) {
                children.push(self.bump());
            } else if lex.is_any_word(JOIN_CONDITION) {
                children.push(self.bump());
                self.generic_until(&mut children, &|l| {
                    l.is(LexKind::Comma) || l.is_any_word(JOIN_WORDS) || l.is_any_word(AFTER_FROM)
                })?;
            } else {
                children.push(self.from_item()?);
            }
        }
        if children.len() == 1 {
            return Err(self.expected("a table reference"));
        }
        Ok(Node::branch(Kind::FromClause, children))
    }

    fn is_alias_candidate(lex: &Lexeme) -> bool {
        match lex.kind {
            LexKind::Quoted => true,
            LexKind::Word => {
                !lex.is_any_word(JOIN_WORDS)
                    && !lex.is_any_word(JOIN_CONDITION)
                    && !lex.is_any_word(AFTER_FROM)
            }
            _ => false,
        }
    }

    fn from_item(&mut self) -> SsqlResult<Node> {
        let mut children = Vec::new();
        match self.peek() {
            Some(lex) if lex.is(LexKind::LParen) => children.push(self.parens()?),
            Some(lex) if lex.is_name() => {
                let name = self.qualified_name("a table name")?;
                if self.at(LexKind::LParen) {
                    // table function call
                    children.extend(name);
                    children.push(self.parens()?);
                } else {
                    children.push(Node::branch(Kind::TableName, name));
                }
            }
            Some(_) => {
                if self.at_sampling_clause(0) {
                    return Err(self.misplaced_sampling_clause());
                }
                children.push(self.bump());
                return Ok(Node::branch(Kind::FromItem, children));
            }
            None => return Err(self.expected("a table reference")),
        }

        let mut aliased = false;
        if self.at_word("AS") {
            children.push(self.bump());
            children.push(self.name_branch(Kind::TableAlias, "a table alias")?);
            aliased = true;
        } else if self.peek().is_some_and(Self::is_alias_candidate) {
            children.push(self.name_branch(Kind::TableAlias, "a table alias")?);
            aliased = true;
        }
        if aliased && self.at(LexKind::LParen) {
            let mut columns = self.parens()?;
            if let Node::Branch(b) = &mut columns {
                b.kind = Kind::ColumnAliases;
            }
            children.push(columns);
        }
        Ok(Node::branch(Kind::FromItem, children))
    }

    // =========================================================================
    // CREATE TABLE
    // =========================================================================

    fn create_table(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump()];
        while !self.at_word("TABLE") {
            if !self.at(LexKind::Word) {
                return Err(self.expected("TABLE"));
            }
            children.push(self.bump());
        }
        children.push(self.bump());
        if self.at_word("IF") {
            children.push(self.bump());
            children.push(self.expect_word("NOT")?);
            children.push(self.expect_word("EXISTS")?);
        }
        let name = self.qualified_name("a table name")?;
        children.push(Node::branch(Kind::CreateTableName, name));
        children.push(self.table_body()?);

        while let Some(lex) = self.peek() {
            if lex.is(LexKind::Semicolon) {
                break;
            }
            if self.at_sort_key() {
                children.push(self.sort_key_clause()?);
            } else if lex.is_word("FROM") {
                let mut source = vec![self.bump()];
                let name = self.qualified_name("a source table name")?;
                source.push(Node::branch(Kind::SourceTableName, name));
                children.push(Node::branch(Kind::SourceClause, source));
            } else if lex.is(LexKind::LParen) {
                children.push(self.parens()?);
            } else if lex.is(LexKind::RParen) {
                return Err(self.unexpected());
            } else {
                children.push(self.bump());
            }
        }
        Ok(Node::branch(Kind::CreateTable, children))
    }

    fn at_sort_key(&self) -> bool {
        self.at_word("SORTKEY")
            || (self.at_any_word(SORT_KEY_STYLES)
                && self.peek_at(1).is_some_and(|l| l.is_word("SORTKEY")))
    }

    fn table_body(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.expect(LexKind::LParen, "'('")?];
        let mut comma = None;
        loop {
            children.push(self.table_element(comma.take())?);
            if self.at(LexKind::Comma) {
                comma = Some(self.bump());
                continue;
            }
            break;
        }
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::TableBody, children))
    }

    fn table_element(&mut self, comma: Option<Node>) -> SsqlResult<Node> {
        let mut children: Vec<Node> = comma.into_iter().collect();
        let leading = children.len();
        if self.at_word("SAMPLEKEY") {
            children.push(self.sample_key_clause()?);
        } else if self.at_sort_key() {
            children.push(self.sort_key_clause()?);
        } else if self.at_any_word(CONSTRAINT_WORDS) {
            self.generic_until(&mut children, &|l| l.is(LexKind::Comma))?;
        } else {
            children.push(self.column_def()?);
        }
        if children.len() == leading {
            return Err(self.expected("a column definition"));
        }
        if !self.at(LexKind::Comma) && !self.at(LexKind::RParen) {
            return Err(self.unexpected());
        }
        Ok(Node::branch(Kind::TableElement, children))
    }

    fn column_def(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.name_branch(Kind::ColumnName, "a column name")?];
        let mut data_type = Vec::new();
        self.generic_until(&mut data_type, &|l| {
            l.is(LexKind::Comma) || l.is_any_word(OPTION_WORDS)
        })?;
        if data_type.is_empty() {
            return Err(self.expected("a data type"));
        }
        children.push(Node::branch(Kind::DataType, data_type));
        while self.at_any_word(OPTION_WORDS) {
            let mut option = vec![self.bump()];
            self.generic_until(&mut option, &|l| {
                l.is(LexKind::Comma) || l.is_any_word(OPTION_WORDS)
            })?;
            children.push(Node::branch(Kind::ColumnOption, option));
        }
        Ok(Node::branch(Kind::ColumnDef, children))
    }

    fn sample_key_clause(&mut self) -> SsqlResult<Node> {
        let mut children = vec![self.bump(), self.expect(LexKind::LParen, "'('")?];
        loop {
            children.push(self.sample_key_item()?);
            if self.at(LexKind::Comma) {
                children.push(self.bump());
                continue;
            }
            break;
        }
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::SampleKeyClause, children))
    }

    fn sample_key_item(&mut self) -> SsqlResult<Node> {
        let mut children = Vec::new();
        let composite = self.at(LexKind::LParen);
        if composite {
            let mut expr = vec![self.bump()];
            loop {
                expr.push(self.name_branch(Kind::ColumnName, "a column name")?);
                if self.at(LexKind::Comma) {
                    expr.push(self.bump());
                    continue;
                }
                break;
            }
            expr.push(self.expect(LexKind::RParen, "')'")?);
            children.push(Node::branch(Kind::KeyExpr, expr));
        } else {
            let column = self.name_branch(Kind::ColumnName, "a sample key column")?;
            children.push(Node::branch(Kind::KeyExpr, vec![column]));
        }
        if self.at_word("AS") {
            children.push(self.bump());
            children.push(self.name_branch(Kind::KeyAlias, "a sample key alias")?);
        } else if composite {
            return Err(self.expected("AS and an alias for the composite sample key"));
        }
        Ok(Node::branch(Kind::SampleKeyItem, children))
    }

    fn sort_key_clause(&mut self) -> SsqlResult<Node> {
        let mut children = Vec::new();
        if self.at_any_word(SORT_KEY_STYLES) {
            children.push(self.bump());
        }
        children.push(self.expect_word("SORTKEY")?);
        children.push(self.expect(LexKind::LParen, "'('")?);
        loop {
            children.push(self.name_branch(Kind::ColumnName, "a sort key column")?);
            if self.at(LexKind::Comma) {
                children.push(self.bump());
                continue;
            }
            break;
        }
        children.push(self.expect(LexKind::RParen, "')'")?);
        Ok(Node::branch(Kind::SortKeyClause, children))
    }
}
