//! SQL statement grammar.
//!
//! `SELECT` clauses are read in a fixed order:
//!
//! ```text
//! SELECT [DISTINCT] cols [LIMIT n] [FROM t [AS a]] [WHERE ..] [GROUP BY ..]
//!        [ORDER BY ..] [LIMIT n] [OFFSET n]
//! ```
//!
//! A WHERE body is a sub-select when lookahead sees `SELECT`, `( SELECT` or
//! `ident [NOT] IN ( SELECT`; otherwise it is an ordinary expression.

use crate::ast::{
    Column, Identity, Literal, Node, Number, SortOrder, SqlDelete, SqlDescribe, SqlInsert,
    SqlPrepare, SqlSelect, SqlShow, SqlSource, SqlStatement, SqlUpdate, SqlWhere, TokenKind,
};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::pager::{Dialect, TokenSource};

use super::Parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnList {
    Projection,
    GroupBy,
    OrderBy,
}

impl<S: TokenSource> Parser<'_, S> {
    /// Parse exactly one SQL statement, optionally followed by `;`.
    pub fn parse_sql(&mut self) -> Result<SqlStatement> {
        log::debug!("parsing SQL statement");
        let statement = match self.pager.current_kind() {
            TokenKind::Select => SqlStatement::Select(self.parse_select()?),
            TokenKind::Insert => SqlStatement::Insert(self.parse_insert()?),
            TokenKind::Update => SqlStatement::Update(self.parse_update()?),
            TokenKind::Delete => SqlStatement::Delete(self.parse_delete()?),
            TokenKind::Prepare => SqlStatement::Prepare(self.parse_prepare()?),
            TokenKind::Describe | TokenKind::Desc => {
                self.advance();
                let identity = self.expect_identity("a name to describe")?;
                SqlStatement::Describe(SqlDescribe { identity })
            }
            TokenKind::Show => {
                self.advance();
                let identity = self.expect_identity("what to show")?;
                SqlStatement::Show(SqlShow { identity })
            }
            _ => return Err(self.unexpected("a statement keyword")),
        };
        self.expect_end()?;
        log::debug!("parsed {} statement", statement.keyword());
        Ok(statement)
    }

    fn parse_select(&mut self) -> Result<SqlSelect> {
        self.expect(TokenKind::Select, "SELECT")?;

        let mut select = SqlSelect {
            distinct: self.consume_if(TokenKind::Distinct),
            ..SqlSelect::default()
        };
        select.columns = self.parse_columns(ColumnList::Projection)?;

        if self.consume_if(TokenKind::Limit) {
            select.limit = Some(self.parse_limit_value()?);
        }
        if self.consume_if(TokenKind::From) {
            select.from = Some(self.parse_source()?);
        }
        if self.consume_if(TokenKind::Where) {
            select.where_clause = Some(self.parse_where()?);
        }
        if self.consume_if(TokenKind::Group) {
            self.expect(TokenKind::By, "BY")?;
            select.group_by = self.parse_columns(ColumnList::GroupBy)?;
        }
        if self.consume_if(TokenKind::Order) {
            self.expect(TokenKind::By, "BY")?;
            select.order_by = self.parse_columns(ColumnList::OrderBy)?;
        }
        if select.limit.is_none() && self.consume_if(TokenKind::Limit) {
            select.limit = Some(self.parse_limit_value()?);
        }
        if self.consume_if(TokenKind::Offset) {
            select.offset = Some(self.parse_limit_value()?);
        }
        Ok(select)
    }

    fn parse_columns(&mut self, list: ColumnList) -> Result<Vec<Column>> {
        let mut columns = Vec::new();

        loop {
            let comment = self.parse_comment();

            let mut column = if list == ColumnList::Projection && self.check(TokenKind::Star) {
                self.advance();
                Column::star()
            } else {
                Column::new(self.parse_or()?)
            };
            column.comment = comment;

            if !column.is_star() && self.consume_if(TokenKind::As) {
                column.as_name = self.expect_identity("a column name after AS")?;
            }
            if list == ColumnList::Projection && self.consume_if(TokenKind::If) {
                column.guard = Some(self.parse_or()?);
            }
            if list == ColumnList::OrderBy {
                if self.consume_if(TokenKind::Asc) {
                    column.order = Some(SortOrder::Asc);
                } else if self.consume_if(TokenKind::Desc) {
                    column.order = Some(SortOrder::Desc);
                }
            }
            columns.push(column);

            if self.consume_if(TokenKind::Comma) {
                continue;
            }
            if !self.pager.is_clause_end() {
                return Err(self.unexpected("',' or the next clause"));
            }
            return Ok(columns);
        }
    }

    /// `-- text` before a column.
    fn parse_comment(&mut self) -> Option<String> {
        let mut comment = None;
        while self.consume_if(TokenKind::CommentMarker) {
            if self.check(TokenKind::Comment) {
                comment = Some(self.advance().text);
            }
        }
        comment
    }

    fn parse_source(&mut self) -> Result<SqlSource> {
        let name = self.expect_identity("a table name")?;
        let alias = if self.consume_if(TokenKind::As) || self.check(TokenKind::Identity) {
            Some(self.expect_identity("a table alias")?)
        } else {
            None
        };
        Ok(SqlSource { name, alias })
    }

    fn parse_where(&mut self) -> Result<SqlWhere> {
        if self.check(TokenKind::Select) {
            let select = self.nested(Self::parse_select)?;
            return Ok(SqlWhere::SubSelect(Box::new(select)));
        }
        if self.check(TokenKind::LParen) && self.pager.peek_kind() == TokenKind::Select {
            self.advance();
            let select = self.nested(Self::parse_select)?;
            self.expect(TokenKind::RParen, "')' after sub-select")?;
            return Ok(SqlWhere::SubSelect(Box::new(select)));
        }
        if let Some(negated) = self.in_subselect_ahead() {
            let operand = self.advance();
            if negated {
                self.advance();
            }
            self.expect(TokenKind::In, "IN")?;
            self.expect(TokenKind::LParen, "'('")?;
            let source = self.nested(Self::parse_select)?;
            self.expect(TokenKind::RParen, "')' after sub-select")?;
            return Ok(SqlWhere::In {
                operand: Node::Identity(Identity {
                    text: operand.text,
                    quote: operand.quote,
                }),
                negated,
                source: Box::new(source),
            });
        }
        Ok(SqlWhere::Expr(self.parse_or()?))
    }

    /// `Some(negated)` when the tokens ahead read `ident [NOT] IN ( SELECT`.
    fn in_subselect_ahead(&mut self) -> Option<bool> {
        if !self.check(TokenKind::Identity) {
            return None;
        }
        let negated = self.pager.peek_kind() == TokenKind::Not;
        let skip = usize::from(negated);
        let shape = [TokenKind::In, TokenKind::LParen, TokenKind::Select];
        let matches = shape
            .iter()
            .enumerate()
            .all(|(i, kind)| self.pager.peek_nth(1 + skip + i).kind == *kind);
        matches.then_some(negated)
    }

    fn parse_insert(&mut self) -> Result<SqlInsert> {
        self.expect(TokenKind::Insert, "INSERT")?;
        self.expect(TokenKind::Into, "INTO")?;
        let table = self.expect_identity("a table name")?;

        self.expect(TokenKind::LParen, "'(' before the field list")?;
        let mut columns = vec![self.expect_identity("a field name")?];
        while self.consume_if(TokenKind::Comma) {
            columns.push(self.expect_identity("a field name")?);
        }
        self.expect(TokenKind::RParen, "')' after the field list")?;

        self.expect(TokenKind::Values, "VALUES")?;
        let mut rows = Vec::new();
        loop {
            let row = self.parse_value_row()?;
            if row.len() != columns.len() {
                return Err(Error::ValueCountMismatch {
                    want: columns.len(),
                    got: row.len(),
                });
            }
            rows.push(row);
            if !self.consume_if(TokenKind::Comma) {
                break;
            }
        }

        Ok(SqlInsert {
            table,
            columns,
            rows,
        })
    }

    /// `( literal {, literal} )` holding only strings and integers.
    fn parse_value_row(&mut self) -> Result<Vec<Node>> {
        self.expect(TokenKind::LParen, "'(' before a row of values")?;
        let mut row = Vec::new();
        loop {
            let node = match self.pager.current_kind() {
                TokenKind::String | TokenKind::Number => self.parse_primary()?,
                _ => return Err(self.unexpected("a string or integer value")),
            };
            if matches!(node, Node::Literal(Literal::Number(Number::Decimal(_)))) {
                return Err(Error::InvalidNumber(node.to_string()));
            }
            row.push(node);
            if !self.consume_if(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')' after a row of values")?;
        Ok(row)
    }

    fn parse_update(&mut self) -> Result<SqlUpdate> {
        self.expect(TokenKind::Update, "UPDATE")?;
        let table = self.expect_identity("a table name")?;
        self.expect(TokenKind::Set, "SET")?;

        let mut values = Vec::new();
        loop {
            let name = self.expect_identity("a column name")?;
            self.expect(TokenKind::Equal, "'='")?;
            values.push((name, self.parse_or()?));
            if !self.consume_if(TokenKind::Comma) {
                break;
            }
        }

        let where_clause = if self.consume_if(TokenKind::Where) {
            Some(self.parse_or()?)
        } else {
            None
        };
        let limit = if self.consume_if(TokenKind::Limit) {
            Some(self.parse_limit_value()?)
        } else {
            None
        };

        Ok(SqlUpdate {
            table,
            values,
            where_clause,
            limit,
        })
    }

    fn parse_delete(&mut self) -> Result<SqlDelete> {
        self.expect(TokenKind::Delete, "DELETE")?;
        self.expect(TokenKind::From, "FROM")?;
        let table = self.expect_identity("a table name")?;

        let where_clause = if self.consume_if(TokenKind::Where) {
            Some(self.parse_or()?)
        } else {
            None
        };
        let limit = if self.consume_if(TokenKind::Limit) {
            Some(self.parse_limit_value()?)
        } else {
            None
        };

        Ok(SqlDelete {
            table,
            where_clause,
            limit,
        })
    }

    /// `PREPARE name FROM '<sql>'`; the quoted text is parsed as a nested
    /// statement with the same registry and settings.
    fn parse_prepare(&mut self) -> Result<SqlPrepare> {
        self.expect(TokenKind::Prepare, "PREPARE")?;
        let name = self.expect_identity("a statement name")?;
        self.expect(TokenKind::From, "FROM")?;
        let text = self.expect(TokenKind::String, "a quoted statement")?.text;

        let mut inner =
            Parser::with_options(Lexer::new(&text), Dialect::Sql, self.registry, self.config);
        inner.depth = self.depth;
        let statement = inner.nested(|parser| parser.parse_sql())?;

        Ok(SqlPrepare {
            name,
            statement: Box::new(statement),
        })
    }
}
