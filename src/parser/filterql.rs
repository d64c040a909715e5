//! FilterQL grammar.
//!
//! ```text
//! statement -> (FILTER | SELECT * [FROM name] WHERE) body clauses
//! body      -> [NOT] (AND | OR) group | item
//! group     -> ( [item {, item}] )
//! item      -> [NOT] (AND | OR) group | [NOT] INCLUDE name | or
//! clauses   -> { FROM name | LIMIT n | ALIAS name | WITH {json} }
//! ```

use std::collections::HashMap;

use crate::ast::{BoolOp, FilterExpr, FilterStatement, Filters, IncludeRef, TokenKind};
use crate::error::{Error, Result};
use crate::pager::TokenSource;
use crate::value::Value;

use super::Parser;

fn group_op(kind: TokenKind) -> Option<BoolOp> {
    match kind {
        TokenKind::And => Some(BoolOp::And),
        TokenKind::Or => Some(BoolOp::Or),
        _ => None,
    }
}

impl<S: TokenSource> Parser<'_, S> {
    /// Parse one FilterQL statement, optionally followed by `;`.
    pub fn parse_filterql(&mut self) -> Result<FilterStatement> {
        log::debug!("parsing FilterQL statement");

        let mut from = None;
        match self.pager.current_kind() {
            TokenKind::Filter => {
                self.advance();
            }
            TokenKind::Select => {
                self.advance();
                self.expect(TokenKind::Star, "'*'")?;
                if self.consume_if(TokenKind::From) {
                    from = Some(self.expect_identity("a source name")?);
                }
                self.expect(TokenKind::Where, "WHERE")?;
            }
            _ => return Err(self.unexpected("FILTER or SELECT")),
        }

        let filter = self.parse_filter_body()?;
        let mut statement = FilterStatement::new(filter);
        statement.from = from;
        self.parse_filter_clauses(&mut statement)?;
        self.expect_end()?;

        log::debug!(
            "parsed filter with {} top-level items",
            statement.filter.len()
        );
        Ok(statement)
    }

    /// The top-level group. A body without a leading `AND`/`OR` is one naked
    /// expression inside an implicit `AND` group.
    fn parse_filter_body(&mut self) -> Result<Filters> {
        self.skip_comments();
        if let Some(group) = self.parse_group_if_present()? {
            return Ok(group);
        }

        let mut group = Filters::new(BoolOp::And);
        group.items.push(self.parse_filter_expr()?);
        if !self.pager.is_clause_end() {
            return Err(self.unexpected("LIMIT, ALIAS, FROM, WITH or end of filter"));
        }
        Ok(group)
    }

    /// `[NOT] AND ( .. )` / `[NOT] OR ( .. )` when the tokens ahead read that
    /// way; otherwise nothing is consumed.
    fn parse_group_if_present(&mut self) -> Result<Option<Filters>> {
        let negated = self.check(TokenKind::Not);
        let at = usize::from(negated);
        let Some(op) = group_op(self.pager.peek_nth(at).kind) else {
            return Ok(None);
        };
        if self.pager.peek_nth(at + 1).kind != TokenKind::LParen {
            return Ok(None);
        }

        if negated {
            self.advance();
        }
        self.advance();
        let mut group = self.parse_filter_group(op)?;
        group.negated = negated;
        Ok(Some(group))
    }

    fn parse_filter_group(&mut self, op: BoolOp) -> Result<Filters> {
        self.nested(|parser| parser.parse_filter_items(op))
    }

    fn parse_filter_items(&mut self, op: BoolOp) -> Result<Filters> {
        self.expect(TokenKind::LParen, "'('")?;

        let mut group = Filters::new(op);
        if self.consume_if(TokenKind::RParen) {
            return Ok(group);
        }
        loop {
            group.items.push(self.parse_filter_expr()?);
            self.skip_comments();
            match self.pager.current_kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {
                    self.advance();
                    return Ok(group);
                }
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    fn parse_filter_expr(&mut self) -> Result<FilterExpr> {
        self.skip_comments();
        if let Some(group) = self.parse_group_if_present()? {
            return Ok(FilterExpr::Nested(group));
        }

        let negated = self.check(TokenKind::Not) && self.pager.peek_kind() == TokenKind::Include;
        if negated || self.check(TokenKind::Include) {
            if negated {
                self.advance();
            }
            self.advance();
            let name = self.expect_identity("an include name")?;
            return Ok(FilterExpr::Include(IncludeRef::new(name, negated)));
        }

        Ok(FilterExpr::Expr(self.parse_or()?))
    }

    fn skip_comments(&mut self) {
        while self.consume_if(TokenKind::CommentMarker) {
            self.consume_if(TokenKind::Comment);
        }
    }

    /// Trailing clauses in any order, each at most once.
    fn parse_filter_clauses(&mut self, statement: &mut FilterStatement) -> Result<()> {
        loop {
            match self.pager.current_kind() {
                TokenKind::From if statement.from.is_none() => {
                    self.advance();
                    statement.from = Some(self.expect_identity("a source name")?);
                }
                TokenKind::Limit if statement.limit.is_none() => {
                    self.advance();
                    statement.limit = Some(self.parse_limit_value()?);
                }
                TokenKind::Alias if statement.alias.is_none() => {
                    self.advance();
                    statement.alias = Some(self.expect_identity("an alias name")?);
                }
                TokenKind::With if statement.with.is_none() => {
                    self.advance();
                    let token = self.expect(TokenKind::Json, "a JSON object")?;
                    let props: HashMap<String, serde_json::Value> =
                        serde_json::from_str(&token.text).map_err(|e| Error::Lex {
                            message: format!("invalid WITH properties: {e}"),
                            position: token.position,
                        })?;
                    statement.with = Some(
                        props
                            .into_iter()
                            .map(|(key, value)| (key, Value::from(value)))
                            .collect(),
                    );
                }
                _ => return Ok(()),
            }
        }
    }
}
