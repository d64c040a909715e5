//! Recursive-descent parser shared by all three grammars.
//!
//! One rule per precedence level, loosest first:
//!
//! ```text
//! or         -> and { (OR | "||") and }
//! and        -> comparison { (AND | "&&") comparison }
//! comparison -> additive { (= | == | != | < | <= | > | >= | LIKE) additive
//!                        | [NOT] BETWEEN additive AND additive
//!                        | [NOT] IN ( additive {, additive} ) | [NOT] IN identity
//!                        | IS [NOT] additive }
//! additive   -> multiplicative { (+ | -) multiplicative }
//! multiplicative -> primary { (* | / | %) primary }
//! primary    -> literal | identity | NOT or | EXISTS or | - primary
//!             | ( or ) | [ literal {, literal} ] | {json}
//!             | name ( [ or {, or} ] ) | INCLUDE identity
//! ```
//!
//! The SQL and FilterQL statement grammars in the submodules build on these
//! rules. Every rule returns a `Result`; the first error aborts the whole
//! parse and no partial tree escapes.
//!
//! Every recursive cycle (groups, prefix operators, calls, FilterQL groups,
//! sub-selects) passes through `Parser::nested`, which bounds the nesting
//! depth by `ParserConfig::max_nesting_depth` so hostile input fails with
//! [`Error::NestingTooDeep`] instead of exhausting the stack.

mod filterql;
mod sql;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::ast::{
    BinOp, FilterStatement, Identity, Literal, MultiArgOp, Node, Number, SqlStatement, Token,
    TokenKind, Tree, TriOp, UnaryOp,
};
use crate::config::{ParseMode, ParserConfig};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::pager::{Dialect, TokenPager, TokenSource};
use crate::registry::{FuncDescriptor, FunctionRegistry, builtins};
use crate::value::Value;

/// Parse a standalone expression with the builtin registry in strict mode.
///
/// # Examples
///
/// ```
/// use qlfront::parse_expression;
///
/// let tree = parse_expression("1 + 2 * 3").unwrap();
/// assert_eq!(tree.to_string(), "1 + 2 * 3");
/// ```
pub fn parse_expression(text: &str) -> Result<Tree> {
    Parser::new(Lexer::new(text), Dialect::Expression).parse_expression()
}

/// Parse one SQL statement with the builtin registry in strict mode.
pub fn parse_sql(text: &str) -> Result<SqlStatement> {
    Parser::new(Lexer::new(text), Dialect::Sql).parse_sql()
}

/// Parse one FilterQL statement with the builtin registry in strict mode.
pub fn parse_filterql(text: &str) -> Result<FilterStatement> {
    Parser::new(Lexer::new(text), Dialect::FilterQl).parse_filterql()
}

pub fn parse_expression_with(
    text: &str,
    registry: &FunctionRegistry,
    config: ParserConfig,
) -> Result<Tree> {
    Parser::with_options(Lexer::new(text), Dialect::Expression, registry, config).parse_expression()
}

pub fn parse_sql_with(
    text: &str,
    registry: &FunctionRegistry,
    config: ParserConfig,
) -> Result<SqlStatement> {
    Parser::with_options(Lexer::new(text), Dialect::Sql, registry, config).parse_sql()
}

pub fn parse_filterql_with(
    text: &str,
    registry: &FunctionRegistry,
    config: ParserConfig,
) -> Result<FilterStatement> {
    Parser::with_options(Lexer::new(text), Dialect::FilterQl, registry, config).parse_filterql()
}

pub struct Parser<'r, S: TokenSource = Lexer> {
    pager: TokenPager<S>,
    registry: &'r FunctionRegistry,
    config: ParserConfig,
    /// Recursive rules currently open
    depth: usize,
}

impl<S: TokenSource> Parser<'static, S> {
    /// Parser over `source` using the builtin registry and default config.
    pub fn new(source: S, dialect: Dialect) -> Self {
        Parser::with_options(source, dialect, builtins(), ParserConfig::default())
    }
}

impl<'r, S: TokenSource> Parser<'r, S> {
    pub fn with_options(
        source: S,
        dialect: Dialect,
        registry: &'r FunctionRegistry,
        config: ParserConfig,
    ) -> Self {
        Parser {
            pager: TokenPager::new(source, dialect, config.max_tokens),
            registry,
            config,
            depth: 0,
        }
    }

    /// Parse a whole input as one expression.
    pub fn parse_expression(&mut self) -> Result<Tree> {
        log::debug!("parsing expression");
        let root = self.parse_or()?;
        self.expect_end()?;
        Ok(Tree::new(root))
    }

    // === Token helpers ===

    fn advance(&mut self) -> Token {
        self.pager.next()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.pager.current_kind() == kind
    }

    fn consume_if(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identity(&mut self, expected: &str) -> Result<String> {
        Ok(self.expect(TokenKind::Identity, expected)?.text)
    }

    /// Error for the current token. Lexer failures and the token cap
    /// surface as their own error kinds.
    fn unexpected(&self, expected: &str) -> Error {
        let token = self.pager.current();
        if token.kind == TokenKind::Error {
            if self.pager.limit_exceeded() {
                return Error::TokenLimitExceeded {
                    limit: self.pager.max_tokens(),
                };
            }
            return Error::Lex {
                message: token.text.clone(),
                position: token.position,
            };
        }
        Error::UnexpectedToken {
            got: token.to_string(),
            expected: expected.to_string(),
            position: token.position,
            context: self.pager.context(),
        }
    }

    /// Accept an optional `;` and require the end of input.
    fn expect_end(&mut self) -> Result<()> {
        self.consume_if(TokenKind::Eos);
        if self.check(TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    /// Run a recursive rule one nesting level deeper.
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.config.max_nesting_depth {
            return Err(Error::NestingTooDeep {
                limit: self.config.max_nesting_depth,
                position: self.pager.current().position,
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn parse_limit_value(&mut self) -> Result<u64> {
        let token = self.expect(TokenKind::Number, "a row count")?;
        token
            .text
            .parse::<u64>()
            .map_err(|_| Error::InvalidNumber(token.text))
    }

    // === Precedence levels ===

    pub(crate) fn parse_or(&mut self) -> Result<Node> {
        let mut left = self.parse_and()?;

        loop {
            match self.pager.current_kind() {
                TokenKind::Or => {
                    self.advance();
                    let right = self.parse_and()?;
                    left = Node::binary(BinOp::Or, left, right);
                }
                // `-- text` between operands: marker and body are skipped
                TokenKind::CommentMarker => {
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut left = self.parse_comparison()?;

        while self.check(TokenKind::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Node::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let mut left = self.parse_additive()?;

        loop {
            let kind = self.pager.current_kind();
            left = match kind {
                TokenKind::Not
                    if matches!(
                        self.pager.peek_kind(),
                        TokenKind::Like | TokenKind::In | TokenKind::Between
                    ) =>
                {
                    self.advance();
                    let kind = self.pager.current_kind();
                    let inner = self.parse_comparison_tail(left, kind)?;
                    Node::unary(UnaryOp::Not, inner)
                }
                TokenKind::Is => {
                    self.advance();
                    let negated = self.consume_if(TokenKind::Not);
                    let right = self.parse_additive()?;
                    let node = Node::binary(BinOp::Is, left, right);
                    if negated {
                        Node::unary(UnaryOp::Not, node)
                    } else {
                        node
                    }
                }
                _ if comparison_op(kind).is_some()
                    || matches!(kind, TokenKind::Between | TokenKind::In) =>
                {
                    self.parse_comparison_tail(left, kind)?
                }
                _ => break,
            };
        }
        Ok(left)
    }

    /// `left` has been parsed and the current token is the operator `kind`.
    fn parse_comparison_tail(&mut self, left: Node, kind: TokenKind) -> Result<Node> {
        match kind {
            TokenKind::Between => {
                self.advance();
                self.parse_between(left)
            }
            TokenKind::In => {
                self.advance();
                self.parse_in(left)
            }
            _ => match comparison_op(kind) {
                Some(op) => {
                    self.advance();
                    let right = self.parse_additive()?;
                    Ok(Node::binary(op, left, right))
                }
                None => Err(self.unexpected("a comparison operator")),
            },
        }
    }

    /// `x BETWEEN lower AND upper`, after `BETWEEN`. The `AND` here is
    /// syntax, not the boolean operator.
    fn parse_between(&mut self, operand: Node) -> Result<Node> {
        let lower = self.parse_additive()?;
        if !self.consume_if(TokenKind::And) {
            return Err(Error::MalformedBetween {
                context: self.pager.context(),
            });
        }
        let upper = self.parse_additive()?;
        Ok(Node::Tri {
            op: TriOp::Between,
            a: Box::new(operand),
            b: Box::new(lower),
            c: Box::new(upper),
        })
    }

    /// `x IN (a, b, ...)` or `x IN ident`, after `IN`.
    fn parse_in(&mut self, operand: Node) -> Result<Node> {
        let mut candidates = Vec::new();

        match self.pager.current_kind() {
            TokenKind::LParen => {
                self.advance();
                loop {
                    match self.pager.current_kind() {
                        TokenKind::Error => return Err(self.unexpected("a value")),
                        TokenKind::RParen | TokenKind::Comma | TokenKind::Eof | TokenKind::Eos => {
                            return Err(Error::MalformedIn {
                                context: self.pager.context(),
                            });
                        }
                        _ => {}
                    }
                    candidates.push(self.parse_additive()?);
                    match self.pager.current_kind() {
                        TokenKind::Comma => {
                            self.advance();
                        }
                        TokenKind::RParen => {
                            self.advance();
                            break;
                        }
                        _ => {
                            return Err(Error::MalformedIn {
                                context: self.pager.context(),
                            });
                        }
                    }
                }
            }
            TokenKind::Identity => {
                let token = self.advance();
                candidates.push(Node::Identity(Identity {
                    text: token.text,
                    quote: token.quote,
                }));
            }
            _ => {
                return Err(Error::MalformedIn {
                    context: self.pager.context(),
                });
            }
        }

        Ok(Node::MultiArg {
            op: MultiArgOp::In,
            operand: Box::new(operand),
            candidates,
        })
    }

    fn parse_additive(&mut self) -> Result<Node> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.pager.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node> {
        let mut left = self.parse_primary()?;

        loop {
            let op = match self.pager.current_kind() {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash => BinOp::Divide,
                TokenKind::Percent => BinOp::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_primary()?;
            left = Node::binary(op, left, right);
        }
        Ok(left)
    }

    /// Literals, references, prefix operators, groups and calls.
    fn parse_primary(&mut self) -> Result<Node> {
        self.nested(Self::parse_primary_inner)
    }

    fn parse_primary_inner(&mut self) -> Result<Node> {
        match self.pager.current_kind() {
            TokenKind::Number => {
                let token = self.advance();
                Ok(Node::Literal(Literal::Number(parse_number(&token.text)?)))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Node::Literal(Literal::String {
                    value: token.text,
                    quote: token.quote.unwrap_or('"'),
                }))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Node::Literal(Literal::Null))
            }
            TokenKind::True => {
                self.advance();
                Ok(Node::Value(Value::Boolean(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Node::Value(Value::Boolean(false)))
            }
            TokenKind::Identity => {
                let is_call = self.pager.current().quote.is_none()
                    && self.pager.peek_kind() == TokenKind::LParen;
                if is_call {
                    return self.parse_func_call();
                }
                let token = self.advance();
                Ok(Node::Identity(Identity {
                    text: token.text,
                    quote: token.quote,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let mut node = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                if let Node::Binary { paren, .. } = &mut node {
                    *paren = true;
                }
                Ok(node)
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_array_literal()
            }
            TokenKind::Json => {
                let token = self.advance();
                let json: serde_json::Value =
                    serde_json::from_str(&token.text).map_err(|e| Error::Lex {
                        message: format!("invalid JSON literal: {e}"),
                        position: token.position,
                    })?;
                Ok(Node::Value(Value::from(json)))
            }
            TokenKind::Not => {
                self.advance();
                Ok(Node::unary(UnaryOp::Not, self.parse_or()?))
            }
            TokenKind::Exists => {
                self.advance();
                Ok(Node::unary(UnaryOp::Exists, self.parse_or()?))
            }
            // Unary minus binds to the next primary only
            TokenKind::Minus => {
                self.advance();
                Ok(Node::unary(UnaryOp::Negate, self.parse_primary()?))
            }
            TokenKind::Include => {
                self.advance();
                let name = self.expect_identity("an include name")?;
                Ok(Node::include(name, false))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Node> {
        let mut elements = vec![];

        while !self.check(TokenKind::RBracket) {
            elements.push(self.parse_literal_value()?);

            if !self.check(TokenKind::RBracket) {
                self.expect(TokenKind::Comma, "',' or ']'")?;
            }
        }

        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Node::Value(Value::Array(elements)))
    }

    fn parse_literal_value(&mut self) -> Result<Value> {
        let negate = self.consume_if(TokenKind::Minus);
        let token = self.pager.current().clone();
        let value = match (token.kind, negate) {
            (TokenKind::Number, _) => match parse_number(&token.text)? {
                Number::Integer(n) if negate => Value::Integer(-n),
                Number::Integer(n) => Value::Integer(n),
                Number::Decimal(d) if negate => Value::Decimal(-d),
                Number::Decimal(d) => Value::Decimal(d),
            },
            (TokenKind::String, false) => Value::String(token.text),
            (TokenKind::Null, false) => Value::Null,
            (TokenKind::True, false) => Value::Boolean(true),
            (TokenKind::False, false) => Value::Boolean(false),
            _ => return Err(self.unexpected("a literal")),
        };
        self.advance();
        Ok(value)
    }

    fn parse_func_call(&mut self) -> Result<Node> {
        let name = self.advance().text;
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_func_arg()?);
                match self.pager.current_kind() {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    TokenKind::RParen => break,
                    _ => return Err(self.unexpected(&format!("',' or ')' to close {name}("))),
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let func = self.resolve_function(&name, args.len())?;
        Ok(Node::Func(crate::ast::FuncCall { name, func, args }))
    }

    /// One function argument: a full expression (`toint(str_item * 5)`),
    /// or a bare `*` as in `count(*)`.
    fn parse_func_arg(&mut self) -> Result<Node> {
        if self.check(TokenKind::Star) && self.pager.peek_kind() == TokenKind::RParen {
            self.advance();
            return Ok(Node::identity("*"));
        }
        self.parse_or()
    }

    /// Look `name` up once and decide which descriptor the call gets.
    fn resolve_function(&self, name: &str, argc: usize) -> Result<Arc<FuncDescriptor>> {
        match (self.registry.resolve(name), self.config.mode) {
            (Some(desc), ParseMode::Strict) => {
                desc.check_arity_for(name, argc)?;
                Ok(desc)
            }
            (Some(desc), ParseMode::Lenient) if desc.accepts(argc) => Ok(desc),
            (Some(desc), ParseMode::Lenient) => {
                log::warn!(
                    "{name}() takes {} arguments, called with {argc}; using an unchecked placeholder",
                    desc.arity
                );
                Ok(Arc::new(FuncDescriptor::placeholder(name)))
            }
            (None, ParseMode::Strict) => Err(Error::UnknownFunction {
                name: name.to_string(),
            }),
            (None, ParseMode::Lenient) => {
                log::warn!("unknown function {name}(); using an unchecked placeholder");
                Ok(Arc::new(FuncDescriptor::placeholder(name)))
            }
        }
    }
}

fn comparison_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::Equal => Some(BinOp::Equal),
        TokenKind::EqualEqual => Some(BinOp::EqualEqual),
        TokenKind::NotEqual => Some(BinOp::NotEqual),
        TokenKind::Lt => Some(BinOp::LessThan),
        TokenKind::LtEq => Some(BinOp::LessEqual),
        TokenKind::Gt => Some(BinOp::GreaterThan),
        TokenKind::GtEq => Some(BinOp::GreaterEqual),
        TokenKind::Like => Some(BinOp::Like),
        _ => None,
    }
}

fn parse_number(text: &str) -> Result<Number> {
    if !text.contains('.') {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Number::Integer(n));
        }
    }
    Decimal::from_str(text)
        .map(Number::Decimal)
        .map_err(|_| Error::InvalidNumber(text.to_string()))
}
