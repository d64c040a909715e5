//! Buffered lookahead cursor over a token source.
//!
//! Tokens pulled from the source are kept in a growable buffer so the
//! parser can peek any distance ahead and rewind anywhere within what it
//! has already seen.

use crate::ast::{Token, TokenKind};

/// Anything that hands out tokens one at a time.
///
/// Must keep returning [`TokenKind::Eof`] once the input is exhausted.
pub trait TokenSource {
    fn next_token(&mut self) -> Token;
}

/// Pre-lexed tokens.
impl TokenSource for std::vec::IntoIter<Token> {
    fn next_token(&mut self) -> Token {
        self.next().unwrap_or_else(|| Token::eof(0))
    }
}

/// The surface grammar a pager is serving; decides which tokens close the
/// clause currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Expression,
    Sql,
    FilterQl,
}

impl Dialect {
    pub fn is_clause_end(self, kind: TokenKind) -> bool {
        use TokenKind::*;
        if matches!(kind, Eof | Eos | Error) {
            return true;
        }
        match self {
            Dialect::Expression => false,
            Dialect::Sql => matches!(
                kind,
                From | Into
                    | Limit
                    | Offset
                    | As
                    | If
                    | Comma
                    | RParen
                    | Where
                    | Group
                    | Order
                    | Asc
                    | Desc
                    | Values
            ),
            Dialect::FilterQl => matches!(
                kind,
                Limit | From | Alias | With | Comma | RParen
            ),
        }
    }
}

/// Position in the pager buffer, for [`TokenPager::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

pub struct TokenPager<S: TokenSource> {
    source: S,
    tokens: Vec<Token>,
    cursor: usize,
    dialect: Dialect,
    max_tokens: usize,
    exhausted: bool,
    limit_hit: bool,
}

impl<S: TokenSource> TokenPager<S> {
    pub fn new(source: S, dialect: Dialect, max_tokens: usize) -> Self {
        let mut pager = TokenPager {
            source,
            tokens: Vec::new(),
            cursor: 0,
            dialect,
            max_tokens: max_tokens.max(1),
            exhausted: false,
            limit_hit: false,
        };
        pager.fill(0);
        pager
    }

    /// Pull from the source until `index` is buffered or the input ends.
    fn fill(&mut self, index: usize) {
        while self.tokens.len() <= index && !self.exhausted {
            let token = if self.tokens.len() >= self.max_tokens {
                self.limit_hit = true;
                let position = self.tokens.last().map_or(0, |t| t.position);
                Token::new(
                    TokenKind::Error,
                    format!("token limit of {} exceeded", self.max_tokens),
                    position,
                )
            } else {
                self.source.next_token()
            };
            if matches!(token.kind, TokenKind::Eof | TokenKind::Error) {
                self.exhausted = true;
            }
            self.tokens.push(token);
        }
    }

    fn at(&mut self, index: usize) -> &Token {
        self.fill(index);
        let last = self.tokens.len() - 1;
        &self.tokens[index.min(last)]
    }

    /// The token under the cursor, not yet consumed.
    pub fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.cursor.min(last)]
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Consume and return the current token. The end of input is never
    /// consumed.
    pub fn next(&mut self) -> Token {
        let token = self.current().clone();
        if !matches!(token.kind, TokenKind::Eof | TokenKind::Error) {
            self.cursor += 1;
            self.fill(self.cursor);
        }
        token
    }

    /// The token after the current one.
    pub fn peek(&mut self) -> &Token {
        self.peek_nth(1)
    }

    /// The token `n` places after the current one; `peek_nth(0)` is
    /// [`current`](Self::current).
    pub fn peek_nth(&mut self, n: usize) -> &Token {
        let index = self.cursor + n;
        self.at(index)
    }

    pub fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    /// Un-consume the last consumed token.
    pub fn backup(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn mark(&self) -> Mark {
        Mark(self.cursor)
    }

    /// Rewind (or fast-forward) to a mark taken earlier on this pager.
    pub fn reset(&mut self, mark: Mark) {
        self.cursor = mark.0;
        self.fill(self.cursor);
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// True when the current token closes the clause being parsed.
    pub fn is_clause_end(&self) -> bool {
        self.dialect.is_clause_end(self.current_kind())
    }

    pub fn limit_exceeded(&self) -> bool {
        self.limit_hit
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// The last few tokens up to and including the current one, for error
    /// messages.
    pub fn context(&self) -> String {
        let end = self.cursor.min(self.tokens.len() - 1);
        let start = end.saturating_sub(5);
        self.tokens[start..=end]
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
