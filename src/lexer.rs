use crate::ast::{Token, TokenKind};
use crate::pager::TokenSource;

/// Default token source for all three grammars.
///
/// Lexical problems do not abort: the lexer emits one [`TokenKind::Error`]
/// token carrying the message and then reports end of input.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    pending: Option<Token>,
    done: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            pending: None,
            done: false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&mut self, message: impl Into<String>, position: usize) -> Token {
        self.done = true;
        Token::new(TokenKind::Error, message, position)
    }

    /// Emit a fixed-width operator token.
    fn op(&mut self, kind: TokenKind, width: usize) -> Token {
        let start = self.position;
        self.position += width;
        let text: String = self.input[start..self.position].iter().collect();
        Token::new(kind, text, start)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '@' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match TokenKind::keyword(&result.to_lowercase()) {
            Some(kind) => Token::new(kind, result, start),
            None => Token::new(TokenKind::Identity, result, start),
        }
    }

    fn read_quoted_identity(&mut self) -> Token {
        let start = self.position;
        self.advance(); // opening backtick

        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == '`' {
                return Token::quoted(TokenKind::Identity, result, '`', start);
            }
            result.push(ch);
        }
        self.error("unterminated quoted identity: missing closing '`'", start)
    }

    fn read_string(&mut self, quote: char) -> Token {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Token::quoted(TokenKind::String, result, quote, start);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(ch) => {
                            return self.error(format!("invalid escape sequence: \\{ch}"), self.position);
                        }
                        None => {
                            return self.error("unterminated string: unexpected end after backslash", start);
                        }
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        self.error("unterminated string: missing closing quote", start)
    }

    fn read_number(&mut self) -> Token {
        let start = self.position;
        let mut number = String::new();
        let mut is_decimal = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_decimal
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_decimal = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Number, number, start)
    }

    /// Scan a `{ ... }` block with balanced braces, skipping over braces
    /// inside JSON strings. The token text is the raw block.
    fn read_json(&mut self) -> Token {
        let start = self.position;
        let mut depth = 0usize;
        let mut in_string = false;

        while let Some(ch) = self.current_char() {
            self.advance();
            if in_string {
                match ch {
                    '\\' => self.advance(),
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let text: String = self.input[start..self.position].iter().collect();
                        return Token::new(TokenKind::Json, text, start);
                    }
                }
                _ => {}
            }
        }

        self.error("unterminated JSON object: missing closing '}'", start)
    }

    /// `--` was seen: emit the marker now and queue the comment body.
    fn read_comment(&mut self) -> Token {
        let marker = self.op(TokenKind::CommentMarker, 2);
        let start = self.position;
        let mut body = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\n' {
                break;
            }
            body.push(ch);
            self.advance();
        }
        self.pending = Some(Token::new(TokenKind::Comment, body.trim(), start));
        marker
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.pending.take() {
            return token;
        }
        if self.done {
            return Token::eof(self.position);
        }

        self.skip_whitespace();

        match self.current_char() {
            None => Token::eof(self.position),
            Some(';') => self.op(TokenKind::Eos, 1),
            Some(',') => self.op(TokenKind::Comma, 1),
            Some('(') => self.op(TokenKind::LParen, 1),
            Some(')') => self.op(TokenKind::RParen, 1),
            Some('[') => self.op(TokenKind::LBracket, 1),
            Some(']') => self.op(TokenKind::RBracket, 1),
            Some('+') => self.op(TokenKind::Plus, 1),
            Some('*') => self.op(TokenKind::Star, 1),
            Some('/') => self.op(TokenKind::Slash, 1),
            Some('%') => self.op(TokenKind::Percent, 1),
            Some('-') => {
                if self.peek_char(1) == Some('-') {
                    self.read_comment()
                } else {
                    self.op(TokenKind::Minus, 1)
                }
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.op(TokenKind::EqualEqual, 2)
                } else {
                    self.op(TokenKind::Equal, 1)
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.op(TokenKind::NotEqual, 2)
                } else {
                    self.error("unexpected '!' (did you mean '!=' or NOT?)", self.position)
                }
            }
            Some('<') => match self.peek_char(1) {
                Some('=') => self.op(TokenKind::LtEq, 2),
                Some('>') => self.op(TokenKind::NotEqual, 2),
                _ => self.op(TokenKind::Lt, 1),
            },
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.op(TokenKind::GtEq, 2)
                } else {
                    self.op(TokenKind::Gt, 1)
                }
            }
            Some('&') => {
                if self.peek_char(1) == Some('&') {
                    self.op(TokenKind::And, 2)
                } else {
                    self.error("unexpected '&' (did you mean '&&'?)", self.position)
                }
            }
            Some('|') => {
                if self.peek_char(1) == Some('|') {
                    self.op(TokenKind::Or, 2)
                } else {
                    self.error("unexpected '|' (did you mean '||'?)", self.position)
                }
            }
            Some('{') => self.read_json(),
            Some('"') => self.read_string('"'),
            Some('\'') => self.read_string('\''),
            Some('`') => self.read_quoted_identity(),
            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '@' => self.read_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => self.error(format!("unexpected character '{ch}'"), self.position),
        }
    }
}

impl TokenSource for Lexer {
    fn next_token(&mut self) -> Token {
        Lexer::next_token(self)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and OR Not between In null");
    assert_eq!(lexer.next_token().kind, TokenKind::And);
    assert_eq!(lexer.next_token().kind, TokenKind::Or);
    assert_eq!(lexer.next_token().kind, TokenKind::Not);
    assert_eq!(lexer.next_token().kind, TokenKind::Between);
    assert_eq!(lexer.next_token().kind, TokenKind::In);
    assert_eq!(lexer.next_token().kind, TokenKind::Null);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

#[test]
fn test_comment_emits_two_tokens() {
    let mut lexer = Lexer::new("a -- trailing note\n OR b");
    assert_eq!(lexer.next_token().kind, TokenKind::Identity);
    assert_eq!(lexer.next_token().kind, TokenKind::CommentMarker);
    let body = lexer.next_token();
    assert_eq!(body.kind, TokenKind::Comment);
    assert_eq!(body.text, "trailing note");
    assert_eq!(lexer.next_token().kind, TokenKind::Or);
}
