use std::fmt;

/// Kind of a lexical token.
///
/// Keyword kinds are matched case-insensitively by the lexer; the original
/// spelling is kept in [`Token::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Integer or decimal number
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.50
    /// ```
    Number,

    /// Quoted string; the delimiter is recorded in [`Token::quote`]
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'now-1d'
    /// ```
    String,

    /// Column or variable reference, possibly dotted or backtick quoted
    ///
    /// # Examples
    /// ```text
    /// name
    /// users.email
    /// @@version_comment
    /// `first name`
    /// ```
    Identity,

    /// Raw JSON object text, braces balanced
    ///
    /// # Examples
    /// ```text
    /// {"retries": 3}
    /// ```
    Json,

    Null,
    True,
    False,

    // Statement keywords
    Select,
    From,
    Where,
    Group,
    By,
    Order,
    Limit,
    Offset,
    As,
    If,
    Insert,
    Into,
    Values,
    Delete,
    Update,
    Set,
    Prepare,
    Describe,
    Desc,
    Asc,
    Show,
    Distinct,

    // FilterQL keywords
    Filter,
    Include,
    Alias,
    With,

    // Logical and comparison keywords
    /// `AND` or `&&`
    And,
    /// `OR` or `||`
    Or,
    /// `NOT`
    Not,
    Is,
    Like,
    In,
    Between,
    Exists,

    // Operators
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!=` or `<>`
    NotEqual,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    /// `--` opening a single line comment; always followed by [`TokenKind::Comment`]
    CommentMarker,
    /// Body of a single line comment
    Comment,

    /// End of statement (`;`)
    Eos,
    /// End of input
    Eof,
    /// Lexical failure, message in [`Token::text`]
    Error,
}

impl TokenKind {
    /// Keyword lookup for an already lowercased word.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match word {
            "select" => Select,
            "from" => From,
            "where" => Where,
            "group" => Group,
            "by" => By,
            "order" => Order,
            "limit" => Limit,
            "offset" => Offset,
            "as" => As,
            "if" => If,
            "insert" => Insert,
            "into" => Into,
            "values" => Values,
            "delete" => Delete,
            "update" => Update,
            "set" => Set,
            "prepare" => Prepare,
            "describe" => Describe,
            "desc" => Desc,
            "asc" => Asc,
            "show" => Show,
            "distinct" => Distinct,
            "filter" => Filter,
            "include" => Include,
            "alias" => Alias,
            "with" => With,
            "and" => And,
            "or" => Or,
            "not" => Not,
            "is" => Is,
            "like" => Like,
            "in" => In,
            "between" => Between,
            "exists" => Exists,
            "null" => Null,
            "true" => True,
            "false" => False,
            _ => return None,
        };
        Some(kind)
    }

    /// True for the operators accepted after an operand at comparison level
    /// and below (`=`, `<`, `LIKE`, `+`, `*` ...).
    pub fn is_operator(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Equal
                | EqualEqual
                | NotEqual
                | Lt
                | LtEq
                | Gt
                | GtEq
                | Like
                | Is
                | In
                | Between
                | Plus
                | Minus
                | Star
                | Slash
                | Percent
                | And
                | Or
        )
    }
}

/// A lexical token.
///
/// Tokens are immutable once produced; the parser only re-reads, peeks and
/// backs up over them.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text; for strings and quoted identities the unescaped content
    pub text: String,
    /// Delimiter of a quoted string or identity
    pub quote: Option<char>,
    /// Character offset of the first character of the token
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            quote: None,
            position,
        }
    }

    pub fn quoted(kind: TokenKind, text: impl Into<String>, quote: char, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            quote: Some(quote),
            position,
        }
    }

    pub fn eof(position: usize) -> Self {
        Token::new(TokenKind::Eof, "", position)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.quote) {
            (TokenKind::Eof, _) => write!(f, "end of input"),
            (TokenKind::String | TokenKind::Identity, Some(q)) => write!(f, "{q}{}{q}", self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}
