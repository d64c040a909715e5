//! Text rendering helpers shared by every `Display` impl of the tree.
//!
//! Rendering is the inverse of parsing: whatever these helpers produce must
//! lex back into the same tokens. Strings keep their original delimiter,
//! identities are backtick quoted whenever they would not lex as a bare
//! identity, and values are written as literals the grammar accepts.
//!
//! # Examples
//!
//! ```
//! use qlfront::output::{quote_identity, quote_string};
//!
//! assert_eq!(quote_string("it's", '\''), r"'it\'s'");
//! assert_eq!(quote_identity("first name", None), "`first name`");
//! assert_eq!(quote_identity("users.email", None), "users.email");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::TokenKind;
use crate::value::Value;

// Same alphabet as `Lexer::read_identifier`: Unicode letters, then letters
// and numerics
static BARE_IDENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Alphabetic}_@][\p{Alphabetic}\p{N}_.@]*$").expect("identity pattern is valid")
});

/// Escape `s` for placement between `quote` delimiters.
pub fn escape_string(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

pub fn quote_string(s: &str, quote: char) -> String {
    format!("{quote}{}{quote}", escape_string(s, quote))
}

/// Render an identity so it lexes back as the same identity.
///
/// Names that collide with a keyword or contain characters outside the bare
/// identity alphabet are backtick quoted.
pub fn quote_identity(text: &str, quote: Option<char>) -> String {
    // `count(*)` keeps its bare star
    if text == "*" && quote.is_none() {
        return text.to_string();
    }
    let needs_quote = quote.is_some()
        || !BARE_IDENTITY.is_match(text)
        || TokenKind::keyword(&text.to_lowercase()).is_some();
    if needs_quote {
        format!("`{text}`")
    } else {
        text.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(&quote_string(s, '"')),
            Value::Array(arr) => {
                f.write_str("[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => {
                // Sort keys for deterministic output
                let mut keys: Vec<_> = obj.keys().collect();
                keys.sort();
                f.write_str("{")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", quote_string(k, '"'), obj[k])?;
                }
                f.write_str("}")
            }
        }
    }
}
