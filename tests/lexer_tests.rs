// tests/lexer_tests.rs

use qlfront::ast::TokenKind;
use qlfront::lexer::Lexer;

fn kinds(input: &str) -> Vec<TokenKind> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token();
        let kind = token.kind;
        out.push(kind);
        if kind == TokenKind::Eof {
            return out;
        }
    }
}

// ============================================================================
// Operators and delimiters
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        (";", TokenKind::Eos),
        (",", TokenKind::Comma),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("=", TokenKind::Equal),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(token.text, input);
    }
}

#[test]
fn test_two_char_operators() {
    let test_cases = vec![
        ("==", TokenKind::EqualEqual),
        ("!=", TokenKind::NotEqual),
        ("<>", TokenKind::NotEqual),
        ("<=", TokenKind::LtEq),
        (">=", TokenKind::GtEq),
        ("&&", TokenKind::And),
        ("||", TokenKind::Or),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().kind, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }
}

#[test]
fn test_operator_sequence() {
    assert_eq!(
        kinds("a>=1&&b<>2"),
        vec![
            TokenKind::Identity,
            TokenKind::GtEq,
            TokenKind::Number,
            TokenKind::And,
            TokenKind::Identity,
            TokenKind::NotEqual,
            TokenKind::Number,
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Keywords and identities
// ============================================================================

#[test]
fn test_keywords_any_case_keep_spelling() {
    let mut lexer = Lexer::new("SeLeCt distinct FROM");
    let select = lexer.next_token();
    assert_eq!(select.kind, TokenKind::Select);
    assert_eq!(select.text, "SeLeCt");
    assert_eq!(lexer.next_token().kind, TokenKind::Distinct);
    assert_eq!(lexer.next_token().kind, TokenKind::From);
}

#[test]
fn test_statement_keywords() {
    assert_eq!(
        kinds("insert into values update set delete prepare describe desc show"),
        vec![
            TokenKind::Insert,
            TokenKind::Into,
            TokenKind::Values,
            TokenKind::Update,
            TokenKind::Set,
            TokenKind::Delete,
            TokenKind::Prepare,
            TokenKind::Describe,
            TokenKind::Desc,
            TokenKind::Show,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_filter_keywords() {
    assert_eq!(
        kinds("FILTER INCLUDE ALIAS WITH exists true false"),
        vec![
            TokenKind::Filter,
            TokenKind::Include,
            TokenKind::Alias,
            TokenKind::With,
            TokenKind::Exists,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_dotted_and_system_identities() {
    let mut lexer = Lexer::new("users.email @@version_comment _private");
    for expected in ["users.email", "@@version_comment", "_private"] {
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Identity);
        assert_eq!(token.text, expected);
        assert_eq!(token.quote, None);
    }
}

#[test]
fn test_backtick_identity() {
    let mut lexer = Lexer::new("`first name`");
    let token = lexer.next_token();
    assert_eq!(token.kind, TokenKind::Identity);
    assert_eq!(token.text, "first name");
    assert_eq!(token.quote, Some('`'));
}

#[test]
fn test_keyword_prefix_is_identity() {
    // "index" starts with "in", "order_id" with "order"
    let mut lexer = Lexer::new("index order_id");
    assert_eq!(lexer.next_token().kind, TokenKind::Identity);
    assert_eq!(lexer.next_token().kind, TokenKind::Identity);
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    let mut lexer = Lexer::new("42 3.50 7.");
    let int = lexer.next_token();
    assert_eq!(int.kind, TokenKind::Number);
    assert_eq!(int.text, "42");
    let dec = lexer.next_token();
    assert_eq!(dec.kind, TokenKind::Number);
    assert_eq!(dec.text, "3.50");
    // a trailing dot is not part of the number
    assert_eq!(lexer.next_token().text, "7");
}

#[test]
fn test_strings_record_their_quote() {
    let mut lexer = Lexer::new(r#""double" 'single'"#);
    let double = lexer.next_token();
    assert_eq!(double.kind, TokenKind::String);
    assert_eq!(double.text, "double");
    assert_eq!(double.quote, Some('"'));
    let single = lexer.next_token();
    assert_eq!(single.text, "single");
    assert_eq!(single.quote, Some('\''));
}

#[test]
fn test_string_escapes() {
    let mut lexer = Lexer::new(r#""a\"b\n\t\\ it\'s""#);
    assert_eq!(lexer.next_token().text, "a\"b\n\t\\ it's");
}

#[test]
fn test_json_block() {
    let mut lexer = Lexer::new(r#"WITH {"a": {"b": "}"}} LIMIT"#);
    assert_eq!(lexer.next_token().kind, TokenKind::With);
    let json = lexer.next_token();
    assert_eq!(json.kind, TokenKind::Json);
    assert_eq!(json.text, r#"{"a": {"b": "}"}}"#);
    assert_eq!(lexer.next_token().kind, TokenKind::Limit);
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_marker_and_body() {
    let mut lexer = Lexer::new("-- first column\nname");
    assert_eq!(lexer.next_token().kind, TokenKind::CommentMarker);
    let body = lexer.next_token();
    assert_eq!(body.kind, TokenKind::Comment);
    assert_eq!(body.text, "first column");
    assert_eq!(lexer.next_token().text, "name");
}

#[test]
fn test_comment_at_end_of_input() {
    assert_eq!(
        kinds("a -- done"),
        vec![
            TokenKind::Identity,
            TokenKind::CommentMarker,
            TokenKind::Comment,
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_errors_become_tokens() {
    let cases = ["\"open", "`open", "{\"a\": 1", "a ! b", "a & b", "a | b", "#", r#""\q""#];
    for input in cases {
        let found = kinds(input);
        assert!(
            found.contains(&TokenKind::Error),
            "expected an error token for {input:?}, got {found:?}"
        );
        // nothing follows the error but the end of input
        assert_eq!(found.last(), Some(&TokenKind::Eof));
    }
}

#[test]
fn test_error_token_carries_message_and_position() {
    let mut lexer = Lexer::new("ab #");
    lexer.next_token();
    let err = lexer.next_token();
    assert_eq!(err.kind, TokenKind::Error);
    assert_eq!(err.position, 3);
    assert!(err.text.contains('#'));
}
