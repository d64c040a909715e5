// tests/filterql_tests.rs

use qlfront::ast::{BinOp, BoolOp, FilterExpr, FilterStatement, Node, NodeKind};
use qlfront::{Error, Value, parse_filterql};

fn filter(input: &str) -> FilterStatement {
    parse_filterql(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}

fn parse_err(input: &str) -> Error {
    match parse_filterql(input) {
        Ok(stmt) => panic!("expected {input:?} to fail, got {stmt}"),
        Err(e) => e,
    }
}

// ============================================================================
// Bodies
// ============================================================================

#[test]
fn test_and_group_with_limit() {
    let stmt = filter(r#"FILTER AND ( NAME != NULL , tostring(fieldname) == "hello" ) LIMIT 100"#);
    assert_eq!(stmt.filter.op, BoolOp::And);
    assert_eq!(stmt.filter.len(), 2);
    assert_eq!(stmt.limit, Some(100));
    assert!(matches!(
        &stmt.filter.items[0],
        FilterExpr::Expr(Node::Binary { op: BinOp::NotEqual, .. })
    ));
    match &stmt.filter.items[1] {
        FilterExpr::Expr(Node::Binary { left, .. }) => assert_eq!(left.kind(), NodeKind::Func),
        other => panic!("Expected comparison, got {other:?}"),
    }
}

#[test]
fn test_naked_expression_defaults_to_and() {
    let stmt = filter("FILTER x > 1 OR y < 2");
    assert_eq!(stmt.filter.op, BoolOp::And);
    assert_eq!(stmt.filter.len(), 1);
    assert!(matches!(
        &stmt.filter.items[0],
        FilterExpr::Expr(Node::Binary { op: BinOp::Or, .. })
    ));
}

#[test]
fn test_nested_groups_and_includes() {
    let stmt = filter("FILTER OR ( INCLUDE is_admin, AND ( x == 1, y == 2 ), NOT INCLUDE banned )");
    assert_eq!(stmt.filter.op, BoolOp::Or);
    assert_eq!(stmt.filter.len(), 3);

    match &stmt.filter.items[0] {
        FilterExpr::Include(inc) => {
            assert_eq!(inc.name, "is_admin");
            assert!(!inc.negated);
        }
        other => panic!("Expected include, got {other:?}"),
    }
    match &stmt.filter.items[1] {
        FilterExpr::Nested(group) => {
            assert_eq!(group.op, BoolOp::And);
            assert_eq!(group.len(), 2);
        }
        other => panic!("Expected nested group, got {other:?}"),
    }
    match &stmt.filter.items[2] {
        FilterExpr::Include(inc) => {
            assert_eq!(inc.name, "banned");
            assert!(inc.negated);
        }
        other => panic!("Expected include, got {other:?}"),
    }
    assert!(stmt.has_includes());
}

#[test]
fn test_negated_groups() {
    let stmt = filter("FILTER NOT AND ( x == 1, OR ( a, b ) )");
    assert!(stmt.filter.negated);
    let stmt = filter("FILTER AND ( NOT OR ( a == 1, b == 2 ) )");
    match &stmt.filter.items[0] {
        FilterExpr::Nested(group) => {
            assert!(group.negated);
            assert_eq!(group.op, BoolOp::Or);
        }
        other => panic!("Expected nested group, got {other:?}"),
    }
}

#[test]
fn test_not_expression_is_not_a_group() {
    let stmt = filter("FILTER AND ( NOT deleted, x IN (1, 2), EXISTS email )");
    assert_eq!(stmt.filter.len(), 3);
    for item in &stmt.filter.items {
        assert!(matches!(item, FilterExpr::Expr(_)), "got {item:?}");
    }
}

#[test]
fn test_empty_group() {
    assert!(filter("FILTER AND ( )").filter.is_empty());
}

#[test]
fn test_comments_between_items() {
    let stmt = filter("FILTER AND (\n  -- must be named\n  name != NULL,\n  age > 3 -- adults\n)");
    assert_eq!(stmt.filter.len(), 2);
}

// ============================================================================
// Entry forms and trailing clauses
// ============================================================================

#[test]
fn test_select_where_form() {
    let stmt = filter("SELECT * FROM users WHERE AND ( a == 1 ) ALIAS admins");
    assert_eq!(stmt.from.as_deref(), Some("users"));
    assert_eq!(stmt.alias.as_deref(), Some("admins"));
    assert_eq!(stmt.filter.len(), 1);

    let stmt = filter("SELECT * WHERE a == 1");
    assert!(stmt.from.is_none());
}

#[test]
fn test_trailing_clauses_any_order() {
    let stmt = filter(r#"FILTER x == 1 ALIAS recent WITH {"public": true, "ttl": 5} LIMIT 5 FROM users"#);
    assert_eq!(stmt.alias.as_deref(), Some("recent"));
    assert_eq!(stmt.limit, Some(5));
    assert_eq!(stmt.from.as_deref(), Some("users"));
    let with = stmt.with.unwrap();
    assert_eq!(with.get("public"), Some(&Value::Boolean(true)));
    assert_eq!(with.get("ttl"), Some(&Value::Integer(5)));
}

#[test]
fn test_duplicate_clause_is_an_error() {
    assert!(matches!(
        parse_err("FILTER x == 1 LIMIT 5 LIMIT 6"),
        Error::UnexpectedToken { .. }
    ));
}

#[test]
fn test_syntax_errors() {
    for input in [
        "FILTER AND ( a == 1",
        "FILTER AND ( a == 1 b == 2 )",
        "FILTER AND ( a == 1, )",
        "FILTER x == 1 y",
        "SELECT a WHERE x == 1",
        "SELECT * FROM users x == 1",
        "WHERE x == 1",
        "FILTER x == 1 WITH [1]",
    ] {
        assert!(
            matches!(parse_err(input), Error::UnexpectedToken { .. }),
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_deeply_nested_groups() {
    let n = 100_000;
    let deep = format!("FILTER {}a == 1{}", "AND ( ".repeat(n), " )".repeat(n));
    assert!(matches!(parse_err(&deep), Error::NestingTooDeep { limit: 128, .. }));

    let nested = format!("FILTER {}a == 1{}", "OR ( ".repeat(20), " )".repeat(20));
    let mut group = filter(&nested).filter;
    let mut levels = 1;
    while let Some(FilterExpr::Nested(inner)) = group.items.pop() {
        group = inner;
        levels += 1;
    }
    assert_eq!(levels, 20);
}

#[test]
fn test_with_must_be_an_object() {
    assert!(matches!(
        parse_err(r#"FILTER x == 1 WITH {"a": }"#),
        Error::Lex { .. }
    ));
}

// ============================================================================
// DateMath
// ============================================================================

#[test]
fn test_has_date_math() {
    assert!(filter(r#"FILTER AND ( lastvisit_ts < "now-1d", x == 1 )"#).has_date_math());
    assert!(filter(r#"FILTER OR ( AND ( created > "NOW-7d" ) )"#).has_date_math());
    assert!(!filter(r#"FILTER AND ( name == "snow", x > 1 )"#).has_date_math());
    // only the right-hand side counts
    assert!(!filter(r#"FILTER "now-1d" < lastvisit_ts"#).has_date_math());
    assert!(!filter(r#"FILTER x IN ("now")"#).has_date_math());
}
