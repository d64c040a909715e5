// tests/roundtrip_tests.rs
//
// Rendering a parsed tree produces text that parses back to the same tree.

use std::collections::HashMap;

use qlfront::ast::Node;
use qlfront::{parse_expression, parse_filterql, parse_sql};

fn reparse_expression(input: &str) {
    let first = parse_expression(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
    let rendered = first.to_string();
    let second = parse_expression(&rendered)
        .unwrap_or_else(|e| panic!("rendering {rendered:?} of {input:?} does not parse: {e}"));
    assert_eq!(first.root, second.root, "Failed for input: {}", input);
    assert_eq!(rendered, second.to_string());
}

#[test]
fn test_expression_roundtrip() {
    for input in [
        "a == 1",
        "a + b * c - d / e % f",
        "(a + b) * c",
        "a - (b - c)",
        "a AND b OR c AND d",
        "(a OR b) AND c",
        "x BETWEEN 1 AND 10",
        "x NOT BETWEEN lo AND hi",
        "x IN (1, 2, 'three')",
        "x NOT IN (1, 2)",
        "x IN candidates",
        "x LIKE '%abc%'",
        "x NOT LIKE \"a_c\"",
        "x IS NULL",
        "x IS NOT NULL",
        "x == 1 AND y IS NOT NULL",
        "NOT a == 1",
        "NOT (a == 1)",
        "NOT a AND b",
        "EXISTS email",
        "-a * -5",
        "-(a + b)",
        "3.50 > price",
        "`first name` == 'Yoda'",
        "`limit` > 10",
        "tostring(fieldname) == \"hello\"",
        "count(*) > 0",
        "join(', ', a, b, c) != ''",
        "todate(created) < \"now-1d\"",
        "tags == [1, \"two\", 3.5]",
        "meta == {\"public\": true, \"ttl\": 5}",
        "NOT INCLUDE banned AND INCLUDE adult",
        "flag == true OR flag == false",
        "a == 'it\\'s'",
        "café == 1 AND größe > 2",
        "straße.länge IN (1, 2)",
    ] {
        reparse_expression(input);
    }
}

#[test]
fn test_comments_are_dropped() {
    let tree = parse_expression("a == 1 -- trailing note").unwrap();
    assert_eq!(tree.to_string(), "a == 1");
    reparse_expression("a == 1 -- trailing note");
}

#[test]
fn test_sql_roundtrip() {
    for input in [
        "SELECT * FROM users",
        "SELECT DISTINCT a, b AS bee FROM t AS x WHERE a > 1 AND b IS NOT NULL",
        "SELECT a, count(*) AS n FROM t GROUP BY a ORDER BY n DESC, a ASC LIMIT 10 OFFSET 5",
        "SELECT tostring(a) AS s IF a > 0 FROM t",
        "SELECT a FROM t WHERE (SELECT b FROM u WHERE c == 1)",
        "SELECT a FROM t WHERE id NOT IN (SELECT id FROM banned)",
        "SELECT @@version_comment LIMIT 1",
        "INSERT INTO users (name, age) VALUES ('yoda', 900), ('luke', 19)",
        "UPDATE users SET age = 901, name = 'old yoda' WHERE name == 'yoda' LIMIT 1",
        "DELETE FROM users WHERE age < 18",
        "PREPARE stmt1 FROM 'SELECT a FROM t WHERE b > 1'",
        "DESCRIBE users",
        "SHOW tables",
    ] {
        let first = parse_sql(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
        let rendered = first.to_string();
        let second = parse_sql(&rendered)
            .unwrap_or_else(|e| panic!("rendering {rendered:?} of {input:?} does not parse: {e}"));
        assert_eq!(first, second, "Failed for input: {}", input);
    }
}

#[test]
fn test_filterql_roundtrip() {
    for input in [
        r#"FILTER AND ( NAME != NULL, tostring(fieldname) == "hello" ) LIMIT 100"#,
        "FILTER x > 1 OR y < 2",
        "FILTER OR ( INCLUDE is_admin, AND ( x == 1, y == 2 ), NOT INCLUDE banned )",
        "FILTER NOT AND ( x == 1, NOT OR ( a, b ) )",
        "FILTER AND ( )",
        "SELECT * FROM users WHERE AND ( a == 1 ) ALIAS admins",
        r#"FILTER x == 1 ALIAS recent WITH {"public": true, "ttl": 5} LIMIT 5 FROM users"#,
    ] {
        let first = parse_filterql(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
        let rendered = first.to_string();
        let second = parse_filterql(&rendered)
            .unwrap_or_else(|e| panic!("rendering {rendered:?} of {input:?} does not parse: {e}"));
        assert_eq!(first, second, "Failed for input: {}", input);
    }
}

#[test]
fn test_inlined_filter_reparses() {
    let mut named = HashMap::new();
    named.insert(
        "is_yoda".to_string(),
        parse_expression(r#"name == "Yoda""#).unwrap().root,
    );
    let stmt = parse_filterql("FILTER AND ( x > 1, NOT INCLUDE is_yoda )").unwrap();
    let inlined = qlfront::IncludeResolver::new(Some(&named))
        .inline_filter(&stmt.filter)
        .unwrap();

    let rendered = format!("FILTER {inlined}");
    assert_eq!(rendered, r#"FILTER AND ( x > 1, NOT (name == "Yoda") )"#);
    let reparsed = parse_filterql(&rendered).unwrap();
    assert_eq!(reparsed.filter.to_node(), inlined);
    assert!(matches!(reparsed.filter.to_node(), Node::Boolean { .. }));
}

#[test]
fn test_inlined_operand_reparses() {
    let mut named = HashMap::new();
    named.insert("either".to_string(), parse_expression("b OR c").unwrap().root);

    for (input, want) in [
        ("a AND INCLUDE either", "a AND (b OR c)"),
        ("x BETWEEN INCLUDE either AND 5", "x BETWEEN (b OR c) AND 5"),
        ("x IN (1, INCLUDE either)", "x IN (1, (b OR c))"),
    ] {
        let root = parse_expression(input).unwrap().root;
        let inlined = qlfront::inline_includes(Some(&named), &root).unwrap();
        let rendered = inlined.to_string();
        assert_eq!(rendered, want);

        let reparsed = parse_expression(&rendered)
            .unwrap_or_else(|e| panic!("rendering {rendered:?} of {input:?} does not parse: {e}"));
        assert_eq!(reparsed.root, inlined, "Failed for input: {}", input);
    }

    // the grouping is what keeps the meaning
    let root = parse_expression("a AND INCLUDE either").unwrap().root;
    match qlfront::inline_includes(Some(&named), &root).unwrap() {
        Node::Binary { op, .. } => assert_eq!(op, qlfront::BinOp::And),
        other => panic!("Expected AND at the root, got {other:?}"),
    }
}
