// tests/include_tests.rs

use std::cell::Cell;
use std::collections::HashMap;

use qlfront::ast::{Node, UnaryOp};
use qlfront::{
    CancellationToken, Error, IncludeResolver, Includer, ParserConfig, Result, has_date_math,
    inline_includes, parse_expression, parse_filterql,
};

fn expr(input: &str) -> Node {
    parse_expression(input)
        .unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
        .root
}

fn named(pairs: &[(&str, &str)]) -> HashMap<String, Node> {
    pairs
        .iter()
        .map(|(name, text)| (name.to_string(), expr(text)))
        .collect()
}

/// Counts how often it is asked for a filter.
struct CountingIncluder {
    filters: HashMap<String, Node>,
    calls: Cell<usize>,
}

impl Includer for CountingIncluder {
    fn include(&self, name: &str) -> Result<Node> {
        self.calls.set(self.calls.get() + 1);
        self.filters.include(name)
    }
}

// ============================================================================
// Inlining
// ============================================================================

#[test]
fn test_inline_filter_group() {
    let includes = named(&[("is_yoda_true", r#"name == "Yoda""#)]);
    let stmt = parse_filterql(r#"FILTER AND ( lastvisit_ts < "now-1d", INCLUDE is_yoda_true )"#).unwrap();

    let mut resolver = IncludeResolver::new(Some(&includes));
    let inlined = resolver.inline_filter(&stmt.filter).unwrap();
    assert_eq!(
        inlined.to_string(),
        r#"AND ( lastvisit_ts < "now-1d", name == "Yoda" )"#
    );
}

#[test]
fn test_inline_negated_include() {
    let includes = named(&[("is_yoda_true", r#"name == "Yoda""#)]);
    let stmt =
        parse_filterql(r#"FILTER AND ( lastvisit_ts < "now-1d", NOT INCLUDE is_yoda_true )"#).unwrap();

    let inlined = IncludeResolver::new(Some(&includes))
        .inline_filter(&stmt.filter)
        .unwrap();
    assert_eq!(
        inlined.to_string(),
        r#"AND ( lastvisit_ts < "now-1d", NOT (name == "Yoda") )"#
    );
}

#[test]
fn test_inline_inside_expression() {
    let includes = named(&[("adult", "age >= 18")]);
    let root = expr("INCLUDE adult AND country == 'NL'");
    let inlined = inline_includes(Some(&includes), &root).unwrap();
    assert_eq!(inlined.to_string(), "(age >= 18) AND country == 'NL'");
    assert!(!inlined.has_includes());
}

#[test]
fn test_nested_includes() {
    let includes = named(&[
        ("active_adult", "INCLUDE adult AND active == true"),
        ("adult", "age >= 18"),
    ]);
    let inlined = inline_includes(Some(&includes), &expr("INCLUDE active_adult")).unwrap();
    assert_eq!(inlined.to_string(), "(age >= 18) AND active == true");
}

#[test]
fn test_included_operand_keeps_its_grouping() {
    let includes = named(&[("vip", "tier == 'gold' OR spend > 1000")]);

    let inlined = inline_includes(Some(&includes), &expr("active AND INCLUDE vip")).unwrap();
    assert_eq!(inlined.to_string(), "active AND (tier == 'gold' OR spend > 1000)");

    let inlined = inline_includes(Some(&includes), &expr("-INCLUDE vip")).unwrap();
    assert_eq!(inlined.to_string(), "-(tier == 'gold' OR spend > 1000)");

    // a whole-expression include needs no grouping
    let inlined = inline_includes(Some(&includes), &expr("INCLUDE vip")).unwrap();
    assert_eq!(inlined.to_string(), "tier == 'gold' OR spend > 1000");
}

#[test]
fn test_include_below_function_and_in() {
    let includes = named(&[("limit_val", "10")]);
    let inlined = inline_includes(Some(&includes), &expr("x IN (INCLUDE limit_val, 2)")).unwrap();
    assert_eq!(inlined.to_string(), "x IN (10, 2)");
}

#[test]
fn test_missing_includer_and_name() {
    let root = expr("INCLUDE nowhere");
    assert!(matches!(inline_includes(None, &root), Err(Error::NoIncluder)));

    let includes = named(&[]);
    assert!(matches!(
        inline_includes(Some(&includes), &root),
        Err(Error::IncludeNotFound { name }) if name == "nowhere"
    ));
}

#[test]
fn test_tree_without_includes_needs_no_includer() {
    let root = expr("a == 1 OR b BETWEEN 1 AND 2");
    assert_eq!(inline_includes(None, &root).unwrap(), root);
}

// ============================================================================
// Memoisation and guards
// ============================================================================

#[test]
fn test_resolution_is_memoised() {
    let includer = CountingIncluder {
        filters: named(&[("adult", "age >= 18")]),
        calls: Cell::new(0),
    };
    let root = expr("INCLUDE adult");

    let mut resolver = IncludeResolver::new(Some(&includer));
    let first = resolver.inline(&root).unwrap();
    let second = resolver.inline(&root).unwrap();
    assert_eq!(first, second);
    assert_eq!(includer.calls.get(), 1);
    assert_eq!(resolver.cached(), 1);

    // a different reference to the same name is resolved on its own
    resolver.inline(&expr("INCLUDE adult")).unwrap();
    assert_eq!(includer.calls.get(), 2);
}

#[test]
fn test_self_reference_hits_depth_ceiling() {
    let includes = named(&[("loop", "INCLUDE loop")]);
    assert!(matches!(
        inline_includes(Some(&includes), &expr("INCLUDE loop")),
        Err(Error::MaxIncludeDepthExceeded { depth: 100 })
    ));
}

#[test]
fn test_long_chain_within_ceiling() {
    let mut includes = HashMap::new();
    for i in 0..50 {
        includes.insert(format!("f{i}"), expr(&format!("INCLUDE f{}", i + 1)));
    }
    includes.insert("f50".to_string(), expr("done == true"));

    let inlined = inline_includes(Some(&includes), &expr("INCLUDE f0")).unwrap();
    assert_eq!(inlined.to_string(), "done == true");
}

#[test]
fn test_configured_ceiling() {
    let includes = named(&[("a", "INCLUDE b"), ("b", "INCLUDE c"), ("c", "x == 1")]);
    let config = ParserConfig {
        max_include_depth: 2,
        ..ParserConfig::default()
    };
    let mut resolver = IncludeResolver::new(Some(&includes)).with_config(&config);
    assert!(matches!(
        resolver.inline(&expr("INCLUDE a")),
        Err(Error::MaxIncludeDepthExceeded { depth: 2 })
    ));

    let mut resolver = IncludeResolver::new(Some(&includes)).with_max_depth(3);
    assert!(resolver.inline(&expr("INCLUDE a")).is_ok());
}

#[test]
fn test_cancellation() {
    let includes = named(&[("adult", "age >= 18")]);
    let token = CancellationToken::new();
    let mut resolver = IncludeResolver::new(Some(&includes)).with_cancellation(token.clone());

    assert!(resolver.inline(&expr("INCLUDE adult")).is_ok());
    token.cancel();
    assert!(matches!(
        resolver.inline(&expr("INCLUDE adult")),
        Err(Error::Cancelled)
    ));
}

// ============================================================================
// DateMath
// ============================================================================

#[test]
fn test_date_math_detection() {
    assert!(has_date_math(&expr(r#"last_event < "now-1d""#)));
    assert!(!has_date_math(&expr(r#"last_event < "2020-01-01""#)));
    assert!(has_date_math(&expr(r#"a == 1 AND NOT (b > "Now")"#)));
    assert!(!has_date_math(&expr(r#"tostring(x) == "snow""#)));
}

#[test]
fn test_date_math_after_inlining() {
    let includes = named(&[("recent", r#"lastvisit_ts > "now-30d""#)]);
    let stmt = parse_filterql("FILTER AND ( INCLUDE recent )").unwrap();
    assert!(!stmt.has_date_math());

    let inlined = IncludeResolver::new(Some(&includes))
        .inline_filter(&stmt.filter)
        .unwrap();
    assert!(has_date_math(&inlined));
    assert!(matches!(
        inlined,
        Node::Boolean { ref args, .. } if args.len() == 1
    ));
}

#[test]
fn test_tree_has_date_math() {
    let tree = parse_expression(r#"NOT created < "now-1h""#).unwrap();
    assert!(matches!(tree.root, Node::Unary { op: UnaryOp::Not, .. }));
    assert!(tree.has_date_math());
}
