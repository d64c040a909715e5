//! Relative-date detection.
//!
//! A filter such as `lastvisit_ts < "now-1d"` matches a different set of
//! rows as time passes, so whoever caches its results has to re-evaluate it
//! periodically. [`has_date_math`] finds such comparisons.

use crate::ast::{Literal, Node};
use crate::value::Value;

const NOW_PREFIX: &str = "now";

/// True when the right-hand side of any reachable binary expression is a
/// string starting with `now` (any case).
///
/// Only `Binary`, `Boolean` and `Unary` nodes are walked through; function
/// arguments and `BETWEEN`/`IN` operands are not considered.
pub fn has_date_math(node: &Node) -> bool {
    match node {
        Node::Binary { left, right, .. } => {
            is_now_literal(right) || has_date_math(left) || has_date_math(right)
        }
        Node::Boolean { args, .. } => args.iter().any(has_date_math),
        Node::Unary { arg, .. } => has_date_math(arg),
        _ => false,
    }
}

fn is_now_literal(node: &Node) -> bool {
    let text = match node {
        Node::Literal(Literal::String { value, .. }) => value.as_str(),
        Node::Value(Value::String(value)) => value.as_str(),
        _ => return false,
    };
    text.get(..NOW_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(NOW_PREFIX))
}

#[test]
fn test_now_prefix_is_case_insensitive() {
    assert!(is_now_literal(&Node::string("NOW-2h")));
    assert!(is_now_literal(&Node::Value(Value::String("now".into()))));
    assert!(!is_now_literal(&Node::string("no")));
    assert!(!is_now_literal(&Node::string("snow")));
    assert!(!is_now_literal(&Node::identity("now")));
}

#[test]
fn test_walks_nested_groups() {
    use crate::ast::{BinOp, BoolOp, UnaryOp};

    let cmp = Node::binary(BinOp::LessThan, Node::identity("ts"), Node::string("now-1d"));
    let group = Node::Boolean {
        op: BoolOp::Or,
        negated: false,
        args: vec![Node::integer(1), Node::unary(UnaryOp::Not, cmp)],
    };
    assert!(has_date_math(&group));
    assert!(!has_date_math(&Node::string("now")));
}
