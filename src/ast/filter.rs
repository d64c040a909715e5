use std::collections::HashMap;
use std::fmt;

use crate::ast::{BoolOp, IncludeRef, Node};
use crate::output::quote_identity;
use crate::value::Value;

/// A parsed FilterQL statement.
///
/// ```text
/// FILTER AND ( name != NULL, INCLUDE is_active ) FROM users LIMIT 100 ALIAS active_users
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStatement {
    pub filter: Filters,
    pub from: Option<String>,
    pub limit: Option<u64>,
    pub alias: Option<String>,
    /// Properties from a `WITH {json}` clause
    pub with: Option<HashMap<String, Value>>,
}

impl FilterStatement {
    pub fn new(filter: Filters) -> Self {
        FilterStatement {
            filter,
            from: None,
            limit: None,
            alias: None,
            with: None,
        }
    }

    /// True when any expression compares against a relative date such as
    /// `"now-1d"`; such filters need periodic re-evaluation.
    pub fn has_date_math(&self) -> bool {
        crate::datemath::has_date_math(&self.filter.to_node())
    }

    pub fn has_includes(&self) -> bool {
        self.filter.has_includes()
    }
}

/// A boolean group: every item must match (`AND`) or any item (`OR`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub op: BoolOp,
    pub negated: bool,
    pub items: Vec<FilterExpr>,
}

/// One element of a [`Filters`] group.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `INCLUDE name` / `NOT INCLUDE name`
    Include(IncludeRef),
    /// A boolean expression from the core grammar
    Expr(Node),
    /// A nested `AND ( ... )` / `OR ( ... )` group
    Nested(Filters),
}

impl Filters {
    pub fn new(op: BoolOp) -> Self {
        Filters {
            op,
            negated: false,
            items: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_includes(&self) -> bool {
        self.items.iter().any(|item| match item {
            FilterExpr::Include(_) => true,
            FilterExpr::Expr(node) => node.has_includes(),
            FilterExpr::Nested(group) => group.has_includes(),
        })
    }

    /// The group as an expression tree: a [`Node::Boolean`] whose includes
    /// keep their identity, so a resolver cache keyed on them stays valid.
    pub fn to_node(&self) -> Node {
        Node::Boolean {
            op: self.op,
            negated: self.negated,
            args: self.items.iter().map(FilterExpr::to_node).collect(),
        }
    }
}

impl FilterExpr {
    pub fn to_node(&self) -> Node {
        match self {
            FilterExpr::Include(inc) => Node::Include(inc.clone()),
            FilterExpr::Expr(node) => node.clone(),
            FilterExpr::Nested(group) => group.to_node(),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterExpr::Include(inc) => write!(f, "{inc}"),
            FilterExpr::Expr(node) => write!(f, "{node}"),
            FilterExpr::Nested(group) => write!(f, "{group}"),
        }
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{} ( ", self.op)?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str(" )")
    }
}

impl fmt::Display for FilterStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FILTER {}", self.filter)?;
        if let Some(from) = &self.from {
            write!(f, " FROM {}", quote_identity(from, None))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(alias) = &self.alias {
            write!(f, " ALIAS {}", quote_identity(alias, None))?;
        }
        if let Some(with) = &self.with {
            write!(f, " WITH {}", Value::Object(with.clone()))?;
        }
        Ok(())
    }
}
