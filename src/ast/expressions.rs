use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;

use crate::ast::{BinOp, BoolOp, UnaryOp};
use crate::error::{Error, Result};
use crate::output::{quote_identity, quote_string};
use crate::registry::FuncDescriptor;
use crate::value::Value;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a node instance that needs one (include references).
///
/// Assigned once at construction; clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Numeric literal, integral when it fits an `i64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(Decimal),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Decimal(d) => write!(f, "{d}"),
        }
    }
}

/// Scalar literal written directly in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Number),
    /// String literal and the delimiter it was written with
    String { value: String, quote: char },
    Null,
}

/// Unresolved column or variable reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub text: String,
    /// Delimiter when the identity was written quoted (`` `first name` ``)
    pub quote: Option<char>,
}

impl Identity {
    pub fn new(text: impl Into<String>) -> Self {
        Identity {
            text: text.into(),
            quote: None,
        }
    }

    /// Split a dotted identity at its first dot: `users.email` gives
    /// `(Some("users"), "email")`, `email` gives `(None, "email")`.
    pub fn left_right(&self) -> (Option<&str>, &str) {
        if self.quote.is_some() {
            return (None, &self.text);
        }
        match self.text.split_once('.') {
            Some((left, right)) => (Some(left), right),
            None => (None, &self.text),
        }
    }
}

/// Reference to a named filter, substituted by include resolution.
#[derive(Debug, Clone)]
pub struct IncludeRef {
    pub id: NodeId,
    pub name: String,
    pub negated: bool,
}

impl IncludeRef {
    pub fn new(name: impl Into<String>, negated: bool) -> Self {
        IncludeRef {
            id: NodeId::next(),
            name: name.into(),
            negated,
        }
    }
}

// Two references are the same shape whatever instance they came from.
impl PartialEq for IncludeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.negated == other.negated
    }
}

/// Function call with the descriptor it was resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub func: Arc<FuncDescriptor>,
    pub args: Vec<Node>,
}

impl FuncCall {
    pub fn check(&self) -> Result<()> {
        self.func.check_arity_for(&self.name, self.args.len())?;
        self.args.iter().try_for_each(Node::check)
    }
}

/// Ternary operator; `BETWEEN` is the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriOp {
    Between,
}

/// Operand-versus-candidates operator; `IN` is the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiArgOp {
    In,
}

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Identity,
    Value,
    Binary,
    Unary,
    Tri,
    MultiArg,
    Func,
    Boolean,
    Include,
}

/// Abstract Syntax Tree node.
///
/// The set of variants is closed. Nodes are immutable after construction;
/// include substitution builds a new tree rather than patching this one.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `42`, `"hello"`, `NULL`
    Literal(Literal),

    /// `name`, `users.email`, `` `first name` ``
    Identity(Identity),

    /// Embedded runtime value: `true`, `[1, 2]`, `{"a": 1}`
    Value(Value),

    /// `left op right`
    ///
    /// `paren` records that the source wrapped this node in parentheses so
    /// rendering restores them.
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
        paren: bool,
    },

    /// `NOT x`, `EXISTS x`, `-x`
    Unary { op: UnaryOp, arg: Box<Node> },

    /// `a BETWEEN b AND c`
    Tri {
        op: TriOp,
        a: Box<Node>,
        b: Box<Node>,
        c: Box<Node>,
    },

    /// `operand IN (candidate, ...)`; at least one candidate
    MultiArg {
        op: MultiArgOp,
        operand: Box<Node>,
        candidates: Vec<Node>,
    },

    /// `name(arg, ...)`
    Func(FuncCall),

    /// N-ary boolean group `AND ( a, b, ... )`
    Boolean {
        op: BoolOp,
        args: Vec<Node>,
        negated: bool,
    },

    /// `INCLUDE name`
    Include(IncludeRef),
}

impl Node {
    pub fn integer(n: i64) -> Self {
        Node::Literal(Literal::Number(Number::Integer(n)))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::Literal(Literal::String {
            value: value.into(),
            quote: '"',
        })
    }

    pub fn identity(text: impl Into<String>) -> Self {
        Node::Identity(Identity::new(text))
    }

    pub fn binary(op: BinOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            paren: false,
        }
    }

    pub fn unary(op: UnaryOp, arg: Node) -> Self {
        Node::Unary {
            op,
            arg: Box::new(arg),
        }
    }

    pub fn include(name: impl Into<String>, negated: bool) -> Self {
        Node::Include(IncludeRef::new(name, negated))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Literal(_) => NodeKind::Literal,
            Node::Identity(_) => NodeKind::Identity,
            Node::Value(_) => NodeKind::Value,
            Node::Binary { .. } => NodeKind::Binary,
            Node::Unary { .. } => NodeKind::Unary,
            Node::Tri { .. } => NodeKind::Tri,
            Node::MultiArg { .. } => NodeKind::MultiArg,
            Node::Func(_) => NodeKind::Func,
            Node::Boolean { .. } => NodeKind::Boolean,
            Node::Include(_) => NodeKind::Include,
        }
    }

    /// Structural self-validation.
    ///
    /// Recurses into children and verifies function arity against the
    /// resolved descriptor. Types are not inferred here.
    pub fn check(&self) -> Result<()> {
        match self {
            Node::Literal(_) | Node::Identity(_) | Node::Value(_) | Node::Include(_) => Ok(()),
            Node::Binary { left, right, .. } => {
                left.check()?;
                right.check()
            }
            Node::Unary { arg, .. } => arg.check(),
            Node::Tri { a, b, c, .. } => {
                a.check()?;
                b.check()?;
                c.check()
            }
            Node::MultiArg {
                operand,
                candidates,
                ..
            } => {
                if candidates.is_empty() {
                    return Err(Error::MalformedIn {
                        context: self.to_string(),
                    });
                }
                operand.check()?;
                candidates.iter().try_for_each(Node::check)
            }
            Node::Func(call) => call.check(),
            Node::Boolean { args, .. } => args.iter().try_for_each(Node::check),
        }
    }

    /// True when an include reference is reachable from this node.
    pub fn has_includes(&self) -> bool {
        match self {
            Node::Include(_) => true,
            Node::Literal(_) | Node::Identity(_) | Node::Value(_) => false,
            Node::Binary { left, right, .. } => left.has_includes() || right.has_includes(),
            Node::Unary { arg, .. } => arg.has_includes(),
            Node::Tri { a, b, c, .. } => a.has_includes() || b.has_includes() || c.has_includes(),
            Node::MultiArg {
                operand,
                candidates,
                ..
            } => operand.has_includes() || candidates.iter().any(Node::has_includes),
            Node::Func(call) => call.args.iter().any(Node::has_includes),
            Node::Boolean { args, .. } => args.iter().any(Node::has_includes),
        }
    }

    fn is_bare_binary(&self) -> bool {
        matches!(self, Node::Binary { paren: false, .. })
    }

    // NOT and EXISTS take a whole boolean expression as operand, so written
    // next to a binary operator they must be fenced off.
    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Unary {
                op: UnaryOp::Not | UnaryOp::Exists,
                ..
            } => write!(f, "({self})"),
            _ => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String { value, quote } => f.write_str(&quote_string(value, *quote)),
            Literal::Null => f.write_str("NULL"),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_identity(&self.text, self.quote))
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for IncludeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "INCLUDE {}", quote_identity(&self.name, None))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(lit) => write!(f, "{lit}"),
            Node::Identity(ident) => write!(f, "{ident}"),
            Node::Value(v) => write!(f, "{v}"),
            Node::Binary {
                op,
                left,
                right,
                paren,
            } => {
                if *paren {
                    f.write_str("(")?;
                }
                left.fmt_operand(f)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f)?;
                if *paren {
                    f.write_str(")")?;
                }
                Ok(())
            }
            // NOT and EXISTS read a whole expression, minus a single primary
            Node::Unary {
                op: UnaryOp::Negate,
                arg,
            } => {
                if arg.is_bare_binary() || matches!(**arg, Node::Unary { .. }) {
                    write!(f, "-({arg})")
                } else {
                    write!(f, "-{arg}")
                }
            }
            Node::Unary { op, arg } => write!(f, "{op} {arg}"),
            Node::Tri { a, b, c, .. } => {
                a.fmt_operand(f)?;
                f.write_str(" BETWEEN ")?;
                b.fmt_operand(f)?;
                f.write_str(" AND ")?;
                c.fmt_operand(f)
            }
            Node::MultiArg {
                operand,
                candidates,
                ..
            } => {
                operand.fmt_operand(f)?;
                f.write_str(" IN (")?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str(")")
            }
            Node::Func(call) => write!(f, "{call}"),
            Node::Boolean { op, args, negated } => {
                if *negated {
                    f.write_str("NOT ")?;
                }
                write!(f, "{op} ( ")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(" )")
            }
            Node::Include(inc) => write!(f, "{inc}"),
        }
    }
}
