//! Named-filter inlining.
//!
//! An `INCLUDE name` reference is replaced by the expression the
//! [`Includer`] returns for `name`, recursively, so a filter may include a
//! filter that includes another. Nested expansion stops at a depth ceiling;
//! there is no cycle detection beyond that.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ast::{Filters, FuncCall, IncludeRef, Node, NodeId, UnaryOp};
use crate::config::ParserConfig;
use crate::error::{Error, Result};

/// Supplies the root expression of a named filter.
pub trait Includer {
    fn include(&self, name: &str) -> Result<Node>;
}

impl Includer for HashMap<String, Node> {
    fn include(&self, name: &str) -> Result<Node> {
        self.get(name).cloned().ok_or_else(|| Error::IncludeNotFound {
            name: name.to_string(),
        })
    }
}

/// Shared flag that aborts include resolution from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Inlines include references and remembers every substitution it made.
///
/// The memo is keyed by the identity of the include reference, so resolving
/// the same reference again (even inside a different call to
/// [`inline`](Self::inline)) returns the earlier result without asking the
/// includer.
pub struct IncludeResolver<'a> {
    includer: Option<&'a dyn Includer>,
    cache: HashMap<NodeId, Node>,
    max_depth: usize,
    cancel: Option<CancellationToken>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(includer: Option<&'a dyn Includer>) -> Self {
        IncludeResolver {
            includer,
            cache: HashMap::new(),
            max_depth: ParserConfig::default().max_include_depth,
            cancel: None,
        }
    }

    pub fn with_config(mut self, config: &ParserConfig) -> Self {
        self.max_depth = config.max_include_depth;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Number of memoised substitutions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// A copy of `root` with every include reference substituted.
    pub fn inline(&mut self, root: &Node) -> Result<Node> {
        self.walk(root, 0)
    }

    /// Inline a FilterQL body, returning it as a `Boolean` tree.
    pub fn inline_filter(&mut self, filter: &Filters) -> Result<Node> {
        self.inline(&filter.to_node())
    }

    fn walk(&mut self, node: &Node, depth: usize) -> Result<Node> {
        let node = match node {
            Node::Include(include) => return self.expand(include, depth),
            Node::Literal(_) | Node::Identity(_) | Node::Value(_) => node.clone(),
            Node::Binary {
                op,
                left,
                right,
                paren,
            } => Node::Binary {
                op: *op,
                left: Box::new(self.walk_operand(left, depth)?),
                right: Box::new(self.walk_operand(right, depth)?),
                paren: *paren,
            },
            Node::Unary {
                op: UnaryOp::Negate,
                arg,
            } => Node::unary(UnaryOp::Negate, self.walk_operand(arg, depth)?),
            Node::Unary { op, arg } => Node::unary(*op, self.walk(arg, depth)?),
            Node::Tri { op, a, b, c } => Node::Tri {
                op: *op,
                a: Box::new(self.walk_operand(a, depth)?),
                b: Box::new(self.walk_operand(b, depth)?),
                c: Box::new(self.walk_operand(c, depth)?),
            },
            Node::MultiArg {
                op,
                operand,
                candidates,
            } => Node::MultiArg {
                op: *op,
                operand: Box::new(self.walk_operand(operand, depth)?),
                candidates: candidates
                    .iter()
                    .map(|c| self.walk_operand(c, depth))
                    .collect::<Result<_>>()?,
            },
            Node::Func(call) => Node::Func(FuncCall {
                name: call.name.clone(),
                func: Arc::clone(&call.func),
                args: self.walk_all(&call.args, depth)?,
            }),
            Node::Boolean { op, args, negated } => Node::Boolean {
                op: *op,
                args: self.walk_all(args, depth)?,
                negated: *negated,
            },
        };
        Ok(node)
    }

    /// An include used as an operand keeps its substitution grouped, so
    /// `a AND INCLUDE x` with `x = b OR c` renders `a AND (b OR c)`.
    fn walk_operand(&mut self, node: &Node, depth: usize) -> Result<Node> {
        let walked = self.walk(node, depth)?;
        if matches!(node, Node::Include(_)) {
            Ok(parenthesized(walked))
        } else {
            Ok(walked)
        }
    }

    fn walk_all(&mut self, nodes: &[Node], depth: usize) -> Result<Vec<Node>> {
        nodes.iter().map(|n| self.walk(n, depth)).collect()
    }

    fn expand(&mut self, include: &IncludeRef, depth: usize) -> Result<Node> {
        if let Some(done) = self.cache.get(&include.id) {
            return Ok(done.clone());
        }
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        if depth >= self.max_depth {
            return Err(Error::MaxIncludeDepthExceeded {
                depth: self.max_depth,
            });
        }
        let includer = self.includer.ok_or(Error::NoIncluder)?;

        log::trace!("expanding include {} at depth {depth}", include.name);
        let resolved = includer.include(&include.name)?;
        let inlined = self.walk(&resolved, depth + 1)?;
        let result = if include.negated {
            Node::unary(UnaryOp::Not, parenthesized(inlined))
        } else {
            inlined
        };

        self.cache.insert(include.id, result.clone());
        Ok(result)
    }
}

/// Mark a substituted binary as grouped so it renders in parentheses.
fn parenthesized(node: Node) -> Node {
    match node {
        Node::Binary {
            op, left, right, ..
        } => Node::Binary {
            op,
            left,
            right,
            paren: true,
        },
        other => other,
    }
}

/// One-shot inlining of every include reachable from `root`.
///
/// ```
/// use std::collections::HashMap;
/// use qlfront::{inline_includes, parse_expression};
///
/// let mut named = HashMap::new();
/// named.insert("is_yoda".to_string(), parse_expression(r#"name == "Yoda""#).unwrap().root);
///
/// let tree = parse_expression("INCLUDE is_yoda").unwrap();
/// let inlined = inline_includes(Some(&named), &tree.root).unwrap();
/// assert_eq!(inlined.to_string(), r#"name == "Yoda""#);
/// ```
pub fn inline_includes(includer: Option<&dyn Includer>, root: &Node) -> Result<Node> {
    IncludeResolver::new(includer).inline(root)
}
