use std::fmt;

use crate::ast::Node;
use crate::error::Result;

/// A parsed standalone expression.
///
/// Owns its whole node graph; nothing in it is shared with another tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub root: Node,
}

impl Tree {
    pub fn new(root: Node) -> Self {
        Tree { root }
    }

    pub fn check(&self) -> Result<()> {
        self.root.check()
    }

    pub fn has_date_math(&self) -> bool {
        crate::datemath::has_date_math(&self.root)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
