//! # Abstract Syntax Tree
//!
//! This module defines the tree produced by all three surface grammars: the
//! generic expression language, the SQL-like statement language and the
//! FilterQL filter DSL. A separate evaluator walks these trees against row
//! data; nothing here executes anything.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens consumed by the parser
//! - **[operators]** - Binary, unary and boolean-group operators
//! - **[expressions]** - The closed set of expression [`Node`] variants
//! - **[tree]** - A standalone parsed expression
//! - **[statements]** - SQL statements (`SELECT`, `INSERT`, `UPDATE`, ...)
//! - **[filter]** - FilterQL statements and their nested boolean groups
//!
//! ## Node Variants
//!
//! | Variant    | Source text                     |
//! |------------|---------------------------------|
//! | `Literal`  | `42`, `"hello"`, `NULL`         |
//! | `Identity` | `name`, `users.email`           |
//! | `Value`    | `true`, `[1, 2]`, `{"a": 1}`    |
//! | `Binary`   | `a + b`, `x == 1`, `a AND b`    |
//! | `Unary`    | `NOT x`, `EXISTS x`, `-x`       |
//! | `Tri`      | `x BETWEEN 1 AND 10`            |
//! | `MultiArg` | `x IN (1, 2, 3)`                |
//! | `Func`     | `tostring(x)`                   |
//! | `Boolean`  | `AND ( a, b )`                  |
//! | `Include`  | `INCLUDE named_filter`          |
//!
//! ## Rendering
//!
//! Every node, statement and filter implements `Display`, and the rendered
//! text parses back into the same shape. Parentheses written in the source
//! around a binary expression are remembered so they come back too:
//!
//! ```text
//! (a OR b) AND c
//! ```
//!
//! renders as written even though the tree alone already encodes the
//! grouping.
pub mod tokens;
pub mod operators;
pub mod expressions;
pub mod tree;
pub mod statements;
pub mod filter;

pub use tokens::{Token, TokenKind};
pub use operators::{BinOp, BoolOp, UnaryOp};
pub use expressions::{
    FuncCall, Identity, IncludeRef, Literal, MultiArgOp, Node, NodeId, NodeKind, Number, TriOp,
};
pub use tree::Tree;
pub use statements::{
    Column, SortOrder, SqlDelete, SqlDescribe, SqlInsert, SqlPrepare, SqlSelect, SqlShow,
    SqlSource, SqlStatement, SqlUpdate, SqlWhere,
};
pub use filter::{FilterExpr, FilterStatement, Filters};
