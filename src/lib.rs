//! Query-language front end: text in, typed syntax tree out.
//!
//! Three surface syntaxes share one lexer, one token pager and one
//! precedence-climbing expression core:
//!
//! - plain expressions: `tostring(a) == "x" AND b BETWEEN 1 AND 10`
//! - SQL statements: `SELECT a, count(*) AS n FROM t WHERE a > 1 GROUP BY a`
//! - FilterQL: `FILTER AND ( name != NULL, INCLUDE active ) LIMIT 100`
//!
//! ```
//! use qlfront::{SqlStatement, parse_sql};
//!
//! let stmt = parse_sql("select @@version_comment limit 7").unwrap();
//! let SqlStatement::Select(select) = stmt else { panic!() };
//! assert_eq!(select.columns[0].as_name, "@@version_comment");
//! assert_eq!(select.limit, Some(7));
//! ```
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod datemath;
pub mod error;
pub mod include;
pub mod lexer;
pub mod output;
pub mod pager;
pub mod parser;
pub mod registry;
pub mod value;

pub use ast::{
    BinOp, BoolOp, Column, FilterExpr, FilterStatement, Filters, FuncCall, Identity, IncludeRef,
    Literal, Node, NodeId, NodeKind, Number, SqlSelect, SqlStatement, SqlWhere, Token, TokenKind,
    Tree, UnaryOp,
};
pub use config::{ParseMode, ParserConfig};
pub use datemath::has_date_math;
pub use error::{Error, Result};
pub use include::{CancellationToken, IncludeResolver, Includer, inline_includes};
pub use lexer::Lexer;
pub use pager::{Dialect, TokenPager, TokenSource};
pub use parser::{
    Parser, parse_expression, parse_expression_with, parse_filterql, parse_filterql_with,
    parse_sql, parse_sql_with,
};
pub use registry::{FuncDescriptor, FunctionRegistry, builtins};
pub use value::Value;
