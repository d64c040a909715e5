//! Parse a query and describe the result

use super::{CliError, filter_to_json, node_to_json, sql_to_json};
use crate::{ParserConfig, builtins, parse_expression_with, parse_filterql_with, parse_sql_with};

/// Which grammar the query is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryKind {
    #[default]
    Expression,
    Sql,
    Filter,
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query text
    pub query: String,
    pub kind: QueryKind,
    pub config: ParserConfig,
    /// Describe the tree as JSON instead of rendering it back to text
    pub json: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Canonical text of the parsed query
    Rendered(String),
    /// JSON description of the syntax tree
    Tree(serde_json::Value),
}

/// Parse the query in `options` with the builtin function registry
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let query = options.query.trim();
    if query.is_empty() {
        return Err(CliError::NoInput);
    }

    let registry = builtins();
    let config = options.config;

    let result = match options.kind {
        QueryKind::Expression => {
            let tree = parse_expression_with(query, registry, config)?;
            if options.json {
                CheckResult::Tree(node_to_json(&tree.root))
            } else {
                CheckResult::Rendered(tree.to_string())
            }
        }
        QueryKind::Sql => {
            let stmt = parse_sql_with(query, registry, config)?;
            if options.json {
                CheckResult::Tree(sql_to_json(&stmt))
            } else {
                CheckResult::Rendered(stmt.to_string())
            }
        }
        QueryKind::Filter => {
            let stmt = parse_filterql_with(query, registry, config)?;
            if options.json {
                CheckResult::Tree(filter_to_json(&stmt))
            } else {
                CheckResult::Rendered(stmt.to_string())
            }
        }
    };
    Ok(result)
}
