use std::fmt;

use crate::ast::Node;
use crate::error::Result;
use crate::output::{quote_identity, quote_string};

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlStatement {
    /// `SELECT cols [FROM t] [WHERE ..] [GROUP BY ..] [ORDER BY ..] [LIMIT n] [OFFSET n]`
    Select(SqlSelect),

    /// `INSERT INTO t (a, b) VALUES (1, 'x'), (2, 'y')`
    Insert(SqlInsert),

    /// `UPDATE t SET a = 1, b = b + 1 [WHERE ..] [LIMIT n]`
    Update(SqlUpdate),

    /// `DELETE FROM t [WHERE ..] [LIMIT n]`
    Delete(SqlDelete),

    /// `PREPARE name FROM 'SELECT ...'`
    Prepare(SqlPrepare),

    /// `DESCRIBE t` or `DESC t`
    Describe(SqlDescribe),

    /// `SHOW tables`
    Show(SqlShow),
}

impl SqlStatement {
    pub fn keyword(&self) -> &'static str {
        match self {
            SqlStatement::Select(_) => "SELECT",
            SqlStatement::Insert(_) => "INSERT",
            SqlStatement::Update(_) => "UPDATE",
            SqlStatement::Delete(_) => "DELETE",
            SqlStatement::Prepare(_) => "PREPARE",
            SqlStatement::Describe(_) => "DESCRIBE",
            SqlStatement::Show(_) => "SHOW",
        }
    }

    /// Structural validation of every expression in the statement.
    pub fn check(&self) -> Result<()> {
        match self {
            SqlStatement::Select(select) => select.check(),
            SqlStatement::Insert(insert) => insert.rows.iter().flatten().try_for_each(Node::check),
            SqlStatement::Update(update) => {
                update.values.iter().try_for_each(|(_, node)| node.check())?;
                update.where_clause.as_ref().map_or(Ok(()), Node::check)
            }
            SqlStatement::Delete(delete) => delete.where_clause.as_ref().map_or(Ok(()), Node::check),
            SqlStatement::Prepare(prepare) => prepare.statement.check(),
            SqlStatement::Describe(_) | SqlStatement::Show(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// One entry of a column list (projection, GROUP BY or ORDER BY).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Output name: the `AS` name, else the identity text, else the
    /// rendered expression
    pub as_name: String,
    /// Source expression; `None` for `*`
    pub expr: Option<Node>,
    /// `IF` guard deciding whether the column is emitted
    pub guard: Option<Node>,
    /// Text of a `--` comment written just before the column
    pub comment: Option<String>,
    /// `ASC`/`DESC` of an ORDER BY column
    pub order: Option<SortOrder>,
}

impl Column {
    pub fn star() -> Self {
        Column {
            as_name: "*".to_string(),
            expr: None,
            guard: None,
            comment: None,
            order: None,
        }
    }

    pub fn new(expr: Node) -> Self {
        Column {
            as_name: Column::default_name(&expr),
            expr: Some(expr),
            guard: None,
            comment: None,
            order: None,
        }
    }

    pub fn default_name(expr: &Node) -> String {
        match expr {
            Node::Identity(ident) => ident.text.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_star(&self) -> bool {
        self.expr.is_none()
    }

    fn check(&self) -> Result<()> {
        if let Some(expr) = &self.expr {
            expr.check()?;
        }
        self.guard.as_ref().map_or(Ok(()), Node::check)
    }
}

/// Table named in `FROM` or as a statement target.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlSource {
    pub name: String,
    pub alias: Option<String>,
}

/// Body of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlWhere {
    Expr(Node),
    /// `WHERE (SELECT ...)`
    SubSelect(Box<SqlSelect>),
    /// `WHERE ident [NOT] IN (SELECT ...)`
    In {
        operand: Node,
        negated: bool,
        source: Box<SqlSelect>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlSelect {
    pub distinct: bool,
    pub columns: Vec<Column>,
    pub from: Option<SqlSource>,
    pub where_clause: Option<SqlWhere>,
    pub group_by: Vec<Column>,
    pub order_by: Vec<Column>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SqlSelect {
    /// True when any projected column calls an aggregate function.
    pub fn is_aggregate(&self) -> bool {
        self.columns.iter().any(|col| match &col.expr {
            Some(Node::Func(call)) => call.func.aggregate,
            _ => false,
        })
    }

    pub fn is_star(&self) -> bool {
        self.columns.len() == 1 && self.columns[0].is_star()
    }

    fn check(&self) -> Result<()> {
        self.columns.iter().try_for_each(Column::check)?;
        match &self.where_clause {
            Some(SqlWhere::Expr(node)) => node.check()?,
            Some(SqlWhere::SubSelect(select)) => select.check()?,
            Some(SqlWhere::In { operand, source, .. }) => {
                operand.check()?;
                source.check()?;
            }
            None => {}
        }
        self.group_by.iter().try_for_each(Column::check)?;
        self.order_by.iter().try_for_each(Column::check)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlInsert {
    pub table: String,
    pub columns: Vec<String>,
    /// Each row holds string or integer literals, one per column
    pub rows: Vec<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlUpdate {
    pub table: String,
    pub values: Vec<(String, Node)>,
    pub where_clause: Option<Node>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlDelete {
    pub table: String,
    pub where_clause: Option<Node>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlPrepare {
    pub name: String,
    pub statement: Box<SqlStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlDescribe {
    pub identity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlShow {
    pub identity: String,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("ASC"),
            SortOrder::Desc => f.write_str("DESC"),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(comment) = &self.comment {
            writeln!(f, "-- {comment}")?;
        }
        let Some(expr) = &self.expr else {
            return f.write_str("*");
        };
        write!(f, "{expr}")?;
        if self.as_name != Column::default_name(expr) {
            write!(f, " AS {}", quote_identity(&self.as_name, None))?;
        }
        if let Some(guard) = &self.guard {
            write!(f, " IF {guard}")?;
        }
        if let Some(order) = &self.order {
            write!(f, " {order}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_identity(&self.name, None))?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", quote_identity(alias, None))?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlWhere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlWhere::Expr(node) => write!(f, "{node}"),
            SqlWhere::SubSelect(select) => write!(f, "({select})"),
            SqlWhere::In {
                operand,
                negated,
                source,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{operand} {not}IN ({source})")
            }
        }
    }
}

impl fmt::Display for SqlSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.columns)?;
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            write_list(f, &self.order_by)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlInsert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {} (", quote_identity(&self.table, None))?;
        let names: Vec<String> = self.columns.iter().map(|c| quote_identity(c, None)).collect();
        write_list(f, &names)?;
        f.write_str(") VALUES ")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str("(")?;
            write_list(f, row)?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", quote_identity(&self.table, None))?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {value}", quote_identity(name, None))?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", quote_identity(&self.table, None))?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlStatement::Select(s) => write!(f, "{s}"),
            SqlStatement::Insert(s) => write!(f, "{s}"),
            SqlStatement::Update(s) => write!(f, "{s}"),
            SqlStatement::Delete(s) => write!(f, "{s}"),
            SqlStatement::Prepare(p) => write!(
                f,
                "PREPARE {} FROM {}",
                quote_identity(&p.name, None),
                quote_string(&p.statement.to_string(), '\'')
            ),
            SqlStatement::Describe(d) => write!(f, "DESCRIBE {}", quote_identity(&d.identity, None)),
            SqlStatement::Show(s) => write!(f, "SHOW {}", quote_identity(&s.identity, None)),
        }
    }
}
