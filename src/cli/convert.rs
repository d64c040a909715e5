//! Syntax tree -> JSON description

use serde_json::{Value as Json, json};

use crate::ast::{
    Column, FilterExpr, FilterStatement, Filters, Literal, Node, Number, SqlSelect, SqlStatement,
    SqlWhere,
};

fn literal_to_json(lit: &Literal) -> Json {
    match lit {
        Literal::Number(Number::Integer(n)) => json!(n),
        // Decimals keep their exact digits
        Literal::Number(Number::Decimal(d)) => json!(d.to_string()),
        Literal::String { value, .. } => json!(value),
        Literal::Null => Json::Null,
    }
}

fn nodes_to_json(nodes: &[Node]) -> Json {
    Json::Array(nodes.iter().map(node_to_json).collect())
}

/// Describe an expression node as `{"kind": ..., ...}`.
pub fn node_to_json(node: &Node) -> Json {
    match node {
        Node::Literal(lit) => json!({ "kind": "literal", "value": literal_to_json(lit) }),
        Node::Identity(ident) => json!({ "kind": "identity", "name": ident.text }),
        Node::Value(value) => json!({ "kind": "value", "value": Json::from(value) }),
        Node::Binary {
            op, left, right, ..
        } => json!({
            "kind": "binary",
            "op": op.as_str(),
            "left": node_to_json(left),
            "right": node_to_json(right),
        }),
        Node::Unary { op, arg } => json!({
            "kind": "unary",
            "op": op.as_str(),
            "arg": node_to_json(arg),
        }),
        Node::Tri { a, b, c, .. } => json!({
            "kind": "between",
            "operand": node_to_json(a),
            "lower": node_to_json(b),
            "upper": node_to_json(c),
        }),
        Node::MultiArg {
            operand,
            candidates,
            ..
        } => json!({
            "kind": "in",
            "operand": node_to_json(operand),
            "candidates": nodes_to_json(candidates),
        }),
        Node::Func(call) => json!({
            "kind": "func",
            "name": call.name,
            "aggregate": call.func.aggregate,
            "checked": !call.func.is_placeholder(),
            "args": nodes_to_json(&call.args),
        }),
        Node::Boolean { op, args, negated } => json!({
            "kind": "boolean",
            "op": op.as_str(),
            "negated": negated,
            "args": nodes_to_json(args),
        }),
        Node::Include(include) => json!({
            "kind": "include",
            "name": include.name,
            "negated": include.negated,
        }),
    }
}

fn opt_node(node: Option<&Node>) -> Json {
    node.map_or(Json::Null, node_to_json)
}

fn column_to_json(col: &Column) -> Json {
    json!({
        "as": col.as_name,
        "expr": opt_node(col.expr.as_ref()),
        "guard": opt_node(col.guard.as_ref()),
        "comment": col.comment,
        "order": col.order.map(|o| o.to_string()),
    })
}

fn select_to_json(select: &SqlSelect) -> Json {
    let where_clause = match &select.where_clause {
        None => Json::Null,
        Some(SqlWhere::Expr(node)) => node_to_json(node),
        Some(SqlWhere::SubSelect(sub)) => json!({ "kind": "select", "select": select_to_json(sub) }),
        Some(SqlWhere::In {
            operand,
            negated,
            source,
        }) => json!({
            "kind": "in_select",
            "operand": node_to_json(operand),
            "negated": negated,
            "select": select_to_json(source),
        }),
    };
    json!({
        "distinct": select.distinct,
        "columns": select.columns.iter().map(column_to_json).collect::<Vec<_>>(),
        "from": select.from.as_ref().map(|s| json!({ "name": s.name, "alias": s.alias })),
        "where": where_clause,
        "group_by": select.group_by.iter().map(column_to_json).collect::<Vec<_>>(),
        "order_by": select.order_by.iter().map(column_to_json).collect::<Vec<_>>(),
        "limit": select.limit,
        "offset": select.offset,
    })
}

pub fn sql_to_json(stmt: &SqlStatement) -> Json {
    let body = match stmt {
        SqlStatement::Select(select) => select_to_json(select),
        SqlStatement::Insert(insert) => json!({
            "table": insert.table,
            "columns": insert.columns,
            "rows": insert.rows.iter().map(|row| nodes_to_json(row)).collect::<Vec<_>>(),
        }),
        SqlStatement::Update(update) => json!({
            "table": update.table,
            "set": update
                .values
                .iter()
                .map(|(name, value)| json!({ "column": name, "value": node_to_json(value) }))
                .collect::<Vec<_>>(),
            "where": opt_node(update.where_clause.as_ref()),
            "limit": update.limit,
        }),
        SqlStatement::Delete(delete) => json!({
            "table": delete.table,
            "where": opt_node(delete.where_clause.as_ref()),
            "limit": delete.limit,
        }),
        SqlStatement::Prepare(prepare) => json!({
            "name": prepare.name,
            "statement": sql_to_json(&prepare.statement),
        }),
        SqlStatement::Describe(d) => json!({ "identity": d.identity }),
        SqlStatement::Show(s) => json!({ "identity": s.identity }),
    };
    json!({ "statement": stmt.keyword(), "body": body })
}

fn filters_to_json(filters: &Filters) -> Json {
    let items: Vec<Json> = filters
        .items
        .iter()
        .map(|item| match item {
            FilterExpr::Include(include) => json!({
                "include": include.name,
                "negated": include.negated,
            }),
            FilterExpr::Expr(node) => json!({ "expr": node_to_json(node) }),
            FilterExpr::Nested(group) => json!({ "nested": filters_to_json(group) }),
        })
        .collect();
    json!({
        "op": filters.op.as_str(),
        "negated": filters.negated,
        "items": items,
    })
}

pub fn filter_to_json(stmt: &FilterStatement) -> Json {
    json!({
        "filter": filters_to_json(&stmt.filter),
        "from": stmt.from,
        "limit": stmt.limit,
        "alias": stmt.alias,
        "with": stmt.with.as_ref().map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), Json::from(v)))
                .collect::<serde_json::Map<_, _>>()
        }),
        "date_math": stmt.has_date_math(),
    })
}
