//! Rendering scenarios for composed queries.

use sable_core::{Expr, IntoExpr, Limit, Select, ToSql, Value};

fn assert_sql<T: ToSql>(node: &T, sql: &str, params: &[Value]) {
    assert_eq!(node.sql(), sql);
    assert_eq!(node.params(), params);
}

#[test]
fn test_operator_composition() {
    let query = Select::new(Expr::value(1) & (Expr::value(2) - Expr::raw("current_timestamp")));
    assert_sql(
        &query,
        "select ? and (? - current_timestamp)",
        &[Value::Integer(1), Value::Integer(2)],
    );
}

#[test]
fn test_operator_composition_with_negation() {
    let query =
        Select::new(Expr::value(1) & (Expr::value(2) - Expr::raw("current_timestamp").not()));
    assert_sql(
        &query,
        "select ? and (? - (not current_timestamp))",
        &[Value::Integer(1), Value::Integer(2)],
    );
}

#[test]
fn test_binary_op_binding() {
    let query = Select::new((Expr::value(1) & Expr::value(2)) - Expr::raw("current_timestamp"));
    assert_sql(
        &query,
        "select (? and ?) - current_timestamp",
        &[Value::Integer(1), Value::Integer(2)],
    );
}

#[test]
fn test_full_select_rendering() {
    let query = Select::new(Expr::raw("some_column"))
        .from(Expr::raw("some_table"))
        .find((Expr::raw("some_column") / 2).eq(3) & Expr::raw("other_column").not())
        .order_by([Expr::raw("order_column").desc()])
        .limit(Limit::range(Some(3), Some(5)).unwrap());
    assert_sql(
        &query,
        "select some_column from some_table \
         where ((some_column / ?) = ?) and (not other_column) \
         order by order_column desc limit 3, 2",
        &[Value::Integer(2), Value::Integer(3)],
    );
}

#[test]
fn test_negated_list_groups() {
    assert_sql(&Expr::list([1]).not(), "not (?)", &[Value::Integer(1)]);
}

#[test]
fn test_subquery_as_operand() {
    assert_sql(
        &(Select::new(1).into_expr() + 2),
        "(select ?) + ?",
        &[Value::Integer(1), Value::Integer(2)],
    );
}

#[test]
fn test_value_in_subquery() {
    assert_sql(
        &Expr::value(1).is_in(Select::new(2)),
        "? in (select ?)",
        &[Value::Integer(1), Value::Integer(2)],
    );
}

#[test]
fn test_placeholder_count_matches_params() {
    let samples = vec![
        Select::new(Expr::value(1) & (Expr::value(2) - Expr::raw("now"))).into_expr(),
        Expr::value("x").is_in(Select::new(Expr::list([1, 2, 3]))),
        Expr::list([Expr::value(1).not(), Expr::value(2).is_null()]),
        (Expr::raw("c") / 4).eq(5).or(Expr::raw("d").like("a%")),
    ];
    for expr in samples {
        assert_eq!(expr.sql().matches('?').count(), expr.params().len());
    }
}
