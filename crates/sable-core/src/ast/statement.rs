//! Statement builders: SELECT, INSERT, UPDATE, DELETE.
//!
//! Statements are expression nodes themselves, so a SELECT can appear as a
//! subquery value and every statement executes through the same adapter.
//! Combinators return a new statement rather than mutating in place.

use std::ops::RangeBounds;

use super::expr::{Expr, IntoExpr};
use super::limit::Limit;
use super::ToSql;
use crate::connection::{Execute, Row, Rows};
use crate::error::{Error, Result};
use crate::value::{FromValue, Value};

/// A SQLite conflict resolution action for `insert or …` / `update or …`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// Roll back the enclosing transaction.
    Rollback,
    /// Abort the statement.
    Abort,
    /// Fail the statement, keeping prior changes.
    Fail,
    /// Skip the conflicting row.
    Ignore,
    /// Replace the conflicting row.
    Replace,
}

impl Conflict {
    /// Returns the SQL spelling of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rollback => "rollback",
            Self::Abort => "abort",
            Self::Fail => "fail",
            Self::Ignore => "ignore",
            Self::Replace => "replace",
        }
    }
}

/// A SELECT statement.
///
/// Renders as `select WHAT [from SOURCES] [where FILTER] [order by ORDER]
/// [LIMIT]`, omitting absent clauses.
#[derive(Debug, Clone)]
pub struct Select {
    /// The selected expression; `*` when built from sources alone.
    pub what: Expr,
    /// The FROM sources, if any.
    pub sources: Option<Expr>,
    /// The WHERE predicate, if any.
    pub filter: Option<Expr>,
    /// The ORDER BY terms, if any.
    pub order: Option<Expr>,
    /// The LIMIT clause, if any.
    pub limit: Option<Limit>,
}

impl Select {
    /// Selects an expression with no sources.
    pub fn new(what: impl IntoExpr) -> Self {
        Self {
            what: what.into_expr(),
            sources: None,
            filter: None,
            order: None,
            limit: None,
        }
    }

    /// Selects `*` from the given sources.
    pub fn from_table(sources: impl IntoExpr) -> Self {
        Self {
            what: Expr::raw("*"),
            sources: Some(sources.into_expr()),
            filter: None,
            order: None,
            limit: None,
        }
    }

    /// Builds a select from optional parts. At least one of `what` and
    /// `sources` must be given; a missing `what` becomes `*`.
    pub fn build(what: Option<Expr>, sources: Option<Expr>) -> Result<Self> {
        let what = match (what, &sources) {
            (Some(what), _) => what,
            (None, Some(_)) => Expr::raw("*"),
            (None, None) => {
                return Err(Error::InvalidStatement(String::from(
                    "select requires sources when nothing is selected",
                )))
            }
        };
        Ok(Self {
            what,
            sources,
            filter: None,
            order: None,
            limit: None,
        })
    }

    /// Sets the FROM sources.
    #[must_use]
    pub fn from(mut self, sources: impl IntoExpr) -> Self {
        self.sources = Some(sources.into_expr());
        self
    }

    /// Narrows the statement with a predicate, AND-ing it onto any
    /// existing WHERE clause.
    #[must_use]
    pub fn find(mut self, pred: impl IntoExpr) -> Self {
        let pred = pred.into_expr();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(pred),
            None => pred,
        });
        self
    }

    /// Replaces the ORDER BY terms; an empty iterator clears them.
    #[must_use]
    pub fn order_by<I>(mut self, terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        let terms: Vec<Expr> = terms.into_iter().map(IntoExpr::into_expr).collect();
        self.order = if terms.is_empty() {
            None
        } else {
            Some(Expr::List(terms))
        };
        self
    }

    /// Replaces the LIMIT clause.
    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the LIMIT clause with one covering the given row range.
    pub fn slice(mut self, range: impl RangeBounds<i64>) -> Result<Self> {
        self.limit = Some(Limit::from_range(range)?);
        Ok(self)
    }

    /// Converts the statement into a DELETE over the same sources,
    /// predicate, order, and limit.
    pub fn delete(self) -> Result<Delete> {
        let sources = self.sources.ok_or_else(|| {
            Error::InvalidStatement(String::from("delete requires a source table"))
        })?;
        Delete::with_parts(sources, self.filter, self.order, self.limit)
    }

    /// Executes `select 1 … limit 1` and reports whether a row matched.
    pub fn exists(&self) -> Result<bool> {
        let probe = Self {
            what: Expr::raw("1"),
            sources: self.sources.clone(),
            filter: self.filter.clone(),
            order: None,
            limit: Some(Limit::rows(1)?),
        };
        let mut cursor = probe.execute()?;
        Ok(cursor.fetch_one()?.is_some())
    }

    /// Executes `select count(*) …` without the limit and adjusts the
    /// result for any limit in host memory.
    pub fn count(&self) -> Result<i64> {
        let query = Self {
            what: Expr::raw("count(*)"),
            sources: self.sources.clone(),
            filter: self.filter.clone(),
            order: None,
            limit: None,
        };
        let mut cursor = query.execute()?;
        let mut n = match cursor.fetch_one()? {
            Some(row) => row.first().and_then(i64::from_value).unwrap_or(0),
            None => 0,
        };
        if let Some(limit) = self.limit {
            if let Some(offset) = limit.offset() {
                if offset != 0 {
                    n -= offset;
                }
            }
            if let Some(count) = limit.count() {
                if n > count {
                    return Ok(count);
                }
            }
            if n < 0 {
                return Ok(0);
            }
        }
        Ok(n)
    }

    /// Executes the statement and returns an iterator over driver rows.
    pub fn rows(&self) -> Result<Rows> {
        Ok(Rows::new(self.execute()?))
    }

    /// Fetches row `index` using `limit index, 1`, replacing any
    /// existing limit.
    pub fn get(&self, index: i64) -> Result<Row> {
        let query = Self {
            what: self.what.clone(),
            sources: self.sources.clone(),
            filter: self.filter.clone(),
            order: self.order.clone(),
            limit: Some(Limit::index(index)?),
        };
        let mut cursor = query.execute()?;
        cursor.fetch_one()?.ok_or(Error::IndexOutOfRange(index))
    }
}

impl ToSql for Select {
    fn sql(&self) -> String {
        let mut sql = format!("select {}", self.what.sql());
        if let Some(sources) = &self.sources {
            sql.push_str(" from ");
            sql.push_str(&sources.sql());
        }
        if let Some(filter) = &self.filter {
            sql.push_str(" where ");
            sql.push_str(&filter.sql());
        }
        if let Some(order) = &self.order {
            sql.push_str(" order by ");
            sql.push_str(&order.sql());
        }
        if let Some(limit) = &self.limit {
            let limit = limit.sql();
            if !limit.is_empty() {
                sql.push(' ');
                sql.push_str(&limit);
            }
        }
        sql
    }

    fn params(&self) -> Vec<Value> {
        let mut params = self.what.params();
        if let Some(sources) = &self.sources {
            params.extend(sources.params());
        }
        if let Some(filter) = &self.filter {
            params.extend(filter.params());
        }
        if let Some(order) = &self.order {
            params.extend(order.params());
        }
        params
    }
}

/// An INSERT statement.
#[derive(Debug, Clone)]
pub struct Insert {
    /// The target table.
    pub table: Expr,
    /// The column list, if any.
    pub columns: Option<Expr>,
    /// The inserted values: a list of expressions or a subquery. `None`
    /// renders as `default values`.
    pub values: Option<Expr>,
    /// The conflict resolution action, if any.
    pub conflict: Option<Conflict>,
}

impl Insert {
    /// Builds an insert. Passing values that are not a subquery without a
    /// column list is an error.
    pub fn new(table: impl IntoExpr, columns: Option<Expr>, values: Option<Expr>) -> Result<Self> {
        if let Some(values) = &values {
            if columns.is_none() && !matches!(values, Expr::Select(_)) {
                return Err(Error::InvalidStatement(String::from(
                    "insert values require a column list unless they are a subquery",
                )));
            }
        }
        Ok(Self {
            table: table.into_expr(),
            columns,
            values,
            conflict: None,
        })
    }

    /// Sets the conflict resolution action, `insert or ACTION`.
    #[must_use]
    pub fn or_conflict(mut self, action: Conflict) -> Self {
        self.conflict = Some(action);
        self
    }
}

impl ToSql for Insert {
    fn sql(&self) -> String {
        let mut sql = String::from("insert");
        if let Some(action) = self.conflict {
            sql.push_str(" or ");
            sql.push_str(action.as_str());
        }
        sql.push_str(" into ");
        sql.push_str(&self.table.sql());
        match &self.values {
            None => sql.push_str(" default values"),
            Some(values) => {
                if let Some(columns) = &self.columns {
                    sql.push_str(" (");
                    sql.push_str(&columns.sql());
                    sql.push(')');
                }
                if let Expr::Select(select) = values {
                    sql.push(' ');
                    sql.push_str(&select.sql());
                } else {
                    sql.push_str(" values (");
                    sql.push_str(&values.sql());
                    sql.push(')');
                }
            }
        }
        sql
    }

    fn params(&self) -> Vec<Value> {
        let mut params = self.table.params();
        if let Some(values) = &self.values {
            if let Some(columns) = &self.columns {
                params.extend(columns.params());
            }
            params.extend(values.params());
        }
        params
    }
}

/// An UPDATE statement.
///
/// Column and value expressions are paired positionally; each pair renders
/// as `col = val` with no added parenthesization.
#[derive(Debug, Clone)]
pub struct Update {
    /// The target table.
    pub table: Expr,
    /// The assigned columns.
    pub columns: Vec<Expr>,
    /// The assigned values, paired with `columns`.
    pub values: Vec<Expr>,
    /// The WHERE predicate, if any.
    pub filter: Option<Expr>,
    /// The conflict resolution action, if any.
    pub conflict: Option<Conflict>,
}

impl Update {
    /// Builds an update over paired columns and values.
    pub fn new(table: impl IntoExpr, columns: Vec<Expr>, values: Vec<Expr>) -> Self {
        Self {
            table: table.into_expr(),
            columns,
            values,
            filter: None,
            conflict: None,
        }
    }

    /// Narrows the statement with a predicate, AND-ing it onto any
    /// existing WHERE clause.
    #[must_use]
    pub fn find(mut self, pred: impl IntoExpr) -> Self {
        let pred = pred.into_expr();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(pred),
            None => pred,
        });
        self
    }

    /// Sets the conflict resolution action, `update or ACTION`.
    #[must_use]
    pub fn or_conflict(mut self, action: Conflict) -> Self {
        self.conflict = Some(action);
        self
    }
}

impl ToSql for Update {
    fn sql(&self) -> String {
        let mut sql = String::from("update");
        if let Some(action) = self.conflict {
            sql.push_str(" or ");
            sql.push_str(action.as_str());
        }
        sql.push(' ');
        sql.push_str(&self.table.sql());
        sql.push_str(" set ");
        let pairs: Vec<String> = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| format!("{} = {}", column.sql(), value.sql()))
            .collect();
        sql.push_str(&pairs.join(", "));
        if let Some(filter) = &self.filter {
            sql.push_str(" where ");
            sql.push_str(&filter.sql());
        }
        sql
    }

    fn params(&self) -> Vec<Value> {
        let mut params = self.table.params();
        for (column, value) in self.columns.iter().zip(&self.values) {
            params.extend(column.params());
            params.extend(value.params());
        }
        if let Some(filter) = &self.filter {
            params.extend(filter.params());
        }
        params
    }
}

/// A DELETE statement.
#[derive(Debug, Clone)]
pub struct Delete {
    /// The source table.
    pub sources: Expr,
    /// The WHERE predicate, if any.
    pub filter: Option<Expr>,
    /// The ORDER BY terms, if any.
    pub order: Option<Expr>,
    /// The LIMIT clause, if any.
    pub limit: Option<Limit>,
}

impl Delete {
    /// Builds a delete over a single source table.
    pub fn new(sources: impl IntoExpr) -> Result<Self> {
        Self::with_parts(sources.into_expr(), None, None, None)
    }

    /// Builds a delete from pre-assembled parts.
    pub fn with_parts(
        sources: Expr,
        filter: Option<Expr>,
        order: Option<Expr>,
        limit: Option<Limit>,
    ) -> Result<Self> {
        if let Expr::List(items) = &sources {
            if items.len() > 1 {
                return Err(Error::InvalidStatement(String::from(
                    "can't delete from more than one table",
                )));
            }
        }
        Ok(Self {
            sources,
            filter,
            order,
            limit,
        })
    }

    /// Narrows the statement with a predicate, AND-ing it onto any
    /// existing WHERE clause.
    #[must_use]
    pub fn find(mut self, pred: impl IntoExpr) -> Self {
        let pred = pred.into_expr();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(pred),
            None => pred,
        });
        self
    }

    /// Replaces the ORDER BY terms; an empty iterator clears them.
    #[must_use]
    pub fn order_by<I>(mut self, terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        let terms: Vec<Expr> = terms.into_iter().map(IntoExpr::into_expr).collect();
        self.order = if terms.is_empty() {
            None
        } else {
            Some(Expr::List(terms))
        };
        self
    }
}

impl ToSql for Delete {
    fn sql(&self) -> String {
        let mut sql = format!("delete from {}", self.sources.sql());
        if let Some(filter) = &self.filter {
            sql.push_str(" where ");
            sql.push_str(&filter.sql());
        }
        if let Some(order) = &self.order {
            sql.push_str(" order by ");
            sql.push_str(&order.sql());
        }
        if let Some(limit) = &self.limit {
            let limit = limit.sql();
            if !limit.is_empty() {
                sql.push(' ');
                sql.push_str(&limit);
            }
        }
        sql
    }

    fn params(&self) -> Vec<Value> {
        let mut params = self.sources.params();
        if let Some(filter) = &self.filter {
            params.extend(filter.params());
        }
        if let Some(order) = &self.order {
            params.extend(order.params());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sql<T: ToSql>(stmt: &T, sql: &str, params: &[Value]) {
        assert_eq!(stmt.sql(), sql);
        assert_eq!(stmt.params(), params);
    }

    #[test]
    fn test_select_value() {
        assert_sql(&Select::new(1), "select ?", &[Value::Integer(1)]);
    }

    #[test]
    fn test_select_raw_what() {
        assert_sql(&Select::new(Expr::raw("some raw sql string")), "select some raw sql string", &[]);
    }

    #[test]
    fn test_select_star_from_sources() {
        assert_sql(
            &Select::from_table(Expr::raw("test_table")),
            "select * from test_table",
            &[],
        );
    }

    #[test]
    fn test_select_requires_what_or_sources() {
        assert!(matches!(
            Select::build(None, None),
            Err(Error::InvalidStatement(_))
        ));
        let select = Select::build(None, Some(Expr::raw("t"))).unwrap();
        assert_eq!(select.sql(), "select * from t");
    }

    #[test]
    fn test_select_full_clause_order() {
        let select = Select::new(Expr::raw("some_column"))
            .from(Expr::raw("some_table"))
            .find((Expr::raw("some_column") / 2).eq(3) & Expr::raw("other_column").not())
            .order_by([Expr::raw("order_column").desc()])
            .limit(Limit::range(Some(3), Some(5)).unwrap());
        assert_sql(
            &select,
            "select some_column from some_table \
             where ((some_column / ?) = ?) and (not other_column) \
             order by order_column desc limit 3, 2",
            &[Value::Integer(2), Value::Integer(3)],
        );
    }

    #[test]
    fn test_select_find_appends_with_and() {
        let select = Select::from_table(Expr::raw("t"))
            .find(Expr::value(1).gt(2))
            .find(Expr::value(3).gt(4));
        assert_sql(
            &select,
            "select * from t where (? > ?) and (? > ?)",
            &[
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::Integer(4),
            ],
        );
    }

    #[test]
    fn test_select_order_by_cleared_by_empty() {
        let select = Select::from_table(Expr::raw("t"))
            .order_by([Expr::raw("c")])
            .order_by(Vec::<Expr>::new());
        assert_eq!(select.sql(), "select * from t");
    }

    #[test]
    fn test_select_empty_limit_omitted() {
        let select = Select::from_table(Expr::raw("t")).limit(Limit::range(None, None).unwrap());
        assert_eq!(select.sql(), "select * from t");
    }

    #[test]
    fn test_subquery_parenthesizes_as_operand() {
        let sum = Select::new(1).into_expr() + 2;
        assert_sql(
            &sum,
            "(select ?) + ?",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_value_in_subquery() {
        let expr = Expr::value(1).is_in(Select::new(2));
        assert_sql(
            &expr,
            "? in (select ?)",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_select_delete_carries_parts() {
        let delete = Select::from_table(Expr::raw("t"))
            .find(Expr::raw("c").eq(1))
            .delete()
            .unwrap();
        assert_sql(&delete, "delete from t where c = ?", &[Value::Integer(1)]);
    }

    #[test]
    fn test_insert_default_values() {
        let insert = Insert::new(Expr::table("t", None), None, None).unwrap();
        assert_sql(&insert, "insert into \"t\" default values", &[]);
    }

    #[test]
    fn test_insert_columns_without_values_is_default() {
        let insert = Insert::new(
            Expr::table("t", None),
            Some(Expr::list([Expr::column("a")])),
            None,
        )
        .unwrap();
        assert_sql(&insert, "insert into \"t\" default values", &[]);
    }

    #[test]
    fn test_insert_columns_and_values() {
        let insert = Insert::new(
            Expr::table("t", None),
            Some(Expr::list([Expr::column("a"), Expr::column("b")])),
            Some(Expr::list([1, 2])),
        )
        .unwrap();
        assert_sql(
            &insert,
            "insert into \"t\" (\"a\", \"b\") values (?, ?)",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_insert_values_require_columns() {
        assert!(matches!(
            Insert::new(Expr::table("t", None), None, Some(Expr::list([1]))),
            Err(Error::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_insert_from_subquery() {
        let insert = Insert::new(
            Expr::table("t", None),
            None,
            Some(Select::new(1).into_expr()),
        )
        .unwrap();
        assert_sql(&insert, "insert into \"t\" select ?", &[Value::Integer(1)]);
    }

    #[test]
    fn test_insert_or_replace() {
        let insert = Insert::new(Expr::table("t", None), None, None)
            .unwrap()
            .or_conflict(Conflict::Replace);
        assert_sql(&insert, "insert or replace into \"t\" default values", &[]);
    }

    #[test]
    fn test_update_pairs_and_filter() {
        let update = Update::new(
            Expr::table("some_table", None),
            vec![Expr::column("some_column"), Expr::column("other_column")],
            vec![Expr::value("hello"), Expr::value("world")],
        )
        .find(Expr::qualified_column("some_table", "some_column").eq("old1"));
        assert_sql(
            &update,
            "update \"some_table\" set \"some_column\" = ?, \"other_column\" = ? \
             where \"some_table\".\"some_column\" = ?",
            &[
                Value::Text(String::from("hello")),
                Value::Text(String::from("world")),
                Value::Text(String::from("old1")),
            ],
        );
    }

    #[test]
    fn test_update_or_fail() {
        let update = Update::new(
            Expr::table("t", None),
            vec![Expr::column("a")],
            vec![Expr::value(1)],
        )
        .or_conflict(Conflict::Fail);
        assert_sql(
            &update,
            "update or fail \"t\" set \"a\" = ?",
            &[Value::Integer(1)],
        );
    }

    #[test]
    fn test_delete_rejects_multiple_sources() {
        let sources = Expr::list([Expr::table("a", None), Expr::table("b", None)]);
        assert!(matches!(
            Delete::new(sources),
            Err(Error::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_delete_single_element_list_allowed() {
        let delete = Delete::new(Expr::list([Expr::table("a", None)])).unwrap();
        assert_eq!(delete.sql(), "delete from \"a\"");
    }

    #[test]
    fn test_delete_order_and_limit() {
        let delete = Delete::with_parts(
            Expr::table("t", None),
            Some(Expr::raw("c").eq(1)),
            Some(Expr::list([Expr::raw("c").asc()])),
            Some(Limit::rows(2).unwrap()),
        )
        .unwrap();
        assert_sql(
            &delete,
            "delete from \"t\" where c = ? order by c asc limit 2",
            &[Value::Integer(1)],
        );
    }
}
