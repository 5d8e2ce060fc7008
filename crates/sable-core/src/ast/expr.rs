//! Expression nodes and the combinator surface used to build them.
//!
//! Expressions form a finite tree. Rendering is pure: the `(sql, params)`
//! pair depends only on the tree. Operator nodes wrap an operand in
//! parentheses exactly when the operand reports itself as parenthesizing;
//! no parsing or post-processing of rendered text ever happens.

use std::ops;

use super::limit::Limit;
use super::ops::{BinaryOp, Direction, UnaryOp};
use super::statement::{Delete, Insert, Select, Update};
use super::ToSql;
use crate::value::{ToValue, Value};

/// A node in the expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value, rendered as a `?` placeholder.
    Value(Value),
    /// A raw SQL fragment, rendered verbatim with no parameters.
    Raw(String),
    /// A unary operator application.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operator application.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<Expr>,
        /// The right operand.
        right: Box<Expr>,
    },
    /// A comma-joined sequence; also the grouped form used by `in` and `not`.
    List(Vec<Expr>),
    /// An ordering term, `expr asc` or `expr desc`.
    Ordered {
        /// The sort direction.
        dir: Direction,
        /// The ordered expression.
        operand: Box<Expr>,
    },
    /// A LIMIT clause.
    Limit(Limit),
    /// A SELECT statement, usable as a subquery value.
    Select(Box<Select>),
    /// An INSERT statement.
    Insert(Box<Insert>),
    /// An UPDATE statement.
    Update(Box<Update>),
    /// A DELETE statement.
    Delete(Box<Delete>),
    /// A column reference, `"qualifier"."name"`.
    Column {
        /// The table or alias qualifier, if any.
        qualifier: Option<String>,
        /// The column name.
        name: String,
    },
    /// A table source, `"table"` or `"table" "alias"`.
    Table {
        /// The table name.
        name: String,
        /// The alias, if any.
        alias: Option<String>,
    },
}

impl Expr {
    /// A literal parameter value.
    pub fn value(value: impl ToValue) -> Self {
        Self::Value(value.to_value())
    }

    /// A raw SQL fragment. Never interpolate user input here.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// The NULL literal.
    #[must_use]
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// A comma-joined list, promoting each item.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        Self::List(items.into_iter().map(IntoExpr::into_expr).collect())
    }

    /// An unqualified column reference.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    /// A qualified column reference.
    pub fn qualified_column(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// A table source, optionally aliased.
    pub fn table(name: impl Into<String>, alias: Option<String>) -> Self {
        Self::Table {
            name: name.into(),
            alias,
        }
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self::Unary {
            op,
            operand: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, other: impl IntoExpr) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(other.into_expr()),
        }
    }

    /// Equality. Comparing against the NULL literal produces `isnull`,
    /// preserving SQL's null semantics.
    #[must_use]
    pub fn eq(self, other: impl IntoExpr) -> Self {
        let other = other.into_expr();
        if other.is_null_literal() {
            return self.is_null();
        }
        self.binary(BinaryOp::Eq, other)
    }

    /// Inequality. Comparing against the NULL literal produces `notnull`.
    #[must_use]
    pub fn ne(self, other: impl IntoExpr) -> Self {
        let other = other.into_expr();
        if other.is_null_literal() {
            return self.not_null();
        }
        self.binary(BinaryOp::Ne, other)
    }

    /// Less-than comparison.
    #[must_use]
    pub fn lt(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Greater-than comparison.
    #[must_use]
    pub fn gt(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Less-than-or-equal comparison.
    #[must_use]
    pub fn le(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    /// Greater-than-or-equal comparison.
    #[must_use]
    pub fn ge(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    /// Logical conjunction. Also available as the `&` operator.
    #[must_use]
    pub fn and(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Logical disjunction. Also available as the `|` operator.
    #[must_use]
    pub fn or(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Membership test against a list or subquery.
    #[must_use]
    pub fn is_in(self, other: impl IntoExpr) -> Self {
        self.binary(BinaryOp::In, other)
    }

    /// LIKE pattern match.
    #[must_use]
    pub fn like(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// GLOB pattern match.
    #[must_use]
    pub fn glob(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Glob, pattern)
    }

    /// MATCH pattern match.
    #[must_use]
    pub fn matches(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Match, pattern)
    }

    /// REGEXP pattern match.
    #[must_use]
    pub fn regexp(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Regexp, pattern)
    }

    /// Null test, `expr isnull`.
    #[must_use]
    pub fn is_null(self) -> Self {
        self.unary(UnaryOp::IsNull)
    }

    /// Non-null test, `expr notnull`.
    #[must_use]
    pub fn not_null(self) -> Self {
        self.unary(UnaryOp::NotNull)
    }

    /// Logical negation. Also available as the `!` operator.
    #[must_use]
    pub fn not(self) -> Self {
        self.unary(UnaryOp::Not)
    }

    /// Unary plus.
    #[must_use]
    pub fn pos(self) -> Self {
        self.unary(UnaryOp::Pos)
    }

    /// Arithmetic negation. Also available as the unary `-` operator.
    #[must_use]
    pub fn neg(self) -> Self {
        self.unary(UnaryOp::Neg)
    }

    /// Marks the expression as an ascending ordering term.
    #[must_use]
    pub fn asc(self) -> Self {
        Self::Ordered {
            dir: Direction::Asc,
            operand: Box::new(self),
        }
    }

    /// Marks the expression as a descending ordering term.
    #[must_use]
    pub fn desc(self) -> Self {
        Self::Ordered {
            dir: Direction::Desc,
            operand: Box::new(self),
        }
    }

    /// Returns whether the node must be wrapped in parentheses when it
    /// appears as an operand.
    #[must_use]
    pub fn parenthesized(&self) -> bool {
        matches!(
            self,
            Self::Unary { .. } | Self::Binary { .. } | Self::List(_) | Self::Select(_)
        )
    }

    fn is_null_literal(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    fn operand_sql(&self) -> String {
        let sql = self.sql();
        if self.parenthesized() {
            format!("({sql})")
        } else {
            sql
        }
    }
}

impl ToSql for Expr {
    fn sql(&self) -> String {
        match self {
            Self::Value(_) => String::from("?"),
            Self::Raw(sql) => sql.clone(),
            Self::Unary { op, operand } => {
                let operand = operand.operand_sql();
                if op.is_postfix() {
                    format!("{operand} {}", op.as_str())
                } else {
                    format!("{} {operand}", op.as_str())
                }
            }
            Self::Binary { op, left, right } => {
                format!(
                    "{} {} {}",
                    left.operand_sql(),
                    op.as_str(),
                    right.operand_sql()
                )
            }
            Self::List(items) => items
                .iter()
                .map(Expr::operand_sql)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Ordered { dir, operand } => format!("{} {}", operand.sql(), dir.as_str()),
            Self::Limit(limit) => limit.sql(),
            Self::Select(select) => select.sql(),
            Self::Insert(insert) => insert.sql(),
            Self::Update(update) => update.sql(),
            Self::Delete(delete) => delete.sql(),
            Self::Column { qualifier, name } => match qualifier {
                Some(qualifier) => format!("\"{qualifier}\".\"{name}\""),
                None => format!("\"{name}\""),
            },
            Self::Table { name, alias } => match alias {
                Some(alias) => format!("\"{name}\" \"{alias}\""),
                None => format!("\"{name}\""),
            },
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            Self::Value(value) => vec![value.clone()],
            Self::Raw(_) | Self::Column { .. } | Self::Table { .. } => Vec::new(),
            Self::Unary { operand, .. } | Self::Ordered { operand, .. } => operand.params(),
            Self::Binary { left, right, .. } => {
                let mut params = left.params();
                params.extend(right.params());
                params
            }
            Self::List(items) => items.iter().flat_map(Expr::params).collect(),
            Self::Limit(limit) => limit.params(),
            Self::Select(select) => select.params(),
            Self::Insert(insert) => insert.params(),
            Self::Update(update) => update.params(),
            Self::Delete(delete) => delete.params(),
        }
    }
}

/// Promotion into an expression node.
///
/// Expressions pass through unchanged; anything convertible to a
/// parameter [`Value`] becomes a literal placeholder.
pub trait IntoExpr {
    /// Converts `self` into an [`Expr`].
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Value(self)
    }
}

impl IntoExpr for bool {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for i8 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for i16 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for i32 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for i64 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for u8 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for u16 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for u32 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for f32 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for f64 {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for String {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for Vec<u8> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl<T: ToValue> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Value(self.to_value())
    }
}

impl IntoExpr for Vec<Expr> {
    fn into_expr(self) -> Expr {
        Expr::List(self)
    }
}

impl IntoExpr for Select {
    fn into_expr(self) -> Expr {
        Expr::Select(Box::new(self))
    }
}

impl IntoExpr for Insert {
    fn into_expr(self) -> Expr {
        Expr::Insert(Box::new(self))
    }
}

impl IntoExpr for Update {
    fn into_expr(self) -> Expr {
        Expr::Update(Box::new(self))
    }
}

impl IntoExpr for Delete {
    fn into_expr(self) -> Expr {
        Expr::Delete(Box::new(self))
    }
}

impl IntoExpr for Limit {
    fn into_expr(self) -> Expr {
        Expr::Limit(self)
    }
}

impl<R: IntoExpr> ops::BitAnd<R> for Expr {
    type Output = Expr;

    fn bitand(self, rhs: R) -> Expr {
        self.and(rhs)
    }
}

impl<R: IntoExpr> ops::BitOr<R> for Expr {
    type Output = Expr;

    fn bitor(self, rhs: R) -> Expr {
        self.or(rhs)
    }
}

impl<R: IntoExpr> ops::Add<R> for Expr {
    type Output = Expr;

    fn add(self, rhs: R) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl<R: IntoExpr> ops::Sub<R> for Expr {
    type Output = Expr;

    fn sub(self, rhs: R) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl<R: IntoExpr> ops::Mul<R> for Expr {
    type Output = Expr;

    fn mul(self, rhs: R) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl<R: IntoExpr> ops::Div<R> for Expr {
    type Output = Expr;

    fn div(self, rhs: R) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }
}

impl<R: IntoExpr> ops::Rem<R> for Expr {
    type Output = Expr;

    fn rem(self, rhs: R) -> Expr {
        self.binary(BinaryOp::Mod, rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        self.unary(UnaryOp::Neg)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sql(expr: &Expr, sql: &str, params: &[Value]) {
        assert_eq!(expr.sql(), sql);
        assert_eq!(expr.params(), params);
    }

    #[test]
    fn test_value_renders_placeholder() {
        assert_sql(&Expr::value(1), "?", &[Value::Integer(1)]);
    }

    #[test]
    fn test_raw_renders_verbatim() {
        assert_sql(&Expr::raw("some raw sql string"), "some raw sql string", &[]);
    }

    #[test]
    fn test_binary_ops_render() {
        let cases: Vec<(Expr, &str)> = vec![
            (Expr::value(1).eq(2), "? = ?"),
            (Expr::value(1).ne(2), "? != ?"),
            (Expr::value(1).lt(2), "? < ?"),
            (Expr::value(1).gt(2), "? > ?"),
            (Expr::value(1).le(2), "? <= ?"),
            (Expr::value(1).ge(2), "? >= ?"),
            (Expr::value(1).and(2), "? and ?"),
            (Expr::value(1).or(2), "? or ?"),
            (Expr::value(1) + 2, "? + ?"),
            (Expr::value(1) - 2, "? - ?"),
            (Expr::value(1) * 2, "? * ?"),
            (Expr::value(1) / 2, "? / ?"),
            (Expr::value(1) % 2, "? % ?"),
            (Expr::value(1).is_in(2), "? in ?"),
            (Expr::value(1).like(2), "? like ?"),
            (Expr::value(1).glob(2), "? glob ?"),
            (Expr::value(1).matches(2), "? match ?"),
            (Expr::value(1).regexp(2), "? regexp ?"),
        ];
        for (expr, sql) in cases {
            assert_sql(&expr, sql, &[Value::Integer(1), Value::Integer(2)]);
        }
    }

    #[test]
    fn test_unary_ops_render() {
        assert_sql(&Expr::value(1).not(), "not ?", &[Value::Integer(1)]);
        assert_sql(&Expr::value(1).pos(), "+ ?", &[Value::Integer(1)]);
        assert_sql(&Expr::value(1).neg(), "- ?", &[Value::Integer(1)]);
        assert_sql(&Expr::value(1).is_null(), "? isnull", &[Value::Integer(1)]);
        assert_sql(&Expr::value(1).not_null(), "? notnull", &[Value::Integer(1)]);
    }

    #[test]
    fn test_operator_sugar() {
        assert_sql(
            &(!(Expr::value(1) & Expr::value(2))),
            "not (? and ?)",
            &[Value::Integer(1), Value::Integer(2)],
        );
        assert_sql(&(-Expr::value(3)), "- ?", &[Value::Integer(3)]);
        assert_sql(
            &(Expr::value(1) | 2),
            "? or ?",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_unary_wraps_parenthesizing_operand() {
        let sum = Expr::value(1) + Expr::value(2);
        assert_sql(
            &sum.clone().not(),
            "not (? + ?)",
            &[Value::Integer(1), Value::Integer(2)],
        );
        assert_sql(
            &sum.is_null(),
            "(? + ?) isnull",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_binary_wraps_parenthesizing_operands() {
        let expected = [Value::Integer(1), Value::Integer(2)];
        assert_sql(&Expr::value(1).not().eq(2), "(not ?) = ?", &expected);
        assert_sql(&Expr::value(1).eq(Expr::value(2).not()), "? = (not ?)", &expected);
    }

    #[test]
    fn test_plain_operands_stay_unwrapped() {
        assert_sql(
            &Expr::raw("a").eq(Expr::raw("b")),
            "a = b",
            &[],
        );
    }

    #[test]
    fn test_list_renders_comma_joined() {
        let list = Expr::list([1, 2, 3]);
        assert_sql(
            &list,
            "?, ?, ?",
            &[Value::Integer(1), Value::Integer(2), Value::Integer(3)],
        );
        assert_sql(&Expr::list(Vec::<Expr>::new()), "", &[]);
    }

    #[test]
    fn test_list_wraps_parenthesizing_items() {
        let list = Expr::list([Expr::value(1).not(), Expr::value(2)]);
        assert_sql(
            &list,
            "(not ?), ?",
            &[Value::Integer(1), Value::Integer(2)],
        );
    }

    #[test]
    fn test_not_of_list_groups() {
        assert_sql(&Expr::list([1]).not(), "not (?)", &[Value::Integer(1)]);
    }

    #[test]
    fn test_ordering_never_parenthesizes() {
        let ordered = (Expr::value(1) + 2).desc();
        assert_sql(
            &ordered,
            "? + ? desc",
            &[Value::Integer(1), Value::Integer(2)],
        );
        assert_sql(&Expr::raw("c").asc(), "c asc", &[]);
    }

    #[test]
    fn test_null_comparison_reroutes() {
        assert_sql(&Expr::value(1).eq(Expr::null()), "? isnull", &[Value::Integer(1)]);
        assert_sql(&Expr::value(1).ne(Expr::null()), "? notnull", &[Value::Integer(1)]);
        assert_sql(
            &Expr::value(1).eq(None::<i64>),
            "? isnull",
            &[Value::Integer(1)],
        );
    }

    #[test]
    fn test_column_and_table_render_quoted() {
        assert_sql(&Expr::column("some_column"), "\"some_column\"", &[]);
        assert_sql(
            &Expr::qualified_column("some_table", "some_column"),
            "\"some_table\".\"some_column\"",
            &[],
        );
        assert_sql(&Expr::table("t", None), "\"t\"", &[]);
        assert_sql(
            &Expr::table("t", Some(String::from("a"))),
            "\"t\" \"a\"",
            &[],
        );
    }

    #[test]
    fn test_placeholder_count_matches_params() {
        let samples = [
            Expr::value(1) & Expr::value(2) - Expr::raw("current_timestamp"),
            Expr::list([Expr::value(1).not(), Expr::value("x")]).is_in(Expr::value(2)),
            (Expr::raw("c") / 2).eq(3) & Expr::raw("d").not(),
        ];
        for expr in samples {
            let placeholders = expr.sql().matches('?').count();
            assert_eq!(placeholders, expr.params().len());
        }
    }
}
