//! Column metadata: declaration, binding, and SQL rendering.

use std::fmt;
use std::sync::{Arc, Weak};

use sable_core::{Expr, IntoExpr, Value};

use crate::model::{Model, ModelInner};

/// Transforms an outbound value before it is bound to a statement.
pub type Adapter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Transforms an inbound value before it is stored on a record.
pub type Converter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// A column declaration, turned into a bound [`Column`] when its model is
/// registered.
///
/// The database column name defaults to the attribute name.
#[derive(Clone)]
pub struct ColumnDef {
    pub(crate) attr: String,
    pub(crate) name: Option<String>,
    pub(crate) primary: bool,
    pub(crate) adapter: Option<Adapter>,
    pub(crate) converter: Option<Converter>,
}

impl ColumnDef {
    /// Declares a column under the given attribute name.
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            name: None,
            primary: false,
            adapter: None,
            converter: None,
        }
    }

    /// Overrides the database column name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the column as part of the model's identity predicate.
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Sets the outbound value adapter.
    #[must_use]
    pub fn adapter(mut self, adapter: Adapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Sets the inbound value converter.
    #[must_use]
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    pub(crate) fn bind(&self, model: Weak<ModelInner>) -> Column {
        Column {
            inner: Arc::new(ColumnInner {
                attr: self.attr.clone(),
                name: self.name.clone().unwrap_or_else(|| self.attr.clone()),
                primary: self.primary,
                adapter: self.adapter.clone(),
                converter: self.converter.clone(),
                model,
            }),
        }
    }
}

impl fmt::Debug for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("attr", &self.attr)
            .field("name", &self.name)
            .field("primary", &self.primary)
            .finish_non_exhaustive()
    }
}

impl From<&Column> for ColumnDef {
    fn from(column: &Column) -> Self {
        Self {
            attr: String::from(column.attr()),
            name: Some(String::from(column.name())),
            primary: column.is_primary(),
            adapter: column.inner.adapter.clone(),
            converter: column.inner.converter.clone(),
        }
    }
}

struct ColumnInner {
    attr: String,
    name: String,
    primary: bool,
    adapter: Option<Adapter>,
    converter: Option<Converter>,
    model: Weak<ModelInner>,
}

/// A column bound to a registered model.
///
/// Clones share identity: two handles compare equal exactly when they
/// refer to the same registered column. Use [`Column::eq`] and friends to
/// build SQL comparisons instead.
#[derive(Clone)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

impl Column {
    /// Returns the attribute name on the model.
    #[must_use]
    pub fn attr(&self) -> &str {
        &self.inner.attr
    }

    /// Returns the database column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns whether the column participates in the identity predicate.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.inner.primary
    }

    /// Returns the owning model.
    #[must_use]
    pub fn model(&self) -> Option<Model> {
        self.inner.model.upgrade().map(Model::from_inner)
    }

    pub(crate) fn adapt_out(&self, value: Value) -> Value {
        match &self.inner.adapter {
            Some(adapter) => adapter(value),
            None => value,
        }
    }

    pub(crate) fn convert_in(&self, value: Value) -> Value {
        match &self.inner.converter {
            Some(converter) => converter(value),
            None => value,
        }
    }

    /// The qualified column expression, `"qualifier"."name"`.
    #[must_use]
    pub fn expr(&self) -> Expr {
        match self.model() {
            Some(model) => Expr::qualified_column(model.qualifier(), self.name()),
            None => Expr::column(self.name()),
        }
    }

    /// The bare column expression, `"name"`, as used in INSERT column
    /// lists and UPDATE assignments.
    #[must_use]
    pub fn name_expr(&self) -> Expr {
        Expr::column(self.name())
    }

    /// SQL equality against the column.
    pub fn eq(&self, other: impl IntoExpr) -> Expr {
        self.expr().eq(other)
    }

    /// SQL inequality against the column.
    pub fn ne(&self, other: impl IntoExpr) -> Expr {
        self.expr().ne(other)
    }

    /// SQL less-than against the column.
    pub fn lt(&self, other: impl IntoExpr) -> Expr {
        self.expr().lt(other)
    }

    /// SQL greater-than against the column.
    pub fn gt(&self, other: impl IntoExpr) -> Expr {
        self.expr().gt(other)
    }

    /// SQL less-than-or-equal against the column.
    pub fn le(&self, other: impl IntoExpr) -> Expr {
        self.expr().le(other)
    }

    /// SQL greater-than-or-equal against the column.
    pub fn ge(&self, other: impl IntoExpr) -> Expr {
        self.expr().ge(other)
    }

    /// SQL LIKE against the column.
    pub fn like(&self, pattern: impl IntoExpr) -> Expr {
        self.expr().like(pattern)
    }

    /// SQL GLOB against the column.
    pub fn glob(&self, pattern: impl IntoExpr) -> Expr {
        self.expr().glob(pattern)
    }

    /// SQL MATCH against the column.
    pub fn matches(&self, pattern: impl IntoExpr) -> Expr {
        self.expr().matches(pattern)
    }

    /// SQL REGEXP against the column.
    pub fn regexp(&self, pattern: impl IntoExpr) -> Expr {
        self.expr().regexp(pattern)
    }

    /// SQL membership test against the column.
    pub fn is_in(&self, other: impl IntoExpr) -> Expr {
        self.expr().is_in(other)
    }

    /// SQL null test on the column.
    #[must_use]
    pub fn is_null(&self) -> Expr {
        self.expr().is_null()
    }

    /// SQL non-null test on the column.
    #[must_use]
    pub fn not_null(&self) -> Expr {
        self.expr().not_null()
    }

    /// Ascending ordering term over the column.
    #[must_use]
    pub fn asc(&self) -> Expr {
        self.expr().asc()
    }

    /// Descending ordering term over the column.
    #[must_use]
    pub fn desc(&self) -> Expr {
        self.expr().desc()
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Column {}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("attr", &self.attr())
            .field("name", &self.name())
            .field("primary", &self.is_primary())
            .finish_non_exhaustive()
    }
}

impl IntoExpr for Column {
    fn into_expr(self) -> Expr {
        self.expr()
    }
}

impl IntoExpr for &Column {
    fn into_expr(self) -> Expr {
        self.expr()
    }
}
