//! Model-aware SELECT and the row materializer.

use std::ops::RangeBounds;

use sable_core::{Expr, IntoExpr, Limit, Row, Select};

use crate::column::Column;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::record::Record;

/// A SELECT that reconstructs records instead of returning raw rows.
///
/// Carries the ordered column list alongside the rendered statement so
/// each fetched value can be routed back to the model that owns it.
/// Combinators mirror [`Select`]'s and preserve this type.
#[derive(Debug, Clone)]
pub struct ModelSelect {
    columns: Vec<Column>,
    select: Select,
}

impl ModelSelect {
    /// Selects the given columns from the given models.
    #[must_use]
    pub fn new(columns: Vec<Column>, models: &[Model]) -> Self {
        let what = Expr::List(columns.iter().map(Column::expr).collect());
        let sources = Expr::List(models.iter().map(Model::source).collect());
        Self {
            columns,
            select: Select {
                what,
                sources: Some(sources),
                filter: None,
                order: None,
                limit: None,
            },
        }
    }

    pub(crate) fn from_model(model: &Model) -> Self {
        Self::new(model.columns().to_vec(), std::slice::from_ref(model))
    }

    /// The underlying statement.
    #[must_use]
    pub fn query(&self) -> &Select {
        &self.select
    }

    /// Narrows the statement with a predicate, AND-ing it onto any
    /// existing WHERE clause.
    #[must_use]
    pub fn find(mut self, pred: impl IntoExpr) -> Self {
        self.select = self.select.find(pred);
        self
    }

    /// Replaces the ORDER BY terms; an empty iterator clears them.
    #[must_use]
    pub fn order_by<I>(mut self, terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        self.select = self.select.order_by(terms);
        self
    }

    /// Replaces the LIMIT clause.
    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.select = self.select.limit(limit);
        self
    }

    /// Replaces the LIMIT clause with one covering the given row range.
    pub fn slice(mut self, range: impl RangeBounds<i64>) -> Result<Self> {
        self.select = self.select.slice(range)?;
        Ok(self)
    }

    /// Reports whether any row matches.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.select.exists()?)
    }

    /// Counts matching rows, adjusted for any limit.
    pub fn count(&self) -> Result<i64> {
        Ok(self.select.count()?)
    }

    /// Converts the statement into a DELETE over the same sources and
    /// predicate.
    pub fn delete(&self) -> Result<sable_core::Delete> {
        Ok(self.select.clone().delete()?)
    }

    /// Executes the query and materializes every row.
    ///
    /// Each row yields the records built from its column buckets, in
    /// first-seen model order; single-model selects yield one record per
    /// row.
    pub fn fetch(&self) -> Result<Vec<Vec<Record>>> {
        let mut rows = Vec::new();
        for row in self.select.rows()? {
            rows.push(self.materialize(row?)?);
        }
        Ok(rows)
    }

    /// Executes the query and materializes every record, flattening join
    /// buckets in row order.
    pub fn records(&self) -> Result<Vec<Record>> {
        Ok(self.fetch()?.into_iter().flatten().collect())
    }

    /// Materializes row `index`; an absent row is out of range.
    pub fn get(&self, index: i64) -> Result<Vec<Record>> {
        let row = self.select.get(index)?;
        self.materialize(row)
    }

    /// Materializes the first row, or `None` when nothing matches.
    pub fn first(&self) -> Result<Option<Vec<Record>>> {
        match self.get(0) {
            Ok(records) => Ok(Some(records)),
            Err(Error::Core(sable_core::Error::IndexOutOfRange(_))) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn materialize(&self, row: Row) -> Result<Vec<Record>> {
        let mut buckets: Vec<(Model, Record)> = Vec::new();
        for (column, value) in self.columns.iter().zip(row) {
            let model = column
                .model()
                .ok_or_else(|| Error::UnresolvedReference(String::from(column.attr())))?;
            let index = match buckets.iter().position(|(owner, _)| owner.same(&model)) {
                Some(index) => index,
                None => {
                    buckets.push((model.clone(), Record::materialized(model)));
                    buckets.len() - 1
                }
            };
            buckets[index].1.set_from_db(column, value);
        }
        Ok(buckets.into_iter().map(|(_, record)| record).collect())
    }
}
