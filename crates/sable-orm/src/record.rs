//! Record instances and the dirty-tracking save / delete / reload
//! lifecycle.

use std::collections::HashMap;
use std::fmt;

use sable_core::{Delete, Execute, Expr, Insert, ToValue, Update, Value};

use crate::column::Column;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::relations::Relation;
use crate::select::ModelSelect;

/// The previous value of a changed attribute.
#[derive(Debug, Clone, PartialEq)]
enum Dirty {
    /// The attribute had never been set.
    NoValue,
    /// The attribute held this value before the first change.
    Was(Value),
}

/// An instance of a model.
///
/// Setting an attribute records its previous value once per save cycle;
/// `save` emits a minimal INSERT or UPDATE covering only the changed
/// columns.
#[derive(Clone)]
pub struct Record {
    model: Model,
    is_new: bool,
    values: HashMap<String, Value>,
    dirty: HashMap<String, Dirty>,
}

impl Record {
    pub(crate) fn new(model: Model) -> Self {
        Self {
            model,
            is_new: true,
            values: HashMap::new(),
            dirty: HashMap::new(),
        }
    }

    pub(crate) fn materialized(model: Model) -> Self {
        Self {
            model,
            is_new: false,
            values: HashMap::new(),
            dirty: HashMap::new(),
        }
    }

    /// Returns the model this record belongs to.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns whether the record has not been written to the database.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns whether any attribute changed since the last save or load.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Returns an attribute value, if set.
    #[must_use]
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.values.get(attr)
    }

    /// Returns an attribute value converted to a native type.
    #[must_use]
    pub fn get_as<T: sable_core::FromValue>(&self, attr: &str) -> Option<T> {
        self.values.get(attr).and_then(|value| T::from_value(value))
    }

    /// Sets an attribute, recording the previous value on first change.
    pub fn set(&mut self, attr: &str, value: impl ToValue) -> Result<()> {
        self.model.column(attr)?;
        let previous = self.values.get(attr).cloned();
        self.dirty
            .entry(String::from(attr))
            .or_insert_with(|| previous.map_or(Dirty::NoValue, Dirty::Was));
        self.values.insert(String::from(attr), value.to_value());
        Ok(())
    }

    /// Stores a database value without marking the attribute dirty,
    /// running the column's converter if it has one.
    pub(crate) fn set_from_db(&mut self, column: &Column, value: Value) {
        let value = column.convert_in(value);
        self.values.insert(String::from(column.attr()), value);
    }

    /// Writes the record out: an INSERT when new, otherwise an UPDATE of
    /// the changed columns targeted by the identity predicate. A clean,
    /// already-saved record is a no-op.
    pub fn save(&mut self) -> Result<()> {
        if !self.is_new && self.dirty.is_empty() {
            return Ok(());
        }
        let model = self.model.clone();
        let changed: Vec<Column> = model
            .columns()
            .iter()
            .filter(|column| self.dirty.contains_key(column.attr()))
            .cloned()
            .collect();
        let mut columns = Vec::with_capacity(changed.len());
        let mut values = Vec::with_capacity(changed.len());
        for column in &changed {
            let value = self
                .values
                .get(column.attr())
                .cloned()
                .unwrap_or(Value::Null);
            columns.push(column.name_expr());
            values.push(Expr::Value(column.adapt_out(value)));
        }
        if self.is_new {
            tracing::debug!(target: "sable::orm", model = model.name(), columns = changed.len(), "inserting record");
            let parts = if changed.is_empty() {
                (None, None)
            } else {
                (Some(Expr::List(columns)), Some(Expr::List(values)))
            };
            let cursor = Insert::new(model.target(), parts.0, parts.1)?.execute()?;
            if let Some(row_id) = cursor.last_row_id() {
                let oid_attr = model.oid().attr();
                if !self.dirty.contains_key(oid_attr) {
                    self.values
                        .insert(String::from(oid_attr), Value::Integer(row_id));
                }
            }
        } else {
            tracing::debug!(target: "sable::orm", model = model.name(), columns = changed.len(), "updating record");
            let filter = self.identity_predicate()?;
            Update::new(model.target(), columns, values)
                .find(filter)
                .execute()?;
        }
        self.dirty.clear();
        self.is_new = false;
        Ok(())
    }

    /// Deletes the record's row. The record becomes new again with every
    /// set attribute marked dirty, so an immediate re-save re-inserts it.
    pub fn delete(&mut self) -> Result<()> {
        if self.is_new {
            return Ok(());
        }
        tracing::debug!(target: "sable::orm", model = self.model.name(), "deleting record");
        let filter = self.identity_predicate()?;
        Delete::new(self.model.target())?.find(filter).execute()?;
        self.dirty = self
            .values
            .keys()
            .map(|attr| (attr.clone(), Dirty::NoValue))
            .collect();
        self.is_new = true;
        Ok(())
    }

    /// Re-reads the record's row, selected by the identity predicate, and
    /// applies it over the current attributes. Pending changes are
    /// discarded.
    pub fn reload(&mut self) -> Result<()> {
        if self.is_new {
            return Ok(());
        }
        let filter = self.identity_predicate()?;
        let select = ModelSelect::from_model(&self.model).find(filter);
        let row = select.query().get(0)?;
        let columns = self.model.columns().to_vec();
        for (column, value) in columns.iter().zip(row) {
            self.set_from_db(column, value);
        }
        self.dirty.clear();
        Ok(())
    }

    /// Reads a relationship as its lazy query.
    pub fn related(&self, name: &str) -> Result<ModelSelect> {
        let relation = self.model.relation(name)?;
        relation.select(self)
    }

    /// Reads a relationship and materializes its first record, or `None`
    /// when nothing matches.
    pub fn related_one(&self, name: &str) -> Result<Option<Record>> {
        let select = self.related(name)?;
        match select.get(0) {
            Ok(mut records) => {
                if records.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(records.remove(0)))
                }
            }
            Err(Error::Core(sable_core::Error::IndexOutOfRange(_))) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Assigns a to-one relationship by copying the referenced attribute
    /// from `other` through the dirty-tracking setter. To-many and
    /// many-to-many relationships are read-only.
    pub fn set_related(&mut self, name: &str, other: &Record) -> Result<()> {
        let relation = self.model.relation(name)?.clone();
        let Relation::ToOne {
            my,
            other: other_ref,
        } = relation
        else {
            return Err(Error::ReadOnlyRelationship(String::from(name)));
        };
        let owner = self.model.clone();
        let attr = String::from(my.resolve(&owner)?.attr());
        let other_column = other_ref.resolve(&owner)?;
        let value = other
            .get(other_column.attr())
            .cloned()
            .unwrap_or(Value::Null);
        self.set(&attr, value)
    }

    /// The WHERE clause targeting this record's row, built from the
    /// primary columns (or the implicit `oid`) using pre-change values.
    fn identity_predicate(&self) -> Result<Expr> {
        let primaries = self.model.primaries();
        let keys: Vec<Column> = if primaries.is_empty() {
            vec![self.model.oid().clone()]
        } else {
            primaries.to_vec()
        };
        let clauses: Vec<Expr> = keys
            .iter()
            .map(|column| {
                let value = match self.dirty.get(column.attr()) {
                    Some(Dirty::Was(value)) => value.clone(),
                    _ => self
                        .values
                        .get(column.attr())
                        .cloned()
                        .unwrap_or(Value::Null),
                };
                column.eq(column.adapt_out(value))
            })
            .collect();
        clauses.into_iter().reduce(|a, b| a.and(b)).ok_or_else(|| {
            Error::Core(sable_core::Error::InvalidStatement(String::from(
                "record has no identity columns",
            )))
        })
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.model.name())
            .field("is_new", &self.is_new)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}
