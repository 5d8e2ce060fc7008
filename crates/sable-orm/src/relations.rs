//! Relationship declarations and late-bound column references.

use std::fmt;

use once_cell::sync::OnceCell;
use sable_core::Value;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::record::Record;
use crate::registry;
use crate::select::ModelSelect;

/// A reference to a column.
///
/// Either a bound handle, or a string resolved on first use: `"Model.attr"`
/// consults the registry, a bare `"attr"` resolves against the owning
/// model. Resolution is memoized per reference.
pub struct ColumnRef {
    target: RefTarget,
    resolved: OnceCell<Column>,
}

#[derive(Clone)]
enum RefTarget {
    Column(Column),
    Path(String),
}

impl ColumnRef {
    pub(crate) fn resolve(&self, owner: &Model) -> Result<Column> {
        self.resolved
            .get_or_try_init(|| self.lookup(owner))
            .cloned()
    }

    fn lookup(&self, owner: &Model) -> Result<Column> {
        match &self.target {
            RefTarget::Column(column) => Ok(column.clone()),
            RefTarget::Path(path) => match path.split_once('.') {
                Some((model, attr)) => {
                    let model = registry::get(model)
                        .ok_or_else(|| Error::UnresolvedReference(path.clone()))?;
                    model
                        .column(attr)
                        .map_err(|_| Error::UnresolvedReference(path.clone()))
                }
                None => owner.column(path).map_err(|_| {
                    Error::UnresolvedReference(format!("{}.{}", owner.name(), path))
                }),
            },
        }
    }
}

// Memoization is per reference and deliberately not carried across clones,
// so relations cloned onto an alias model re-resolve against it.
impl Clone for ColumnRef {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            resolved: OnceCell::new(),
        }
    }
}

impl From<Column> for ColumnRef {
    fn from(column: Column) -> Self {
        Self {
            target: RefTarget::Column(column),
            resolved: OnceCell::new(),
        }
    }
}

impl From<&Column> for ColumnRef {
    fn from(column: &Column) -> Self {
        Self::from(column.clone())
    }
}

impl From<&str> for ColumnRef {
    fn from(path: &str) -> Self {
        Self {
            target: RefTarget::Path(String::from(path)),
            resolved: OnceCell::new(),
        }
    }
}

impl From<String> for ColumnRef {
    fn from(path: String) -> Self {
        Self {
            target: RefTarget::Path(path),
            resolved: OnceCell::new(),
        }
    }
}

impl fmt::Debug for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RefTarget::Column(column) => write!(f, "ColumnRef({:?})", column.attr()),
            RefTarget::Path(path) => write!(f, "ColumnRef({path:?})"),
        }
    }
}

/// A relationship between models, read as a lazily built query.
#[derive(Debug, Clone)]
pub enum Relation {
    /// A reference to a single related record.
    ToOne {
        /// The referencing column on the owning model.
        my: ColumnRef,
        /// The referenced column on the related model.
        other: ColumnRef,
    },
    /// The reverse side of a to-one: many related records.
    ToMany {
        /// The referenced column on the owning model.
        my: ColumnRef,
        /// The referencing column on the related model.
        other: ColumnRef,
    },
    /// A many-to-many relationship through a join table.
    ManyToMany {
        /// The referenced column on the owning model.
        my: ColumnRef,
        /// The join-table column referencing the owning model.
        my_join: ColumnRef,
        /// The join-table column referencing the related model.
        other_join: ColumnRef,
        /// The referenced column on the related model.
        other: ColumnRef,
    },
}

impl Relation {
    /// Builds the lazy query reading this relationship from `record`.
    pub(crate) fn select(&self, record: &Record) -> Result<ModelSelect> {
        let owner = record.model();
        match self {
            Self::ToOne { my, other } | Self::ToMany { my, other } => {
                let my = my.resolve(owner)?;
                let other = other.resolve(owner)?;
                let other_model = related_model(&other)?;
                let value = my_value(record, &my);
                Ok(other_model.find().find(other.eq(value)))
            }
            Self::ManyToMany {
                my,
                my_join,
                other_join,
                other,
            } => {
                let my = my.resolve(owner)?;
                let my_join = my_join.resolve(owner)?;
                let other_join = other_join.resolve(owner)?;
                let other = other.resolve(owner)?;
                let other_model = related_model(&other)?;
                let join_model = related_model(&other_join)?;
                let value = my_value(record, &my);
                Ok(
                    ModelSelect::new(other_model.columns().to_vec(), &[other_model, join_model])
                        .find(my_join.eq(value))
                        .find(other_join.eq(&other)),
                )
            }
        }
    }

}

fn related_model(column: &Column) -> Result<Model> {
    column
        .model()
        .ok_or_else(|| Error::UnresolvedReference(String::from(column.attr())))
}

fn my_value(record: &Record, my: &Column) -> Value {
    record.get(my.attr()).cloned().unwrap_or(Value::Null)
}
