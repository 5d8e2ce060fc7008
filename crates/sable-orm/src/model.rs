//! Model metadata, declarative registration, and aliasing.

use std::fmt;
use std::sync::Arc;

use sable_core::Expr;

use crate::column::{Column, ColumnDef};
use crate::error::{Error, Result};
use crate::record::Record;
use crate::registry;
use crate::relations::{ColumnRef, Relation};
use crate::select::ModelSelect;

pub(crate) struct ModelInner {
    pub(crate) name: String,
    pub(crate) table: String,
    pub(crate) alias: Option<String>,
    pub(crate) columns: Vec<Column>,
    pub(crate) primaries: Vec<Column>,
    pub(crate) oid: Column,
    pub(crate) relations: Vec<(String, Relation)>,
}

/// A registered model: a table, its mapped columns, and its relationships.
///
/// Models are runtime metadata shared through cheap clones. Build one with
/// [`Model::build`]; the registration step publishes it in the global
/// registry under its name.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Starts declaring a model mapped to `table`.
    pub fn build(name: impl Into<String>, table: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            table: table.into(),
            alias: None,
            inherited: Vec::new(),
            declared: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Looks up a registered model by name.
    pub fn lookup(name: &str) -> Result<Self> {
        registry::get(name).ok_or_else(|| Error::UnresolvedReference(String::from(name)))
    }

    pub(crate) fn from_inner(inner: Arc<ModelInner>) -> Self {
        Self { inner }
    }

    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.inner.table
    }

    /// Returns the alias, if this model was produced by [`Model::as_alias`].
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.inner.alias.as_deref()
    }

    /// The identifier qualifying this model's columns in SQL.
    pub(crate) fn qualifier(&self) -> &str {
        self.inner.alias.as_deref().unwrap_or(&self.inner.table)
    }

    /// The FROM-clause source expression, `"table"` or `"table" "alias"`.
    #[must_use]
    pub fn source(&self) -> Expr {
        Expr::table(self.table(), self.inner.alias.clone())
    }

    /// The unaliased table expression targeted by INSERT/UPDATE/DELETE.
    pub(crate) fn target(&self) -> Expr {
        Expr::table(self.table(), None)
    }

    /// Returns the mapped columns, the implicit `oid` last.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    /// Returns the explicitly declared columns, without the implicit `oid`.
    #[must_use]
    pub fn user_columns(&self) -> &[Column] {
        &self.inner.columns[..self.inner.columns.len() - 1]
    }

    /// Returns the primary columns.
    #[must_use]
    pub fn primaries(&self) -> &[Column] {
        &self.inner.primaries
    }

    /// Returns the implicit rowid column.
    #[must_use]
    pub fn oid(&self) -> &Column {
        &self.inner.oid
    }

    /// Looks up a column by attribute name.
    pub fn column(&self, attr: &str) -> Result<Column> {
        self.inner
            .columns
            .iter()
            .find(|column| column.attr() == attr)
            .cloned()
            .ok_or_else(|| Error::UnknownAttribute(format!("{}.{attr}", self.name())))
    }

    pub(crate) fn relation(&self, name: &str) -> Result<&Relation> {
        self.inner
            .relations
            .iter()
            .find(|(relation_name, _)| relation_name == name)
            .map(|(_, relation)| relation)
            .ok_or_else(|| Error::UnknownRelation(String::from(name)))
    }

    /// A select over all of this model's rows, ready for narrowing.
    #[must_use]
    pub fn find(&self) -> ModelSelect {
        ModelSelect::from_model(self)
    }

    /// A fresh, unsaved record of this model.
    #[must_use]
    pub fn record(&self) -> Record {
        Record::new(self.clone())
    }

    /// Registers a clone of this model under `{name}_as_{alias}` whose SQL
    /// is qualified by `alias`, for self-joins.
    pub fn as_alias(&self, alias: &str) -> Result<Self> {
        let mut builder = Self::build(format!("{}_as_{alias}", self.name()), self.table());
        builder.alias = Some(String::from(alias));
        for column in self.user_columns() {
            builder = builder.column(ColumnDef::from(column));
        }
        for (name, relation) in &self.inner.relations {
            builder.relations.push((name.clone(), relation.clone()));
        }
        builder.register()
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("table", &self.table())
            .field("alias", &self.alias())
            .finish_non_exhaustive()
    }
}

/// Declares a model's columns and relationships before registration.
pub struct ModelBuilder {
    name: String,
    table: String,
    pub(crate) alias: Option<String>,
    inherited: Vec<ColumnDef>,
    declared: Vec<ColumnDef>,
    pub(crate) relations: Vec<(String, Relation)>,
}

impl ModelBuilder {
    /// Adds a column declaration.
    #[must_use]
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.declared.push(def);
        self
    }

    /// Inherits all columns and relationships from a base model.
    ///
    /// Inherited columns precede declared ones; a redeclared attribute
    /// replaces the inherited column in place, keeping the most-derived
    /// binding.
    #[must_use]
    pub fn inherit(mut self, base: &Model) -> Self {
        for column in base.user_columns() {
            self.inherited.push(ColumnDef::from(column));
        }
        for (name, relation) in &base.inner.relations {
            self.relations.push((name.clone(), relation.clone()));
        }
        self
    }

    /// Declares a to-one relationship.
    #[must_use]
    pub fn to_one(
        mut self,
        name: impl Into<String>,
        my: impl Into<ColumnRef>,
        other: impl Into<ColumnRef>,
    ) -> Self {
        self.relations.push((
            name.into(),
            Relation::ToOne {
                my: my.into(),
                other: other.into(),
            },
        ));
        self
    }

    /// Declares a to-many relationship.
    #[must_use]
    pub fn to_many(
        mut self,
        name: impl Into<String>,
        my: impl Into<ColumnRef>,
        other: impl Into<ColumnRef>,
    ) -> Self {
        self.relations.push((
            name.into(),
            Relation::ToMany {
                my: my.into(),
                other: other.into(),
            },
        ));
        self
    }

    /// Declares a many-to-many relationship through a join table.
    #[must_use]
    pub fn many_to_many(
        mut self,
        name: impl Into<String>,
        my: impl Into<ColumnRef>,
        my_join: impl Into<ColumnRef>,
        other_join: impl Into<ColumnRef>,
        other: impl Into<ColumnRef>,
    ) -> Self {
        self.relations.push((
            name.into(),
            Relation::ManyToMany {
                my: my.into(),
                my_join: my_join.into(),
                other_join: other_join.into(),
                other: other.into(),
            },
        ));
        self
    }

    /// Binds the columns, appends the implicit `oid`, and publishes the
    /// model in the global registry.
    pub fn register(self) -> Result<Model> {
        let mut defs = self.inherited;
        for def in self.declared {
            match defs.iter_mut().find(|existing| existing.attr == def.attr) {
                Some(existing) => *existing = def,
                None => defs.push(def),
            }
        }
        for def in &defs {
            if def.attr.is_empty() || def.name.as_deref() == Some("") {
                return Err(Error::InvalidColumn(def.attr.clone()));
            }
        }
        let oid_def = ColumnDef::new("oid");
        let inner = Arc::new_cyclic(|weak| {
            let mut columns: Vec<Column> =
                defs.iter().map(|def| def.bind(weak.clone())).collect();
            let oid = oid_def.bind(weak.clone());
            columns.push(oid.clone());
            let primaries = columns
                .iter()
                .filter(|column| column.is_primary())
                .cloned()
                .collect();
            ModelInner {
                name: self.name,
                table: self.table,
                alias: self.alias,
                columns,
                primaries,
                oid,
                relations: self.relations,
            }
        });
        let model = Model { inner };
        registry::insert(model.clone());
        Ok(model)
    }
}
