//! # sable-orm
//!
//! The model layer of the sable ORM: declarative table mapping, a global
//! model registry, relationships, and a dirty-tracking record lifecycle,
//! all built on the `sable-core` expression algebra.
//!
//! This crate provides:
//! - [`Model`] metadata built with a declarative builder and registered
//!   by name, with column inheritance and aliasing for self-joins
//! - [`Column`] handles that double as SQL expression leaves
//! - [`ModelSelect`], a lazy query whose rows materialize as [`Record`]s
//! - [`Record`] instances with minimal-statement `save`, `delete`, and
//!   `reload`
//! - Relationship declarations (to-one, to-many, many-to-many) read as
//!   lazy queries
//!
//! ## Declaring and querying a model
//!
//! ```
//! use sable_orm::{ColumnDef, Model, ToSql};
//!
//! let books = Model::build("Book", "books")
//!     .column(ColumnDef::new("id").primary())
//!     .column(ColumnDef::new("title"))
//!     .register()
//!     .unwrap();
//!
//! let query = books.find().find(books.column("title").unwrap().like("a%"));
//! assert!(query.query().sql().ends_with("where \"books\".\"title\" like ?"));
//! ```
//!
//! Executing queries requires a connection installed for the current
//! thread; see the `sable-sqlite` driver crate.

pub mod adapters;
mod column;
mod error;
mod model;
mod record;
pub mod registry;
mod relations;
mod select;

pub use column::{Adapter, Column, ColumnDef, Converter};
pub use error::{Error, Result};
pub use model::{Model, ModelBuilder};
pub use record::Record;
pub use relations::{ColumnRef, Relation};
pub use select::ModelSelect;

// Re-export the core surface model code composes with.
pub use sable_core::{
    Conflict, Execute, Expr, IntoExpr, Limit, Select, ToSql, ToValue, Value,
};
