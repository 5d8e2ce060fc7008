//! # sable-core
//!
//! The query core of the sable ORM: a typed SQL expression algebra for the
//! SQLite dialect, statement builders on top of it, and the small driver
//! interface statements execute through.
//!
//! This crate provides:
//! - An [`Expr`] tree whose nodes render parameterized SQL fragments and
//!   emit their arguments in placeholder order
//! - [`Select`] / [`Insert`] / [`Update`] / [`Delete`] builders with a
//!   fluent combinator surface
//! - A per-thread connection holder and an execution adapter over
//!   object-safe [`Connection`] / [`Cursor`] traits
//!
//! ## Building queries
//!
//! ```
//! use sable_core::{Expr, Select, ToSql};
//!
//! let query = Select::from_table(Expr::table("users", None))
//!     .find(Expr::column("age").gt(18) & Expr::column("name").like("a%"));
//!
//! assert_eq!(
//!     query.sql(),
//!     "select * from \"users\" where (\"age\" > ?) and (\"name\" like ?)"
//! );
//! assert_eq!(query.params().len(), 2);
//! ```
//!
//! Values are always parameterized, never interpolated into the SQL text.

pub mod ast;
pub mod connection;
pub mod error;
pub mod value;

pub use ast::{
    BinaryOp, Conflict, Delete, Direction, Expr, Insert, IntoExpr, Limit, Select, ToSql, UnaryOp,
    Update,
};
pub use connection::{Connection, Cursor, Execute, Row, Rows};
pub use error::{Error, Result};
pub use value::{FromValue, ToValue, Value};
