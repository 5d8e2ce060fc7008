//! The query AST: expressions, limits, and statement builders.
//!
//! Every node renders to a parameterized SQL fragment through [`ToSql`].
//! The argument list returned by [`ToSql::params`] is ordered exactly like
//! the `?` placeholders in the rendered text, child-first, left to right.

pub mod expr;
pub mod limit;
pub mod ops;
pub mod statement;

use crate::value::Value;

pub use expr::{Expr, IntoExpr};
pub use limit::Limit;
pub use ops::{BinaryOp, Direction, UnaryOp};
pub use statement::{Conflict, Delete, Insert, Select, Update};

/// Rendering contract shared by every AST node.
pub trait ToSql {
    /// Renders the node as a SQL fragment with `?` placeholders.
    fn sql(&self) -> String;

    /// Returns the positional parameters in placeholder order.
    fn params(&self) -> Vec<Value>;
}
