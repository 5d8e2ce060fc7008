//! The driver interface and the per-thread connection holder.
//!
//! The core never talks to a database directly; it renders statements and
//! hands them to whatever [`Connection`] the calling thread has installed.
//! Connections are thread-local state: each thread connects for itself and
//! threads never share handles, cursors, or row iterators.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::ToSql;
use crate::error::{Error, Result};
use crate::value::Value;

/// A single result row, positional.
pub type Row = Vec<Value>;

/// A database connection as consumed by the execution adapter.
pub trait Connection {
    /// Opens a new cursor.
    fn cursor(&self) -> Result<Box<dyn Cursor>>;
}

/// A statement cursor.
///
/// The cursor returned by [`Execute::execute`] is owned by the caller;
/// iteration either exhausts or abandons it.
pub trait Cursor: std::fmt::Debug {
    /// Executes a statement with positional parameters.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()>;

    /// Executes a statement once per parameter row.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<()>;

    /// Fetches the next result row, if any.
    fn fetch_one(&mut self) -> Result<Option<Row>>;

    /// Rowid of the most recent successful insert, if the driver
    /// reports one.
    fn last_row_id(&self) -> Option<i64>;
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<dyn Connection>>> = RefCell::new(None);
}

/// Installs `conn` as the calling thread's current connection, replacing
/// any previous one.
pub fn set_current(conn: Rc<dyn Connection>) {
    CURRENT.with(|slot| *slot.borrow_mut() = Some(conn));
}

/// Returns the calling thread's current connection.
pub fn current() -> Result<Rc<dyn Connection>> {
    CURRENT.with(|slot| slot.borrow().clone().ok_or(Error::NotConnected))
}

/// Clears the calling thread's current connection.
pub fn reset() {
    CURRENT.with(|slot| *slot.borrow_mut() = None);
}

/// Executes rendered statements against the current connection.
///
/// Implemented once for everything that renders; statements and bare
/// expressions share the same execution path.
pub trait Execute: ToSql {
    /// Renders the statement and executes it, returning the cursor.
    fn execute(&self) -> Result<Box<dyn Cursor>> {
        let connection = current()?;
        let mut cursor = connection.cursor()?;
        let sql = self.sql();
        let params = self.params();
        tracing::debug!(target: "sable::sql", sql = %sql, params = params.len(), "executing statement");
        cursor.execute(&sql, &params)?;
        Ok(cursor)
    }

    /// Renders the statement and executes it once per parameter row.
    fn execute_many(&self, rows: &[Vec<Value>]) -> Result<Box<dyn Cursor>> {
        let connection = current()?;
        let mut cursor = connection.cursor()?;
        let sql = self.sql();
        tracing::debug!(target: "sable::sql", sql = %sql, rows = rows.len(), "executing batch statement");
        cursor.execute_many(&sql, rows)?;
        Ok(cursor)
    }
}

impl<T: ToSql + ?Sized> Execute for T {}

/// Iterator over the rows of an executed cursor.
pub struct Rows {
    cursor: Box<dyn Cursor>,
}

impl Rows {
    /// Wraps an executed cursor.
    #[must_use]
    pub fn new(cursor: Box<dyn Cursor>) -> Self {
        Self { cursor }
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.fetch_one().transpose()
    }
}
