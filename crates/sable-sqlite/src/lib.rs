//! # sable-sqlite
//!
//! The SQLite driver for the sable ORM, backed by `rusqlite`.
//!
//! [`connect`] opens a database and installs it as the calling thread's
//! current connection; statements built with `sable-core` then execute
//! against it. Cursors buffer their full result set at execute time, so
//! they stay valid however long the caller holds them.
//!
//! ```no_run
//! use sable_core::{Expr, Select, Execute};
//!
//! sable_sqlite::connect("app.db")?;
//! let cursor = Select::from_table(Expr::table("users", None)).execute()?;
//! # Ok::<(), sable_core::Error>(())
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

use rusqlite::types::ValueRef;
use sable_core::connection::{self, Connection, Cursor, Row};
use sable_core::{Error, Result, Value};

/// A SQLite database handle implementing the core connection trait.
pub struct SqliteConnection {
    conn: Rc<rusqlite::Connection>,
}

impl SqliteConnection {
    /// Opens the database at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path).map_err(Error::driver)?;
        Ok(Self {
            conn: Rc::new(conn),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(Error::driver)?;
        Ok(Self {
            conn: Rc::new(conn),
        })
    }

    /// Runs a batch of semicolon-separated statements, such as schema
    /// setup. The core itself never creates tables.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql).map_err(Error::driver)
    }
}

impl Connection for SqliteConnection {
    fn cursor(&self) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(SqliteCursor {
            conn: Rc::clone(&self.conn),
            rows: VecDeque::new(),
            last_row_id: None,
        }))
    }
}

/// A cursor buffering the full result set at execute time.
#[derive(Debug)]
pub struct SqliteCursor {
    conn: Rc<rusqlite::Connection>,
    rows: VecDeque<Row>,
    last_row_id: Option<i64>,
}

impl Cursor for SqliteCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        self.rows.clear();
        let conn = Rc::clone(&self.conn);
        let mut statement = conn.prepare(sql).map_err(Error::driver)?;
        let column_count = statement.column_count();
        let mut rows = statement
            .query(rusqlite::params_from_iter(params.iter().map(bind_value)))
            .map_err(Error::driver)?;
        while let Some(row) = rows.next().map_err(Error::driver)? {
            let mut out = Row::with_capacity(column_count);
            for index in 0..column_count {
                out.push(read_value(row.get_ref(index).map_err(Error::driver)?));
            }
            self.rows.push_back(out);
        }
        drop(rows);
        drop(statement);
        self.last_row_id = Some(conn.last_insert_rowid());
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<()> {
        self.rows.clear();
        let conn = Rc::clone(&self.conn);
        let mut statement = conn.prepare(sql).map_err(Error::driver)?;
        for params in rows {
            statement
                .execute(rusqlite::params_from_iter(params.iter().map(bind_value)))
                .map_err(Error::driver)?;
        }
        drop(statement);
        self.last_row_id = Some(conn.last_insert_rowid());
        Ok(())
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn last_row_id(&self) -> Option<i64> {
        self.last_row_id
    }
}

fn bind_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Integer(n) => rusqlite::types::Value::Integer(*n),
        Value::Real(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => Value::Blob(blob.to_vec()),
    }
}

/// Opens the database at `path` and installs it as the calling thread's
/// current connection.
pub fn connect(path: impl AsRef<Path>) -> Result<Rc<SqliteConnection>> {
    install(SqliteConnection::open(path)?)
}

/// Opens a private in-memory database and installs it as the calling
/// thread's current connection.
pub fn connect_in_memory() -> Result<Rc<SqliteConnection>> {
    install(SqliteConnection::open_in_memory()?)
}

fn install(conn: SqliteConnection) -> Result<Rc<SqliteConnection>> {
    let conn = Rc::new(conn);
    connection::set_current(Rc::clone(&conn) as Rc<dyn Connection>);
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_mapping_round_trip() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .execute(
                "select ?, ?, ?, ?, ?",
                &[
                    Value::Null,
                    Value::Integer(7),
                    Value::Real(1.5),
                    Value::Text(String::from("hi")),
                    Value::Blob(vec![1, 2, 3]),
                ],
            )
            .unwrap();
        let row = cursor.fetch_one().unwrap().unwrap();
        assert_eq!(
            row,
            vec![
                Value::Null,
                Value::Integer(7),
                Value::Real(1.5),
                Value::Text(String::from("hi")),
                Value::Blob(vec![1, 2, 3]),
            ]
        );
        assert!(cursor.fetch_one().unwrap().is_none());
    }

    #[test]
    fn test_last_row_id_after_insert() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("create table t (c text)").unwrap();
        let mut cursor = conn.cursor().unwrap();
        cursor
            .execute("insert into t (c) values (?)", &[Value::Text(String::from("x"))])
            .unwrap();
        assert_eq!(cursor.last_row_id(), Some(1));
    }
}
