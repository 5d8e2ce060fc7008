//! A recording fake driver for execution tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use sable_core::connection::{self, Connection, Cursor, Row};
use sable_core::{Result, Value};

/// Shared driver state inspected by tests.
#[derive(Default, Debug)]
pub struct State {
    /// Statements executed, in order, with their parameters.
    pub statements: Vec<(String, Vec<Value>)>,
    /// Batch statements executed with their parameter rows.
    pub batches: Vec<(String, Vec<Vec<Value>>)>,
    /// Rows served to every cursor on execute.
    pub rows: Vec<Row>,
    /// Rowid reported by cursors.
    pub last_row_id: Option<i64>,
}

/// A connection that records statements and serves canned rows.
pub struct FakeConnection {
    state: Rc<RefCell<State>>,
}

impl FakeConnection {
    /// Creates a fake driver and installs it as the calling thread's
    /// current connection. Returns the shared state for inspection.
    pub fn install() -> Rc<RefCell<State>> {
        let state = Rc::new(RefCell::new(State::default()));
        let conn = Rc::new(FakeConnection {
            state: Rc::clone(&state),
        });
        connection::set_current(conn);
        state
    }
}

impl Connection for FakeConnection {
    fn cursor(&self) -> Result<Box<dyn Cursor>> {
        Ok(Box::new(FakeCursor {
            state: Rc::clone(&self.state),
            pending: VecDeque::new(),
        }))
    }
}

#[derive(Debug)]
struct FakeCursor {
    state: Rc<RefCell<State>>,
    pending: VecDeque<Row>,
}

impl Cursor for FakeCursor {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state
            .statements
            .push((String::from(sql), params.to_vec()));
        self.pending = state.rows.clone().into();
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Vec<Value>]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.batches.push((String::from(sql), rows.to_vec()));
        self.pending = state.rows.clone().into();
        Ok(())
    }

    fn fetch_one(&mut self) -> Result<Option<Row>> {
        Ok(self.pending.pop_front())
    }

    fn last_row_id(&self) -> Option<i64> {
        self.state.borrow().last_row_id
    }
}
