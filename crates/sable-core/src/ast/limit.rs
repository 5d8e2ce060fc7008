//! LIMIT / OFFSET clauses.

use std::ops::{Bound, RangeBounds};

use super::ToSql;
use crate::error::{Error, Result};
use crate::value::Value;

/// A LIMIT clause built from a row count or a half-open row range.
///
/// Renders with SQLite's `limit offset, count` form, using `-1` for
/// "all remaining rows" when only an offset is present. A limit with
/// neither bound renders as the empty string and is omitted by the
/// enclosing statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    offset: Option<i64>,
    count: Option<i64>,
}

impl Limit {
    /// A limit on the first `n` rows.
    pub fn rows(n: i64) -> Result<Self> {
        Self::range(None, Some(n))
    }

    /// A limit over the half-open row range `[offset, stop)`.
    ///
    /// Bounds must be non-negative and `stop` must not precede `offset`.
    pub fn range(offset: Option<i64>, stop: Option<i64>) -> Result<Self> {
        for bound in [offset, stop].into_iter().flatten() {
            if bound < 0 {
                return Err(Error::UnsupportedLimit(bound));
            }
        }
        if let (Some(offset), Some(stop)) = (offset, stop) {
            if stop < offset {
                return Err(Error::InvalidLimit { offset, stop });
            }
        }
        let count = match (offset, stop) {
            (Some(offset), Some(stop)) => Some(stop - offset),
            (None, stop) => stop,
            (Some(_), None) => None,
        };
        Ok(Self { offset, count })
    }

    /// A limit selecting exactly the row at `index`.
    pub fn index(index: i64) -> Result<Self> {
        if index < 0 {
            return Err(Error::UnsupportedLimit(index));
        }
        Self::range(Some(index), Some(index + 1))
    }

    /// Builds a limit from a standard range over row positions.
    pub fn from_range(range: impl RangeBounds<i64>) -> Result<Self> {
        let offset = match range.start_bound() {
            Bound::Included(&n) => Some(n),
            Bound::Excluded(&n) => Some(n + 1),
            Bound::Unbounded => None,
        };
        let stop = match range.end_bound() {
            Bound::Included(&n) => Some(n + 1),
            Bound::Excluded(&n) => Some(n),
            Bound::Unbounded => None,
        };
        Self::range(offset, stop)
    }

    /// Returns the row offset, if any.
    #[must_use]
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Returns the row count, if any.
    #[must_use]
    pub fn count(&self) -> Option<i64> {
        self.count
    }
}

impl ToSql for Limit {
    fn sql(&self) -> String {
        match (self.offset, self.count) {
            (None, None) => String::new(),
            (None, Some(count)) => format!("limit {count}"),
            (Some(offset), None) => format!("limit {offset}, -1"),
            (Some(offset), Some(count)) => format!("limit {offset}, {count}"),
        }
    }

    fn params(&self) -> Vec<Value> {
        Vec::new()
    }
}
