//! Stock value adapters and converters.
//!
//! Adapters run on the way out (before a value is bound to a statement),
//! converters on the way in (before a fetched value is stored on a
//! record). Both leave values of unexpected storage classes untouched.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sable_core::Value;

use crate::column::{Adapter, Converter};

/// Writes unix-timestamp integers as ISO-8601 text.
#[must_use]
pub fn timestamp_adapter() -> Adapter {
    Arc::new(|value| match value {
        Value::Integer(secs) => match Utc.timestamp_opt(secs, 0).single() {
            Some(moment) => Value::Text(moment.to_rfc3339()),
            None => Value::Integer(secs),
        },
        other => other,
    })
}

/// Reads ISO-8601 text back as unix-timestamp integers.
#[must_use]
pub fn timestamp_converter() -> Converter {
    Arc::new(|value| match value {
        Value::Text(text) => match DateTime::parse_from_rfc3339(&text) {
            Ok(moment) => Value::Integer(moment.timestamp()),
            Err(_) => Value::Text(text),
        },
        other => other,
    })
}

/// Normalizes integers to a 0/1 boolean flag on the way out.
#[must_use]
pub fn boolean_adapter() -> Adapter {
    Arc::new(|value| match value {
        Value::Integer(n) => Value::Integer(i64::from(n != 0)),
        other => other,
    })
}

/// Normalizes integers to a 0/1 boolean flag on the way in.
#[must_use]
pub fn boolean_converter() -> Converter {
    Arc::new(|value| match value {
        Value::Integer(n) => Value::Integer(i64::from(n != 0)),
        other => other,
    })
}
