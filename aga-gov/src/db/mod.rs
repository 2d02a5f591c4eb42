//! Store repositories
//!
//! Each entity has exactly one `*_from_row` conversion from a SQLite row to
//! its typed model; every query for that entity goes through it.

pub mod adm;
pub mod artifacts;
pub mod capabilities;
pub mod conflicts;
pub mod links;
pub mod parking;
pub mod principles;
pub mod tags;

use aga_common::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

/// Parse a stored enum column. Bad stored text is an internal error, not
/// caller input.
pub(crate) fn column_enum<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    value
        .parse()
        .map_err(|e: Error| Error::Internal(format!("Corrupt stored value: {}", e)))
}

pub(crate) fn optional_column_enum<T>(value: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = Error>,
{
    value.as_deref().map(column_enum).transpose()
}

/// Parse a stored JSON string list
pub(crate) fn json_list(value: &str) -> Result<Vec<String>> {
    Ok(serde_json::from_str(value)?)
}

/// Parse a stored JSON document; empty text reads as an empty object
pub(crate) fn json_value(value: &str) -> Result<serde_json::Value> {
    if value.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    Ok(serde_json::from_str(value)?)
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Store representation of a missing JSON object
pub(crate) const EMPTY_OBJECT: &str = "{}";
