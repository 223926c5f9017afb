//! Row, row identity and table naming shared by the client and the reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// One record of a remote table: column name to scalar JSON value.
///
/// The schema is not enforced here; whatever columns the backend returns
/// (or the caller supplies) pass through untouched.
pub type Row = serde_json::Map<String, Value>;

/// Column that carries the server-assigned identity of every row.
pub const ID_COLUMN: &str = "id";

/// Table of apartment installments.
pub const APARTMENT: &str = "apartment";
/// Table of credit-card purchases.
pub const CARD: &str = "card";
/// Table of daily, unplanned expenses.
pub const EXPENSES_DAILY: &str = "expenses_daily";

// ---------------------------------------------------------------------------
// RowId
// ---------------------------------------------------------------------------

/// Server-assigned row identity.
///
/// Backends hand out integer or UUID keys; both are kept in their textual
/// form since the client only ever echoes them back in a query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read the `id` column of a row, if it holds a string or a number.
    pub fn of(row: &Row) -> Option<Self> {
        match row.get(ID_COLUMN)? {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// TableName
// ---------------------------------------------------------------------------

/// Name of a remote table, safe to splice into a resource path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    /// Validate a table name: non-empty, ASCII alphanumerics and `_` only.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("table name must not be empty".into()));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::InvalidInput(format!(
                "table name '{name}' may only contain ASCII letters, digits and '_'"
            )));
        }
        Ok(Self(name))
    }

    pub fn apartment() -> Self {
        Self(APARTMENT.to_string())
    }

    pub fn card() -> Self {
        Self(CARD.to_string())
    }

    pub fn expenses_daily() -> Self {
        Self(EXPENSES_DAILY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TableName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Row accessors
// ---------------------------------------------------------------------------

/// Read a boolean column. Accepts JSON booleans and the strings
/// `"true"`/`"false"`; anything else is `None`.
pub fn row_bool(row: &Row, field: &str) -> Option<bool> {
    match row.get(field)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Read a column as display text. Numbers and booleans are rendered,
/// `null` and missing columns are `None`.
pub fn row_text(row: &Row, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
