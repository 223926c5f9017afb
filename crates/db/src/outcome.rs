//! Three-way result of a fetch, so "no rows" and "could not fetch" render
//! differently.

use finboard_core::types::Row;

use crate::error::StoreError;

#[derive(Debug)]
pub enum FetchOutcome {
    /// The fetch succeeded and returned at least one row.
    Rows(Vec<Row>),
    /// The fetch succeeded and the table (or filter) holds no rows.
    Empty,
    /// The fetch failed; the reason is kept for reporting.
    Failed(StoreError),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Degrade to a plain row list, treating a failure as no rows.
    ///
    /// This is an explicit opt-in: the failure is logged and then dropped.
    pub fn rows_or_empty(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Empty => Vec::new(),
            Self::Failed(err) => {
                tracing::warn!(error = %err, "Fetch failed, continuing with no rows");
                Vec::new()
            }
        }
    }

    /// Back to a `Result`, with `Empty` as an empty list.
    pub fn into_result(self) -> Result<Vec<Row>, StoreError> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Empty => Ok(Vec::new()),
            Self::Failed(err) => Err(err),
        }
    }
}

impl From<Result<Vec<Row>, StoreError>> for FetchOutcome {
    fn from(result: Result<Vec<Row>, StoreError>) -> Self {
        match result {
            Ok(rows) if rows.is_empty() => Self::Empty,
            Ok(rows) => Self::Rows(rows),
            Err(err) => Self::Failed(err),
        }
    }
}
