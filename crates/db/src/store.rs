use async_trait::async_trait;
use finboard_core::types::{Row, RowId, TableName};

use crate::error::StoreError;
use crate::filter::Filter;
use crate::outcome::FetchOutcome;

/// Create/read/update access to named tables.
///
/// Implemented by [`crate::TableClient`] (straight to the network) and
/// [`crate::CachedStore`] (cached reads in front of another store).
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Rows of `table` matching `filter`, in backend order.
    async fn fetch(&self, table: &TableName, filter: Option<&Filter>)
        -> Result<Vec<Row>, StoreError>;

    /// Insert one row; returns it with its server-assigned id.
    async fn create(&self, table: &TableName, fields: &Row) -> Result<Row, StoreError>;

    /// Overwrite the given columns of one row.
    async fn update(&self, table: &TableName, id: &RowId, fields: &Row) -> Result<Row, StoreError>;

    /// [`TableStore::fetch`] folded into a [`FetchOutcome`].
    async fn fetch_outcome(&self, table: &TableName, filter: Option<&Filter>) -> FetchOutcome {
        FetchOutcome::from(self.fetch(table, filter).await)
    }
}
