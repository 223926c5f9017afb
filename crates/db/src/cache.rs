//! Short-lived read cache in front of a [`TableStore`].
//!
//! Fetch results are kept per `(table, filter query)` for a fixed TTL so a
//! single display cycle does not hit the network twice for the same rows.
//! A successful create or update drops every entry of the touched table
//! before returning, so the next read sees the write.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use finboard_core::types::{Row, RowId, TableName};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::filter::Filter;
use crate::store::TableStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    table: TableName,
    query: String,
}

impl CacheKey {
    fn new(table: &TableName, filter: Option<&Filter>) -> Self {
        Self {
            table: table.clone(),
            query: filter.and_then(Filter::and_expression).unwrap_or_default(),
        }
    }
}

struct CacheEntry {
    rows: Vec<Row>,
    stored_at: Instant,
}

/// A [`TableStore`] that caches successful fetches of another store.
///
/// Errors are never cached. A zero TTL disables caching.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl<S: TableStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached result of `table`.
    pub async fn invalidate(&self, table: &TableName) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| &key.table != table);
        tracing::debug!(table = %table, dropped = before - entries.len(), "Invalidated cache");
    }

    /// Drop every cached result.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached results, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Vec<Row>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.rows.clone())
    }
}

#[async_trait]
impl<S: TableStore> TableStore for CachedStore<S> {
    async fn fetch(
        &self,
        table: &TableName,
        filter: Option<&Filter>,
    ) -> Result<Vec<Row>, StoreError> {
        let key = CacheKey::new(table, filter);
        if let Some(rows) = self.lookup(&key).await {
            tracing::debug!(table = %table, query = %key.query, rows = rows.len(), "Cache hit");
            return Ok(rows);
        }

        let rows = self.inner.fetch(table, filter).await?;
        if !self.ttl.is_zero() {
            self.entries.write().await.insert(
                key,
                CacheEntry {
                    rows: rows.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
        Ok(rows)
    }

    async fn create(&self, table: &TableName, fields: &Row) -> Result<Row, StoreError> {
        let row = self.inner.create(table, fields).await?;
        self.invalidate(table).await;
        Ok(row)
    }

    async fn update(
        &self,
        table: &TableName,
        id: &RowId,
        fields: &Row,
    ) -> Result<Row, StoreError> {
        let row = self.inner.update(table, id, fields).await?;
        self.invalidate(table).await;
        Ok(row)
    }
}
