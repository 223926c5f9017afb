//! Data access for the finance dashboard.
//!
//! The dashboard's tables live in a hosted store reached over its REST
//! surface. [`TableClient`] performs the create/read/update calls,
//! [`CachedStore`] puts a short-lived read cache in front of it, and both
//! implement [`TableStore`] so callers can be written against either.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod outcome;
pub mod store;

pub use cache::CachedStore;
pub use client::TableClient;
pub use config::StoreConfig;
pub use error::StoreError;
pub use filter::{Filter, FilterOp};
pub use outcome::FetchOutcome;
pub use store::TableStore;

/// Build the default stack: a [`TableClient`] behind a [`CachedStore`] using
/// the configured TTL.
pub fn connect(config: &StoreConfig) -> Result<CachedStore<TableClient>, StoreError> {
    let client = TableClient::new(config)?;
    tracing::info!(
        base_url = %client.base_url(),
        ttl_secs = config.cache_ttl.as_secs(),
        "Table store client ready"
    );
    Ok(CachedStore::new(client, config.cache_ttl))
}
