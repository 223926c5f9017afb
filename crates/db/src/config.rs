use std::fmt;
use std::time::Duration;

use crate::error::StoreError;

/// Connection settings for the remote table store.
#[derive(Clone)]
pub struct StoreConfig {
    /// REST root of the store, e.g. `https://xyz.supabase.co/rest/v1`.
    pub base_url: String,
    /// Key sent in the `apikey` header of every request.
    pub api_key: String,
    /// Per-request timeout; `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
    /// How long a cached fetch result stays fresh.
    pub cache_ttl: Duration,
}

/// Default freshness window for cached fetches.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            request_timeout: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }

    /// Load the store settings from environment variables.
    ///
    /// | Env Var                         | Required | Default |
    /// |---------------------------------|----------|---------|
    /// | `SUPABASE_URL`                  | **yes**  | --      |
    /// | `SUPABASE_KEY`                  | **yes**  | --      |
    /// | `FINBOARD_REQUEST_TIMEOUT_SECS` | no       | unset   |
    /// | `FINBOARD_CACHE_TTL_SECS`       | no       | `60`    |
    pub fn from_env() -> Result<Self, StoreError> {
        let base_url = required_var("SUPABASE_URL")?;
        let api_key = required_var("SUPABASE_KEY")?;

        let mut config = Self::new(base_url, api_key);

        if let Some(secs) = optional_secs("FINBOARD_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = optional_secs("FINBOARD_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String, StoreError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(StoreError::Config(format!("{name} must be set"))),
    }
}

fn optional_secs(name: &str) -> Result<Option<u64>, StoreError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| StoreError::Config(format!("{name} must be a whole number of seconds"))),
        _ => Ok(None),
    }
}
