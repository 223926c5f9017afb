use finboard_core::error::CoreError;

/// Errors from the table store client.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response decoded but does not have the expected shape.
    #[error("Malformed response from table store: {0}")]
    MalformedResponse(String),

    /// The table store answered with a status outside the accepted set.
    #[error("Table store error ({status}): {body}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Raw response body, surfaced as-is.
        body: String,
    },

    /// An update addressed an id that matched no row.
    #[error("No row with id {id} in table {table}")]
    RowNotFound { table: String, id: String },

    /// The request was refused locally before reaching the network.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Base URL or credential cannot be used to build a client.
    #[error("Invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Network-level or response-shape failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_) | Self::MalformedResponse(_))
    }

    /// The backend was reached and refused the request.
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::RowNotFound { .. })
    }
}
