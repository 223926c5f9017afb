//! REST client for the remote table store.
//!
//! Wraps the store's HTTP surface (`GET`, `POST`, `PATCH` on `{base}/{table}`)
//! using [`reqwest`]. Every request carries the `apikey` and JSON
//! content-type headers; writes also ask for the mutated rows back.

use async_trait::async_trait;
use finboard_core::error::CoreError;
use finboard_core::types::{Row, RowId, TableName, ID_COLUMN};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::filter::Filter;
use crate::store::TableStore;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "apikey";
/// Header asking the store to echo mutated rows.
pub const PREFER_HEADER: &str = "Prefer";
/// Value of [`PREFER_HEADER`] on every write.
pub const RETURN_REPRESENTATION: &str = "return=representation";

/// HTTP client for one table store.
///
/// Holds only the base URL and a pre-configured [`reqwest::Client`]; both
/// are fixed at construction, so one instance can serve any number of
/// sequential calls.
#[derive(Debug, Clone)]
pub struct TableClient {
    client: reqwest::Client,
    base_url: String,
}

impl TableClient {
    /// Build a client whose default headers carry the API key and the JSON
    /// content type.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.base_url.is_empty() {
            return Err(StoreError::Config("base URL must not be empty".into()));
        }

        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| StoreError::Config("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, table: &TableName) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// Read the rows of `table`, optionally narrowed by `filter`.
    ///
    /// Rows come back in the order the store returned them. Any status other
    /// than success is a [`StoreError::Backend`] carrying the raw body.
    pub async fn fetch(
        &self,
        table: &TableName,
        filter: Option<&Filter>,
    ) -> Result<Vec<Row>, StoreError> {
        let mut request = self.client.get(self.endpoint(table));
        if let Some(filter) = filter {
            filter.validate()?;
            request = request.query(&filter.query_pairs());
        }

        let response = request.send().await?;
        let response = Self::ensure_status(table, response, |s| s.is_success()).await?;
        let rows = Self::parse_rows(response).await?;

        tracing::debug!(table = %table, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Insert one row and return it as persisted, including the
    /// server-assigned `id`.
    ///
    /// `fields` must not carry an `id`; identity belongs to the store.
    pub async fn create(&self, table: &TableName, fields: &Row) -> Result<Row, StoreError> {
        reject_id_column(fields)?;

        let response = self
            .client
            .post(self.endpoint(table))
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(fields)
            .send()
            .await?;
        let response = Self::ensure_status(table, response, |s| {
            s == StatusCode::OK || s == StatusCode::CREATED
        })
        .await?;

        let row = Self::parse_rows(response).await?.into_iter().next().ok_or_else(|| {
            StoreError::MalformedResponse(format!("create on {table} returned no rows"))
        })?;
        let id = RowId::of(&row).ok_or_else(|| {
            StoreError::MalformedResponse(format!("row created in {table} has no id"))
        })?;

        tracing::info!(table = %table, %id, "Created row");
        Ok(row)
    }

    /// Overwrite the supplied columns of the row with `id`; other columns are
    /// left as they are.
    ///
    /// Returns the updated row. If no row has that id the store answers with
    /// an empty list, reported as [`StoreError::RowNotFound`].
    pub async fn update(
        &self,
        table: &TableName,
        id: &RowId,
        fields: &Row,
    ) -> Result<Row, StoreError> {
        if fields.is_empty() {
            return Err(CoreError::InvalidInput("update needs at least one column".into()).into());
        }
        reject_id_column(fields)?;

        let response = self
            .client
            .patch(self.endpoint(table))
            .query(&[(ID_COLUMN, format!("eq.{id}"))])
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(fields)
            .send()
            .await?;
        let response = Self::ensure_status(table, response, |s| s == StatusCode::OK).await?;

        let row = Self::parse_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                tracing::warn!(table = %table, %id, "Update matched no row");
                StoreError::RowNotFound {
                    table: table.to_string(),
                    id: id.to_string(),
                }
            })?;
        if let Some(returned) = RowId::of(&row) {
            if &returned != id {
                return Err(StoreError::MalformedResponse(format!(
                    "update of {table} id {id} returned row {returned}"
                )));
            }
        }

        tracing::info!(table = %table, %id, columns = fields.len(), "Updated row");
        Ok(row)
    }

    // ---- private helpers ----

    /// Pass the response through when `accept` approves its status; otherwise
    /// turn it into a [`StoreError::Backend`] with the body text.
    async fn ensure_status(
        table: &TableName,
        response: reqwest::Response,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !accept(status) {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                table = %table,
                status = status.as_u16(),
                body = %body,
                "Table store rejected request"
            );
            return Err(StoreError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Decode a JSON array of objects.
    async fn parse_rows(response: reqwest::Response) -> Result<Vec<Row>, StoreError> {
        let body: Value = response.json().await?;
        rows_from_value(body)
    }
}

/// Split a decoded body into rows, refusing anything but an array of objects.
pub(crate) fn rows_from_value(body: Value) -> Result<Vec<Row>, StoreError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::MalformedResponse(format!(
                    "element {i} is not an object: {other}"
                ))),
            })
            .collect(),
        other => Err(StoreError::MalformedResponse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn reject_id_column(fields: &Row) -> Result<(), CoreError> {
    if fields.contains_key(ID_COLUMN) {
        return Err(CoreError::Validation(
            "the id column is assigned by the store and cannot be written".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl TableStore for TableClient {
    async fn fetch(
        &self,
        table: &TableName,
        filter: Option<&Filter>,
    ) -> Result<Vec<Row>, StoreError> {
        TableClient::fetch(self, table, filter).await
    }

    async fn create(&self, table: &TableName, fields: &Row) -> Result<Row, StoreError> {
        TableClient::create(self, table, fields).await
    }

    async fn update(
        &self,
        table: &TableName,
        id: &RowId,
        fields: &Row,
    ) -> Result<Row, StoreError> {
        TableClient::update(self, table, id, fields).await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn new_rejects_header_unsafe_key() {
        let config = StoreConfig::new("https://db.example.com", "bad\nkey");
        assert_matches!(TableClient::new(&config), Err(StoreError::Config(_)));
    }

    #[test]
    fn new_rejects_empty_base_url() {
        let config = StoreConfig::new("", "key");
        assert_matches!(TableClient::new(&config), Err(StoreError::Config(_)));
    }

    #[test]
    fn endpoint_joins_base_and_table() {
        let config = StoreConfig::new("https://db.example.com/rest/v1/", "k");
        let client = TableClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(&TableName::expenses_daily()),
            "https://db.example.com/rest/v1/expenses_daily"
        );
    }

    #[test]
    fn rows_from_array_of_objects() {
        let rows = rows_from_value(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["id"], json!(2));
    }

    #[test]
    fn rows_from_non_array_is_malformed() {
        assert_matches!(
            rows_from_value(json!({"message": "hi"})),
            Err(StoreError::MalformedResponse(msg)) if msg.contains("an object")
        );
        assert_matches!(
            rows_from_value(json!([1, 2])),
            Err(StoreError::MalformedResponse(_))
        );
    }

    #[test]
    fn id_column_is_refused_in_payloads() {
        let mut fields = Row::new();
        fields.insert("value".into(), json!(10));
        assert!(reject_id_column(&fields).is_ok());
        fields.insert("id".into(), json!(3));
        assert_matches!(reject_id_column(&fields), Err(CoreError::Validation(_)));
    }
}
