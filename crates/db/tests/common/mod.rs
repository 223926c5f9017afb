//! In-process fake of the REST table store.
//!
//! Serves `GET`/`POST`/`PATCH /{table}` on `127.0.0.1:0` from an in-memory
//! map, understands the `and=(col.op.value,...)` and `id=eq.N` grammar, and
//! records every request so tests can assert on headers and queries.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use finboard_core::types::Row;
use finboard_db::{StoreConfig, TableClient};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-anon-key";

/// Table that always answers 500.
pub const BROKEN_TABLE: &str = "broken";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub table: String,
    pub params: HashMap<String, String>,
    pub api_key: Option<String>,
    pub prefer: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    tables: HashMap<String, Vec<Row>>,
    next_id: i64,
    requests: Vec<RecordedRequest>,
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeStore {
    addr: SocketAddr,
    state: Shared,
}

impl FakeStore {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            next_id: 1,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route(
                "/{table}",
                get(handle_get).post(handle_post).patch(handle_patch),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::new(self.base_url(), API_KEY)
    }

    pub fn client(&self) -> TableClient {
        TableClient::new(&self.config()).unwrap()
    }

    /// Replace the rows of `table`. Rows without an id get one assigned.
    pub fn seed(&self, table: &str, rows: Value) {
        let mut state = self.state.lock().unwrap();
        let mut seeded = Vec::new();
        for value in rows.as_array().cloned().unwrap_or_default() {
            let mut row = value.as_object().cloned().unwrap();
            match row.get("id").and_then(Value::as_i64) {
                Some(id) => state.next_id = state.next_id.max(id + 1),
                None => {
                    row.insert("id".into(), json!(state.next_id));
                    state.next_id += 1;
                }
            }
            seeded.push(row);
        }
        state.tables.insert(table.to_string(), seeded);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Record the request and check its API key; `Err` is the response to send.
fn admit(
    state: &mut FakeState,
    method: &'static str,
    table: &str,
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<(), Response> {
    let api_key = header(headers, "apikey");
    state.requests.push(RecordedRequest {
        method,
        table: table.to_string(),
        params: params.clone(),
        api_key: api_key.clone(),
        prefer: header(headers, "prefer"),
        content_type: header(headers, "content-type"),
    });

    if api_key.as_deref() != Some(API_KEY) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid API key"})),
        )
            .into_response());
    }
    if table == BROKEN_TABLE {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response());
    }
    Ok(())
}

fn cell_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Evaluate `(col.op.value,...)` against a row; string comparison is enough
/// for ISO dates and labels.
fn matches_and(row: &Row, expr: &str) -> bool {
    let inner = expr.trim_start_matches('(').trim_end_matches(')');
    inner.split(',').filter(|p| !p.is_empty()).all(|predicate| {
        let mut parts = predicate.splitn(3, '.');
        let (Some(column), Some(op), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let value = value.trim_matches('"');
        let Some(cell) = cell_text(row, column) else {
            return false;
        };
        match op {
            "gte" => cell.as_str() >= value,
            "lt" => cell.as_str() < value,
            "eq" => cell == value,
            _ => false,
        }
    })
}

async fn handle_get(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Err(response) = admit(&mut state, "GET", &table, &params, &headers) {
        return response;
    }

    let rows: Vec<Row> = state
        .tables
        .get(&table)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|row| params.get("and").map_or(true, |expr| matches_and(row, expr)))
        .collect();
    Json(rows).into_response()
}

async fn handle_post(
    State(state): State<Shared>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Err(response) = admit(&mut state, "POST", &table, &HashMap::new(), &headers) {
        return response;
    }

    let Some(mut row) = body.as_object().cloned() else {
        return (StatusCode::BAD_REQUEST, "expected an object").into_response();
    };
    let id = state.next_id;
    state.next_id += 1;
    row.insert("id".into(), json!(id));
    state.tables.entry(table).or_default().push(row.clone());

    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn handle_patch(
    State(state): State<Shared>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Err(response) = admit(&mut state, "PATCH", &table, &params, &headers) {
        return response;
    }

    let Some(wanted) = params.get("id").and_then(|v| v.strip_prefix("eq.")) else {
        return (StatusCode::BAD_REQUEST, "missing id filter").into_response();
    };
    let Some(fields) = body.as_object() else {
        return (StatusCode::BAD_REQUEST, "expected an object").into_response();
    };

    let mut updated = Vec::new();
    if let Some(rows) = state.tables.get_mut(&table) {
        for row in rows.iter_mut() {
            if cell_text(row, "id").as_deref() == Some(wanted) {
                for (k, v) in fields {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(row.clone());
            }
        }
    }
    Json(updated).into_response()
}
