//! Small pieces shared by the resource handlers.

use std::collections::HashMap;

use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use showroom_db::Database;
use showroom_types::Record;
use showroom_types::api::WithClient;
use showroom_types::models::{Client, ClientSummary};

use crate::error::{ApiError, ApiResult};

/// `?id=` on the collection-level DELETE routes.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    pub fn require(self, what: &str) -> ApiResult<String> {
        self.id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("{what} ID is required")))
    }
}

/// List endpoints sort descending unless `sort=asc`.
pub fn descending(sort: Option<&str>) -> bool {
    sort != Some("asc")
}

pub fn message(text: &str) -> Json<Value> {
    Json(serde_json::json!({ "message": text }))
}

/// `{"message": text, key: value}`
pub fn envelope<T: Serialize>(text: &str, key: &str, value: &T) -> ApiResult<Json<Value>> {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::String(text.to_string()));
    body.insert(key.to_string(), to_json(value)?);
    Ok(Json(Value::Object(body)))
}

/// `{key: value}`
pub fn wrap<T: Serialize>(key: &str, value: &T) -> ApiResult<Json<Value>> {
    let mut body = Map::new();
    body.insert(key.to_string(), to_json(value)?);
    Ok(Json(Value::Object(body)))
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(format!("serialize: {e}")))
}

/// Client summaries keyed by `client_id`, for resolving soft references in bulk.
pub struct ClientIndex(HashMap<String, ClientSummary>);

impl ClientIndex {
    pub fn load(db: &Database) -> anyhow::Result<Self> {
        let index = db
            .find_all::<Client>()?
            .iter()
            .map(|c| (c.doc.client_id.clone(), ClientSummary::from(&c.doc)))
            .collect();
        Ok(Self(index))
    }

    pub fn attach<T>(&self, record: Record<T>, client_id: &str) -> WithClient<T> {
        WithClient {
            client: self.0.get(client_id).cloned(),
            record,
        }
    }
}

/// Resolve one soft reference.
pub fn lookup_client(db: &Database, client_id: &str) -> anyhow::Result<Option<ClientSummary>> {
    Ok(db
        .find_one_by::<Client>("client_id", client_id)?
        .map(|c| ClientSummary::from(&c.doc)))
}

/// The referenced client must exist before a dependent document is written.
pub fn require_client(db: &Database, client_id: &str) -> ApiResult<ClientSummary> {
    lookup_client(db, client_id)?.ok_or_else(|| ApiError::not_found("Client"))
}

/// Trimmed, non-blank text or the empty string.
pub fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Trimmed, non-blank text or `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
