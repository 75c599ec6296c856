//! Generic CRUD endpoints, one set of handlers for every resource kind

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{CacheAsideGateway, Document, QuerySpec};

fn lookup_gateway<'a>(
    state: &'a AppState,
    resource: &str,
) -> Result<&'a Arc<CacheAsideGateway>, ApiError> {
    state
        .gateway(resource)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource '{}'", resource)))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("Invalid id '{}'", raw)).with_param("id"))
}

/// Checks a write body: it must be a non-empty JSON object, and the id is
/// allocated by the store, never supplied by the client.
fn validate_fields(body: Value) -> Result<Map<String, Value>, ApiError> {
    let fields = match body {
        Value::Object(fields) => fields,
        _ => return Err(ApiError::bad_request("Body must be a JSON object")),
    };

    if fields.is_empty() {
        return Err(ApiError::bad_request("Body must not be empty"));
    }

    if fields.contains_key("id") {
        return Err(ApiError::bad_request("Field 'id' is assigned by the server").with_param("id"));
    }

    Ok(fields)
}

/// GET /{resource}
pub async fn list_documents(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let gateway = lookup_gateway(&state, &resource)?;
    let spec = QuerySpec::from_params(&resource, &params);

    debug!(resource = %resource, page = spec.page, per = spec.per_page, "Listing documents");

    let documents = gateway.read_list(&spec).await.map_err(ApiError::from)?;
    Ok(Json(documents))
}

/// GET /{resource}/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    let gateway = lookup_gateway(&state, &resource)?;
    let id = parse_id(&id)?;

    debug!(resource = %resource, id, "Fetching document");

    let document = gateway
        .read_detail(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Document '{}' not found", id)))?;

    Ok(Json(document))
}

/// POST /{resource}
pub async fn create_document(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    let gateway = lookup_gateway(&state, &resource)?;
    let fields = validate_fields(body)?;

    debug!(resource = %resource, "Creating document");

    let document = gateway.insert(fields).await.map_err(ApiError::from)?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// PUT /{resource}/{id}
pub async fn update_document(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let gateway = lookup_gateway(&state, &resource)?;
    let id = parse_id(&id)?;
    let fields = validate_fields(body)?;

    debug!(resource = %resource, id, "Updating document");

    let updated = gateway.update(id, fields).await.map_err(ApiError::from)?;

    if !updated {
        return Err(ApiError::not_found(format!("Document '{}' not found", id)));
    }

    Ok(Json(json!({ "updated": true, "id": id })))
}

/// DELETE /{resource}/{id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let gateway = lookup_gateway(&state, &resource)?;
    let id = parse_id(&id)?;

    debug!(resource = %resource, id, "Deleting document");

    let deleted = gateway.delete(id).await.map_err(ApiError::from)?;

    if !deleted {
        return Err(ApiError::not_found(format!("Document '{}' not found", id)));
    }

    Ok(Json(json!({ "deleted": true, "id": id })))
}

/// GET /__ping/cache
pub async fn cache_ping(State(state): State<AppState>) -> Json<Value> {
    let cache_ok = state.cache().ping().await;
    Json(json!({ "cache_ok": cache_ok }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("1.5").is_err());
    }

    #[test]
    fn test_validate_fields_accepts_objects() {
        let fields = validate_fields(json!({"title": "X", "year": 2004})).unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_validate_fields_rejects_non_objects() {
        assert!(validate_fields(json!([1, 2, 3])).is_err());
        assert!(validate_fields(json!("text")).is_err());
        assert!(validate_fields(json!(null)).is_err());
    }

    #[test]
    fn test_validate_fields_rejects_empty_body() {
        assert!(validate_fields(json!({})).is_err());
    }

    #[test]
    fn test_validate_fields_rejects_client_supplied_id() {
        let err = validate_fields(json!({"id": 5, "title": "X"})).unwrap_err();
        assert_eq!(err.response.error.param, Some("id".to_string()));
    }
}
