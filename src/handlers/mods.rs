use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use super::common::{page_from_query, path_name, store_failure, ListParams};
use super::HandlerResult;
use crate::error::ApiError;
use crate::protocol::{ModDocument, ModPayload, UpsertOutcome};
use crate::router::AppState;

/// `GET /mods?page=<n>`
///
/// A query string that does not deserialize is read as an unparseable page.
pub async fn list_mods(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> HandlerResult<Json<Vec<ModDocument>>> {
    let page = page_from_query(query, state.legacy_pagination);
    let docs = state
        .store
        .list(page)
        .await
        .map_err(|e| store_failure(&state, "list", None, e, ApiError::internal("failed to retrieve mods")))?;
    Ok(Json(docs))
}

/// `PUT /create`
///
/// The receipt time is taken before the body is decoded and becomes the
/// document's `updated_at` (and `created_at` when the name is new).
pub async fn upsert_mod(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> HandlerResult<Response> {
    let received_at = Utc::now();

    let body = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let payload: ModPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("body fields are missing: {}", e)))?;
    let draft = payload.into_draft(received_at).map_err(ApiError::bad_request)?;
    let name = draft.name.clone();

    let outcome = state
        .store
        .upsert(draft)
        .await
        .map_err(|e| store_failure(&state, "upsert", Some(&name), e, ApiError::bad_request("unknown error on upsert")))?;

    match outcome {
        UpsertOutcome::Created(doc) => {
            state.metrics.mods_created_total.inc();
            state.logger.info("Mod created", Some(&json!({"name": doc.name, "id": doc.id.to_string()})));
            Ok((StatusCode::CREATED, Json(doc)).into_response())
        }
        UpsertOutcome::Updated(doc) => {
            state.metrics.mods_updated_total.inc();
            state.logger.info("Mod updated", Some(&json!({"name": doc.name, "id": doc.id.to_string()})));
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

/// `DELETE /delete/:name`
pub async fn delete_mod(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> HandlerResult<StatusCode> {
    let name = path_name(path)?;
    let removed = state
        .store
        .delete_by_name(&name)
        .await
        .map_err(|e| store_failure(&state, "delete", Some(&name), e, ApiError::bad_request("unknown error on delete")))?;

    state.metrics.mods_deleted_total.inc();
    state.logger.info("Mod deleted", Some(&json!({"name": removed.name, "id": removed.id.to_string()})));
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /find/:name`
pub async fn find_mod(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> HandlerResult<Json<ModDocument>> {
    let name = path_name(path)?;
    let doc = state
        .store
        .find_by_name(&name)
        .await
        .map_err(|e| store_failure(&state, "find", Some(&name), e, ApiError::bad_request("unknown error")))?;
    Ok(Json(doc))
}

/// Unmatched routes answer with the same error envelope as the handlers.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("route not found")
}
