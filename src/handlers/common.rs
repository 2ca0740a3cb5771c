use axum::extract::{
    rejection::{PathRejection, QueryRejection},
    Path, Query,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, StoreError};
use crate::protocol::Page;
use crate::router::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
}

/// Resolves the `page` query value into a window.
///
/// An absent value always means the whole collection. Anything that is not a
/// positive integer is clamped to page 1, unless `legacy` is set, in which
/// case it also means the whole collection.
pub fn parse_page(raw: Option<&str>, legacy: bool) -> Option<Page> {
    let raw = raw?;
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Some(Page::number(n as u64)),
        _ if legacy => None,
        _ => Some(Page::number(1)),
    }
}

/// Like `parse_page`, but a rejected query string (duplicate keys, bad
/// encoding) counts as a present, unparseable page value.
pub fn page_from_query(query: Result<Query<ListParams>, QueryRejection>, legacy: bool) -> Option<Page> {
    match query {
        Ok(Query(params)) => parse_page(params.page.as_deref(), legacy),
        Err(_) => parse_page(Some(""), legacy),
    }
}

/// Unwraps the `:name` segment, turning a rejection into a 400 envelope.
pub fn path_name(path: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    path.map(|Path(name)| name)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Logs a store failure and maps it to a response: not-found becomes 404,
/// everything else `fallback`.
pub fn store_failure(state: &AppState, op: &str, name: Option<&str>, err: StoreError, fallback: ApiError) -> ApiError {
    if err.is_not_found() {
        return ApiError::not_found("document not exists");
    }
    state.metrics.store_errors_total.inc();
    state.logger.error("Store operation failed", Some(&json!({
        "op": op,
        "name": name,
        "backend": state.store.backend(),
        "transient": err.is_transient(),
        "error": err.message(),
    })));
    fallback
}
