//! Cache RPC Handlers
//!
//! HTTP endpoints translating the wire protocol into group reads. The
//! internal fetch handler is what a peer's [`super::Client`] talks to; the
//! API handler is the optional public front-end.

use std::sync::Arc;

use axum::extract::{Extension, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::protocol::KeyQuery;
use crate::error::CacheError;
use crate::group::{get_group, Group};

/// Internal fetch: resolves the group by name and returns the raw value
/// bytes for the requested key.
pub async fn handle_cache_fetch(
    Path(group_name): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Response {
    let Some(group) = get_group(&group_name) else {
        tracing::warn!("fetch for unknown group [{}]", group_name);
        return error_response(&CacheError::GroupUnknown(group_name));
    };

    tracing::debug!("serving fetch ({})/({})", group.name(), query.key);
    match group.get(&query.key).await {
        Ok(view) => octet_response(view.byte_slice()),
        Err(e) => error_response(&e),
    }
}

/// Public front-end: same lookup against a fixed group, but every failure
/// is the client's 500. Callers of the API are not peers and get no
/// routing detail.
pub async fn handle_api_get(
    Extension(group): Extension<Arc<Group>>,
    Query(query): Query<KeyQuery>,
) -> Response {
    match group.get(&query.key).await {
        Ok(view) => octet_response(view.byte_slice()),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

fn octet_response(body: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response()
}

fn error_response(err: &CacheError) -> Response {
    let status = match err {
        CacheError::EmptyKey => StatusCode::BAD_REQUEST,
        CacheError::GroupUnknown(_) | CacheError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}
