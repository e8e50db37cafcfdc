//! Small client preferences (theme, selected month, ...) backed by the
//! key/value adapter. Values are arbitrary JSON.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use finanzas_store::{KvError, get_json, set_json};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn get_preference(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let store = services.preferences.as_ref();
    if !store.is_available() {
        return errors::kv_error_to_response(KvError::Unavailable);
    }
    match get_json::<serde_json::Value>(store, &key) {
        Some(value) => (StatusCode::OK, Json(dto::PreferenceResponse { key, value })).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no preference '{key}'")),
    }
}

pub async fn put_preference(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> axum::response::Response {
    let store = services.preferences.clone();
    match blocking(move || set_json(store.as_ref(), &key, &value)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::kv_error_to_response(err),
    }
}

pub async fn delete_preference(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
) -> axum::response::Response {
    let store = services.preferences.clone();
    match blocking(move || store.remove(&key)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => errors::kv_error_to_response(err),
    }
}

/// Writes may rewrite the backing file; run them on the blocking pool.
async fn blocking<F>(write: F) -> Result<(), KvError>
where
    F: FnOnce() -> Result<(), KvError> + Send + 'static,
{
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| KvError::Io(format!("preference write task failed: {e}")))?
}
