use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use finanzas_core::DomainError;
use finanzas_store::{KvError, StoreError};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `/api/finanzas` failure envelope: `{success: false, error}`.
pub fn finanzas_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::InvalidId(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Convergence(_) | DomainError::InvariantViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    finanzas_error(domain_status(&err), err.to_string())
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Domain(inner) => domain_error_to_response(inner),
        StoreError::Unavailable(_) => finanzas_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "El almacén de datos no está disponible",
        ),
        StoreError::Rejected { .. } | StoreError::Decode(_) => {
            finanzas_error(StatusCode::BAD_GATEWAY, "El almacén de datos rechazó la solicitud")
        }
    }
}

pub fn kv_error_to_response(err: KvError) -> Response {
    match err {
        KvError::Unavailable => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_unavailable",
            "preference storage is not available",
        ),
        KvError::InvalidKey(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_key", msg),
        KvError::Encode(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_value", msg),
        KvError::Io(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg),
    }
}
