use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

use crate::app::dto;
use crate::app::services::AppServices;

pub async fn send_chat(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ChatRequest>,
) -> axum::response::Response {
    match services.chat.send_chat(&body.messages, &body.system_context).await {
        Ok(message) => (StatusCode::OK, Json(dto::ChatResponse { message })).into_response(),
        Err(err) => {
            // Provider details stay in the log.
            error!(error = %err, "chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Error al procesar el mensaje",
                    "details": "No se pudo obtener respuesta del asistente",
                })),
            )
                .into_response()
        }
    }
}
