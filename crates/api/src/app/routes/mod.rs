use axum::{
    Router,
    routing::{get, post},
};

pub mod chat;
pub mod finanzas;
pub mod preferences;
pub mod system;

/// Router for the dashboard endpoints under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/chat", post(chat::send_chat))
        .route("/finanzas", post(finanzas::dispatch))
        .route(
            "/preferences/:key",
            get(preferences::get_preference)
                .put(preferences::put_preference)
                .delete(preferences::delete_preference),
        )
}
