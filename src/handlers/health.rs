use axum::Json;
use serde_json::json;

/// Liveness probe. No authorization required.
#[axum::debug_handler]
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
