use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{AppError, Result},
    models::principal::Principal,
    state::AppState,
};

/// The request payload for login.
///
/// Fields are optional so a missing field is a 400, not a deserialization
/// rejection.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub principal: Principal,
}

/// Handles login: validates credentials and issues a session token.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let (username, password) = match (payload.username, payload.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            (username, password)
        }
        _ => {
            return Err(AppError::Validation(
                "Username and password required".to_string(),
            ))
        }
    };

    tracing::info!("🔐 Login attempt: {}", username);

    let principal = state.credentials.validate_credentials(&username, &password)?;
    let token = state.tokens.issue(&principal)?;

    tracing::info!("✅ Token issued for: {}", principal.username);

    Ok(Json(LoginResponse { token, principal }))
}

/// Returns the principal resolved by the authorization gate.
///
/// When the gate is disabled or the request was authorized by API key there
/// is no principal to report.
#[axum::debug_handler]
pub async fn me(principal: Option<Extension<Principal>>) -> Json<serde_json::Value> {
    Json(json!({
        "principal": principal.map(|Extension(p)| p),
    }))
}

/// Reports whether a static API key is configured. Never the key itself.
#[axum::debug_handler]
pub async fn api_key_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "hasApiKey": state.config.api_key.is_some(),
    }))
}
