use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::{error::AppError, state::AppState};

/// The authorization gate, evaluated once per protected call on both the
/// plain transport and the tool protocol endpoint.
///
/// Precedence is strict:
/// 1. auth disabled by configuration: allow unconditionally;
/// 2. an `X-API-Key` header present: accept iff it equals the configured
///    key; a wrong key is rejected immediately and never falls through to
///    the bearer path;
/// 3. a bearer token present: verify and attach the resolved principal;
/// 4. no credential at all: reject.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.auth_enabled {
        return Ok(next.run(request).await);
    }

    tracing::debug!("🔐 Checking authorization...");

    if let Some(supplied) = request.headers().get("x-api-key") {
        let matches = match (supplied.to_str(), state.config.api_key.as_deref()) {
            (Ok(supplied), Some(expected)) => {
                bool::from(supplied.as_bytes().ct_eq(expected.as_bytes()))
            }
            _ => false,
        };

        if matches {
            tracing::debug!("✅ Request authorized by API key");
            return Ok(next.run(request).await);
        }

        tracing::warn!("❌ Invalid API key");
        return Err(AppError::Authentication("Invalid API key".to_string()));
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = bearer {
        if let Some(principal) = state.tokens.verify(&token) {
            tracing::debug!("✅ Request authorized for: {}", principal.username);
            request.extensions_mut().insert(principal);
            return Ok(next.run(request).await);
        }

        tracing::warn!("❌ Invalid or expired token");
        return Err(AppError::Authentication(
            "Invalid or expired token".to_string(),
        ));
    }

    tracing::warn!("❌ No credential on request");
    Err(AppError::Authentication(
        "Authentication required".to_string(),
    ))
}
