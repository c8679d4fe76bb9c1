use std::time::Duration;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use http::{header, HeaderName, HeaderValue, Method};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, mcp, middleware_layer, state::AppState};

/// Builds the application router.
///
/// Health and login are public; every other route, the tool protocol
/// endpoint included, sits behind the authorization gate.
pub fn build(state: AppState) -> Router {
    let session_header = HeaderName::from_static(mcp::server::SESSION_HEADER);

    let mut origins: Vec<HeaderValue> = vec![
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];
    if let Some(origin) = state
        .config
        .cors_origin
        .as_deref()
        .and_then(|o| HeaderValue::from_str(o).ok())
    {
        origins.push(origin);
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
            session_header.clone(),
        ])
        .expose_headers([session_header])
        .max_age(Duration::from_secs(86400));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/auth/login", post(handlers::auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/api-key", get(handlers::auth::api_key_info))
        .route("/query", post(handlers::query::execute))
        .route("/schemas", get(handlers::query::schemas))
        .route("/tables/{schema}", get(handlers::query::tables))
        .route("/queries", get(handlers::queries::list))
        .route("/queries", post(handlers::queries::create))
        .route("/queries/{id}", get(handlers::queries::get))
        .route("/queries/{id}", delete(handlers::queries::delete))
        .route("/mcp", post(mcp::server::post))
        .route("/mcp", get(mcp::server::sse))
        .route("/mcp", delete(mcp::server::delete))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors)
}
