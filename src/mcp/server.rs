use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::Stream;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    mcp::protocol::JsonRpcRequest,
    state::AppState,
};

/// Header carrying the session id on every non-initialize call.
pub const SESSION_HEADER: &str = "mcp-session-id";

fn session_id(headers: &HeaderMap) -> Result<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Uuid::parse_str(h).ok())
        .ok_or(AppError::NotFound)
}

/// Handles one JSON-RPC message.
///
/// `initialize` mints a fresh session and echoes its id in the
/// `mcp-session-id` response header. Every other method requires an
/// established session; an unknown or closed one is a transport-level 404,
/// never a JSON-RPC error.
#[axum::debug_handler]
pub async fn post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Result<Response> {
    if request.method == "initialize" {
        let session = state.sessions.establish();
        let response = state.mcp.handle_request(request).await;

        let mut reply = Json(response).into_response();
        let value = HeaderValue::from_str(&session.to_string())
            .map_err(|e| AppError::Internal(e.to_string()))?;
        reply.headers_mut().insert(SESSION_HEADER, value);
        return Ok(reply);
    }

    let session = session_id(&headers)?;
    if !state.sessions.is_established(&session) {
        tracing::warn!("❌ Request on unestablished session: {}", session);
        return Err(AppError::NotFound);
    }

    match state.mcp.handle_request(request).await {
        Some(response) => Ok(Json(response).into_response()),
        // Notifications get no body.
        None => Ok(StatusCode::ACCEPTED.into_response()),
    }
}

/// Opens the server-to-client event stream for an established session.
#[axum::debug_handler]
pub async fn sse(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let session = session_id(&headers)?;
    if !state.sessions.is_established(&session) {
        return Err(AppError::NotFound);
    }

    tracing::debug!("📡 Event stream opened for session: {}", session);

    let stream = futures::stream::once(async move {
        Ok::<_, Infallible>(
            Event::default()
                .event("connected")
                .data(session.to_string()),
        )
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    ))
}

/// Closes a session. The id stays known so later calls against it are
/// rejected rather than mistaken for a never-established session.
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let session = session_id(&headers)?;
    if state.sessions.close(&session) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
