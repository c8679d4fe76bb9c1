use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::saved_query::SavedQuery,
    state::AppState,
};

/// The request payload for saving a query.
#[derive(Deserialize, Debug)]
pub struct SaveQueryRequest {
    pub name: Option<String>,
    pub sql: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Lists all saved queries.
#[axum::debug_handler]
pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.saved_queries.read().await;
    let queries: Vec<&SavedQuery> = store.values().collect();
    Json(json!({ "queries": queries }))
}

/// Saves a query.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<SaveQueryRequest>,
) -> Result<Json<serde_json::Value>> {
    let (name, sql) = match (payload.name, payload.sql) {
        (Some(name), Some(sql)) if !name.is_empty() && !sql.is_empty() => (name, sql),
        _ => {
            return Err(AppError::Validation(
                "Name and SQL are required".to_string(),
            ))
        }
    };

    let query = SavedQuery {
        id: Uuid::new_v4(),
        name,
        sql,
        tags: payload.tags,
    };

    let mut store = state.saved_queries.write().await;
    store.insert(query.id, query.clone());

    Ok(Json(json!({ "success": true, "query": query })))
}

/// Fetches one saved query by id.
#[axum::debug_handler]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let store = state.saved_queries.read().await;
    let query = store.get(&id).ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "query": query })))
}

/// Deletes one saved query by id.
#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let mut store = state.saved_queries.write().await;
    store.remove(&id).ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "success": true })))
}
