use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// The request payload for query execution.
#[derive(Deserialize, Debug)]
pub struct QueryRequest {
    pub sql: Option<String>,
    pub format: Option<String>,
}

/// Executes SQL and returns the normalized result, as JSON or CSV.
#[axum::debug_handler]
pub async fn execute(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Response> {
    let sql = payload
        .sql
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("SQL query is required".to_string()))?;

    let result = state.engine.execute_query(sql).await?;
    tracing::debug!(
        "Query returned {} rows in {:.6}s",
        result.row_count,
        result.execution_time
    );

    if payload.format.as_deref() == Some("csv") {
        // Minimal delimited export: header row plus comma-joined rows, no
        // quoting or escaping guarantee.
        let header_row = result
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let body_rows = result
            .data
            .iter()
            .map(|row| {
                row.iter()
                    .map(csv_field)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");
        let csv = format!("{}\n{}", header_row, body_rows);

        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"query_result.csv\"",
                ),
            ],
            csv,
        )
            .into_response());
    }

    Ok(Json(result).into_response())
}

fn csv_field(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lists schemas (catalog-qualified, system schemas excluded).
#[axum::debug_handler]
pub async fn schemas(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let schemas = state.engine.list_schemas().await?;
    Ok(Json(json!({ "schemas": schemas })))
}

/// Lists tables and their columns for a schema.
#[axum::debug_handler]
pub async fn tables(
    State(state): State<AppState>,
    Path(schema): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let tables = state.engine.list_tables(schema).await?;
    Ok(Json(json!({ "tables": tables })))
}
