use crate::error::{AppError, Result};
use crate::models::query::{CellValue, ColumnInfo, QueryResult, TableColumn, TableInfo};
use crate::services::normalize;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::DateTime;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use rust_decimal::prelude::ToPrimitive;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Adapter over the process-wide DuckDB handle.
///
/// DuckDB's Rust connection is not `Sync`, so every call is funneled through
/// a single mutex and executed on the blocking pool: a single-writer queue
/// serializing all statement execution against the one shared handle. The
/// gateway imposes no timeout of its own; a call is bounded only by the
/// engine's execution time.
#[derive(Clone)]
pub struct QueryEngine {
    conn: Arc<Mutex<Connection>>,
}

impl QueryEngine {
    /// Wraps an opened connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Executes SQL text and returns the normalized result set.
    ///
    /// On failure the engine's diagnostic text is passed through verbatim as
    /// `AppError::Engine`; it is never rewritten or swallowed.
    ///
    /// # Arguments
    ///
    /// * `sql` - The SQL text to execute.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `QueryResult`.
    pub async fn execute_query(&self, sql: String) -> Result<QueryResult> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let conn = conn
                .lock()
                .map_err(|_| AppError::Internal("engine lock poisoned".to_string()))?;

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| AppError::Engine(e.to_string()))?;

            let mut cells: Vec<Vec<CellValue>> = Vec::new();
            {
                let mut rows = stmt
                    .query([])
                    .map_err(|e| AppError::Engine(e.to_string()))?;
                while let Some(row) = rows
                    .next()
                    .map_err(|e| AppError::Engine(e.to_string()))?
                {
                    let column_count = row.as_ref().column_count();
                    let mut record = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        let value: Value = row
                            .get(i)
                            .map_err(|e| AppError::Engine(e.to_string()))?;
                        record.push(from_engine_value(value));
                    }
                    cells.push(record);
                }
            }

            let execution_time = started.elapsed().as_secs_f64();

            // Zero rows: no values to derive runtime types from.
            if cells.is_empty() {
                return Ok(QueryResult {
                    columns: Vec::new(),
                    data: Vec::new(),
                    row_count: 0,
                    execution_time,
                });
            }

            // The reported type is the normalized runtime type of the first
            // row's value, not the engine's catalog type name.
            let columns: Vec<ColumnInfo> = stmt
                .column_names()
                .iter()
                .zip(cells[0].iter())
                .map(|(name, value)| ColumnInfo {
                    name: name.to_string(),
                    type_name: value.type_name().to_string(),
                })
                .collect();

            let row_count = cells.len();
            let data = cells.into_iter().map(normalize::normalize_row).collect();

            Ok(QueryResult {
                columns,
                data,
                row_count,
                execution_time,
            })
        })
        .await
        .map_err(|e| AppError::Internal(format!("Engine task panicked: {}", e)))?
    }

    /// Lists schemas as catalog-qualified identifiers (`catalog.schema`),
    /// excluding the engine's internal schemas by name.
    pub async fn list_schemas(&self) -> Result<Vec<String>> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::Internal("engine lock poisoned".to_string()))?;

            let mut stmt = conn
                .prepare(
                    "SELECT catalog_name, schema_name FROM information_schema.schemata \
                     WHERE schema_name NOT IN ('information_schema', 'pg_catalog')",
                )
                .map_err(|e| AppError::Engine(e.to_string()))?;

            let schemas = stmt
                .query_map([], |row| {
                    let catalog: String = row.get(0)?;
                    let schema: String = row.get(1)?;
                    Ok(format!("{}.{}", catalog, schema))
                })
                .map_err(|e| AppError::Engine(e.to_string()))?
                .collect::<duckdb::Result<Vec<String>>>()
                .map_err(|e| AppError::Engine(e.to_string()))?;

            Ok(schemas)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Engine task panicked: {}", e)))?
    }

    /// Lists tables of a schema with their columns.
    ///
    /// The schema identifier may be catalog-qualified (`catalog.schema`).
    /// Columns come back ordered by the engine's declared ordinal position,
    /// flagged nullable from catalog metadata.
    ///
    /// # Arguments
    ///
    /// * `schema` - The schema identifier, optionally catalog-qualified.
    pub async fn list_tables(&self, schema: String) -> Result<Vec<TableInfo>> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::Internal("engine lock poisoned".to_string()))?;

            let (catalog_name, schema_name) = match schema.split_once('.') {
                Some((catalog, schema)) => (Some(catalog.to_string()), schema.to_string()),
                None => (None, schema),
            };

            let rows: Vec<(String, String, String, String)> = match catalog_name {
                Some(catalog) => {
                    let mut stmt = conn
                        .prepare(
                            "SELECT table_name, column_name, data_type, is_nullable \
                             FROM information_schema.columns \
                             WHERE table_schema = ? AND table_catalog = ? \
                             ORDER BY table_name, ordinal_position",
                        )
                        .map_err(|e| AppError::Engine(e.to_string()))?;
                    stmt.query_map(duckdb::params![schema_name, catalog], column_row)
                        .map_err(|e| AppError::Engine(e.to_string()))?
                        .collect::<duckdb::Result<_>>()
                        .map_err(|e| AppError::Engine(e.to_string()))?
                }
                None => {
                    let mut stmt = conn
                        .prepare(
                            "SELECT table_name, column_name, data_type, is_nullable \
                             FROM information_schema.columns \
                             WHERE table_schema = ? \
                             ORDER BY table_name, ordinal_position",
                        )
                        .map_err(|e| AppError::Engine(e.to_string()))?;
                    stmt.query_map(duckdb::params![schema_name], column_row)
                        .map_err(|e| AppError::Engine(e.to_string()))?
                        .collect::<duckdb::Result<_>>()
                        .map_err(|e| AppError::Engine(e.to_string()))?
                }
            };

            // Rows arrive sorted by table name, so tables group sequentially.
            let mut tables: Vec<TableInfo> = Vec::new();
            for (table_name, column_name, data_type, is_nullable) in rows {
                if tables.last().map(|t| t.name.as_str()) != Some(table_name.as_str()) {
                    tables.push(TableInfo {
                        name: table_name.clone(),
                        columns: Vec::new(),
                    });
                }
                if let Some(table) = tables.last_mut() {
                    table.columns.push(TableColumn {
                        name: column_name,
                        type_name: data_type,
                        nullable: is_nullable == "YES",
                    });
                }
            }

            Ok(tables)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Engine task panicked: {}", e)))?
    }
}

fn column_row(row: &duckdb::Row<'_>) -> duckdb::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

/// Converts an engine-native value into the adapter's tagged variant.
///
/// Exotic engine types that have no transport counterpart degrade to text
/// rather than leaking a foreign runtime shape across the boundary.
fn from_engine_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(b) => CellValue::Bool(b),
        Value::TinyInt(v) => CellValue::Int(i64::from(v)),
        Value::SmallInt(v) => CellValue::Int(i64::from(v)),
        Value::Int(v) => CellValue::Int(i64::from(v)),
        Value::BigInt(v) => CellValue::Int(v),
        Value::HugeInt(v) => match i64::try_from(v) {
            Ok(narrow) => CellValue::Int(narrow),
            Err(_) => CellValue::Float(v as f64),
        },
        Value::UTinyInt(v) => CellValue::Int(i64::from(v)),
        Value::USmallInt(v) => CellValue::Int(i64::from(v)),
        Value::UInt(v) => CellValue::Int(i64::from(v)),
        Value::UBigInt(v) => match i64::try_from(v) {
            Ok(narrow) => CellValue::Int(narrow),
            Err(_) => CellValue::Float(v as f64),
        },
        Value::Float(v) => CellValue::Float(f64::from(v)),
        Value::Double(v) => CellValue::Float(v),
        Value::Decimal(d) => rust_decimal::Decimal::try_from(d)
            .ok()
            .and_then(|v| v.to_f64())
            .map(CellValue::Float)
            .unwrap_or(CellValue::Null),
        Value::Timestamp(unit, v) => timestamp_to_cell(unit, v),
        Value::Text(s) => CellValue::Text(s),
        Value::Enum(s) => CellValue::Text(s),
        Value::Blob(bytes) => CellValue::Text(BASE64.encode(bytes)),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map(CellValue::Timestamp)
            .unwrap_or(CellValue::Null),
        Value::Time64(unit, v) => CellValue::Text(time_to_text(unit, v)),
        Value::Interval { months, days, nanos } => CellValue::Text(format!(
            "{} months {} days {} us",
            months,
            days,
            nanos / 1_000
        )),
        Value::List(values) => {
            CellValue::Array(values.into_iter().map(from_engine_value).collect())
        }
        Value::Array(values) => {
            CellValue::Array(values.into_iter().map(from_engine_value).collect())
        }
        Value::Struct(fields) => CellValue::Struct(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), from_engine_value(value.clone())))
                .collect(),
        ),
        Value::Map(entries) => CellValue::Struct(
            entries
                .iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::Text(s) => s.clone(),
                        other => format!("{:?}", other),
                    };
                    (key, from_engine_value(value.clone()))
                })
                .collect(),
        ),
        Value::Union(inner) => from_engine_value(*inner),
        other => CellValue::Text(format!("{:?}", other)),
    }
}

fn timestamp_to_cell(unit: TimeUnit, v: i64) -> CellValue {
    let datetime = match unit {
        TimeUnit::Second => DateTime::from_timestamp(v, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(v),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(v),
        TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(v)),
    };
    datetime.map(CellValue::Timestamp).unwrap_or(CellValue::Null)
}

fn time_to_text(unit: TimeUnit, v: i64) -> String {
    let micros = match unit {
        TimeUnit::Second => v * 1_000_000,
        TimeUnit::Millisecond => v * 1_000,
        TimeUnit::Microsecond => v,
        TimeUnit::Nanosecond => v / 1_000,
    };
    let seconds = micros / 1_000_000;
    format!(
        "{:02}:{:02}:{:02}.{:06}",
        seconds / 3_600,
        (seconds / 60) % 60,
        seconds % 60,
        micros % 1_000_000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> QueryEngine {
        QueryEngine::new(Connection::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn select_one_returns_single_row() {
        let result = engine()
            .execute_query("SELECT 1 AS x".to_string())
            .await
            .unwrap();

        assert_eq!(result.columns.len(), 1);
        assert_eq!(result.columns[0].name, "x");
        assert_eq!(result.columns[0].type_name, "number");
        assert_eq!(result.row_count, 1);
        assert_eq!(result.data, vec![vec![serde_json::json!(1)]]);
        assert!(result.execution_time > 0.0);
    }

    #[tokio::test]
    async fn zero_row_query_is_not_an_error() {
        let engine = engine();
        engine
            .execute_query("CREATE TABLE empty_t (a INTEGER)".to_string())
            .await
            .unwrap();

        let result = engine
            .execute_query("SELECT * FROM empty_t".to_string())
            .await
            .unwrap();
        assert_eq!(result.row_count, 0);
        assert!(result.data.is_empty());
        assert!(result.columns.is_empty());
    }

    #[tokio::test]
    async fn missing_table_surfaces_engine_diagnostic() {
        let result = engine()
            .execute_query("SELECT * FROM does_not_exist".to_string())
            .await;

        match result {
            Err(crate::error::AppError::Engine(message)) => {
                assert!(!message.is_empty());
            }
            Ok(_) => panic!("expected engine error"),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn timestamps_normalize_to_iso_8601() {
        let result = engine()
            .execute_query("SELECT TIMESTAMP '2024-05-01 12:30:00' AS ts".to_string())
            .await
            .unwrap();

        let ts = result.data[0][0].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
        assert_eq!(result.columns[0].type_name, "string");
    }

    #[tokio::test]
    async fn decimals_narrow_to_numbers() {
        let result = engine()
            .execute_query("SELECT 1.50::DECIMAL(10,2) AS d".to_string())
            .await
            .unwrap();

        assert_eq!(result.columns[0].type_name, "number");
        assert_eq!(result.data[0][0].as_f64(), Some(1.5));
    }

    #[tokio::test]
    async fn blobs_encode_as_base64_text() {
        let result = engine()
            .execute_query("SELECT 'abc'::BLOB AS b".to_string())
            .await
            .unwrap();

        assert_eq!(result.columns[0].type_name, "string");
        assert_eq!(result.data[0][0], serde_json::json!("YWJj"));
    }

    #[tokio::test]
    async fn nested_list_preserves_order() {
        let result = engine()
            .execute_query("SELECT [1, 2, 3] AS xs".to_string())
            .await
            .unwrap();

        assert_eq!(result.data[0][0], serde_json::json!([1, 2, 3]));
        assert_eq!(result.columns[0].type_name, "array");
    }

    #[tokio::test]
    async fn list_schemas_excludes_system_schemas() {
        let schemas = engine().list_schemas().await.unwrap();
        assert!(schemas.iter().any(|s| s.ends_with(".main")));
        assert!(!schemas.iter().any(|s| s.contains("information_schema")));
    }

    #[tokio::test]
    async fn list_tables_orders_columns_by_ordinal_position() {
        let engine = engine();
        engine
            .execute_query(
                "CREATE TABLE people (id INTEGER NOT NULL, name VARCHAR, age INTEGER)".to_string(),
            )
            .await
            .unwrap();

        let tables = engine.list_tables("main".to_string()).await.unwrap();
        let people = tables.iter().find(|t| t.name == "people").unwrap();

        assert_eq!(people.columns.len(), 3);
        assert_eq!(people.columns[0].name, "id");
        assert!(!people.columns[0].nullable);
        assert_eq!(people.columns[1].name, "name");
        assert!(people.columns[1].nullable);
        assert_eq!(people.columns[2].name, "age");
    }
}
