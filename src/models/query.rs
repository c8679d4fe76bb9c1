use chrono::{DateTime, Utc};
use serde::Serialize;

/// An engine value as produced by the query adapter.
///
/// Every engine-native value is converted into this tagged variant before it
/// goes anywhere near a transport. Normalization is an exhaustive match over
/// these variants, so no runtime type inspection is needed downstream.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<CellValue>),
    Struct(Vec<(String, CellValue)>),
}

impl CellValue {
    /// The transport-level type name this value normalizes to.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Bool(_) => "boolean",
            CellValue::Int(_) | CellValue::Float(_) => "number",
            // Timestamps serialize to ISO-8601 strings.
            CellValue::Text(_) | CellValue::Timestamp(_) => "string",
            CellValue::Array(_) => "array",
            CellValue::Struct(_) => "object",
        }
    }
}

/// A result-set column: name plus the normalized runtime type of its values.
#[derive(Clone, Debug, Serialize)]
pub struct ColumnInfo {
    /// The column name.
    pub name: String,
    /// The normalized runtime type, not the engine's catalog type name.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// The result of a query execution, ready for transport.
#[derive(Clone, Debug, Serialize)]
pub struct QueryResult {
    /// The result-set columns, in engine order.
    pub columns: Vec<ColumnInfo>,
    /// The rows, each an ordered sequence of normalized values.
    pub data: Vec<Vec<serde_json::Value>>,
    /// The number of rows returned.
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    /// Wall-clock execution time in seconds, sub-millisecond resolution.
    #[serde(rename = "executionTime")]
    pub execution_time: f64,
}

/// A column of a discovered table.
#[derive(Clone, Debug, Serialize)]
pub struct TableColumn {
    /// The column name.
    pub name: String,
    /// The engine's declared data type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the column is nullable per catalog metadata.
    pub nullable: bool,
}

/// A table discovered from catalog metadata.
///
/// Columns are ordered by the engine's declared ordinal position. A table
/// with zero columns is never valid output; any such entry is a defect in
/// the adapter, not a state callers should handle.
#[derive(Clone, Debug, Serialize)]
pub struct TableInfo {
    /// The table name.
    pub name: String,
    /// The table's columns in ordinal order.
    pub columns: Vec<TableColumn>,
}
