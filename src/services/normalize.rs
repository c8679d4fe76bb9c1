use crate::models::query::CellValue;
use chrono::SecondsFormat;
use serde_json::Value;

/// The largest integer magnitude a 64-bit float represents exactly (2^53).
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_992;

/// Normalizes one engine value into the transport type set.
///
/// Every value that crosses the boundary is one of: null, boolean, finite
/// number, string, ISO-8601 UTC date-time string, or a recursively
/// normalized array/object. Integers beyond 2^53 narrow to the nearest
/// float: a known lossy edge case, accepted rather than silently "fixed".
/// Non-finite floats become null so that only finite numbers escape.
pub fn normalize_value(value: CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::from(b),
        CellValue::Int(i) => {
            // unsigned_abs: i64::MIN has no i64 absolute value.
            if i.unsigned_abs() <= MAX_SAFE_INTEGER as u64 {
                Value::from(i)
            } else {
                Value::from(i as f64)
            }
        }
        CellValue::Float(f) => {
            if f.is_finite() {
                Value::from(f)
            } else {
                Value::Null
            }
        }
        CellValue::Text(s) => Value::from(s),
        CellValue::Timestamp(ts) => Value::from(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        CellValue::Array(values) => {
            Value::Array(values.into_iter().map(normalize_value).collect())
        }
        CellValue::Struct(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name, normalize_value(value)))
                .collect(),
        ),
    }
}

/// Normalizes a whole row, preserving value order.
pub fn normalize_row(row: Vec<CellValue>) -> Vec<Value> {
    row.into_iter().map(normalize_value).collect()
}
