use crate::config::{Config, DuckDbMode};
use crate::error::{AppError, Result};
use duckdb::Connection;

/// Opens the embedded DuckDB database per configuration.
///
/// # Arguments
///
/// * `config` - The application's configuration.
///
/// # Returns
///
/// A `Result` containing the `Connection`.
pub fn open(config: &Config) -> Result<Connection> {
    let conn = match config.duckdb_mode {
        DuckDbMode::Memory => Connection::open_in_memory(),
        DuckDbMode::File => Connection::open(&config.duckdb_path),
    }
    .map_err(|e| AppError::Internal(format!("Failed to open DuckDB: {}", e)))?;

    Ok(conn)
}
