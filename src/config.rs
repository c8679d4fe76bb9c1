use std::env;
use anyhow::{Context, Result};

/// How the embedded DuckDB database is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DuckDbMode {
    /// Transient in-memory database.
    Memory,
    /// Persistent database file.
    File,
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The address the server binds to.
    pub host: String,
    /// The port the server listens on.
    pub port: u16,
    /// Whether DuckDB runs in memory or against a file.
    pub duckdb_mode: DuckDbMode,
    /// The path of the DuckDB database file (ignored in memory mode).
    pub duckdb_path: String,
    /// Whether the authorization gate is active. Disabling it allows every
    /// request unconditionally.
    pub auth_enabled: bool,
    /// The HMAC secret used to sign session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in hours.
    pub token_ttl_hours: i64,
    /// The static API key accepted by the gate, if one is configured.
    pub api_key: Option<String>,
    /// The username of the default principal created at startup.
    pub default_username: String,
    /// The password of the default principal created at startup.
    pub default_password: String,
    /// An extra allowed CORS origin besides the localhost defaults.
    pub cors_origin: Option<String>,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let duckdb_mode = match env::var("DUCKDB_MODE")
            .unwrap_or_else(|_| "file".to_string())
            .as_str()
        {
            "memory" => DuckDbMode::Memory,
            "file" => DuckDbMode::File,
            other => anyhow::bail!("DUCKDB_MODE must be 'memory' or 'file', got '{}'", other),
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            duckdb_mode,
            duckdb_path: env::var("DUCKDB_PATH").unwrap_or_else(|_| "/data/db.duckdb".to_string()),
            auth_enabled: env::var("AUTH_ENABLED")
                .map(|v| v != "false")
                .unwrap_or(true),
            jwt_secret: env::var("JWT_SECRET")
                .context("JWT_SECRET must be set (generate with: openssl rand -hex 32)")?,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid TOKEN_TTL_HOURS")?,
            api_key: env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            default_username: env::var("DEFAULT_USER").unwrap_or_else(|_| "admin".to_string()),
            default_password: env::var("DEFAULT_PASSWORD")
                .context("DEFAULT_PASSWORD must be set")?,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
        })
    }
}
