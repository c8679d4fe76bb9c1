use crate::config::Config;
use crate::error::Result;
use crate::mcp::handlers::McpHandler;
use crate::mcp::session::ToolSessions;
use crate::models::saved_query::SavedQuery;
use crate::services::auth::CredentialStore;
use crate::services::engine::QueryEngine;
use crate::services::token::TokenService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The in-memory saved-query store.
pub type SavedQueryStore = Arc<RwLock<HashMap<Uuid, SavedQuery>>>;

/// The application's state.
///
/// Everything here is constructed once at bootstrap and passed by reference
/// into the gate and handlers; nothing is ambient global state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The shared query engine handle.
    pub engine: QueryEngine,
    /// The single active principal's credential.
    pub credentials: Arc<CredentialStore>,
    /// The session token service.
    pub tokens: TokenService,
    /// Tool protocol session registry.
    pub sessions: ToolSessions,
    /// Tool protocol request handler.
    pub mcp: Arc<McpHandler>,
    /// Saved queries.
    pub saved_queries: SavedQueryStore,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Opens the engine handle, seeds the default principal, and wires the
    /// tool protocol handler.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let conn = crate::db::open(config)?;
        let engine = QueryEngine::new(conn);
        tracing::info!("✅ DuckDB handle opened ({:?} mode)", config.duckdb_mode);

        let credentials = Arc::new(CredentialStore::new());
        credentials.set_principal(&config.default_username, &config.default_password)?;

        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);

        let mcp = Arc::new(McpHandler::new(engine.clone())?);
        tracing::info!("✅ Tool protocol handler initialized");

        Ok(AppState {
            config: config.clone(),
            engine,
            credentials,
            tokens,
            sessions: ToolSessions::new(),
            mcp,
            saved_queries: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}
