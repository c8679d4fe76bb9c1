use serde_json::json;

use crate::error::Result;
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, Tool, ToolsCapability,
    PROTOCOL_VERSION,
};
use crate::mcp::tools::{self, ToolDefinition};
use crate::services::engine::QueryEngine;

/// Dispatches tool protocol requests to the query engine.
pub struct McpHandler {
    engine: QueryEngine,
    tools: Vec<ToolDefinition>,
}

impl McpHandler {
    pub fn new(engine: QueryEngine) -> Result<Self> {
        Ok(Self {
            engine,
            tools: tools::registry()?,
        })
    }

    /// Handles one request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        tracing::debug!("📡 Tool protocol method: {}", request.method);

        match request.method.as_str() {
            "initialize" => Some(JsonRpcResponse::success(
                id,
                json!(InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: false
                        }),
                    },
                    server_info: ServerInfo {
                        name: env!("CARGO_PKG_NAME").to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                    instructions: Some(
                        "Execute SQL and inspect schemas through the registered tools."
                            .to_string()
                    ),
                }),
            )),
            "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            "tools/list" => Some(JsonRpcResponse::success(
                id,
                json!(ListToolsResult {
                    tools: self
                        .tools
                        .iter()
                        .map(|t| Tool {
                            name: t.name.to_string(),
                            description: Some(t.description.to_string()),
                            input_schema: t.input_schema.clone(),
                        })
                        .collect(),
                }),
            )),
            "tools/call" => Some(self.call_tool(request).await),
            other => Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(other),
            )),
        }
    }

    async fn call_tool(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;

        let params: CallToolParams = match request.params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)),
                )
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing tool call params"),
                )
            }
        };

        let Some(tool) = self.tools.iter().find(|t| t.name == params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        let arguments = serde_json::Value::Object(params.arguments);
        if let Err(details) = tool.validate(&arguments) {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!(
                    "Invalid arguments for {}: {}",
                    tool.name, details
                )),
            );
        }

        tracing::info!("🛠️ Tool call: {}", tool.name);

        // Engine failures stay on the tool channel as isError results so the
        // session survives a bad statement.
        let result = match self.run_tool(tool.name, &arguments).await {
            Ok(rendered) => CallToolResult::text(rendered),
            Err(e) => {
                tracing::warn!("❌ Tool {} failed: {}", tool.name, e);
                CallToolResult::failure(e.to_string())
            }
        };

        match serde_json::to_value(&result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
        }
    }

    async fn run_tool(&self, name: &str, arguments: &serde_json::Value) -> Result<String> {
        let rendered = match name {
            "execute_sql" => {
                // Arguments are schema-validated before dispatch, so the
                // field is present and a string.
                let sql = arguments["sql"].as_str().unwrap_or_default().to_string();
                let result = self.engine.execute_query(sql).await?;
                serde_json::to_string_pretty(&result)
            }
            "list_schemas" => {
                let schemas = self.engine.list_schemas().await?;
                serde_json::to_string_pretty(&json!({ "schemas": schemas }))
            }
            "list_tables" => {
                let schema = arguments["schema"].as_str().unwrap_or_default().to_string();
                let tables = self.engine.list_tables(schema).await?;
                serde_json::to_string_pretty(&json!({ "tables": tables }))
            }
            other => {
                return Err(crate::error::AppError::Internal(format!(
                    "tool {} registered without a dispatch arm",
                    other
                )))
            }
        };

        rendered.map_err(|e| crate::error::AppError::Internal(e.to_string()))
    }
}
