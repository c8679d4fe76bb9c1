use jsonschema::JSONSchema;
use serde_json::json;

use crate::error::{AppError, Result};

/// A tool exposed over the protocol endpoint, with its advertised input
/// schema and the compiled validator used before any engine work.
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
    compiled: JSONSchema,
}

impl ToolDefinition {
    fn new(
        name: &'static str,
        description: &'static str,
        input_schema: serde_json::Value,
    ) -> Result<Self> {
        let compiled = JSONSchema::compile(&input_schema)
            .map_err(|e| AppError::Internal(format!("invalid tool schema for {}: {}", name, e)))?;
        Ok(Self {
            name,
            description,
            input_schema,
            compiled,
        })
    }

    /// Validates arguments against the input schema. Collects every
    /// violation into one message.
    pub fn validate(&self, arguments: &serde_json::Value) -> std::result::Result<(), String> {
        if let Err(errors) = self.compiled.validate(arguments) {
            let details: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(details.join("; "));
        }
        Ok(())
    }
}

/// Builds the fixed tool registry.
pub fn registry() -> Result<Vec<ToolDefinition>> {
    Ok(vec![
        ToolDefinition::new(
            "execute_sql",
            "Execute a SQL statement and return the normalized result set",
            json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The SQL statement to execute"
                    }
                },
                "required": ["sql"],
                "additionalProperties": false
            }),
        )?,
        ToolDefinition::new(
            "list_schemas",
            "List available schemas, excluding system schemas",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        )?,
        ToolDefinition::new(
            "list_tables",
            "List tables and their columns for a schema",
            json!({
                "type": "object",
                "properties": {
                    "schema": {
                        "type": "string",
                        "description": "The schema to inspect, optionally catalog-qualified"
                    }
                },
                "required": ["schema"],
                "additionalProperties": false
            }),
        )?,
    ])
}
