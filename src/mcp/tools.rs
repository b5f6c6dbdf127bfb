//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::{ConstraintSet, QueryRequest, YearRange};
use crate::search::QueryCoordinator;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "run_query")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry exposing the query and detail interfaces
    pub fn from_coordinator(coordinator: Arc<QueryCoordinator>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        let record_count = coordinator.store().len();

        registry.register(Tool {
            name: "run_query".to_string(),
            description: format!(
                "Search the VIP catalog ({} records) by free text and/or structured filters. \
                 Free text equal to a PubMed ID returns that record only.",
                record_count
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Free-text fuzzy query or exact PubMed ID"
                    },
                    "title": {
                        "type": "string",
                        "description": "Case-insensitive substring of the title"
                    },
                    "vip_name": {
                        "type": "string",
                        "description": "Case-insensitive substring of the VIP name"
                    },
                    "vip_family_name": {
                        "type": "string",
                        "description": "Case-insensitive substring of the VIP family name"
                    },
                    "pubmed_id": {
                        "type": "string",
                        "description": "Case-insensitive substring of the PubMed ID"
                    },
                    "year_from": {
                        "type": "string",
                        "description": "Inclusive lower year bound (malformed values are ignored)"
                    },
                    "year_to": {
                        "type": "string",
                        "description": "Inclusive upper year bound (malformed values are ignored)"
                    },
                    "filters": {
                        "type": "object",
                        "description": "Exact-value filters, e.g. {\"Database\": \"1\"}",
                        "additionalProperties": { "type": "string" }
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number (1-based)",
                        "default": 1
                    }
                }
            }),
            handler: Arc::new(RunQueryHandler {
                coordinator: coordinator.clone(),
            }),
        });

        registry.register(Tool {
            name: "get_details".to_string(),
            description: "Get every field of a VIP catalog record by PubMed ID, priority fields first"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "PubMed ID of the record"
                    }
                },
                "required": ["id"]
            }),
            handler: Arc::new(GetDetailsHandler { coordinator }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// All registered tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Handler for `run_query`
#[derive(Debug)]
pub struct RunQueryHandler {
    pub coordinator: Arc<QueryCoordinator>,
}

impl RunQueryHandler {
    fn request_from_args(args: &Value) -> Result<QueryRequest, String> {
        let mut constraints = ConstraintSet::new()
            .title(str_arg(args, "title"))
            .vip_name(str_arg(args, "vip_name"))
            .vip_family_name(str_arg(args, "vip_family_name"))
            .identifier(str_arg(args, "pubmed_id"))
            .year(YearRange::parse(
                Some(&year_arg(args, "year_from")),
                Some(&year_arg(args, "year_to")),
            ));

        if let Some(filters) = args.get("filters").and_then(|v| v.as_object()) {
            for (field, value) in filters {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => continue,
                    other => other.to_string(),
                };
                constraints = constraints
                    .equals(field, value)
                    .map_err(|e| e.to_string())?;
            }
        }

        Ok(QueryRequest::new(str_arg(args, "query")).constraints(constraints))
    }
}

fn str_arg<'a>(args: &'a Value, name: &str) -> &'a str {
    args.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

/// Year bounds may arrive as strings or numbers; fractional years are truncated
fn year_arg(args: &Value, name: &str) -> String {
    match args.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(|year| year.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[async_trait::async_trait]
impl ToolHandler for RunQueryHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let request = Self::request_from_args(&args)?;
        let page = args.get("page").and_then(|v| v.as_u64()).unwrap_or(1) as usize;

        // Each call gets its own session; the coordinator is shared read-only
        let mut session = self.coordinator.session();
        self.coordinator.run_query(&mut session, &request);
        let response = self.coordinator.go_to_page(&mut session, page);

        let mut value = serde_json::to_value(&response).map_err(|e| e.to_string())?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("summary".to_string(), Value::String(response.summary()));
        }
        Ok(value)
    }
}

/// Handler for `get_details`
#[derive(Debug)]
pub struct GetDetailsHandler {
    pub coordinator: Arc<QueryCoordinator>,
}

#[async_trait::async_trait]
impl ToolHandler for GetDetailsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let id = args
            .get("id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or("Missing 'id' parameter")?;

        let record = self
            .coordinator
            .find_by_identifier(&id)
            .ok_or_else(|| format!("Record not found: {}", id.trim()))?;

        serde_json::to_value(self.coordinator.get_details(record)).map_err(|e| e.to_string())
    }
}
