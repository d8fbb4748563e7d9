//! Tool contracts: schema declarations, execution results, the `Tool` trait

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

// ============================================================================
// Schema
// ============================================================================

/// Declaration of a tool that can be called by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name (unique within a registry)
    pub name: String,

    /// Human-readable description shown to the model
    pub description: String,

    /// JSON Schema for parameters
    pub parameters: ToolParameters,
}

/// Parameters schema for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (always "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Properties (parameter definitions)
    pub properties: Value,

    /// Required parameters
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolSchema {
    /// Create a new tool schema with an empty parameter object
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters {
                schema_type: "object".to_string(),
                properties: serde_json::json!({}),
                required: vec![],
            },
        }
    }

    /// Add a string parameter
    pub fn with_string_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(
                name.clone(),
                serde_json::json!({
                    "type": "string",
                    "description": description.into()
                }),
            );
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }

    /// Add an integer parameter
    pub fn with_integer_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(
                name.clone(),
                serde_json::json!({
                    "type": "integer",
                    "description": description.into()
                }),
            );
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }

    /// Add a boolean parameter
    pub fn with_boolean_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(
                name.clone(),
                serde_json::json!({
                    "type": "boolean",
                    "description": description.into()
                }),
            );
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }

    /// Add an enum parameter (string with a fixed value set)
    pub fn with_enum_param(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        values: Vec<&str>,
        required: bool,
    ) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(
                name.clone(),
                serde_json::json!({
                    "type": "string",
                    "description": description.into(),
                    "enum": values
                }),
            );
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }

    /// Add a custom parameter with a full schema value
    pub fn with_param(mut self, name: impl Into<String>, schema: Value, required: bool) -> Self {
        let name = name.into();

        if let Value::Object(ref mut props) = self.parameters.properties {
            props.insert(name.clone(), schema);
        }

        if required {
            self.parameters.required.push(name);
        }

        self
    }
}

// ============================================================================
// Result
// ============================================================================

/// Outcome of a tool execution.
///
/// Invariant: `error` is `Some` exactly when `success` is false. The
/// constructors below are the only way callers should build one, which keeps
/// the invariant from drifting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution succeeded
    pub success: bool,

    /// Structured payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure description on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Auxiliary information (timings, provenance, counters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl ToolResult {
    /// Successful result with a structured payload
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Failed result with a description
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Serialize for a tool-role message. Falls back to a plain error string
    /// if the payload itself refuses to serialize.
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!("{{\"success\":false,\"error\":\"serialize: {}\"}}", e))
    }
}

// ============================================================================
// Context & Trait
// ============================================================================

/// Ambient state handed to every tool execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Directory relative paths resolve against
    pub working_dir: PathBuf,

    /// Extra environment variables for spawned processes
    pub env: HashMap<String, String>,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            env: HashMap::new(),
        }
    }

    /// Resolve a path against the working directory
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = PathBuf::from(path);
        if p.is_absolute() {
            p
        } else {
            self.working_dir.join(p)
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

/// An invokable tool.
///
/// `execute` returns `Err` only for infrastructure faults; a tool that ran
/// and failed reports that through a `ToolResult` with `success == false`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &str;

    /// Schema advertised to the model
    fn schema(&self) -> ToolSchema;

    /// Execute with JSON arguments
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult>;
}
