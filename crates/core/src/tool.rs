//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act on the operator's
//! machine: read and write files, search them, run shell commands.
//! Every tool declares its parameters up front; the raw argument bag sent by
//! the model is decoded against that declaration before the handler runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{RegistryError, ToolError};

/// The declared type of a tool parameter.
///
/// Only strings are in use today; new kinds get a matching [`ArgValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
        }
    }
}

/// One named parameter in a tool's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub required: bool,
}

/// The ordered parameter list of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required string parameter.
    pub fn required(mut self, name: &str, description: &str) -> Self {
        self.params.push(ParameterSpec {
            name: name.into(),
            description: description.into(),
            kind: ParamKind::String,
            required: true,
        });
        self
    }

    /// Declare an optional string parameter.
    pub fn optional(mut self, name: &str, description: &str) -> Self {
        self.params.push(ParameterSpec {
            name: name.into(),
            description: description.into(),
            kind: ParamKind::String,
            required: false,
        });
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// Render as a JSON Schema object for the backend.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.kind.json_type(),
                        "description": p.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// Declared parameters
    pub parameters: ParameterSchema,
}

/// A decoded argument value, tagged by its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
}

/// A decoded argument bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    values: BTreeMap<String, ArgValue>,
}

impl ToolArgs {
    /// Decode the raw JSON argument string against a schema.
    ///
    /// An empty string is treated as an empty object. Keys that the schema
    /// does not declare are ignored.
    pub fn decode(raw: &str, schema: &ParameterSchema) -> Result<Self, ToolError> {
        let raw = raw.trim();
        let parsed: serde_json::Value = if raw.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw)
                .map_err(|e| ToolError::InvalidArguments(format!("failed to parse arguments: {e}")))?
        };

        let serde_json::Value::Object(object) = parsed else {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".into(),
            ));
        };

        let mut values = BTreeMap::new();
        for spec in schema.params() {
            match (object.get(&spec.name), spec.kind) {
                (Some(serde_json::Value::String(s)), ParamKind::String) => {
                    values.insert(spec.name.clone(), ArgValue::String(s.clone()));
                }
                (None | Some(serde_json::Value::Null), _) => {
                    if spec.required {
                        return Err(ToolError::InvalidArguments(format!(
                            "missing required parameter '{}'",
                            spec.name
                        )));
                    }
                }
                (Some(other), kind) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "parameter '{}' must be a {}, got {}",
                        spec.name,
                        kind.json_type(),
                        json_kind(other)
                    )));
                }
            }
        }

        Ok(Self { values })
    }

    /// Build an argument bag directly (handy for callers that skip JSON).
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), ArgValue::String(v.to_string())))
                .collect(),
        }
    }

    /// A required string argument.
    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        self.optional_string(name).ok_or_else(|| {
            ToolError::InvalidArguments(format!("missing required parameter '{name}'"))
        })
    }

    /// An optional string argument.
    pub fn optional_string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Some(s.as_str()),
            None => None,
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The outcome of one dispatched tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name the model asked for
    pub tool_name: String,

    /// The output content (possibly partial when failed)
    pub output: String,

    /// Human-readable failure, if the call failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: &ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: error.partial_output().to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Text handed back to the model: the output, then the error line if any.
    pub fn content(&self) -> String {
        match &self.error {
            Some(err) => format!("{}error: {err}\n", self.output),
            None => self.output.clone(),
        }
    }
}

/// The core Tool trait.
///
/// Each built-in tool (readFile, shell, ...) implements this trait. Tools are
/// registered in the [`ToolRegistry`] and made available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "readFile").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Declared parameters.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the tool with decoded arguments.
    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// The fixed catalog of tools available in a session.
///
/// Built once at startup, then shared read-only (`Arc<ToolRegistry>`).
/// Registration order is kept so the schema list sent to the backend is
/// deterministic.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build a registry from a list of tools, rejecting duplicate names.
    pub fn from_tools(
        tools: impl IntoIterator<Item = Box<dyn Tool>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. A second tool with the same name is an error.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by exact name.
    pub fn resolve(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// All tool definitions, in registration order.
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// All registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
