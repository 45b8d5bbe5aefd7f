//! Tool registry: lookup, argument validation, execution
//!
//! The registry sits between the dispatch loop and tool bodies. Every
//! invocation is validated against the tool's declared parameter schema
//! before the body runs, so a call with a missing required parameter or an
//! unknown parameter name fails fast and never touches the [`RunContext`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::error::{AgentsError, Result};
use crate::tool::{Tool, ToolResult};

/// A set of tools addressable by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an agent's tool list. Later tools shadow
    /// earlier ones with the same name.
    pub fn from_tools(tools: &[Arc<dyn Tool>]) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool.clone());
        }
        registry
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke `name` with `arguments`.
    ///
    /// Fails with [`AgentsError::ToolInvocation`] when the tool is unknown or
    /// the arguments do not satisfy its parameter schema; in both cases the
    /// tool body never runs. A failure inside the tool body is returned as an
    /// error-carrying [`ToolResult`] so the caller can feed it back to the
    /// model instead of aborting the run.
    pub async fn invoke(
        &self,
        ctx: &RunContext,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult> {
        let tool = self.get(name).ok_or_else(|| {
            warn!(tool = %name, "unknown tool requested");
            AgentsError::ToolInvocation {
                message: format!("unknown tool '{name}'"),
            }
        })?;

        validate_arguments(name, &tool.parameters_schema(), &arguments)?;

        debug!(tool = %name, args = %arguments, "invoking tool");
        tool.execute(ctx, arguments).await
    }
}

/// Validate `arguments` against a tool's parameter schema.
///
/// Unknown parameter names are rejected here even when the schema document
/// itself is silent about additional properties, since a misspelled argument
/// from the model would otherwise be dropped on the floor.
pub fn validate_arguments(tool_name: &str, schema: &Value, arguments: &Value) -> Result<()> {
    if schema.is_null() {
        return Ok(());
    }

    let args = arguments.as_object().ok_or_else(|| AgentsError::ToolInvocation {
        message: format!("tool '{tool_name}': arguments must be a JSON object"),
    })?;

    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        let allow_extra = schema
            .get("additionalProperties")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !allow_extra {
            for key in args.keys() {
                if !properties.contains_key(key) {
                    return Err(AgentsError::ToolInvocation {
                        message: format!("tool '{tool_name}': unknown parameter '{key}'"),
                    });
                }
            }
        }
    }

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !args.contains_key(field) {
                return Err(AgentsError::ToolInvocation {
                    message: format!("tool '{tool_name}': missing required parameter '{field}'"),
                });
            }
        }
    }

    match jsonschema::validator_for(schema) {
        Ok(validator) => {
            let violations: Vec<String> = validator
                .iter_errors(arguments)
                .map(|error| format!("at {}: {}", error.instance_path, error))
                .collect();
            if !violations.is_empty() {
                return Err(AgentsError::ToolInvocation {
                    message: format!(
                        "tool '{tool_name}': invalid arguments: {}",
                        violations.join("; ")
                    ),
                });
            }
        }
        Err(e) => {
            return Err(AgentsError::ToolInvocation {
                message: format!("tool '{tool_name}': invalid parameter schema: {e}"),
            });
        }
    }

    Ok(())
}
