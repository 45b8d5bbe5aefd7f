//! Tool system for agents
//!
//! Tools are the way agents act on the world. A tool declares its name, a
//! description for the model, and a JSON Schema for its arguments; the
//! dispatch loop validates arguments against that schema before the body
//! runs. Tool bodies are synchronous functions. The only sanctioned side
//! effect is mutation of the [`RunContext`], and tools that mutate it should
//! say so in their description.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use crate::context::RunContext;
use crate::error::Result;

/// Result from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output from the tool
    pub output: Value,
    /// Error message if the tool body failed
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: Value) -> Self {
        Self {
            output,
            error: None,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: Value::Null,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Trait for all tools that can be exposed to the model
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with already-validated arguments
    async fn execute(&self, ctx: &RunContext, arguments: Value) -> Result<ToolResult>;
}

/// A function-based tool
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters_schema: Value,
    function: Arc<dyn Fn(&RunContext, Value) -> Result<Value> + Send + Sync>,
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters_schema", &self.parameters_schema)
            .finish()
    }
}

impl FunctionTool {
    /// Create a tool from a function over raw JSON arguments.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: Value,
        function: F,
    ) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            function: Arc::new(move |_ctx, args| function(args)),
        }
    }

    /// Create a tool whose function also receives the run's [`RunContext`].
    ///
    /// Use this for tools that store or retrieve conversation state.
    pub fn with_context<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters_schema: Value,
        function: F,
    ) -> Self
    where
        F: Fn(&RunContext, Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema,
            function: Arc::new(function),
        }
    }

    /// Create a tool from a typed function, deriving the parameter schema
    /// from the argument type.
    ///
    /// ```rust
    /// use agent_relay::tool::{FunctionTool, Tool};
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize, JsonSchema)]
    /// struct WeatherArgs {
    ///     location: String,
    ///     #[serde(default)]
    ///     unit: Option<String>,
    /// }
    ///
    /// let tool = FunctionTool::typed(
    ///     "get_weather",
    ///     "Gets the current weather for a location.",
    ///     |args: WeatherArgs| {
    ///         Ok(serde_json::json!(format!("Sunny in {}", args.location)))
    ///     },
    /// );
    /// assert_eq!(tool.parameters_schema()["type"], "object");
    /// ```
    pub fn typed<A, F>(name: impl Into<String>, description: impl Into<String>, function: F) -> Self
    where
        A: DeserializeOwned + schemars::JsonSchema + 'static,
        F: Fn(A) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: schema_of::<A>(),
            function: Arc::new(move |_ctx, args| {
                let typed: A = serde_json::from_value(args)?;
                function(typed)
            }),
        }
    }

    /// Typed variant of [`FunctionTool::with_context`].
    pub fn typed_with_context<A, F>(
        name: impl Into<String>,
        description: impl Into<String>,
        function: F,
    ) -> Self
    where
        A: DeserializeOwned + schemars::JsonSchema + 'static,
        F: Fn(&RunContext, A) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters_schema: schema_of::<A>(),
            function: Arc::new(move |ctx, args| {
                let typed: A = serde_json::from_value(args)?;
                function(ctx, typed)
            }),
        }
    }

    /// Create a tool with a simple string-to-string function, taking its
    /// single argument under the key `input`.
    pub fn simple<F>(name: &str, description: &str, function: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        let wrapped = move |args: Value| {
            let input = args
                .get("input")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            Ok(Value::String(function(input)))
        };

        Self::new(
            name,
            description,
            serde_json::json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "Input to the function"
                    }
                },
                "required": ["input"],
                "additionalProperties": false
            }),
            wrapped,
        )
    }
}

/// Derive a parameter schema document from a schemars-annotated type.
///
/// Unknown parameters are rejected at the registry regardless, but the schema
/// also declares `additionalProperties: false` so the constraint is visible
/// to the model.
fn schema_of<A: schemars::JsonSchema>() -> Value {
    let root = schemars::gen::SchemaGenerator::default().into_root_schema_for::<A>();
    let mut document = serde_json::to_value(root).unwrap_or(Value::Null);
    if let Some(obj) = document.as_object_mut() {
        obj.entry("additionalProperties")
            .or_insert(Value::Bool(false));
    }
    document
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters_schema.clone()
    }

    async fn execute(&self, ctx: &RunContext, arguments: Value) -> Result<ToolResult> {
        match (self.function)(ctx, arguments) {
            Ok(output) => Ok(ToolResult::success(output)),
            Err(e) => Ok(ToolResult::error(e.to_string())),
        }
    }
}

/// Macro to create a function tool from a Rust function
#[macro_export]
macro_rules! function_tool {
    ($name:expr, $description:expr, $func:expr) => {
        $crate::tool::FunctionTool::simple($name, $description, $func)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemars::JsonSchema;

    #[test]
    fn test_tool_result_creation() {
        let result = ToolResult::success(serde_json::json!({"data": "test"}));
        assert!(!result.is_error());
        assert_eq!(result.output, serde_json::json!({"data": "test"}));

        let error_result = ToolResult::error("something went wrong");
        assert!(error_result.is_error());
        assert_eq!(error_result.output, Value::Null);
    }

    #[tokio::test]
    async fn test_function_tool_execution() {
        let tool = FunctionTool::simple("reverse", "Reverses a string", |s: String| {
            s.chars().rev().collect()
        });

        let ctx = RunContext::new();
        let args = serde_json::json!({"input": "hello"});
        let result = tool.execute(&ctx, args).await.unwrap();

        assert_eq!(result.output, Value::String("olleh".to_string()));
        assert!(!result.is_error());
    }

    #[derive(Debug, serde::Deserialize, JsonSchema)]
    struct AddArgs {
        a: f64,
        b: f64,
    }

    #[tokio::test]
    async fn test_typed_tool() {
        let tool = FunctionTool::typed("add", "Adds two numbers", |args: AddArgs| {
            Ok(serde_json::json!({"sum": args.a + args.b}))
        });

        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert!(schema["properties"].get("a").is_some());

        let ctx = RunContext::new();
        let result = tool
            .execute(&ctx, serde_json::json!({"a": 1.0, "b": 2.0}))
            .await
            .unwrap();
        assert_eq!(result.output["sum"], 3.0);
    }

    #[tokio::test]
    async fn test_typed_tool_bad_arguments_become_error_result() {
        let tool = FunctionTool::typed("add", "Adds two numbers", |args: AddArgs| {
            Ok(serde_json::json!(args.a + args.b))
        });

        let ctx = RunContext::new();
        let result = tool
            .execute(&ctx, serde_json::json!({"a": "one"}))
            .await
            .unwrap();
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_context_tool_mutates_shared_state() {
        let tool = FunctionTool::with_context(
            "set_preference",
            "Stores a user preference. Mutates the conversation context.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "preference_key": {"type": "string"},
                    "preference_value": {"type": "string"}
                },
                "required": ["preference_key", "preference_value"],
                "additionalProperties": false
            }),
            |ctx, args| {
                let key = args["preference_key"].as_str().unwrap_or_default();
                let value = args["preference_value"].as_str().unwrap_or_default();
                ctx.add_preference(key, value);
                Ok(Value::String(format!("stored {key}={value}")))
            },
        );

        let ctx = RunContext::new();
        let result = tool
            .execute(
                &ctx,
                serde_json::json!({"preference_key": "unit", "preference_value": "F"}),
            )
            .await
            .unwrap();

        assert!(!result.is_error());
        assert_eq!(ctx.preference("unit").as_deref(), Some("F"));
    }

    #[test]
    fn test_function_tool_macro() {
        let tool = function_tool!("echo", "Echoes the input", |s: String| format!("Echo: {s}"));
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.description(), "Echoes the input");
    }
}
