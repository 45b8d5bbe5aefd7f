//! # Agent (orientation)
//!
//! An `Agent` is a declarative bundle: a name, instructions, tools, an
//! optional output schema, input guardrails, and hand-off targets. Agents are
//! immutable once a run starts; construction goes through the builder-style
//! `with_*` methods. The dispatch loop in [`crate::runner`] executes them.

use std::sync::Arc;

use crate::guardrail::{InputGuardrail, OutputGuardrail};
use crate::handoff::Handoff;
use crate::items::Message;
use crate::schema::OutputSchema;
use crate::tool::Tool;

/// Defines the complete configuration for an [`Agent`].
#[derive(Clone)]
pub struct AgentConfig {
    /// The name of the agent, used for identification, hand-off targeting,
    /// and in logs.
    pub name: String,

    /// The system instructions that guide the agent's behavior.
    pub instructions: String,

    /// A description of the agent's capabilities, used when this agent is a
    /// potential hand-off target for another agent.
    pub handoff_description: Option<String>,

    /// Tools the agent can call to perform actions.
    pub tools: Vec<Arc<dyn Tool>>,

    /// Agents this agent can hand control off to. A non-empty list makes
    /// this agent a triage node.
    pub handoffs: Vec<Handoff>,

    /// Guardrails run against the raw input before the agent executes.
    pub input_guardrails: Vec<Arc<dyn InputGuardrail>>,

    /// Guardrails run against the final answer before it is returned.
    pub output_guardrails: Vec<Arc<dyn OutputGuardrail>>,

    /// The model used for generating responses.
    pub model: String,

    /// Maximum number of model invocations per run. Prevents runaway
    /// tool-call loops. Defaults to 10.
    pub max_turns: Option<usize>,

    /// Sampling temperature for the model.
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate in a single response.
    pub max_tokens: Option<u32>,

    /// When set, the agent's final answer must validate against this schema.
    pub output_schema: Option<Arc<OutputSchema>>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Assistant".to_string(),
            instructions: "You are a helpful assistant.".to_string(),
            handoff_description: None,
            tools: vec![],
            handoffs: vec![],
            input_guardrails: vec![],
            output_guardrails: vec![],
            model: "gpt-4o".to_string(),
            max_turns: Some(10),
            temperature: Some(1.0),
            max_tokens: None,
            output_schema: None,
        }
    }
}

/// A configured participant in a multi-agent workflow.
///
/// ## Example
///
/// ```rust
/// use agent_relay::{Agent, tool::FunctionTool};
/// use std::sync::Arc;
///
/// let weather_tool = Arc::new(FunctionTool::simple(
///     "get_weather",
///     "Gets the current weather for a specified location.",
///     |location: String| format!("Sunny in {location}."),
/// ));
///
/// let weather_agent = Agent::simple("WeatherAssistant", "You provide weather information.")
///     .with_model("gpt-4o-mini")
///     .with_tool(weather_tool)
///     .with_temperature(0.5);
///
/// assert_eq!(weather_agent.config.model, "gpt-4o-mini");
/// assert_eq!(weather_agent.tools().len(), 1);
/// ```
#[derive(Clone)]
pub struct Agent {
    /// The configuration that defines the agent's behavior and capabilities.
    pub config: AgentConfig,
}

impl Agent {
    /// Creates a new agent from a full configuration.
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Creates an agent with just a name and instructions; everything else
    /// takes its default.
    pub fn simple(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self::new(AgentConfig {
            name: name.into(),
            instructions: instructions.into(),
            ..Default::default()
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn with_handoff_description(mut self, description: impl Into<String>) -> Self {
        self.config.handoff_description = Some(description.into());
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.config.tools.push(tool);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.config.tools.extend(tools);
        self
    }

    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.config.handoffs.push(handoff);
        self
    }

    pub fn with_handoffs(mut self, handoffs: Vec<Handoff>) -> Self {
        self.config.handoffs.extend(handoffs);
        self
    }

    pub fn with_input_guardrail(mut self, guardrail: Arc<dyn InputGuardrail>) -> Self {
        self.config.input_guardrails.push(guardrail);
        self
    }

    pub fn with_output_guardrail(mut self, guardrail: Arc<dyn OutputGuardrail>) -> Self {
        self.config.output_guardrails.push(guardrail);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.config.max_turns = Some(max_turns);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Requires the final answer to validate against `schema`.
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.config.output_schema = Some(Arc::new(schema));
        self
    }

    /// Requires the final answer to deserialize into `T`, deriving the
    /// schema from the type.
    pub fn with_output_type<T: schemars::JsonSchema>(self) -> Self {
        self.with_output_schema(OutputSchema::from_type::<T>())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn instructions(&self) -> &str {
        &self.config.instructions
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.config.tools
    }

    pub fn handoffs(&self) -> &[Handoff] {
        &self.config.handoffs
    }

    pub fn has_tools(&self) -> bool {
        !self.config.tools.is_empty()
    }

    pub fn has_handoffs(&self) -> bool {
        !self.config.handoffs.is_empty()
    }

    /// Constructs the system message priming the model with the agent's
    /// instructions, available tools, hand-off candidates, and, when an
    /// output schema is set, the required answer format.
    pub fn build_system_message(&self) -> Message {
        let mut content = self.config.instructions.clone();

        if !self.config.tools.is_empty() {
            content.push_str("\n\nYou have access to the following tools:\n");
            for tool in &self.config.tools {
                content.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            }
        }

        if !self.config.handoffs.is_empty() {
            content.push_str("\n\nYou can hand off to the following agents by calling the tool with the agent's name:\n");
            for handoff in &self.config.handoffs {
                content.push_str(&format!("- {}: {}\n", handoff.name, handoff.description));
            }
        }

        if let Some(schema) = &self.config.output_schema {
            content.push_str(&format!(
                "\n\nRespond with a single JSON object conforming to this JSON Schema, with no surrounding prose:\n{}\n",
                schema.document()
            ));
        }

        Message::system(content)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.name)
            .field("model", &self.config.model)
            .field("tools_count", &self.config.tools.len())
            .field("handoffs_count", &self.config.handoffs.len())
            .field("has_output_schema", &self.config.output_schema.is_some())
            .finish()
    }
}
