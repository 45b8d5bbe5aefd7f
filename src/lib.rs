//! # agent-relay
//!
//! A minimal multi-agent dispatch loop: declarative agents with tools,
//! input-validation guardrails, typed output schemas, and hand-offs between
//! specialized agents, executed by a bounded runner that threads caller-owned
//! conversation state through every turn.
//!
//! ## Core Concepts
//!
//! - **Agent**: a declarative bundle of instructions, tools, output schema,
//!   guardrails, and hand-off targets
//! - **Tool**: a callable capability exposed to the model, with a declared
//!   parameter schema that is validated before the body runs
//! - **Guardrail**: a pre-execution input validator that can abort a turn
//!   with a tripwire, including a classifier backed by its own sub-agent
//! - **Hand-off**: transfer of an in-progress turn from a triage agent to a
//!   specialist
//! - **Context**: caller-owned mutable state shared across turns of one
//!   conversation
//!
//! ## Getting Started
//!
//! Set your OpenAI API key in the `OPENAI_API_KEY` environment variable.
//!
//! ```rust,no_run
//! use agent_relay::{Agent, Runner, runner::RunConfig, tool::FunctionTool};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let weather = Arc::new(FunctionTool::simple(
//!     "get_weather",
//!     "Gets the current weather for a location.",
//!     |location: String| format!("22°C and sunny in {location}."),
//! ));
//!
//! let agent = Agent::simple("WeatherAssistant", "You provide weather information.")
//!     .with_tool(weather);
//!
//! let result = Runner::run(agent, "What's the weather in Tokyo?", RunConfig::default()).await?;
//! println!("{}", result.final_output);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod context;
pub mod error;
pub mod guardrail;
pub mod handoff;
pub mod items;
pub mod model;
pub mod registry;
pub mod result;
pub mod runner;
pub mod schema;
pub mod tool;
pub mod usage;

pub use agent::{Agent, AgentConfig};
pub use context::RunContext;
pub use error::{AgentsError, Result};
pub use guardrail::{ClassifierGuardrail, GuardrailResult, InputGuardrail, OutputGuardrail};
pub use handoff::Handoff;
pub use model::{ModelProvider, OpenAIProvider, ScriptedProvider};
pub use registry::ToolRegistry;
pub use result::RunResult;
pub use runner::{RunConfig, Runner};
pub use schema::OutputSchema;
pub use tool::{FunctionTool, Tool, ToolResult};
