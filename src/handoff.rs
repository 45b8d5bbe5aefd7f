//! # Agent hand-offs
//!
//! A hand-off lets a triage agent transfer an in-progress turn to a more
//! specialized agent. The [`Handoff`] struct names a target agent and
//! describes its capabilities; the dispatch loop advertises each hand-off to
//! the model as a synthetic tool, and intercepts the call instead of
//! executing it: the active agent is swapped and the same conversation
//! (full message history, same context) continues under the target.
//!
//! ```rust
//! use agent_relay::{Agent, Handoff};
//!
//! let math_tutor = Agent::simple(
//!     "Math Tutor",
//!     "You provide help with math problems. Explain your reasoning at each step.",
//! );
//!
//! let triage = Agent::simple(
//!     "Triage Agent",
//!     "You determine which agent to use based on the user's question.",
//! )
//! .with_handoff(Handoff::new(math_tutor, "Specialist agent for math questions"));
//!
//! assert_eq!(triage.handoffs()[0].name, "Math Tutor");
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::Agent;
use crate::context::RunContext;
use crate::error::Result;
use crate::tool::{Tool, ToolResult};

/// A potential hand-off target.
#[derive(Clone)]
pub struct Handoff {
    /// The name the model calls to select this target. Defaults to the
    /// target agent's name.
    pub name: String,

    /// Description of the target's capabilities, shown to the model so it
    /// can decide when delegation is appropriate.
    pub description: String,

    /// The agent control transfers to.
    pub agent: Arc<Agent>,
}

impl Handoff {
    /// Creates a hand-off named after the target agent.
    ///
    /// When the target declares its own `handoff_description`, that text is
    /// used unless `description` overrides it with something non-empty.
    pub fn new(agent: Agent, description: impl Into<String>) -> Self {
        let name = agent.name().to_string();
        Self {
            name,
            description: description.into(),
            agent: Arc::new(agent),
        }
    }

    /// Creates a hand-off from an agent that carries its own
    /// `handoff_description`.
    pub fn from_agent(agent: Agent) -> Self {
        let description = agent
            .config
            .handoff_description
            .clone()
            .unwrap_or_default();
        Self::new(agent, description)
    }

    /// Creates a hand-off with a custom tool name.
    pub fn with_name(
        agent: Agent,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            agent: Arc::new(agent),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

impl std::fmt::Debug for Handoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handoff")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Adapter exposing a hand-off as a tool to the model provider.
///
/// The dispatch loop intercepts calls to this tool; `execute` only runs if
/// something routes a call here directly, and simply acknowledges.
#[derive(Clone, Debug)]
pub struct HandoffTool {
    handoff: Handoff,
}

impl From<Handoff> for HandoffTool {
    fn from(handoff: Handoff) -> Self {
        Self { handoff }
    }
}

#[async_trait]
impl Tool for HandoffTool {
    fn name(&self) -> &str {
        &self.handoff.name
    }

    fn description(&self) -> &str {
        &self.handoff.description
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "reason": {"type": "string", "description": "Reason for the hand-off"}
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, _ctx: &RunContext, _arguments: Value) -> Result<ToolResult> {
        Ok(ToolResult::success(
            serde_json::json!({"handoff": self.handoff.name, "ack": true}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_creation() {
        let agent = Agent::simple("Specialist", "I handle special cases");
        let handoff = Handoff::new(agent, "Handles complex queries");

        assert_eq!(handoff.name, "Specialist");
        assert_eq!(handoff.description, "Handles complex queries");
        assert_eq!(handoff.agent().name(), "Specialist");
    }

    #[test]
    fn test_handoff_from_agent_uses_declared_description() {
        let agent = Agent::simple("History Tutor", "You assist with historical queries.")
            .with_handoff_description("Specialist agent for historical questions");
        let handoff = Handoff::from_agent(agent);

        assert_eq!(handoff.name, "History Tutor");
        assert_eq!(
            handoff.description,
            "Specialist agent for historical questions"
        );
    }

    #[test]
    fn test_handoff_with_custom_name() {
        let agent = Agent::simple("Agent1", "Instructions");
        let handoff = Handoff::with_name(agent, "escalate", "Escalates hard cases");

        assert_eq!(handoff.name, "escalate");
        assert_eq!(handoff.description, "Escalates hard cases");
    }

    #[tokio::test]
    async fn test_handoff_tool_adapter() {
        let agent = Agent::simple("Helper", "Helps");
        let tool = HandoffTool::from(Handoff::new(agent, "Handles everything else"));

        assert_eq!(tool.name(), "Helper");
        let schema = tool.parameters_schema();
        assert!(schema["properties"].get("reason").is_some());

        let ctx = RunContext::new();
        let result = tool
            .execute(&ctx, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result.output["ack"], true);
    }

    #[test]
    fn test_handoff_debug_hides_agent() {
        let agent = Agent::simple("Debug", "Debug agent");
        let handoff = Handoff::new(agent, "Debug description");

        let debug_str = format!("{handoff:?}");
        assert!(debug_str.contains("Debug description"));
        assert!(!debug_str.contains("agent:"));
    }
}
