//! # Runner (orientation)
//!
//! The `Runner` coordinates an agent run: guardrails first, then the
//! model/tool loop with hand-off interception, then output-schema validation.
//! Every step is bounded, because the model's decisions are not guaranteed
//! to converge on their own: model invocations by `max_turns`, transfers by
//! `max_handoffs`, schema correction by a single retry, and repeated tool
//! failures by a small consecutive-failure allowance.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::context::RunContext;
use crate::error::{AgentsError, Result};
use crate::guardrail::GuardrailRunner;
use crate::handoff::HandoffTool;
use crate::items::{
    HandoffItem, Message, MessageItem, Role, RunItem, ToolCallItem, ToolOutputItem,
};
use crate::model::{ModelProvider, OpenAIProvider};
use crate::registry::ToolRegistry;
use crate::result::RunResult;
use crate::schema::OutputSchema;
use crate::tool::Tool;
use crate::usage::UsageStats;

/// Consecutive failures of one tool before the run is aborted.
const MAX_CONSECUTIVE_TOOL_FAILURES: usize = 3;

fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() > max {
        let mut out = s.chars().take(max).collect::<String>();
        out.push('…');
        out
    } else {
        s.to_string()
    }
}

fn format_messages_for_log(messages: &[Message]) -> String {
    let mut lines = Vec::new();
    for (idx, m) in messages.iter().enumerate() {
        match m.role {
            Role::User => {
                lines.push(format!(
                    "{:02} USER     | {}",
                    idx,
                    truncate_for_log(&m.content, 160)
                ));
            }
            Role::System => {
                lines.push(format!(
                    "{:02} SYSTEM   | {}",
                    idx,
                    truncate_for_log(&m.content, 160)
                ));
            }
            Role::Assistant => {
                if let Some(tool_calls) = &m.tool_calls {
                    let calls: Vec<String> = tool_calls
                        .iter()
                        .map(|tc| format!("id={}, name={}", tc.id, tc.name))
                        .collect();
                    lines.push(format!(
                        "{:02} ASSIST   | tool_calls=[{}] content=\"{}\"",
                        idx,
                        calls.join(", "),
                        truncate_for_log(&m.content, 120)
                    ));
                } else {
                    lines.push(format!(
                        "{:02} ASSIST   | {}",
                        idx,
                        truncate_for_log(&m.content, 160)
                    ));
                }
            }
            Role::Tool => {
                let tcid = m.tool_call_id.as_deref().unwrap_or("<missing tool_call_id>");
                lines.push(format!(
                    "{:02} TOOL     | tool_call_id={} payload={}",
                    idx,
                    tcid,
                    truncate_for_log(&m.content, 120)
                ));
            }
        }
    }
    lines.join("\n")
}

/// Configuration for an agent run.
///
/// ## Example
///
/// ```rust
/// use agent_relay::{context::RunContext, runner::RunConfig};
///
/// let ctx = RunContext::new();
/// let config = RunConfig::default()
///     .with_context(ctx)
///     .with_max_handoffs(2);
/// assert_eq!(config.max_handoffs, 2);
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Conversation state threaded through guardrails and tools. When
    /// absent, a fresh context is created for the run and discarded with it.
    pub context: Option<RunContext>,

    /// The model provider used for completions. Defaults to
    /// [`OpenAIProvider`] with the agent's configured model.
    pub model_provider: Option<Arc<dyn ModelProvider>>,

    /// Maximum model invocations before the run is stopped. Overrides the
    /// agent's own `max_turns` when set.
    pub max_turns: Option<usize>,

    /// Maximum hand-off transfers per run. The model's selection is not
    /// guaranteed acyclic, so this bound is load-bearing.
    pub max_handoffs: usize,

    /// Optional per-call deadline applied to every model and tool
    /// invocation.
    pub call_timeout: Option<Duration>,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("context", &self.context.is_some())
            .field("model_provider", &self.model_provider.is_some())
            .field("max_turns", &self.max_turns)
            .field("max_handoffs", &self.max_handoffs)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            context: None,
            model_provider: None,
            max_turns: None,
            max_handoffs: 5,
            call_timeout: None,
        }
    }
}

impl RunConfig {
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_model_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.model_provider = Some(provider);
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_max_handoffs(mut self, max_handoffs: usize) -> Self {
        self.max_handoffs = max_handoffs;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

/// The main runner for executing agents.
///
/// - **[`run`]** executes an agent asynchronously to completion.
/// - **[`run_sync`]** blocks the calling thread on a private runtime.
///
/// The runner is stateless; multiple runs may proceed concurrently as long
/// as they do not share a [`RunContext`].
///
/// ## Example
///
/// ```rust,no_run
/// use agent_relay::{Agent, Runner, runner::RunConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let agent = Agent::simple("Assistant", "You are a helpful assistant.");
/// let result = Runner::run(agent, "Hello!", RunConfig::default()).await?;
/// println!("{}", result.final_output);
/// # Ok(())
/// # }
/// ```
///
/// [`run`]: Self::run
/// [`run_sync`]: Self::run_sync
pub struct Runner;

impl Runner {
    /// Executes an agent asynchronously and returns the result.
    ///
    /// Steps, in order: input guardrails of the addressed agent (a tripwire
    /// aborts before any model or tool activity), then the model/tool loop
    /// (intercepting hand-off selections and feeding tool results back in
    /// request order), and finally output-schema validation with one
    /// formatting retry. Guardrails of a hand-off target are not
    /// re-evaluated after a transfer; the turn was already validated by the
    /// agent the caller addressed.
    pub async fn run(
        agent: Agent,
        input: impl Into<String>,
        config: RunConfig,
    ) -> Result<RunResult> {
        let input = input.into();
        info!(agent = %agent.name(), "starting agent run");

        let ctx = config.context.clone().unwrap_or_default();

        let guardrail_results = if agent.config.input_guardrails.is_empty() {
            Vec::new()
        } else {
            GuardrailRunner::check_input(&agent.config.input_guardrails, &ctx, &agent, &input)
                .await?
        };

        let mut result = Self::run_loop(agent, input, ctx, &config).await?;
        result.guardrail_results = guardrail_results;
        Ok(result)
    }

    /// Executes an agent synchronously, blocking until the result is
    /// available. Creates a private Tokio runtime; do not call from inside
    /// an async context.
    pub fn run_sync(
        agent: Agent,
        input: impl Into<String>,
        config: RunConfig,
    ) -> Result<RunResult> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(Self::run(agent, input, config))
    }

    async fn with_deadline<F, T>(timeout: Option<Duration>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match timeout {
            Some(deadline) => tokio::time::timeout(deadline, fut)
                .await
                .map_err(|_| AgentsError::DeadlineExceeded)?,
            None => fut.await,
        }
    }

    fn parse_structured(content: &str) -> std::result::Result<serde_json::Value, String> {
        let mut candidate = content.trim();
        // Models frequently wrap JSON answers in a fenced code block
        if let Some(rest) = candidate.strip_prefix("```") {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            candidate = rest.strip_suffix("```").unwrap_or(rest).trim();
        }
        serde_json::from_str(candidate)
            .map_err(|e| format!("final answer is not valid JSON: {e}"))
    }

    fn validate_structured(
        schema: &OutputSchema,
        content: &str,
    ) -> std::result::Result<serde_json::Value, String> {
        let value = Self::parse_structured(content)?;
        let violations = schema.violations(&value);
        if violations.is_empty() {
            Ok(value)
        } else {
            Err(format!("schema violations: {}", violations.join("; ")))
        }
    }

    /// The turn-by-turn core: model call, hand-off interception, sequential
    /// tool execution, final-answer validation.
    async fn run_loop(
        agent: Agent,
        input: String,
        ctx: RunContext,
        config: &RunConfig,
    ) -> Result<RunResult> {
        let mut active = agent;
        let mut messages = vec![active.build_system_message(), Message::user(input)];
        let mut items: Vec<RunItem> = Vec::new();
        let mut usage_stats = UsageStats::new();

        let max_turns = config
            .max_turns
            .unwrap_or(active.config.max_turns.unwrap_or(10));
        let mut turn_count = 0;
        let mut handoff_count = 0;
        let mut schema_retry_used = false;
        let mut failure_streaks: HashMap<String, usize> = HashMap::new();

        let model_provider = config
            .model_provider
            .clone()
            .unwrap_or_else(|| Arc::new(OpenAIProvider::new(&active.config.model)));

        loop {
            turn_count += 1;
            if turn_count > max_turns {
                return Err(AgentsError::MaxTurnsExceeded { max_turns });
            }

            debug!(turn = turn_count, agent = %active.name(), "starting turn");

            // Advertise both regular tools and hand-offs (as tools)
            let mut advertised: Vec<Arc<dyn Tool>> = active.tools().to_vec();
            for handoff in active.handoffs() {
                advertised.push(Arc::new(HandoffTool::from(handoff.clone())));
            }

            debug!(
                target: "runner::messages",
                "\n=== Sending to provider (model: {}) ===\n{}\n=== end ===",
                active.config.model,
                format_messages_for_log(&messages)
            );

            let (response, usage) = Self::with_deadline(
                config.call_timeout,
                model_provider.complete(
                    messages.clone(),
                    advertised,
                    active.config.temperature,
                    active.config.max_tokens,
                ),
            )
            .await?;

            usage_stats.record(&active.config.model, active.name(), usage);

            // Final answer: no tool calls requested
            if response.tool_calls.is_empty() {
                let content = match &response.content {
                    Some(content) if !content.is_empty() => content.clone(),
                    _ => {
                        return Err(AgentsError::ModelBehavior {
                            message: "model returned neither content nor tool calls".to_string(),
                        })
                    }
                };

                if !active.config.output_guardrails.is_empty() {
                    GuardrailRunner::check_output(&active.config.output_guardrails, &content)
                        .await?;
                }

                if let Some(schema) = active.config.output_schema.clone() {
                    match Self::validate_structured(&schema, &content) {
                        Ok(value) => {
                            items.push(RunItem::Message(MessageItem::assistant(&content)));
                            return Ok(RunResult {
                                final_output: value,
                                items,
                                final_agent: active.name().to_string(),
                                guardrail_results: Vec::new(),
                                usage: usage_stats,
                            });
                        }
                        Err(reason) if !schema_retry_used => {
                            // One bounded formatting retry
                            schema_retry_used = true;
                            warn!(agent = %active.name(), %reason, "output failed schema validation, retrying once");
                            messages.push(Message::assistant(&content));
                            items.push(RunItem::Message(MessageItem::assistant(&content)));
                            messages.push(Message::user(format!(
                                "The previous response did not conform to the required output schema ({reason}). \
                                 Respond again with only a JSON object that conforms to the schema."
                            )));
                            continue;
                        }
                        Err(reason) => {
                            return Err(AgentsError::OutputValidation { message: reason });
                        }
                    }
                }

                messages.push(Message::assistant(&content));
                items.push(RunItem::Message(MessageItem::assistant(&content)));
                return Ok(RunResult {
                    final_output: serde_json::Value::String(content),
                    items,
                    final_agent: active.name().to_string(),
                    guardrail_results: Vec::new(),
                    usage: usage_stats,
                });
            }

            // Record the assistant turn that requested tools
            let message_tool_calls: Vec<crate::items::ToolCall> = response.tool_calls.clone();
            messages.push(Message::assistant_with_tool_calls(
                response.content.clone().unwrap_or_default(),
                message_tool_calls,
            ));
            items.push(RunItem::Message(MessageItem {
                id: uuid::Uuid::new_v4().to_string(),
                role: Role::Assistant,
                content: response.content.clone().unwrap_or_default(),
                created_at: chrono::Utc::now(),
            }));

            // Hand-off short-circuit: if any requested call names a hand-off
            // target, the first one wins and starts a new turn under the
            // target agent; remaining calls from this turn are dropped.
            if let Some(handoff_call) = response
                .tool_calls
                .iter()
                .find(|tc| active.handoffs().iter().any(|h| h.name == tc.name))
            {
                handoff_count += 1;
                if handoff_count > config.max_handoffs {
                    return Err(AgentsError::HandoffDepthExceeded {
                        max_handoffs: config.max_handoffs,
                    });
                }

                let handoff = active
                    .handoffs()
                    .iter()
                    .find(|h| h.name == handoff_call.name)
                    .cloned()
                    .expect("hand-off matched above");

                info!(from = %active.name(), to = %handoff.name, "hand-off detected");

                items.push(RunItem::ToolCall(ToolCallItem {
                    id: handoff_call.id.clone(),
                    tool_name: handoff_call.name.clone(),
                    arguments: handoff_call.arguments.clone(),
                    created_at: chrono::Utc::now(),
                }));
                items.push(RunItem::Handoff(HandoffItem {
                    id: uuid::Uuid::new_v4().to_string(),
                    from_agent: active.name().to_string(),
                    to_agent: handoff.name.clone(),
                    reason: handoff_call
                        .arguments
                        .get("reason")
                        .and_then(|r| r.as_str())
                        .map(str::to_string),
                    created_at: chrono::Utc::now(),
                }));

                let ack = serde_json::json!({ "handoff": handoff.name, "ack": true });
                messages.push(Message::tool(ack.to_string(), &handoff_call.id));
                items.push(RunItem::ToolOutput(ToolOutputItem {
                    id: uuid::Uuid::new_v4().to_string(),
                    tool_call_id: handoff_call.id.clone(),
                    output: ack,
                    error: None,
                    created_at: chrono::Utc::now(),
                }));

                active = handoff.agent().clone();
                // The target takes over the same conversation; re-prime the
                // system message so its instructions and schema apply.
                messages[0] = active.build_system_message();
                continue;
            }

            // Execute tool calls sequentially, in the order the model
            // requested them, so context mutations stay deterministic.
            let registry = ToolRegistry::from_tools(active.tools());
            for tool_call in &response.tool_calls {
                items.push(RunItem::ToolCall(ToolCallItem {
                    id: tool_call.id.clone(),
                    tool_name: tool_call.name.clone(),
                    arguments: tool_call.arguments.clone(),
                    created_at: chrono::Utc::now(),
                }));

                let outcome = Self::with_deadline(
                    config.call_timeout,
                    registry.invoke(&ctx, &tool_call.name, tool_call.arguments.clone()),
                )
                .await;

                let failure: Option<String> = match outcome {
                    Ok(result) if !result.is_error() => {
                        failure_streaks.remove(&tool_call.name);
                        let content = serde_json::to_string(&result.output)
                            .unwrap_or_else(|_| "null".to_string());
                        messages.push(Message::tool(content, &tool_call.id));
                        items.push(RunItem::ToolOutput(ToolOutputItem {
                            id: uuid::Uuid::new_v4().to_string(),
                            tool_call_id: tool_call.id.clone(),
                            output: result.output,
                            error: None,
                            created_at: chrono::Utc::now(),
                        }));
                        None
                    }
                    Ok(result) => Some(result.error.unwrap_or_else(|| "tool failed".to_string())),
                    Err(AgentsError::ToolInvocation { message }) => Some(message),
                    Err(e) => return Err(e),
                };

                if let Some(error) = failure {
                    warn!(tool = %tool_call.name, %error, "tool call failed");
                    messages.push(Message::tool(format!("Error: {error}"), &tool_call.id));
                    items.push(RunItem::ToolOutput(ToolOutputItem {
                        id: uuid::Uuid::new_v4().to_string(),
                        tool_call_id: tool_call.id.clone(),
                        output: serde_json::Value::Null,
                        error: Some(error.clone()),
                        created_at: chrono::Utc::now(),
                    }));

                    let streak = failure_streaks.entry(tool_call.name.clone()).or_insert(0);
                    *streak += 1;
                    if *streak >= MAX_CONSECUTIVE_TOOL_FAILURES {
                        return Err(AgentsError::ToolInvocation {
                            message: format!(
                                "tool '{}' failed {} consecutive times: {error}",
                                tool_call.name, streak
                            ),
                        });
                    }
                }
            }

            debug!(
                target: "runner::messages",
                "\n↳ Appended tool replies\n{}\n---",
                format_messages_for_log(&messages)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedProvider;
    use crate::tool::FunctionTool;
    use serde_json::json;

    fn config_with(provider: ScriptedProvider) -> RunConfig {
        RunConfig::default().with_model_provider(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_simple_run() {
        let agent = Agent::simple("TestAgent", "You are a test agent");
        let provider = ScriptedProvider::new("test-model").with_message("Hello! How can I help?");

        let result = Runner::run(agent, "Hi", config_with(provider)).await.unwrap();

        assert_eq!(result.final_agent, "TestAgent");
        assert_eq!(result.final_text(), Some("Hello! How can I help?"));
        assert_eq!(result.usage.total.request_count, 1);
    }

    #[test]
    fn test_run_sync() {
        let agent = Agent::simple("SyncAgent", "Sync test agent");
        let provider = ScriptedProvider::new("test-model").with_message("Sync response");

        let result = Runner::run_sync(agent, "Test", config_with(provider)).unwrap();
        assert_eq!(result.final_output, json!("Sync response"));
    }

    #[tokio::test]
    async fn test_tool_call_loop() {
        let tool = Arc::new(FunctionTool::simple(
            "uppercase",
            "Converts to uppercase",
            |s: String| s.to_uppercase(),
        ));
        let agent = Agent::simple("ToolAgent", "Use tools when needed").with_tool(tool);

        let provider = ScriptedProvider::new("test-model")
            .with_tool_call("uppercase", json!({"input": "hello"}))
            .with_message("The result is: HELLO");

        let result = Runner::run(agent, "Make 'hello' uppercase", config_with(provider))
            .await
            .unwrap();

        assert_eq!(result.final_text(), Some("The result is: HELLO"));
        assert!(result
            .items
            .iter()
            .any(|item| matches!(item, RunItem::ToolCall(_))));
        assert!(result.items.iter().any(|item| match item {
            RunItem::ToolOutput(o) => o.output == json!("HELLO"),
            _ => false,
        }));
    }

    #[tokio::test]
    async fn test_max_turns_exceeded() {
        let tool = Arc::new(FunctionTool::simple("echo", "Echoes", |s: String| s));
        let agent = Agent::simple("LoopAgent", "Loops forever")
            .with_tool(tool)
            .with_max_turns(2);

        // The model keeps requesting tool calls and never produces an answer
        let provider = ScriptedProvider::new("test-model")
            .with_tool_call("echo", json!({"input": "a"}))
            .with_tool_call("echo", json!({"input": "b"}))
            .with_tool_call("echo", json!({"input": "c"}));

        let err = Runner::run(agent, "Go", config_with(provider))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentsError::MaxTurnsExceeded { max_turns: 2 }));
    }

    #[tokio::test]
    async fn test_unknown_tool_fed_back_to_model() {
        let agent = Agent::simple("NoTools", "You have no tools");

        let provider = ScriptedProvider::new("test-model")
            .with_tool_call("nonexistent", json!({}))
            .with_message("Sorry, I cannot do that.");

        let result = Runner::run(agent, "Try", config_with(provider)).await.unwrap();

        assert_eq!(result.final_text(), Some("Sorry, I cannot do that."));
        assert!(result.items.iter().any(|item| match item {
            RunItem::ToolOutput(o) => o.error.as_deref().is_some_and(|e| e.contains("nonexistent")),
            _ => false,
        }));
    }

    #[tokio::test]
    async fn test_repeated_tool_failure_aborts() {
        let tool = Arc::new(FunctionTool::new(
            "flaky",
            "Always fails",
            json!({"type": "object", "properties": {}, "additionalProperties": false}),
            |_| Err(AgentsError::Other("backend unreachable".to_string())),
        ));
        let agent = Agent::simple("FlakyAgent", "Keep trying").with_tool(tool);

        let provider = ScriptedProvider::new("test-model")
            .with_tool_call("flaky", json!({}))
            .with_tool_call("flaky", json!({}))
            .with_tool_call("flaky", json!({}))
            .with_message("never reached");

        let err = Runner::run(agent, "Go", config_with(provider))
            .await
            .unwrap_err();
        match err {
            AgentsError::ToolInvocation { message } => {
                assert!(message.contains("flaky"));
                assert!(message.contains("consecutive"));
            }
            other => panic!("expected ToolInvocation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handoff_depth_bound() {
        let pong = Agent::simple("Pong", "Hand off to Ping");
        let ping = Agent::simple("Ping", "Hand off to Pong")
            .with_handoff(crate::handoff::Handoff::new(pong, "The other one"));

        let provider = ScriptedProvider::new("test-model")
            .with_tool_call("Pong", json!({}))
            .with_message("done");

        let config = config_with(provider).with_max_handoffs(0);
        let err = Runner::run(ping, "Go", config).await.unwrap_err();
        assert!(matches!(
            err,
            AgentsError::HandoffDepthExceeded { max_handoffs: 0 }
        ));
    }

    #[test]
    fn test_parse_structured_plain_and_fenced() {
        let plain = Runner::parse_structured(r#"{"a": 1}"#).unwrap();
        assert_eq!(plain, json!({"a": 1}));

        let fenced = Runner::parse_structured("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(fenced, json!({"a": 1}));

        let bare_fence = Runner::parse_structured("```\n{\"a\": 1}\n```").unwrap();
        assert_eq!(bare_fence, json!({"a": 1}));

        assert!(Runner::parse_structured("not json").is_err());
    }

    #[tokio::test]
    async fn test_empty_response_is_model_behavior_error() {
        struct EmptyProvider;
        #[async_trait::async_trait]
        impl ModelProvider for EmptyProvider {
            async fn complete(
                &self,
                _messages: Vec<Message>,
                _tools: Vec<Arc<dyn Tool>>,
                _temperature: Option<f32>,
                _max_tokens: Option<u32>,
            ) -> Result<(crate::items::ModelResponse, crate::usage::Usage)> {
                let mut response = crate::items::ModelResponse::new_message("");
                response.content = None;
                Ok((response, crate::usage::Usage::empty()))
            }
            fn model_name(&self) -> &str {
                "empty"
            }
        }

        let agent = Agent::simple("Agent", "instructions");
        let config = RunConfig::default().with_model_provider(Arc::new(EmptyProvider));
        let err = Runner::run(agent, "Hi", config).await.unwrap_err();
        assert!(matches!(err, AgentsError::ModelBehavior { .. }));
    }
}
