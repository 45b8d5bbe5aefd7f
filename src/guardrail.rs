//! # Guardrails (orientation)
//!
//! Input guardrails validate the raw user input before the primary agent
//! executes; output guardrails check the final answer before it is returned.
//! Each evaluation yields a [`GuardrailResult`] whose `tripwire_triggered`
//! flag aborts the turn with a distinguished error when set. The most
//! interesting implementation is [`ClassifierGuardrail`], which runs a
//! dedicated classification agent over the input (the same `Agent` and
//! `Runner` abstractions, used recursively) and applies a caller-supplied
//! domain predicate to its structured output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::agent::Agent;
use crate::context::RunContext;
use crate::error::{AgentsError, Result};
use crate::model::ModelProvider;
use crate::runner::{RunConfig, Runner};

/// The outcome of one guardrail evaluation.
///
/// `output_info` carries whatever the evaluator learned (for a classifier
/// guardrail, the classification agent's structured output) so callers can
/// inspect why an input was accepted or rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    /// Name of the guardrail that produced this result.
    pub guardrail: String,
    /// Structured payload describing the evaluation.
    pub output_info: Value,
    /// When true, the turn is aborted before the primary agent executes.
    pub tripwire_triggered: bool,
}

impl GuardrailResult {
    pub fn pass(guardrail: impl Into<String>, output_info: Value) -> Self {
        Self {
            guardrail: guardrail.into(),
            output_info,
            tripwire_triggered: false,
        }
    }

    pub fn tripwire(guardrail: impl Into<String>, output_info: Value) -> Self {
        Self {
            guardrail: guardrail.into(),
            output_info,
            tripwire_triggered: true,
        }
    }
}

/// Trait for input guardrails, evaluated before the primary agent executes.
#[async_trait]
pub trait InputGuardrail: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate the raw input in the context of the addressed agent.
    async fn evaluate(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        input: &str,
    ) -> Result<GuardrailResult>;
}

/// Trait for output guardrails, evaluated on the final answer text.
#[async_trait]
pub trait OutputGuardrail: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self, output: &str) -> Result<GuardrailResult>;
}

/// An input guardrail wrapping a plain evaluation function.
pub struct FnGuardrail<F> {
    name: String,
    function: F,
}

impl<F> FnGuardrail<F>
where
    F: Fn(&RunContext, &Agent, &str) -> Result<GuardrailResult> + Send + Sync,
{
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

#[async_trait]
impl<F> InputGuardrail for FnGuardrail<F>
where
    F: Fn(&RunContext, &Agent, &str) -> Result<GuardrailResult> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        ctx: &RunContext,
        agent: &Agent,
        input: &str,
    ) -> Result<GuardrailResult> {
        (self.function)(ctx, agent, input)
    }
}

/// An input guardrail backed by a classification agent.
///
/// The classification agent runs over the raw input (with its own output
/// schema); the domain predicate then decides membership. The tripwire fires
/// when the predicate returns false.
///
/// ```rust,no_run
/// use agent_relay::{Agent, guardrail::ClassifierGuardrail, schema::OutputSchema};
///
/// let classifier = Agent::simple(
///     "Guardrail check",
///     "Check if the user is asking about homework.",
/// )
/// .with_output_schema(OutputSchema::new(serde_json::json!({
///     "type": "object",
///     "properties": {
///         "is_homework": {"type": "boolean"},
///         "reasoning": {"type": "string"}
///     },
///     "required": ["is_homework"]
/// })));
///
/// let guardrail = ClassifierGuardrail::new("homework_check", classifier, |info| {
///     info["is_homework"].as_bool().unwrap_or(false)
/// });
/// ```
pub struct ClassifierGuardrail {
    name: String,
    agent: Agent,
    predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
    provider: Option<Arc<dyn ModelProvider>>,
}

impl ClassifierGuardrail {
    pub fn new<P>(name: impl Into<String>, agent: Agent, predicate: P) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            agent,
            predicate: Arc::new(predicate),
            provider: None,
        }
    }

    /// Use a specific model provider for the classification run instead of
    /// the default one.
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

#[async_trait]
impl InputGuardrail for ClassifierGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        ctx: &RunContext,
        _agent: &Agent,
        input: &str,
    ) -> Result<GuardrailResult> {
        let mut config = RunConfig::default().with_context(ctx.clone());
        if let Some(provider) = &self.provider {
            config = config.with_model_provider(provider.clone());
        }

        let result = Runner::run(self.agent.clone(), input, config).await?;
        let info = result.final_output;
        debug!(guardrail = %self.name, classification = %info, "classifier guardrail evaluated");

        if (self.predicate)(&info) {
            Ok(GuardrailResult::pass(&self.name, info))
        } else {
            Ok(GuardrailResult::tripwire(&self.name, info))
        }
    }
}

/// Executes guardrails in declaration order.
pub struct GuardrailRunner;

impl GuardrailRunner {
    /// Run all input guardrails; the first tripwire aborts with
    /// [`AgentsError::GuardrailTripwire`]. Passing results are returned for
    /// attachment to the run result.
    pub async fn check_input(
        guards: &[Arc<dyn InputGuardrail>],
        ctx: &RunContext,
        agent: &Agent,
        input: &str,
    ) -> Result<Vec<GuardrailResult>> {
        let mut results = Vec::with_capacity(guards.len());
        for guard in guards {
            let result = guard.evaluate(ctx, agent, input).await?;
            if result.tripwire_triggered {
                return Err(AgentsError::GuardrailTripwire { result });
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Run all output guardrails over the final answer text.
    pub async fn check_output(guards: &[Arc<dyn OutputGuardrail>], output: &str) -> Result<()> {
        for guard in guards {
            let result = guard.check(output).await?;
            if result.tripwire_triggered {
                return Err(AgentsError::OutputGuardrailTriggered {
                    message: result
                        .output_info
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| guard.name().to_string()),
                });
            }
        }
        Ok(())
    }
}

/// An [`InputGuardrail`] that rejects inputs longer than a maximum length.
#[derive(Debug, Clone)]
pub struct MaxLengthGuardrail {
    name: String,
    max_length: usize,
}

impl MaxLengthGuardrail {
    pub fn new(max_length: usize) -> Self {
        Self {
            name: format!("max_length_{max_length}"),
            max_length,
        }
    }
}

#[async_trait]
impl InputGuardrail for MaxLengthGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        _ctx: &RunContext,
        _agent: &Agent,
        input: &str,
    ) -> Result<GuardrailResult> {
        let info = serde_json::json!({
            "length": input.len(),
            "max_length": self.max_length,
        });
        if input.len() > self.max_length {
            Ok(GuardrailResult::tripwire(&self.name, info))
        } else {
            Ok(GuardrailResult::pass(&self.name, info))
        }
    }
}

/// Blocks content containing specific patterns, case-insensitively.
/// Usable both as an input and as an output guardrail.
#[derive(Debug, Clone)]
pub struct PatternBlockGuardrail {
    name: String,
    patterns: Vec<String>,
}

impl PatternBlockGuardrail {
    pub fn new(name: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            patterns,
        }
    }

    fn first_match(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .find(|p| lowered.contains(&p.to_lowercase()))
            .map(String::as_str)
    }
}

#[async_trait]
impl InputGuardrail for PatternBlockGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        _ctx: &RunContext,
        _agent: &Agent,
        input: &str,
    ) -> Result<GuardrailResult> {
        match self.first_match(input) {
            Some(pattern) => Ok(GuardrailResult::tripwire(
                &self.name,
                serde_json::json!({"blocked_pattern": pattern}),
            )),
            None => Ok(GuardrailResult::pass(&self.name, Value::Null)),
        }
    }
}

#[async_trait]
impl OutputGuardrail for PatternBlockGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, output: &str) -> Result<GuardrailResult> {
        match self.first_match(output) {
            Some(pattern) => Ok(GuardrailResult::tripwire(
                &self.name,
                serde_json::json!(format!("output contains blocked pattern: {pattern}")),
            )),
            None => Ok(GuardrailResult::pass(&self.name, Value::Null)),
        }
    }
}
