//! Error types for the dispatch loop

use thiserror::Error;

use crate::guardrail::GuardrailResult;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, AgentsError>;

/// Main error type for agent runs
#[derive(Debug, Error)]
pub enum AgentsError {
    /// An input guardrail classified the input as out-of-policy. Carries the
    /// full guardrail result so callers can inspect the classification.
    #[error("guardrail '{}' tripped", .result.guardrail)]
    GuardrailTripwire { result: GuardrailResult },

    /// Output guardrail rejected the final answer
    #[error("output guardrail triggered: {message}")]
    OutputGuardrailTriggered { message: String },

    /// Unknown tool, schema-invalid arguments, or a tool that kept failing
    #[error("tool invocation error: {message}")]
    ToolInvocation { message: String },

    /// The final answer never conformed to the agent's output schema,
    /// even after the formatting retry
    #[error("output validation error: {message}")]
    OutputValidation { message: String },

    /// Maximum model invocations exceeded
    #[error("maximum turns exceeded: {max_turns}")]
    MaxTurnsExceeded { max_turns: usize },

    /// Maximum hand-off transfers exceeded
    #[error("maximum hand-offs exceeded: {max_handoffs}")]
    HandoffDepthExceeded { max_handoffs: usize },

    /// A model or tool call outlived the configured per-call deadline
    #[error("call deadline exceeded")]
    DeadlineExceeded,

    /// Model returned something the loop cannot act on
    #[error("model behavior error: {message}")]
    ModelBehavior { message: String },

    /// Error from the OpenAI API
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
