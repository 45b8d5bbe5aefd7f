//! Result types for agent runs

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::guardrail::GuardrailResult;
use crate::items::RunItem;
use crate::usage::UsageStats;

/// The result of running an agent to completion.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// The final output: a schema-validated JSON value when the resolved
    /// agent declares an output schema, otherwise the raw answer text as a
    /// JSON string.
    pub final_output: Value,
    /// Trace of intermediate messages, tool calls, tool outputs, and
    /// hand-offs, in execution order.
    pub items: Vec<RunItem>,
    /// Name of the agent that produced the final output (the hand-off
    /// target, if a transfer happened).
    pub final_agent: String,
    /// Results of the input guardrails that passed before execution.
    pub guardrail_results: Vec<GuardrailResult>,
    /// Token usage aggregated over the run.
    pub usage: UsageStats,
}

impl RunResult {
    /// Deserialize a structured final output into `T`.
    pub fn final_output_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.final_output.clone())?)
    }

    /// The final output as text, when it is a plain string.
    pub fn final_text(&self) -> Option<&str> {
        self.final_output.as_str()
    }

    /// Hand-offs that occurred during the run, as `(from, to)` pairs.
    pub fn handoff_chain(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .filter_map(|item| match item {
                RunItem::Handoff(h) => Some((h.from_agent.as_str(), h.to_agent.as_str())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        answer: String,
        confidence: f64,
    }

    fn result_with(final_output: Value) -> RunResult {
        RunResult {
            final_output,
            items: vec![],
            final_agent: "Test".to_string(),
            guardrail_results: vec![],
            usage: UsageStats::new(),
        }
    }

    #[test]
    fn test_final_output_as() {
        let result = result_with(serde_json::json!({"answer": "42", "confidence": 0.9}));
        let answer: Answer = result.final_output_as().unwrap();
        assert_eq!(
            answer,
            Answer {
                answer: "42".to_string(),
                confidence: 0.9
            }
        );
    }

    #[test]
    fn test_final_output_as_type_mismatch() {
        let result = result_with(serde_json::json!("plain text"));
        assert!(result.final_output_as::<Answer>().is_err());
    }

    #[test]
    fn test_final_text() {
        let result = result_with(serde_json::json!("plain text"));
        assert_eq!(result.final_text(), Some("plain text"));

        let structured = result_with(serde_json::json!({"k": "v"}));
        assert!(structured.final_text().is_none());
    }
}
