//! Token usage tracking
//!
//! [`Usage`] records the token counts of a single model call; [`UsageStats`]
//! aggregates them across a run, broken down by model and by agent.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Add;

/// Token usage for a single model call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
    /// Number of API requests made, typically 1 for a single `Usage`.
    pub request_count: usize,
}

impl Usage {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            request_count: 1,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add_usage(&mut self, other: &Usage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.request_count += other.request_count;
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(mut self, other: Usage) -> Usage {
        self.add_usage(&other);
        self
    }
}

/// Usage aggregated over an entire run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub total: Usage,
    pub by_model: HashMap<String, Usage>,
    pub by_agent: HashMap<String, Usage>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one model call's usage against a model name and agent name.
    pub fn record(&mut self, model: &str, agent: &str, usage: Usage) {
        self.total.add_usage(&usage);
        self.by_model
            .entry(model.to_string())
            .or_default()
            .add_usage(&usage);
        self.by_agent
            .entry(agent.to_string())
            .or_default()
            .add_usage(&usage);
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} requests, {} tokens ({} prompt + {} completion)",
            self.total.request_count,
            self.total.total_tokens,
            self.total.prompt_tokens,
            self.total.completion_tokens
        )
    }
}
