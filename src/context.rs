//! Caller-owned conversation state
//!
//! A [`RunContext`] is created by the caller before the first turn and handed
//! to every run over the same conversation. Tools read and mutate it; later
//! turns observe what earlier turns stored. Each method takes the internal
//! lock once, so a single mutation is atomic; the handle is cheap to clone
//! and every clone shares the same underlying state.
//!
//! One run at a time per context. Running two turns concurrently over the
//! same `RunContext` interleaves their mutations in arbitrary order.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

#[derive(Debug, Default)]
struct ContextState {
    preferences: BTreeMap<String, String>,
    history: Vec<String>,
    values: BTreeMap<String, Value>,
}

/// Shared handle to mutable conversation state.
///
/// ```rust
/// use agent_relay::context::RunContext;
///
/// let ctx = RunContext::new();
/// ctx.add_preference("temperature_unit", "F");
/// assert_eq!(ctx.preference("temperature_unit").as_deref(), Some("F"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    state: Arc<Mutex<ContextState>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a user preference under `key`, replacing any previous value.
    pub fn add_preference(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.preferences.insert(key.into(), value.into());
    }

    /// Returns the preference stored under `key`, if any.
    pub fn preference(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().preferences.get(key).cloned()
    }

    /// Snapshot of all stored preferences.
    pub fn preferences(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().preferences.clone()
    }

    /// Appends an entry to the interaction log.
    pub fn log_interaction(&self, entry: impl Into<String>) {
        self.state.lock().unwrap().history.push(entry.into());
    }

    /// Snapshot of the interaction log, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state.lock().unwrap().history.clone()
    }

    /// Stores an arbitrary JSON value under `key`.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.state.lock().unwrap().values.insert(key.into(), value);
    }

    /// Returns the JSON value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().values.get(key).cloned()
    }
}
