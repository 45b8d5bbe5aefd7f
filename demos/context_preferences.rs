//! Threading mutable conversation state across turns.
//!
//! The first run stores a preference through a context-mutating tool; the
//! second run, over the same context, reads it back.
//!
//! Requires `OPENAI_API_KEY`.

use std::sync::Arc;

use agent_relay::{context::RunContext, runner::RunConfig, tool::FunctionTool, Agent, Runner};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let set_preference = Arc::new(FunctionTool::with_context(
        "set_preference",
        "Stores a user preference (e.g. temperature_unit=F) in the conversation context. \
         Mutates the context.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "preference_key": {"type": "string", "description": "Name of the setting"},
                "preference_value": {"type": "string", "description": "Value of the setting"}
            },
            "required": ["preference_key", "preference_value"],
            "additionalProperties": false
        }),
        |ctx, args| {
            let key = args["preference_key"].as_str().unwrap_or_default();
            let value = args["preference_value"].as_str().unwrap_or_default();
            ctx.add_preference(key, value);
            ctx.log_interaction(format!("preference {key} set to {value}"));
            Ok(serde_json::json!(format!("Preference {key} set to {value}.")))
        },
    ));

    let get_user_preferences = Arc::new(FunctionTool::with_context(
        "get_user_preferences",
        "Returns all stored user preferences.",
        serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        |ctx, _args| {
            let prefs = ctx.preferences();
            if prefs.is_empty() {
                Ok(serde_json::json!("No preferences stored yet."))
            } else {
                let line = prefs
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                Ok(serde_json::json!(format!("Current preferences: {line}")))
            }
        },
    ));

    let agent = Agent::simple(
        "ContextAwareAgent",
        "You remember user settings. Use set_preference to store settings and \
         get_user_preferences to retrieve them.",
    )
    .with_tools(vec![set_preference, get_user_preferences]);

    let ctx = RunContext::new();

    info!("first turn: storing a preference");
    let first = Runner::run(
        agent.clone(),
        "Please show temperatures in Fahrenheit from now on.",
        RunConfig::default().with_context(ctx.clone()),
    )
    .await?;
    println!("agent: {}", first.final_output);

    info!("second turn: reading preferences back");
    let second = Runner::run(
        agent,
        "What have I configured so far?",
        RunConfig::default().with_context(ctx.clone()),
    )
    .await?;
    println!("agent: {}", second.final_output);

    println!("context log: {:?}", ctx.history());
    Ok(())
}
