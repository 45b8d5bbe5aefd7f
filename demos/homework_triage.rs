//! Triage between tutor agents, gated by a homework classifier guardrail.
//!
//! A classification agent decides whether the input is a homework question;
//! off-topic inputs trip the guardrail before any tutor runs. On-topic
//! questions are routed by the triage agent to the math or history tutor,
//! each of which answers in a structured format.
//!
//! Requires `OPENAI_API_KEY`.

use std::sync::Arc;

use agent_relay::{
    guardrail::ClassifierGuardrail, runner::RunConfig, schema::OutputSchema, Agent, AgentsError,
    Handoff, Runner,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, JsonSchema)]
#[allow(dead_code)]
struct HomeworkAnswer {
    answer: String,
    answer_number_if_exists: Option<f64>,
    question_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let classifier = Agent::simple(
        "Guardrail check",
        "Check if the user is asking about homework.",
    )
    .with_output_schema(OutputSchema::new(serde_json::json!({
        "type": "object",
        "properties": {
            "is_homework": {"type": "boolean"},
            "homework_like_level_0_to_9": {"type": "integer", "minimum": 0, "maximum": 9},
            "reasoning": {"type": "string"}
        },
        "required": ["is_homework", "reasoning"]
    })));

    let homework_guardrail = Arc::new(ClassifierGuardrail::new(
        "homework_check",
        classifier,
        |info| info["is_homework"].as_bool().unwrap_or(false),
    ));

    let math_tutor = Agent::simple(
        "Math Tutor",
        "You provide help with math problems. Explain your reasoning at each step and include examples.",
    )
    .with_handoff_description("Specialist agent for math questions")
    .with_output_type::<HomeworkAnswer>();

    let history_tutor = Agent::simple(
        "History Tutor",
        "You provide assistance with historical queries. Explain important events and context clearly.",
    )
    .with_handoff_description("Specialist agent for historical questions")
    .with_output_type::<HomeworkAnswer>();

    let triage = Agent::simple(
        "Triage Agent",
        "You determine which agent to use based on the user's homework question.",
    )
    .with_handoffs(vec![
        Handoff::from_agent(history_tutor),
        Handoff::from_agent(math_tutor),
    ])
    .with_input_guardrail(homework_guardrail);

    let question = "who was the first president of the united states?";
    info!(%question, "running triage agent");

    match Runner::run(triage, question, RunConfig::default()).await {
        Ok(result) => {
            let answer: HomeworkAnswer = result.final_output_as()?;
            println!("answered by {}: {:#?}", result.final_agent, answer);
        }
        Err(AgentsError::GuardrailTripwire { result }) => {
            println!(
                "tripwire triggered, the input was not flagged as homework: {}",
                result.output_info
            );
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
