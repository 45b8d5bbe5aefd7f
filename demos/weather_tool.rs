//! A weather agent with a single typed tool, run on the blocking entry point.
//!
//! Requires `OPENAI_API_KEY`.

use std::sync::Arc;

use agent_relay::{runner::RunConfig, tool::FunctionTool, Agent, Runner};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherArgs {
    /// City name
    location: String,
    /// Temperature unit, "C" or "F"
    #[serde(default)]
    unit: Option<String>,
}

fn get_weather(args: WeatherArgs) -> agent_relay::Result<serde_json::Value> {
    // Mock data standing in for a real weather API
    let (temp_c, condition) = match args.location.as_str() {
        "Tokyo" => (22.0, "sunny"),
        "Osaka" => (24.0, "cloudy"),
        "Sapporo" => (15.0, "rainy"),
        "Fukuoka" => (26.0, "clear"),
        _ => (20.0, "unknown"),
    };

    let unit = args.unit.as_deref().unwrap_or("C").to_uppercase();
    let temp = if unit == "F" {
        temp_c * 9.0 / 5.0 + 32.0
    } else {
        temp_c
    };

    Ok(serde_json::json!(format!(
        "The weather in {} is {condition} with a temperature of {temp}°{unit}.",
        args.location
    )))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let weather_tool = Arc::new(FunctionTool::typed(
        "get_weather",
        "Gets the current weather for a location. Accepts an optional unit, 'C' or 'F'.",
        get_weather,
    ));

    let agent = Agent::simple(
        "WeatherAssistant",
        "You provide weather information. Use the get_weather tool for weather questions, \
         and check whether the user specified a temperature unit (C or F).",
    )
    .with_tool(weather_tool);

    info!("asking the weather agent about Tokyo");
    let result = Runner::run_sync(
        agent,
        "What's the weather in Tokyo? In Fahrenheit, please.",
        RunConfig::default(),
    )?;

    println!("agent answer: {}", result.final_output);
    println!("usage: {}", result.usage.summary());
    Ok(())
}
