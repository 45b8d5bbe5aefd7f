//! Structured output: the agent answers in a schema-validated format derived
//! from a Rust type.
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
    location: String,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherResponse {
    location: String,
    temperature: f64,
    unit: String,
    condition: String,
    recommendation: String,
}

fn get_weather(args: WeatherArgs) -> agent_relay::Result<serde_json::Value> {
    let (temp_c, condition) = match args.location.as_str() {
        "Tokyo" => (22.0, "sunny"),
        "Osaka" => (24.0, "cloudy"),
        "Sapporo" => (15.0, "hail"),
        "Fukuoka" => (26.0, "clear"),
        _ => (20.0, "unknown"),
    };
    let unit = args.unit.as_deref().unwrap_or("C").to_uppercase();
    let temp = if unit == "F" {
        temp_c * 9.0 / 5.0 + 32.0
    } else {
        temp_c
    };
    Ok(serde_json::json!({
        "location": args.location,
        "temperature": temp,
        "unit": unit,
        "condition": condition,
    }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let weather_tool = Arc::new(FunctionTool::typed(
        "get_weather",
        "Gets the current weather for a location.",
        get_weather,
    ));

    let agent = Agent::simple(
        "StructuredWeatherAgent",
        "You provide structured weather information. Use the get_weather tool to fetch data \
         and answer in the required format, adding a short recommendation.",
    )
    .with_tool(weather_tool)
    .with_output_type::<WeatherResponse>();

    info!("asking for structured weather in Sapporo");
    let result = Runner::run_sync(agent, "What's the weather in Sapporo?", RunConfig::default())?;

    let weather: WeatherResponse = result.final_output_as()?;
    println!("location:       {}", weather.location);
    println!("temperature:    {}°{}", weather.temperature, weather.unit);
    println!("condition:      {}", weather.condition);
    println!("recommendation: {}", weather.recommendation);
    Ok(())
}
