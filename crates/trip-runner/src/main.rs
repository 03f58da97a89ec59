use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Context;
use serde::de::DeserializeOwned;

use trip_core::agent::conversation::ChatMessage;
use trip_core::agent::harness::{LlmClient, ReviseConfig, revise_itinerary};
use trip_core::agent::tools::Toolset;
use trip_core::llm::{ChatConfig, query_chat_completion};
use trip_core::model::{ActivitiesByDate, VacationInfo, WeatherByDate};
use trip_core::planner::produce_initial;
use trip_core::weather::SuitabilityOracle;

struct RunnerLlm {
    cfg: ChatConfig,
}

impl LlmClient for RunnerLlm {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move { query_chat_completion(messages, &self.cfg).await })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let endpoint = env_or(
        "TRIP_LLM_ENDPOINT",
        "https://api.openai.com/v1/chat/completions",
    );
    let model = env_or("TRIP_LLM_MODEL", "gpt-4.1-mini");
    let api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());
    let data_dir = PathBuf::from(env_or("TRIP_DATA_DIR", "data"));
    let max_rounds: usize = std::env::var("TRIP_MAX_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15);

    let vacation: VacationInfo = load_json(&data_dir.join("vacation.json"))?;
    let activities: ActivitiesByDate = load_json(&data_dir.join("activities.json"))?;
    let weather: WeatherByDate = load_json(&data_dir.join("weather.json"))?;

    let llm = RunnerLlm {
        cfg: ChatConfig {
            endpoint,
            model,
            api_key,
            temperature: 0.2,
        },
    };

    let initial = produce_initial(&llm, &vacation, &activities, &weather).await?;
    tracing::info!(
        total_cost = initial.total_cost_usd,
        days = initial.days.len(),
        "initial plan ready, starting revision"
    );

    let tools = Toolset::new(activities, weather, Box::new(SuitabilityOracle));
    let cfg = ReviseConfig {
        max_rounds,
        ..ReviseConfig::default()
    };
    let plan = revise_itinerary(&llm, &tools, &initial, &cfg).await?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
