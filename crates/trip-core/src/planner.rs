//! One-shot itinerary producer: seeds the revision loop with an initial
//! plan. Out of the loop's scope otherwise.

use anyhow::Context;

use crate::agent::conversation::ChatMessage;
use crate::agent::harness::LlmClient;
use crate::model::{ActivitiesByDate, TravelPlan, VacationInfo, WeatherByDate};
use crate::prompts::ITINERARY_SYSTEM_PROMPT;

pub fn build_planner_prompt(
    vacation: &VacationInfo,
    activities: &ActivitiesByDate,
    weather: &WeatherByDate,
) -> String {
    let vacation_json =
        serde_json::to_string_pretty(vacation).unwrap_or_else(|_| "{}".to_string());
    let activities_json =
        serde_json::to_string_pretty(activities).unwrap_or_else(|_| "{}".to_string());
    let weather_json = serde_json::to_string_pretty(weather).unwrap_or_else(|_| "{}".to_string());

    format!(
        "VacationInfo:\n{vacation_json}\n\nActivities:\n{activities_json}\n\nWeather:\n{weather_json}"
    )
}

/// Models often wrap JSON in a markdown fence even when told not to.
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Asks the text generator for an initial plan and validates it.
pub async fn produce_initial(
    llm: &dyn LlmClient,
    vacation: &VacationInfo,
    activities: &ActivitiesByDate,
    weather: &WeatherByDate,
) -> anyhow::Result<TravelPlan> {
    let messages = vec![
        ChatMessage::system(ITINERARY_SYSTEM_PROMPT),
        ChatMessage::user(build_planner_prompt(vacation, activities, weather)),
    ];

    let raw = llm.complete(&messages).await?;
    let body = strip_code_fence(&raw);
    let plan: TravelPlan = serde_json::from_str(body)
        .with_context(|| format!("planner output is not valid TravelPlan JSON: {body}"))?;
    plan.validate().context("planner output failed validation")?;

    tracing::info!(
        destination = %plan.destination,
        days = plan.days.len(),
        "initial itinerary produced"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::model::{DayPlan, Traveler};

    #[derive(Default)]
    struct FakeLlm {
        responses: Mutex<VecDeque<String>>,
    }

    impl LlmClient for FakeLlm {
        fn complete<'a>(
            &'a self,
            _messages: &'a [ChatMessage],
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move {
                self.responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| anyhow::anyhow!("no llm response queued"))
            })
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn vacation() -> VacationInfo {
        VacationInfo {
            destination: "AgentsVille".to_string(),
            start_date: date("2025-07-15"),
            end_date: date("2025-07-16"),
            interests: vec!["food".to_string()],
            budget_usd: 1000.0,
            travelers: vec![Traveler {
                name: "Alice".to_string(),
                age: Some(30),
            }],
        }
    }

    fn plan() -> TravelPlan {
        TravelPlan {
            destination: "AgentsVille".to_string(),
            start_date: date("2025-07-15"),
            end_date: date("2025-07-16"),
            total_cost_usd: 100.0,
            days: vec![DayPlan {
                date: date("2025-07-15"),
                summary: "arrival".to_string(),
                activities: vec![],
                estimated_cost_usd: 100.0,
            }],
            notes: None,
        }
    }

    #[tokio::test]
    async fn decodes_a_plain_json_reply() {
        let llm = FakeLlm::default();
        let expected = plan();
        llm.responses
            .lock()
            .unwrap()
            .push_back(serde_json::to_string(&expected).unwrap());

        let got = produce_initial(
            &llm,
            &vacation(),
            &ActivitiesByDate::new(),
            &WeatherByDate::new(),
        )
        .await
        .unwrap();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn tolerates_a_markdown_fence() {
        let llm = FakeLlm::default();
        let expected = plan();
        llm.responses.lock().unwrap().push_back(format!(
            "```json\n{}\n```",
            serde_json::to_string(&expected).unwrap()
        ));

        let got = produce_initial(
            &llm,
            &vacation(),
            &ActivitiesByDate::new(),
            &WeatherByDate::new(),
        )
        .await
        .unwrap();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn rejects_non_plan_output() {
        let llm = FakeLlm::default();
        llm.responses
            .lock()
            .unwrap()
            .push_back("here is your trip!".to_string());

        let err = produce_initial(
            &llm,
            &vacation(),
            &ActivitiesByDate::new(),
            &WeatherByDate::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not valid TravelPlan JSON"));
    }

    #[tokio::test]
    async fn rejects_a_plan_violating_date_invariants() {
        let llm = FakeLlm::default();
        let mut bad = plan();
        bad.days[0].date = date("2025-08-01");
        llm.responses
            .lock()
            .unwrap()
            .push_back(serde_json::to_string(&bad).unwrap());

        let err = produce_initial(
            &llm,
            &vacation(),
            &ActivitiesByDate::new(),
            &WeatherByDate::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed validation"));
    }

    #[test]
    fn strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
