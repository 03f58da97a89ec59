use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use super::calc::{self, CalcError};
use super::wire::{ActionWire, ToolCall};
use crate::model::{
    ActivitiesByDate, Activity, EvaluationIssue, EvaluationResult, PayloadError, TravelPlan,
    WeatherByDate,
};
use crate::weather::{Compatibility, WeatherOracle};

/// Acknowledgement returned by the finalize marker tool.
pub const FINAL_ACK: &str = "FINAL_OK";

/// Result of `lookup_activities`: the activities known for a date, or an
/// empty list if the date is absent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LookupResult {
    pub date: NaiveDate,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CalcResult {
    pub expression: String,
    pub result: f64,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidArguments(#[from] super::wire::InvalidArguments),
    #[error("itinerary {0}")]
    BadItinerary(#[from] PayloadError),
    #[error("expression: {0}")]
    Computation(#[from] CalcError),
}

/// The fixed tool registry plus its read-only inputs.
///
/// Holds the activities database, the weather table, and the injected
/// compatibility oracle; every tool is a pure synchronous function over
/// those, so a `Toolset` can be shared by reference across concurrent runs.
pub struct Toolset {
    activities: ActivitiesByDate,
    weather: WeatherByDate,
    oracle: Box<dyn WeatherOracle>,
}

impl Toolset {
    pub fn new(
        activities: ActivitiesByDate,
        weather: WeatherByDate,
        oracle: Box<dyn WeatherOracle>,
    ) -> Self {
        Self {
            activities,
            weather,
            oracle,
        }
    }

    pub fn weather(&self) -> &WeatherByDate {
        &self.weather
    }

    pub fn activities(&self) -> &ActivitiesByDate {
        &self.activities
    }

    /// Never fails: unknown dates return an empty list.
    pub fn lookup_activities(&self, date: NaiveDate) -> LookupResult {
        LookupResult {
            date,
            activities: self.activities.get(&date).cloned().unwrap_or_default(),
        }
    }

    /// Flags days with fewer than 2 activities, and weather-incompatible
    /// activities on days with a known forecast. Days absent from the
    /// weather table skip the compatibility check entirely.
    pub fn evaluate_itinerary(&self, payload: &Value) -> Result<EvaluationResult, ToolError> {
        let plan = TravelPlan::from_payload(payload)?;
        let mut issues = Vec::new();

        for day in &plan.days {
            if day.activities.len() < 2 {
                issues.push(EvaluationIssue {
                    date: day.date,
                    activity: None,
                    issue: "fewer than 2 activities".to_string(),
                });
            }

            let Some(forecast) = self.weather.get(&day.date) else {
                continue;
            };
            for act in &day.activities {
                if self.oracle.is_compatible(act, forecast) == Compatibility::Incompatible {
                    issues.push(EvaluationIssue {
                        date: day.date,
                        activity: Some(act.name.clone()),
                        issue: format!("incompatible with {forecast}"),
                    });
                }
            }
        }

        Ok(EvaluationResult::from_issues(issues))
    }

    pub fn evaluate_expression(&self, expression: &str) -> Result<CalcResult, ToolError> {
        let result = calc::evaluate(expression)?;
        Ok(CalcResult {
            expression: expression.to_string(),
            result,
        })
    }

    /// Executes a wire action and always yields exactly one observation.
    ///
    /// Unknown tools and tool-internal failures become `{"error": ...}`
    /// observations rather than propagating; a single bad call must never
    /// take down the loop.
    pub fn dispatch(&self, action: &ActionWire) -> Value {
        let call = match ToolCall::try_from(action.clone()) {
            Ok(call) => call,
            Err(err) => return error_observation(&format!("Tool execution error: {err}")),
        };

        match call {
            ToolCall::LookupActivities(args) => to_observation(&self.lookup_activities(args.date)),
            ToolCall::EvaluateItinerary(args) => match self.evaluate_itinerary(&args.itinerary) {
                Ok(result) => to_observation(&result),
                Err(err) => error_observation(&format!("Tool execution error: {err}")),
            },
            ToolCall::EvaluateExpression(args) => {
                match self.evaluate_expression(&args.expression) {
                    Ok(result) => to_observation(&result),
                    Err(err) => error_observation(&format!("Tool execution error: {err}")),
                }
            }
            ToolCall::Finalize(_) => Value::String(FINAL_ACK.to_string()),
            ToolCall::Unrecognized { name, .. } => {
                error_observation(&format!("Unknown tool: {name}"))
            }
        }
    }
}

fn to_observation<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| error_observation(&format!("encode: {e}")))
}

fn error_observation(message: &str) -> Value {
    json!({ "error": message })
}
