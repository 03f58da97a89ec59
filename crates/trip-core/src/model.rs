use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Activities available on a given date, keyed by calendar day.
pub type ActivitiesByDate = BTreeMap<NaiveDate, Vec<Activity>>;

/// Forecast condition per calendar day, e.g. "sunny" or "heavy-rain".
pub type WeatherByDate = BTreeMap<NaiveDate, String>;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Traveler {
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
}

/// Trip parameters the planner works from. Opaque to the revision loop
/// itself; only the planner prompt reads it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct VacationInfo {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interests: Vec<String>,
    pub budget_usd: f64,
    pub travelers: Vec<Traveler>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub duration_hours: f64,
    pub cost_usd: f64,
    #[serde(default)]
    pub suitability: Vec<String>,
    #[serde(default)]
    pub weather_suitable: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub summary: String,
    /// The "at least 2 activities" target is checked by the evaluation
    /// tool, not here: a thin day must parse so it can be reported.
    #[serde(default)]
    pub activities: Vec<Activity>,
    pub estimated_cost_usd: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TravelPlan {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost_usd: f64,
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("start_date {start} is after end_date {end}")]
    DateRangeInverted { start: NaiveDate, end: NaiveDate },
    #[error("day {date} lies outside the trip range {start}..={end}")]
    DayOutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid TravelPlan JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] PlanError),
}

impl TravelPlan {
    /// Structural invariants that the finalize path enforces.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.start_date > self.end_date {
            return Err(PlanError::DateRangeInverted {
                start: self.start_date,
                end: self.end_date,
            });
        }
        for day in &self.days {
            if day.date < self.start_date || day.date > self.end_date {
                return Err(PlanError::DayOutOfRange {
                    date: day.date,
                    start: self.start_date,
                    end: self.end_date,
                });
            }
        }
        Ok(())
    }

    /// Decodes a plan from an action argument. Agents sometimes pass the
    /// plan as a JSON string rather than an inline object; both are accepted.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, PayloadError> {
        let plan: TravelPlan = match payload {
            serde_json::Value::String(s) => serde_json::from_str(s)?,
            other => serde_json::from_value(other.clone())?,
        };
        Ok(plan)
    }

    /// `from_payload` plus `validate` in one step.
    pub fn from_validated_payload(payload: &serde_json::Value) -> Result<Self, PayloadError> {
        let plan = Self::from_payload(payload)?;
        plan.validate()?;
        Ok(plan)
    }
}

/// Issue flagged by the evaluation tool for one day (and optionally one
/// activity on that day).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluationIssue {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
    pub issue: String,
}

/// Wire format: `{"passed": bool, "issues": [...], "summary": "..."}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EvaluationResult {
    pub passed: bool,
    #[serde(default)]
    pub issues: Vec<EvaluationIssue>,
    pub summary: String,
}

impl EvaluationResult {
    pub fn from_issues(issues: Vec<EvaluationIssue>) -> Self {
        Self {
            passed: issues.is_empty(),
            summary: format!("{} issue(s)", issues.len()),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn plan_with_days(start: &str, end: &str, days: &[&str]) -> TravelPlan {
        TravelPlan {
            destination: "AgentsVille".to_string(),
            start_date: date(start),
            end_date: date(end),
            total_cost_usd: 0.0,
            days: days
                .iter()
                .map(|d| DayPlan {
                    date: date(d),
                    summary: "day".to_string(),
                    activities: vec![],
                    estimated_cost_usd: 0.0,
                })
                .collect(),
            notes: None,
        }
    }

    #[test]
    fn validate_accepts_days_inside_range() {
        let plan = plan_with_days("2025-07-15", "2025-07-18", &["2025-07-15", "2025-07-18"]);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let plan = plan_with_days("2025-07-18", "2025-07-15", &[]);
        assert!(matches!(
            plan.validate(),
            Err(PlanError::DateRangeInverted { .. })
        ));
    }

    #[test]
    fn validate_rejects_day_outside_range() {
        let plan = plan_with_days("2025-07-15", "2025-07-16", &["2025-07-17"]);
        assert!(matches!(
            plan.validate(),
            Err(PlanError::DayOutOfRange { .. })
        ));
    }

    #[test]
    fn from_payload_accepts_embedded_json_string() {
        let plan = plan_with_days("2025-07-15", "2025-07-15", &["2025-07-15"]);
        let embedded = serde_json::Value::String(serde_json::to_string(&plan).unwrap());
        let decoded = TravelPlan::from_payload(&embedded).unwrap();
        assert_eq!(decoded, plan);
    }

    #[test]
    fn from_payload_rejects_garbage() {
        let err = TravelPlan::from_payload(&serde_json::json!({"days": 3}));
        assert!(err.is_err());
    }

    #[test]
    fn evaluation_result_summary_counts_issues() {
        let res = EvaluationResult::from_issues(vec![EvaluationIssue {
            date: date("2025-07-15"),
            activity: None,
            issue: "fewer than 2 activities".to_string(),
        }]);
        assert!(!res.passed);
        assert_eq!(res.summary, "1 issue(s)");
    }
}
