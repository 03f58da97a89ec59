use crate::model::Activity;

/// Verdict of the weather-compatibility oracle for one (activity, forecast)
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Incompatible,
}

/// Decides whether an activity can go ahead under a given forecast.
///
/// Consulted once per (activity, day) pair by the evaluation tool. Must be
/// pure and synchronous so evaluation stays deterministic and reentrant.
pub trait WeatherOracle: Send + Sync {
    fn is_compatible(&self, activity: &Activity, weather: &str) -> Compatibility;
}

/// Rule-based oracle over the activity's own suitability tags:
/// - the forecast appears in `weather_suitable`, or
/// - the activity is tagged `indoor`.
/// Everything else is incompatible.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuitabilityOracle;

impl WeatherOracle for SuitabilityOracle {
    fn is_compatible(&self, activity: &Activity, weather: &str) -> Compatibility {
        if activity.weather_suitable.iter().any(|w| w == weather) {
            return Compatibility::Compatible;
        }
        if activity.suitability.iter().any(|s| s == "indoor") {
            return Compatibility::Compatible;
        }
        Compatibility::Incompatible
    }
}
