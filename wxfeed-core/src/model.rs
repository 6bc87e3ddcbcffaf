use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Measurement system requested from the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Single-character code sent as the `u` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Units::Metric => "c",
            Units::Imperial => "f",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for one location, as reported by a single feed document.
///
/// Temperature and wind speed keep the feed's literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    pub observed_at: DateTime<FixedOffset>,
    pub temperature: String,
    pub temperature_unit: String,
    pub wind_speed: String,
    pub wind_speed_unit: String,
    pub description: String,
}

impl WeatherRecord {
    /// Replace the feed's observation time, e.g. with the current wall-clock time.
    pub fn with_observed_at(self, observed_at: DateTime<FixedOffset>) -> Self {
        Self {
            observed_at,
            ..self
        }
    }
}
