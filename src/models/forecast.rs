use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a provider forecast, already reduced to the two metrics the
/// alert rules look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    /// Wind speed in the provider's configured unit (m/s for metric).
    pub windspeed: f64,
    /// Rain plus snow over the sample interval, in mm.
    pub precipitation: f64,
}

impl ForecastSample {
    pub fn new(timestamp: DateTime<Utc>, windspeed: f64, precipitation: f64) -> Self {
        Self {
            timestamp,
            windspeed: windspeed.max(0.0),
            precipitation: precipitation.max(0.0),
        }
    }
}
