pub mod openweathermap;

pub use openweathermap::OpenWeatherMapClient;

use crate::error::Result;
use crate::models::ForecastSample;

/// Anything that can produce a chronological forecast for a coordinate.
#[async_trait::async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Vec<ForecastSample>>;

    fn name(&self) -> &str;
}
