use super::ForecastSource;
use crate::config::OpenWeatherMapConfig;
use crate::error::{Result, WeatherWatchError};
use crate::models::ForecastSample;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
    base_url: String,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    #[serde(default)]
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    #[serde(default)]
    wind: Option<OwmWind>,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    snow: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: API_BASE_URL.to_string(),
        })
    }

    fn forecast_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/forecast?lat={}&lon={}&appid={}&units={}&cnt={}",
            self.base_url,
            latitude,
            longitude,
            self.config.api_key,
            self.config.units.as_str(),
            self.config.forecast_count
        )
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!(
            "{}/weather?lat=0&lon=0&appid={}&units={}",
            self.base_url,
            self.config.api_key,
            self.config.units.as_str()
        );

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                WeatherWatchError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        Ok(response.status().is_success())
    }
}

#[async_trait::async_trait]
impl ForecastSource for OpenWeatherMapClient {
    /// Fetch the 3-hour forecast for a coordinate.
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<Vec<ForecastSample>> {
        let url = self.forecast_url(latitude, longitude);

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                WeatherWatchError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherWatchError::DataSourceUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmForecastResponse = response.json().await.map_err(|e| {
            WeatherWatchError::DataSourceUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })?;

        let samples = convert_response(owm_response);
        tracing::debug!(
            lat = latitude,
            lon = longitude,
            samples = samples.len(),
            "Forecast fetched"
        );
        Ok(samples)
    }

    fn name(&self) -> &str {
        "openweathermap"
    }
}

fn convert_response(response: OwmForecastResponse) -> Vec<ForecastSample> {
    let mut samples: Vec<ForecastSample> = response
        .list
        .iter()
        .filter_map(convert_forecast_item)
        .collect();
    samples.sort_by_key(|s| s.timestamp);
    samples
}

fn convert_forecast_item(item: &OwmForecastItem) -> Option<ForecastSample> {
    let timestamp = DateTime::from_timestamp(item.dt, 0)?;

    // Combine rain and snow precipitation
    let rain_mm = item.rain.as_ref().map(|r| r.three_hour).unwrap_or(0.0);
    let snow_mm = item.snow.as_ref().map(|s| s.three_hour).unwrap_or(0.0);
    let windspeed = item.wind.as_ref().map(|w| w.speed).unwrap_or(0.0);

    Some(ForecastSample::new(timestamp, windspeed, rain_mm + snow_mm))
}
