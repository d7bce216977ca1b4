//! Weather provider seam and the OpenWeatherMap client behind it.

use crate::types::{Coordinates, FetchError, QueryOrigin, WeatherReading};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Source of current weather, consumed by the state machine.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_by_name(&self, city: &str) -> Result<WeatherReading, FetchError>;

    async fn get_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherReading, FetchError>;
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainMetrics,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MainMetrics {
    temp: f64,
    humidity: i32,
    pressure: i32,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

impl From<CurrentWeatherResponse> for WeatherReading {
    fn from(resp: CurrentWeatherResponse) -> Self {
        let (description, icon_code) = resp
            .weather
            .into_iter()
            .next()
            .map(|c| (c.description, c.icon))
            .unwrap_or_default();

        Self {
            place_name: resp.name,
            temperature_c: resp.main.temp,
            humidity_pct: resp.main.humidity,
            pressure_hpa: resp.main.pressure,
            description,
            icon_code,
        }
    }
}

/// URL of the provider's image for an icon code (e.g. `"01d"`).
pub fn icon_url(icon_code: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon_code)
}

/// OpenWeatherMap "current weather" client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    units: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_options(
            api_key,
            DEFAULT_BASE_URL,
            "metric",
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: &str,
        units: &str,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            units: units.to_string(),
        })
    }

    async fn fetch(
        &self,
        query: &[(&str, String)],
        origin: QueryOrigin,
    ) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", self.units.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Weather request failed: {}", e);
                FetchError::ServiceError(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { origin });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Weather API returned {}: {}", status, body);
            return Err(FetchError::ServiceError(format!("HTTP {}", status.as_u16())));
        }

        let body: CurrentWeatherResponse = response.json().await.map_err(|e| {
            tracing::debug!("Weather response parse error: {}", e);
            FetchError::Unknown(e.to_string())
        })?;

        Ok(body.into())
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn get_by_name(&self, city: &str) -> Result<WeatherReading, FetchError> {
        self.fetch(&[("q", city.to_string())], QueryOrigin::City).await
    }

    #[instrument(skip(self), level = "info")]
    async fn get_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherReading, FetchError> {
        self.fetch(
            &[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
            ],
            QueryOrigin::Device,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_response_maps_first_condition() {
        let json = serde_json::json!({
            "main": { "temp": 20.0, "humidity": 50, "pressure": 1010, "feels_like": 19.2 },
            "weather": [
                { "description": "clear sky", "icon": "01d", "main": "Clear" },
                { "description": "haze", "icon": "50d" }
            ],
            "name": "Tokyo"
        });
        let resp: CurrentWeatherResponse = serde_json::from_value(json).unwrap();
        let reading = WeatherReading::from(resp);

        assert_eq!(reading.place_name, "Tokyo");
        assert_eq!(reading.temperature_c, 20.0);
        assert_eq!(reading.humidity_pct, 50);
        assert_eq!(reading.pressure_hpa, 1010);
        assert_eq!(reading.description, "clear sky");
        assert_eq!(reading.icon_code, "01d");
    }

    #[test]
    fn test_response_without_conditions() {
        let json = serde_json::json!({
            "main": { "temp": -3.5, "humidity": 80, "pressure": 990 }
        });
        let resp: CurrentWeatherResponse = serde_json::from_value(json).unwrap();
        let reading = WeatherReading::from(resp);

        assert_eq!(reading.place_name, "");
        assert_eq!(reading.description, "");
        assert_eq!(reading.icon_code, "");
    }

    #[test]
    fn test_icon_url() {
        assert_eq!(icon_url("10n"), "https://openweathermap.org/img/wn/10n@2x.png");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenWeatherClient::with_options(
            "key",
            "http://localhost:9999/",
            "metric",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}
