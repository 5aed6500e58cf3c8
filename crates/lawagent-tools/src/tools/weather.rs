//! `weather`: city name -> current conditions, via Open-Meteo's free
//! geocoding + forecast endpoints (no API key required).

use async_trait::async_trait;
use lawagent_core::{CoreError, Result};
use lawagent_llm::ToolSchema;
use serde_json::{Value, json};
use tracing::debug;

use crate::registry::extract_primary_arg;
use crate::tool::Tool;

const GEOCODE_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub struct WeatherTool {
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client }
    }

    async fn geocode(&self, city: &str) -> Result<(f64, f64, String)> {
        let response = self
            .client
            .get(GEOCODE_URL)
            .query(&[("name", city), ("count", "1")])
            .send()
            .await
            .map_err(|e| CoreError::provider(format!("geocoding request failed: {e}")))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::parse(format!("failed to parse geocoding response: {e}")))?;

        let result = body
            .get("results")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .ok_or_else(|| CoreError::tool("weather", format!("no location found for `{city}`")))?;

        let lat = result.get("latitude").and_then(|v| v.as_f64()).unwrap_or_default();
        let lon = result.get("longitude").and_then(|v| v.as_f64()).unwrap_or_default();
        let name = result.get("name").and_then(|v| v.as_str()).unwrap_or(city).to_string();
        Ok((lat, lon, name))
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<Value> {
        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("current", "temperature_2m,weather_code,wind_speed_10m".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CoreError::provider(format!("forecast request failed: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| CoreError::parse(format!("failed to parse forecast response: {e}")))
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "weather",
            "Returns current weather conditions for a city.",
            json!({
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let city = extract_primary_arg(arguments);
        debug!(city, "looking up weather");

        let (lat, lon, resolved_name) = self.geocode(&city).await?;
        let forecast = self.forecast(lat, lon).await?;

        let current = forecast.get("current").cloned().unwrap_or(json!({}));
        Ok(serde_json::to_string(&json!({"city": resolved_name, "current": current})).unwrap())
    }
}
