//! Current weather lookup against an OpenWeatherMap-compatible API
//!
//! Failures never propagate: the caller receives `None` and treats the
//! weather as unavailable.

use crate::config::WeatherConfig;
use crate::models::{Coordinates, WeatherReading};
use crate::{FireWatchError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Weather API client
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("firewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FireWatchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Current conditions at a point, or `None` if they could not be fetched
    #[instrument(skip(self))]
    pub async fn current(&self, point: Coordinates) -> Option<WeatherReading> {
        match self.fetch(point).await {
            Ok(reading) => {
                info!(
                    "Weather at ({:.4}, {:.4}): {} °C, wind {} m/s from {}",
                    point.latitude,
                    point.longitude,
                    reading.temperature,
                    reading.wind_speed,
                    reading.wind_dir
                );
                Some(reading)
            }
            Err(e) => {
                warn!("Weather unavailable: {}", e);
                None
            }
        }
    }

    async fn fetch(&self, point: Coordinates) -> Result<WeatherReading> {
        let url = format!(
            "{}/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            point.latitude,
            point.longitude,
            urlencoding::encode(self.api_key.as_deref().unwrap_or_default())
        );
        debug!(
            "Weather API request: {}",
            url.split("&appid=").next().unwrap_or(&url)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FireWatchError::api(format!(
                "weather API returned {status}"
            )));
        }

        let body: openweather::CurrentResponse = response.json().await?;
        Ok(body.into())
    }
}

/// OpenWeatherMap response structures
mod openweather {
    use super::WeatherReading;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub main: Main,
        pub wind: Wind,
    }

    #[derive(Debug, Deserialize)]
    pub struct Main {
        pub temp: f64,
        pub humidity: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct Wind {
        pub speed: f64,
        pub deg: f64,
    }

    impl From<CurrentResponse> for WeatherReading {
        fn from(response: CurrentResponse) -> Self {
            WeatherReading::new(
                response.main.temp,
                response.main.humidity,
                response.wind.speed,
                response.wind.deg,
            )
        }
    }
}
