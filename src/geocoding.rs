//! Geocoding client for Nominatim-compatible services
//!
//! Forward lookups resolve the user's free-text location; reverse lookups
//! label fire points and are throttled to the service's one-request-per-second
//! usage policy.

use crate::config::GeocodingConfig;
use crate::models::{Coordinates, Location};
use crate::{FireWatchError, Result};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Enforces a minimum interval between consecutive requests
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Get time until next request is allowed
    pub fn time_until_next_request(&self) -> Duration {
        match self.last_request {
            Some(last) => self.min_interval.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Wait until a request is allowed and record it
    pub async fn acquire(&mut self) {
        let wait = self.time_until_next_request();
        if !wait.is_zero() {
            debug!("Rate limiting, waiting {:.3}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
        self.last_request = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: Option<String>,
    error: Option<String>,
}

/// Forward and reverse geocoding client
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    language: String,
    reverse_limiter: Mutex<RateLimiter>,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FireWatchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            reverse_limiter: Mutex::new(RateLimiter::new(Duration::from_millis(
                config.reverse_min_delay_ms,
            ))),
        })
    }

    /// Look up the best match for a free-text query.
    ///
    /// Returns `Ok(None)` when the service answered but found nothing.
    #[instrument(skip(self))]
    pub async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1&accept-language={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.language)
        );

        let start_time = std::time::Instant::now();
        let response = self.send(&url).await?;
        let results: Vec<SearchResult> = response.json().await.map_err(|e| {
            FireWatchError::geocoding(format!("Invalid geocoding response for '{query}': {e}"))
        })?;

        let Some(best) = results.into_iter().next() else {
            warn!("No results found for location '{}'", query);
            return Ok(None);
        };

        let latitude = parse_degrees(&best.lat)?;
        let longitude = parse_degrees(&best.lon)?;
        info!(
            "Geocoded '{}' to ({:.4}, {:.4}) in {:.3}s",
            query,
            latitude,
            longitude,
            start_time.elapsed().as_secs_f64()
        );

        Ok(Some(Location {
            latitude,
            longitude,
            name: best.display_name,
        }))
    }

    /// Look up the address of a point, waiting for the rate limiter first.
    #[instrument(skip(self))]
    pub async fn reverse(&self, point: Coordinates) -> Result<Option<String>> {
        self.reverse_limiter.lock().await.acquire().await;

        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json&accept-language={}",
            self.base_url,
            point.latitude,
            point.longitude,
            urlencoding::encode(&self.language)
        );

        let response = self.send(&url).await?;
        let result: ReverseResult = response.json().await.map_err(|e| {
            FireWatchError::geocoding(format!("Invalid reverse geocoding response: {e}"))
        })?;

        if let Some(error) = result.error {
            debug!("Reverse geocoding found nothing: {}", error);
            return Ok(None);
        }
        Ok(result.display_name.filter(|name| !name.is_empty()))
    }

    async fn send(&self, url: &str) -> Result<Response> {
        debug!("Geocoding request: {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FireWatchError::geocoding("geocoding service timed out")
            } else {
                FireWatchError::geocoding(format!("geocoding service unavailable: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FireWatchError::geocoding(format!(
                "geocoding service returned {status}"
            )));
        }
        Ok(response)
    }
}

fn parse_degrees(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| FireWatchError::geocoding(format!("Invalid coordinate in response: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use serde_json::json;
    use std::collections::HashMap;

    fn config_for(base_url: String) -> GeocodingConfig {
        GeocodingConfig {
            base_url,
            reverse_min_delay_ms: 0,
            ..GeocodingConfig::default()
        }
    }

    fn stub_router() -> Router {
        Router::new()
            .route(
                "/search",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    match params.get("q").map(String::as_str) {
                        Some("Paradise, CA") => Json(json!([{
                            "lat": "39.7596",
                            "lon": "-121.6219",
                            "display_name": "Paradise, Butte County, California, United States"
                        }])),
                        _ => Json(json!([])),
                    }
                }),
            )
            .route(
                "/reverse",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("lat").map(String::as_str) == Some("0") {
                        Json(json!({"error": "Unable to geocode"}))
                    } else {
                        Json(json!({"display_name": "Concow, Butte County, California"}))
                    }
                }),
            )
    }

    #[tokio::test]
    async fn test_geocode_parses_best_match() {
        let base_url = spawn_stub(stub_router()).await;
        let client = GeocodingClient::new(&config_for(base_url)).unwrap();

        let location = client.geocode("Paradise, CA").await.unwrap().unwrap();
        assert!((location.latitude - 39.7596).abs() < 1e-9);
        assert!((location.longitude + 121.6219).abs() < 1e-9);
        assert_eq!(
            location.name.as_deref(),
            Some("Paradise, Butte County, California, United States")
        );
    }

    #[tokio::test]
    async fn test_geocode_empty_result() {
        let base_url = spawn_stub(stub_router()).await;
        let client = GeocodingClient::new(&config_for(base_url)).unwrap();
        assert!(client.geocode("Atlantis").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_service_is_geocoding_error() {
        let router = Router::new().route(
            "/search",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let base_url = spawn_stub(router).await;
        let client = GeocodingClient::new(&config_for(base_url)).unwrap();

        let err = client.geocode("Paradise, CA").await.unwrap_err();
        assert!(matches!(err, FireWatchError::Geocoding { .. }));
    }

    #[tokio::test]
    async fn test_reverse_lookup() {
        let base_url = spawn_stub(stub_router()).await;
        let client = GeocodingClient::new(&config_for(base_url)).unwrap();

        let label = client.reverse(Coordinates::new(39.8, -121.5)).await.unwrap();
        assert_eq!(label.as_deref(), Some("Concow, Butte County, California"));

        let nothing = client.reverse(Coordinates::new(0.0, 0.0)).await.unwrap();
        assert!(nothing.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_enforces_min_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        assert_eq!(limiter.time_until_next_request(), Duration::ZERO);

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(limiter.time_until_next_request() > Duration::ZERO);
    }
}
