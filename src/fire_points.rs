//! Fire-point extraction
//!
//! Hotspot centroids are turned into labelled fire locations. Labels come
//! from reverse geocoding; any lookup that fails or finds nothing falls back
//! to the coordinate label.

use crate::geocoding::GeocodingClient;
use crate::models::{FireDetection, FireLocation, FireLocations};
use crate::remote_sensing::{RemoteSensing, SensingQuery};
use tracing::{debug, info, instrument, warn};

pub struct FirePointExtractor<'a> {
    sensing: &'a dyn RemoteSensing,
    geocoder: &'a GeocodingClient,
}

impl<'a> FirePointExtractor<'a> {
    pub fn new(sensing: &'a dyn RemoteSensing, geocoder: &'a GeocodingClient) -> Self {
        Self { sensing, geocoder }
    }

    /// Labelled fire points of the alert window, empty when extraction fails
    #[instrument(skip_all)]
    pub async fn extract(&self, query: &SensingQuery) -> FireLocations {
        let detections = match self.sensing.hotspots(query).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!("Hotspot extraction failed: {}", e);
                return FireLocations::new();
            }
        };

        let mut fires = FireLocations::new();
        for detection in detections {
            let label = self.label(&detection).await;
            fires.insert(FireLocation {
                label,
                coordinates: detection.coordinates,
                brightness: detection.brightness,
            });
        }

        info!("Extracted {} labelled fire points", fires.len());
        fires
    }

    async fn label(&self, detection: &FireDetection) -> String {
        match self.geocoder.reverse(detection.coordinates).await {
            Ok(Some(address)) => address,
            Ok(None) => detection.coordinates.label(),
            Err(e) => {
                debug!("Reverse geocoding failed, using coordinates: {}", e);
                detection.coordinates.label()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeocodingConfig;
    use crate::models::{Coordinates, Region, Timeframe};
    use crate::test_support::{FakeSensing, spawn_stub};
    use axum::{Json, Router, extract::Query, routing::get};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;

    fn query() -> SensingQuery {
        SensingQuery::new(
            Region::around(Coordinates::new(39.76, -121.62), 50.0),
            Timeframe::Today,
            NaiveDate::from_ymd_opt(2024, 8, 17).unwrap(),
        )
    }

    fn geocoder(base_url: String) -> GeocodingClient {
        GeocodingClient::new(&GeocodingConfig {
            base_url,
            reverse_min_delay_ms: 0,
            ..GeocodingConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_labels_collide_and_fall_back() {
        let router = Router::new().route(
            "/reverse",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("lat").map(String::as_str) {
                    Some("39.8") | Some("39.81") => {
                        Json(json!({"display_name": "Concow, Butte County"}))
                    }
                    _ => Json(json!({"error": "Unable to geocode"})),
                }
            }),
        );
        let geocoder = geocoder(spawn_stub(router).await);
        let sensing = FakeSensing::with_hotspots(&[(39.8, -121.5), (39.7, -121.9), (39.81, -121.49)]);

        let fires = FirePointExtractor::new(&sensing, &geocoder)
            .extract(&query())
            .await;

        assert_eq!(fires.len(), 2);
        assert_eq!(
            fires.labels().collect::<Vec<_>>(),
            vec!["Concow, Butte County", "39.70, -121.90"]
        );
        let concow = fires.get("Concow, Butte County").unwrap();
        assert_eq!(concow.coordinates, Coordinates::new(39.81, -121.49));
    }

    #[tokio::test]
    async fn test_unreachable_geocoder_uses_coordinate_labels() {
        let geocoder = geocoder("http://127.0.0.1:9".to_string());
        let sensing = FakeSensing::with_hotspots(&[(-33.86, 151.21)]);

        let fires = FirePointExtractor::new(&sensing, &geocoder)
            .extract(&query())
            .await;
        assert_eq!(fires.labels().collect::<Vec<_>>(), vec!["-33.86, 151.21"]);
    }

    #[tokio::test]
    async fn test_sensing_failure_yields_empty() {
        let geocoder = geocoder("http://127.0.0.1:9".to_string());
        let sensing = FakeSensing::failing();

        let fires = FirePointExtractor::new(&sensing, &geocoder)
            .extract(&query())
            .await;
        assert!(fires.is_empty());
    }
}
