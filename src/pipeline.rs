//! Assessment pipeline
//!
//! One run resolves the location, scopes the remote-sensing queries to the
//! region, extracts labelled fire points, looks up the weather at the
//! selected point, predicts burned area when every precondition holds, and
//! assembles the map scene. Only location resolution can abort a run; every
//! later step degrades to an empty or missing result.

use crate::config::{MAX_REGION_RADIUS_KM, MIN_REGION_RADIUS_KM};
use crate::features::assemble;
use crate::fire_points::FirePointExtractor;
use crate::geocoding::GeocodingClient;
use crate::geometry::project_spread;
use crate::location_resolver::LocationResolver;
use crate::map::{MapScene, MapTheme};
use crate::model::BurnedAreaModel;
use crate::models::{
    Coordinates, FireLocations, Location, PredictionResult, Region, Timeframe, WeatherReading,
};
use crate::remote_sensing::{OverlayKind, RemoteSensing, SensingQuery};
use crate::weather::WeatherClient;
use crate::{FireWatchError, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// User inputs of one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub location: String,
    pub radius_km: u32,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default)]
    pub dark_mode: bool,
    /// Label of the fire point to center on, defaults to the first one
    #[serde(default)]
    pub selected_fire: Option<String>,
}

impl AssessmentRequest {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_REGION_RADIUS_KM..=MAX_REGION_RADIUS_KM).contains(&self.radius_km) {
            return Err(FireWatchError::validation(format!(
                "Region radius must be between {MIN_REGION_RADIUS_KM} and {MAX_REGION_RADIUS_KM} km, got {}",
                self.radius_km
            )));
        }
        Ok(())
    }
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub location: Location,
    pub region: Region,
    pub timeframe: Timeframe,
    /// Thermal-anomaly images found in the alert window
    pub detection_count: u64,
    pub fires: FireLocations,
    pub selected_label: Option<String>,
    pub selected: Coordinates,
    pub weather: Option<WeatherReading>,
    pub prediction: Option<PredictionResult>,
    pub map: MapScene,
}

pub struct AssessmentService {
    geocoder: GeocodingClient,
    weather: WeatherClient,
    sensing: Arc<dyn RemoteSensing>,
    model: Arc<BurnedAreaModel>,
}

impl AssessmentService {
    pub fn new(
        geocoder: GeocodingClient,
        weather: WeatherClient,
        sensing: Arc<dyn RemoteSensing>,
        model: Arc<BurnedAreaModel>,
    ) -> Self {
        Self {
            geocoder,
            weather,
            sensing,
            model,
        }
    }

    /// Run the pipeline for the current UTC day
    pub async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment> {
        self.assess_on(request, Utc::now().date_naive()).await
    }

    #[instrument(skip(self, request), fields(location = %request.location, timeframe = %request.timeframe))]
    pub async fn assess_on(
        &self,
        request: &AssessmentRequest,
        today: NaiveDate,
    ) -> Result<Assessment> {
        request.validate()?;
        let start_time = std::time::Instant::now();

        let location = LocationResolver::resolve(&self.geocoder, &request.location).await?;
        let region = Region::around(location.coordinates(), f64::from(request.radius_km));
        let query = SensingQuery::new(region.clone(), request.timeframe, today);

        let detection_count = match self.sensing.detection_count(&query).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Detection count unavailable, assuming none: {}", e);
                0
            }
        };

        let fires = if detection_count > 0 {
            FirePointExtractor::new(self.sensing.as_ref(), &self.geocoder)
                .extract(&query)
                .await
        } else {
            info!("No thermal anomalies in alert window, skipping fire points");
            FireLocations::new()
        };

        let selected_fire = request
            .selected_fire
            .as_deref()
            .and_then(|label| fires.get(label))
            .or_else(|| fires.first());
        let selected_label = selected_fire.map(|fire| fire.label.clone());
        let selected = selected_fire.map_or_else(|| location.coordinates(), |fire| fire.coordinates);

        let weather = self.weather.current(selected).await;

        let prediction = match &weather {
            Some(reading) if !fires.is_empty() && request.timeframe.is_real_time() => {
                self.predict(&query, selected, reading).await
            }
            _ => None,
        };

        let mut map = MapScene::new(selected, MapTheme::from_dark_mode(request.dark_mode));
        if detection_count > 0 {
            map = self.add_overlay(map, &query, OverlayKind::Detections).await;
        }
        map = self.add_overlay(map, &query, OverlayKind::WildfireRisk).await;
        map = map.with_fires(&fires);
        if let Some(prediction) = &prediction {
            map = map.with_spread(prediction.spread.clone());
        }

        info!(
            "Assessment for {} finished in {:.3}s: {} fire points, prediction {}",
            location.display_name(),
            start_time.elapsed().as_secs_f64(),
            fires.len(),
            if prediction.is_some() { "computed" } else { "skipped" }
        );

        Ok(Assessment {
            location,
            region,
            timeframe: request.timeframe,
            detection_count,
            fires,
            selected_label,
            selected,
            weather,
            prediction,
            map,
        })
    }

    async fn predict(
        &self,
        query: &SensingQuery,
        origin: Coordinates,
        weather: &WeatherReading,
    ) -> Option<PredictionResult> {
        let aggregates = match self.sensing.region_aggregates(query).await {
            Ok(aggregates) => aggregates,
            Err(e) => {
                warn!("Regional aggregates unavailable: {}", e);
                Default::default()
            }
        };

        let features = assemble(&aggregates, weather);
        match self.model.predict(&features) {
            Ok(burned_area_km2) => Some(PredictionResult {
                burned_area_km2,
                features,
                spread: project_spread(origin, weather),
            }),
            Err(e) => {
                warn!("Prediction failed: {}", e);
                None
            }
        }
    }

    async fn add_overlay(&self, map: MapScene, query: &SensingQuery, kind: OverlayKind) -> MapScene {
        match self.sensing.overlay(query, kind).await {
            Ok(layer) => map.with_overlay(layer),
            Err(e) => {
                warn!("{} overlay unavailable: {}", kind.title(), e);
                map
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeocodingConfig, WeatherConfig};
    use crate::model::fixtures::two_stump_model;
    use crate::test_support::{FakeSensing, spawn_stub};
    use axum::{Json, Router, http::StatusCode, routing::get};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 17).unwrap()
    }

    fn request(timeframe: Timeframe) -> AssessmentRequest {
        AssessmentRequest {
            location: "39.76, -121.62".to_string(),
            radius_km: 50,
            timeframe,
            dark_mode: false,
            selected_fire: None,
        }
    }

    async fn geocoder() -> GeocodingClient {
        let router = Router::new()
            .route("/search", get(|| async { Json(json!([])) }))
            .route(
                "/reverse",
                get(|| async { Json(json!({"error": "Unable to geocode"})) }),
            );
        GeocodingClient::new(&GeocodingConfig {
            base_url: spawn_stub(router).await,
            reverse_min_delay_ms: 0,
            ..GeocodingConfig::default()
        })
        .unwrap()
    }

    async fn weather(available: bool) -> WeatherClient {
        let router = Router::new().route(
            "/weather",
            get(move || async move {
                if available {
                    (
                        StatusCode::OK,
                        Json(json!({"main": {"temp": 35.0, "humidity": 9}, "wind": {"speed": 8.0, "deg": 45}})),
                    )
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
                }
            }),
        );
        WeatherClient::new(&WeatherConfig {
            api_key: Some("key".to_string()),
            base_url: spawn_stub(router).await,
            timeout_seconds: 5,
        })
        .unwrap()
    }

    async fn service(sensing: FakeSensing, weather_available: bool) -> AssessmentService {
        AssessmentService::new(
            geocoder().await,
            weather(weather_available).await,
            Arc::new(sensing),
            Arc::new(BurnedAreaModel::from_json(&two_stump_model()).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_real_time_assessment_predicts() {
        let sensing = FakeSensing::with_hotspots(&[(39.8, -121.5), (39.7, -121.9)]);
        let service = service(sensing, true).await;

        let assessment = service
            .assess_on(&request(Timeframe::Today), today())
            .await
            .unwrap();

        assert_eq!(assessment.fires.len(), 2);
        assert_eq!(assessment.selected_label.as_deref(), Some("39.80, -121.50"));
        assert_eq!(assessment.selected, Coordinates::new(39.8, -121.5));

        let prediction = assessment.prediction.unwrap();
        // ndvi 3500 > 3000 -> 4.0, temperature 35 > 30 -> 20.0
        assert!((prediction.burned_area_km2 - 12.0).abs() < 1e-9);
        assert_eq!(prediction.features.fire_confidence, 50.0);
        assert_eq!(prediction.spread.cone.len(), 12);

        assert_eq!(assessment.map.overlays.len(), 2);
        assert_eq!(assessment.map.markers.len(), 2);
        assert!(assessment.map.spread.is_some());
        assert_eq!(assessment.map.center, assessment.selected);
    }

    #[tokio::test]
    async fn test_selected_fire_is_honoured() {
        let sensing = FakeSensing::with_hotspots(&[(39.8, -121.5), (39.7, -121.9)]);
        let service = service(sensing, true).await;
        let mut request = request(Timeframe::Today);
        request.selected_fire = Some("39.70, -121.90".to_string());

        let assessment = service.assess_on(&request, today()).await.unwrap();
        assert_eq!(assessment.selected, Coordinates::new(39.7, -121.9));
    }

    #[tokio::test]
    async fn test_longer_timeframe_skips_prediction() {
        let sensing = FakeSensing::with_hotspots(&[(39.8, -121.5)]);
        let service = service(sensing, true).await;

        let assessment = service
            .assess_on(&request(Timeframe::PastWeek), today())
            .await
            .unwrap();
        assert_eq!(assessment.fires.len(), 1);
        assert!(assessment.weather.is_some());
        assert!(assessment.prediction.is_none());
        assert!(assessment.map.spread.is_none());
    }

    #[tokio::test]
    async fn test_missing_weather_skips_prediction() {
        let sensing = FakeSensing::with_hotspots(&[(39.8, -121.5)]);
        let service = service(sensing, false).await;

        let assessment = service
            .assess_on(&request(Timeframe::Today), today())
            .await
            .unwrap();
        assert!(assessment.weather.is_none());
        assert!(assessment.prediction.is_none());
    }

    #[tokio::test]
    async fn test_no_detections_centers_on_location() {
        let service = service(FakeSensing::with_hotspots(&[]), true).await;

        let assessment = service
            .assess_on(&request(Timeframe::Today), today())
            .await
            .unwrap();
        assert_eq!(assessment.detection_count, 0);
        assert!(assessment.fires.is_empty());
        assert!(assessment.prediction.is_none());
        assert_eq!(assessment.selected, Coordinates::new(39.76, -121.62));
        assert_eq!(assessment.map.overlays.len(), 1);
        assert_eq!(assessment.map.overlays[0].name, "Wildfire Risk");
    }

    #[tokio::test]
    async fn test_platform_outage_degrades() {
        let service = service(FakeSensing::failing(), true).await;

        let assessment = service
            .assess_on(&request(Timeframe::Today), today())
            .await
            .unwrap();
        assert!(assessment.fires.is_empty());
        assert!(assessment.map.overlays.is_empty());
        assert!(assessment.weather.is_some());
    }

    #[tokio::test]
    async fn test_unknown_location_aborts() {
        let service = service(FakeSensing::with_hotspots(&[(39.8, -121.5)]), true).await;
        let mut request = request(Timeframe::Today);
        request.location = "Atlantis".to_string();

        let err = service.assess_on(&request, today()).await.unwrap_err();
        assert!(matches!(err, FireWatchError::LocationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_radius_out_of_range_is_rejected() {
        let service = service(FakeSensing::default(), true).await;
        let mut request = request(Timeframe::Today);
        request.radius_km = 10;

        let err = service.assess_on(&request, today()).await.unwrap_err();
        assert!(matches!(err, FireWatchError::Validation { .. }));
    }
}
