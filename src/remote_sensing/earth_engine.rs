//! Earth Engine REST client
//!
//! Every query is expressed as an [`ExprGraph`] and evaluated server-side
//! through `value:compute`; overlays are registered through `maps` and served
//! as XYZ tiles.

use super::expr::{ExprGraph, NodeRef};
use super::{
    AGGREGATE_SCALE_M, BURNED_AREA_COLLECTION, ELEVATION_IMAGE, HOTSPOT_BRIGHTNESS_K,
    HOTSPOT_SCALE_M, LOW_NDVI_THRESHOLD, MAX_PIXELS, OverlayKind, RemoteSensing, SensingQuery,
    THERMAL_ANOMALY_COLLECTION, THERMAL_BANDS, TileLayer, VEGETATION_COLLECTION,
};
use crate::config::EarthEngineConfig;
use crate::models::{Coordinates, FireDetection, RegionAggregates};
use crate::{FireWatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, read_service_account_key};

const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";

const DETECTION_PALETTE: [&str; 4] = ["black", "red", "orange", "yellow"];
const RISK_PALETTE: [&str; 1] = ["red"];

enum TokenSource {
    Static(String),
    ServiceAccount(DefaultAuthenticator),
}

impl TokenSource {
    async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(auth) => {
                let token = auth.token(&[EARTH_ENGINE_SCOPE]).await.map_err(|e| {
                    FireWatchError::remote_sensing(format!("Failed to acquire access token: {e}"))
                })?;
                token
                    .token()
                    .map(str::to_string)
                    .ok_or_else(|| FireWatchError::remote_sensing("Access token is empty"))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
struct MapResponse {
    name: String,
}

pub struct EarthEngineClient {
    client: Client,
    base_url: String,
    project: String,
    tokens: TokenSource,
}

impl EarthEngineClient {
    /// Build a client, authenticating with the configured token or service account
    pub async fn from_config(config: &EarthEngineConfig) -> Result<Self> {
        let tokens = if let Some(token) = config.access_token.as_ref().filter(|t| !t.is_empty()) {
            TokenSource::Static(token.clone())
        } else {
            let key_path = config
                .service_account_key
                .clone()
                .or_else(|| std::env::var("GOOGLE_APPLICATION_CREDENTIALS").ok())
                .ok_or_else(|| {
                    FireWatchError::config(
                        "Earth Engine credentials missing: set earth_engine.service_account_key or earth_engine.access_token",
                    )
                })?;
            let key = read_service_account_key(&key_path).await.map_err(|e| {
                FireWatchError::config(format!("Failed to read service account key {key_path}: {e}"))
            })?;
            let auth = ServiceAccountAuthenticator::builder(key)
                .build()
                .await
                .map_err(|e| {
                    FireWatchError::config(format!("Failed to create authenticator: {e}"))
                })?;
            TokenSource::ServiceAccount(auth)
        };

        Self::build(config, tokens)
    }

    /// Build a client with a fixed bearer token
    pub fn with_token(config: &EarthEngineConfig, token: impl Into<String>) -> Result<Self> {
        Self::build(config, TokenSource::Static(token.into()))
    }

    fn build(config: &EarthEngineConfig, tokens: TokenSource) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| FireWatchError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            tokens,
        })
    }

    async fn post(&self, path: &str, body: Value) -> Result<reqwest::Response> {
        let url = format!("{}/projects/{}/{}", self.base_url, self.project, path);
        debug!("Earth Engine request: {}", url);

        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FireWatchError::remote_sensing("Earth Engine request timed out")
                } else {
                    FireWatchError::remote_sensing(format!("Earth Engine unavailable: {e}"))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => match body.error.status {
                Some(code) => format!("{code}: {}", body.error.message),
                None => body.error.message,
            },
            Err(_) => format!("{status}: {text}"),
        };
        Err(FireWatchError::remote_sensing(message))
    }

    /// Evaluate `result` and return the computed value
    async fn compute(&self, graph: ExprGraph, result: &NodeRef) -> Result<Value> {
        let nodes = graph.len();
        let body = json!({ "expression": graph.into_expression(result) });
        let start_time = std::time::Instant::now();

        let response: ComputeResponse = self
            .post("value:compute", body)
            .await?
            .json()
            .await
            .map_err(|e| FireWatchError::remote_sensing(format!("Invalid compute response: {e}")))?;

        debug!(
            "Computed {}-node expression in {:.3}s",
            nodes,
            start_time.elapsed().as_secs_f64()
        );
        Ok(response.result)
    }

    /// Register `image` as a PNG tile map and return its tile URL template
    async fn tile_url(&self, graph: ExprGraph, image: &NodeRef) -> Result<String> {
        let body = json!({
            "expression": graph.into_expression(image),
            "fileFormat": "PNG",
        });

        let response: MapResponse = self
            .post("maps", body)
            .await?
            .json()
            .await
            .map_err(|e| FireWatchError::remote_sensing(format!("Invalid maps response: {e}")))?;

        Ok(format!("{}/{}/tiles/{{z}}/{{x}}/{{y}}", self.base_url, response.name))
    }
}

/// Query-scoped graph building shared by every operation
struct Scope<'a> {
    graph: ExprGraph,
    query: &'a SensingQuery,
    region: NodeRef,
}

impl<'a> Scope<'a> {
    fn new(query: &'a SensingQuery) -> Self {
        let mut graph = ExprGraph::new();
        let region = graph.polygon(&query.region.ring());
        Self {
            graph,
            query,
            region,
        }
    }

    fn collection(&mut self, id: &str, window: &super::DateWindow) -> NodeRef {
        let loaded = self.graph.load_collection(id);
        let dated = self.graph.filter_date(&loaded, window);
        self.graph.filter_bounds(&dated, &self.region)
    }

    fn alerts(&mut self) -> NodeRef {
        let window = self.query.alerts;
        self.collection(THERMAL_ANOMALY_COLLECTION, &window)
    }

    fn ndvi_median(&mut self) -> NodeRef {
        let window = self.query.vegetation;
        let vegetation = self.collection(VEGETATION_COLLECTION, &window);
        let ndvi = self.graph.select_collection(&vegetation, &["NDVI"]);
        self.graph.median(&ndvi)
    }

    fn thermal_mean(&mut self) -> NodeRef {
        let alerts = self.alerts();
        let bands = self.graph.select_collection(&alerts, &THERMAL_BANDS);
        self.graph.mean(&bands)
    }

    fn burned_mask(&mut self) -> NodeRef {
        let window = self.query.burned;
        let burned = self.collection(BURNED_AREA_COLLECTION, &window);
        let burn_date = self.graph.select_collection(&burned, &["BurnDate"]);
        let mosaic = self.graph.mosaic(&burn_date);
        self.graph.gt(&mosaic, 0.0)
    }
}

fn aggregate(result: &Value, band: &str) -> Option<f64> {
    result.get(band).and_then(Value::as_f64)
}

fn parse_hotspots(result: Value) -> Result<Vec<FireDetection>> {
    let collection: geojson::FeatureCollection = serde_json::from_value(result)
        .map_err(|e| FireWatchError::remote_sensing(format!("Invalid hotspot collection: {e}")))?;

    let detections = collection
        .features
        .iter()
        .filter_map(|feature| {
            let geometry = feature.geometry.as_ref()?;
            let geojson::Value::Point(position) = &geometry.value else {
                return None;
            };
            let longitude = *position.first()?;
            let latitude = *position.get(1)?;
            Some(FireDetection {
                coordinates: Coordinates::new(latitude, longitude),
                brightness: feature.property("mean").and_then(Value::as_f64),
            })
        })
        .collect();

    Ok(detections)
}

#[async_trait]
impl RemoteSensing for EarthEngineClient {
    #[instrument(skip(self, query), fields(timeframe = %query.timeframe))]
    async fn detection_count(&self, query: &SensingQuery) -> Result<u64> {
        let mut scope = Scope::new(query);
        let alerts = scope.alerts();
        let size = scope.graph.size(&alerts);

        let result = self.compute(scope.graph, &size).await?;
        let count = result
            .as_u64()
            .ok_or_else(|| FireWatchError::remote_sensing(format!("Unexpected count: {result}")))?;
        info!("{} thermal-anomaly images in alert window", count);
        Ok(count)
    }

    #[instrument(skip(self, query), fields(timeframe = %query.timeframe))]
    async fn hotspots(&self, query: &SensingQuery) -> Result<Vec<FireDetection>> {
        let mut scope = Scope::new(query);
        let alerts = scope.alerts();
        let region = scope.region.clone();

        let per_image = scope.graph.map_images(&alerts, |g, image| {
            let brightness = g.select(image, &["Bright_ti4"]);
            let hot = g.gt(&brightness, HOTSPOT_BRIGHTNESS_K);
            let mask = g.self_mask(&hot);
            let label = g.rename(&mask, &["fire"]);
            let labelled = g.add_bands(&label, &brightness);
            g.centroids(&labelled, &region, HOTSPOT_SCALE_M, "fire")
        });
        let flattened = scope.graph.flatten(&per_image);

        let result = self.compute(scope.graph, &flattened).await?;
        let detections = parse_hotspots(result)?;
        info!("Found {} hotspot clusters", detections.len());
        Ok(detections)
    }

    #[instrument(skip(self, query))]
    async fn region_aggregates(&self, query: &SensingQuery) -> Result<RegionAggregates> {
        let mut scope = Scope::new(query);
        let ndvi = scope.ndvi_median();
        let elevation_image = scope.graph.load_image(ELEVATION_IMAGE);
        let elevation = scope.graph.select(&elevation_image, &["elevation"]);
        let thermal = scope.thermal_mean();

        let stacked = scope.graph.add_bands(&ndvi, &elevation);
        let stacked = scope.graph.add_bands(&stacked, &thermal);
        let region = scope.region.clone();
        let reduced =
            scope
                .graph
                .reduce_region_mean(&stacked, &region, AGGREGATE_SCALE_M, MAX_PIXELS);

        let result = self.compute(scope.graph, &reduced).await?;
        if !result.is_object() {
            warn!("Region reduction returned {}, treating as empty", result);
        }

        Ok(RegionAggregates {
            ndvi: aggregate(&result, "NDVI"),
            elevation: aggregate(&result, "elevation"),
            bright_ti4: aggregate(&result, "Bright_ti4"),
            bright_ti5: aggregate(&result, "Bright_ti5"),
            frp: aggregate(&result, "frp"),
        })
    }

    #[instrument(skip(self, query))]
    async fn overlay(&self, query: &SensingQuery, kind: OverlayKind) -> Result<TileLayer> {
        let mut scope = Scope::new(query);
        let region = scope.region.clone();

        let visual = match kind {
            OverlayKind::Detections => {
                let alerts = scope.alerts();
                let brightness = scope.graph.select_collection(&alerts, &["Bright_ti4"]);
                let mean = scope.graph.mean(&brightness);
                let clipped = scope.graph.clip(&mean, &region);
                scope
                    .graph
                    .visualize(&clipped, 300.0, 400.0, &DETECTION_PALETTE)
            }
            OverlayKind::WildfireRisk => {
                let burned = scope.burned_mask();
                let ndvi = scope.ndvi_median();
                let sparse = scope.graph.lt(&ndvi, LOW_NDVI_THRESHOLD);
                let risk = scope.graph.and(&burned, &sparse);
                let masked = scope.graph.self_mask(&risk);
                let clipped = scope.graph.clip(&masked, &region);
                scope.graph.visualize(&clipped, 0.0, 1.0, &RISK_PALETTE)
            }
        };

        let url_template = self.tile_url(scope.graph, &visual).await?;
        Ok(TileLayer {
            name: kind.title().to_string(),
            url_template,
            attribution: kind.attribution().to_string(),
        })
    }
}
