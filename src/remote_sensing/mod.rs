//! Remote-sensing query layer
//!
//! Burned-area history, vegetation index and active-fire detections are
//! fetched for a [`Region`] and a set of date windows. The pipeline only
//! depends on the [`RemoteSensing`] trait; [`EarthEngineClient`] is the
//! production implementation.

pub mod earth_engine;
pub mod expr;

use crate::Result;
use crate::models::{FireDetection, Region, RegionAggregates, Timeframe};
use async_trait::async_trait;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub use earth_engine::EarthEngineClient;

/// Monthly burned-area product
pub const BURNED_AREA_COLLECTION: &str = "MODIS/061/MCD64A1";
/// 16-day vegetation index product
pub const VEGETATION_COLLECTION: &str = "MODIS/061/MOD13Q1";
/// Near-real-time thermal anomalies
pub const THERMAL_ANOMALY_COLLECTION: &str = "NASA/LANCE/NOAA20_VIIRS/C2";
/// Digital elevation model
pub const ELEVATION_IMAGE: &str = "USGS/SRTMGL1_003";

/// Thermal bands read from the anomaly collection
pub const THERMAL_BANDS: [&str; 3] = ["Bright_ti4", "Bright_ti5", "frp"];

/// NDVI (scaled by 10000) below which burned pixels count as wildfire risk
pub const LOW_NDVI_THRESHOLD: f64 = 2000.0;
/// `Bright_ti4` brightness temperature in Kelvin above which a pixel is a hotspot
pub const HOTSPOT_BRIGHTNESS_K: f64 = 330.0;
/// Hotspot vectorization scale in meters
pub const HOTSPOT_SCALE_M: f64 = 1000.0;
/// Regional aggregate sampling scale in meters
pub const AGGREGATE_SCALE_M: f64 = 500.0;
/// Pixel budget for best-effort reductions
pub const MAX_PIXELS: f64 = 1e8;

/// Half-open date interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Everything needed to scope the queries of one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensingQuery {
    pub region: Region,
    pub timeframe: Timeframe,
    /// Burned-area history, from three months before the current month
    pub burned: DateWindow,
    /// Vegetation composite, one month longer than the burned-area window
    pub vegetation: DateWindow,
    /// Thermal-anomaly alerts, `days_back` days ending with the current day
    pub alerts: DateWindow,
}

impl SensingQuery {
    #[must_use]
    pub fn new(region: Region, timeframe: Timeframe, today: NaiveDate) -> Self {
        let month_start = today.with_day0(0).unwrap_or(today);
        let burned_start = month_start
            .checked_sub_months(Months::new(3))
            .unwrap_or(month_start);
        let vegetation_start = burned_start
            .checked_sub_months(Months::new(1))
            .unwrap_or(burned_start);
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

        Self {
            region,
            timeframe,
            burned: DateWindow::new(burned_start, today),
            vegetation: DateWindow::new(vegetation_start, today),
            alerts: DateWindow::new(timeframe.window_start(today), tomorrow),
        }
    }
}

/// Raster overlays that can be drawn on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Mean `Bright_ti4` of the alert window
    Detections,
    /// Burned pixels with low vegetation index
    WildfireRisk,
}

impl OverlayKind {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            OverlayKind::Detections => "Fire Alerts",
            OverlayKind::WildfireRisk => "Wildfire Risk",
        }
    }

    #[must_use]
    pub fn attribution(self) -> &'static str {
        match self {
            OverlayKind::Detections => "VIIRS NOAA20 NRT",
            OverlayKind::WildfireRisk => "MODIS MCD64A1 / MOD13Q1",
        }
    }
}

/// XYZ tile layer rendered by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// URL with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    pub attribution: String,
}

#[async_trait]
pub trait RemoteSensing: Send + Sync {
    /// Number of thermal-anomaly images in the alert window
    async fn detection_count(&self, query: &SensingQuery) -> Result<u64>;

    /// Hotspot centroids of the alert window
    async fn hotspots(&self, query: &SensingQuery) -> Result<Vec<FireDetection>>;

    /// Regional means of vegetation, elevation and thermal bands
    async fn region_aggregates(&self, query: &SensingQuery) -> Result<RegionAggregates>;

    /// Tile layer for a raster overlay
    async fn overlay(&self, query: &SensingQuery, kind: OverlayKind) -> Result<TileLayer>;
}
