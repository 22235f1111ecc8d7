//! `FireWatch` - Wildfire alerts, fire weather and burned-area prediction
//!
//! This library resolves a location, queries satellite data for the
//! surrounding region, labels active fire points, looks up the weather,
//! predicts burned area and renders the result as a map.

pub mod config;
pub mod error;
pub mod features;
pub mod fire_points;
pub mod firms;
pub mod geocoding;
pub mod geometry;
pub mod location_resolver;
pub mod logging;
pub mod map;
pub mod merge;
pub mod model;
pub mod models;
pub mod pipeline;
pub mod remote_sensing;
pub mod weather;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export core types for public API
pub use config::FireWatchConfig;
pub use error::FireWatchError;
pub use geocoding::GeocodingClient;
pub use location_resolver::{LocationInput, LocationParser, LocationResolver};
pub use map::{MapScene, MapTheme};
pub use model::BurnedAreaModel;
pub use models::{Coordinates, Location, Region, Timeframe, WeatherReading};
pub use pipeline::{Assessment, AssessmentRequest, AssessmentService};
pub use remote_sensing::{EarthEngineClient, RemoteSensing};
pub use weather::WeatherClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FireWatchError>;
