//! Data models for the `FireWatch` application
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, resolved places and query regions
//! - Timeframe: the selectable fire alert windows
//! - Fire: detections and labelled fire locations
//! - Weather: current conditions and compass directions
//! - Prediction: model features and burned-area results

pub mod fire;
pub mod location;
pub mod prediction;
pub mod timeframe;
pub mod weather;

pub use fire::{FireDetection, FireLocation, FireLocations};
pub use location::{Coordinates, EARTH_RADIUS_KM, Location, Region};
pub use prediction::{
    FEATURE_NAMES, FeatureVector, PredictionResult, RegionAggregates, SpreadProjection,
};
pub use timeframe::Timeframe;
pub use weather::{CompassDirection, WeatherReading};
