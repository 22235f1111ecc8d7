//! Feature vector and prediction result models

use super::{CompassDirection, Coordinates};
use serde::{Deserialize, Serialize};

/// Column names in the exact order the model was trained with
pub const FEATURE_NAMES: [&str; 9] = [
    "NDVI",
    "elevation",
    "temperature_2m",
    "u_component_of_wind_10m",
    "v_component_of_wind_10m",
    "frp",
    "FireConfidence",
    "BrightTi4",
    "BrightTi5",
];

/// Regional means returned by the remote-sensing layer.
///
/// `None` marks a band the platform returned no value for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionAggregates {
    pub ndvi: Option<f64>,
    pub elevation: Option<f64>,
    pub bright_ti4: Option<f64>,
    pub bright_ti5: Option<f64>,
    pub frp: Option<f64>,
}

/// Single model input row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "NDVI")]
    pub ndvi: f64,
    pub elevation: f64,
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    #[serde(rename = "u_component_of_wind_10m")]
    pub wind_u: f64,
    #[serde(rename = "v_component_of_wind_10m")]
    pub wind_v: f64,
    pub frp: f64,
    #[serde(rename = "FireConfidence")]
    pub fire_confidence: f64,
    #[serde(rename = "BrightTi4")]
    pub bright_ti4: f64,
    #[serde(rename = "BrightTi5")]
    pub bright_ti5: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    #[must_use]
    pub fn as_row(&self) -> [f64; 9] {
        [
            self.ndvi,
            self.elevation,
            self.temperature,
            self.wind_u,
            self.wind_v,
            self.frp,
            self.fire_confidence,
            self.bright_ti4,
            self.bright_ti5,
        ]
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.as_row())
    }
}

/// Downwind spread geometry drawn with a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadProjection {
    pub origin: Coordinates,
    pub bearing_deg: f64,
    pub direction: CompassDirection,
    pub distance_km: f64,
    pub endpoint: Coordinates,
    /// Fan polygon starting at the origin
    pub cone: Vec<Coordinates>,
}

/// Predicted burned area with the inputs that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted burned area in square kilometers
    pub burned_area_km2: f64,
    pub features: FeatureVector,
    pub spread: SpreadProjection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_matches_feature_names() {
        let vector = FeatureVector {
            ndvi: 1.0,
            elevation: 2.0,
            temperature: 3.0,
            wind_u: 4.0,
            wind_v: 5.0,
            frp: 6.0,
            fire_confidence: 7.0,
            bright_ti4: 8.0,
            bright_ti5: 9.0,
        };

        let named: Vec<_> = vector.named().collect();
        assert_eq!(named[0], ("NDVI", 1.0));
        assert_eq!(named[6], ("FireConfidence", 7.0));
        assert_eq!(named[8], ("BrightTi5", 9.0));

        let json = serde_json::to_value(vector).unwrap();
        for name in FEATURE_NAMES {
            assert!(json.get(name).is_some(), "missing column {name}");
        }
    }
}
