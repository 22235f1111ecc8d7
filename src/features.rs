//! Feature assembly for the burned-area model

use crate::models::{FeatureVector, RegionAggregates, WeatherReading};
use tracing::warn;

/// Detection confidence fed to the model, the platform offers no per-region value
pub const FIRE_CONFIDENCE: f64 = 50.0;

/// Build the model input row from regional aggregates and current weather.
///
/// Missing or non-finite values become 0.0.
#[must_use]
pub fn assemble(aggregates: &RegionAggregates, weather: &WeatherReading) -> FeatureVector {
    let (wind_u, wind_v) = weather.wind_components();

    FeatureVector {
        ndvi: or_zero("NDVI", aggregates.ndvi),
        elevation: or_zero("elevation", aggregates.elevation),
        temperature: or_zero("temperature_2m", Some(weather.temperature)),
        wind_u: or_zero("u_component_of_wind_10m", Some(wind_u)),
        wind_v: or_zero("v_component_of_wind_10m", Some(wind_v)),
        frp: or_zero("frp", aggregates.frp),
        fire_confidence: FIRE_CONFIDENCE,
        bright_ti4: or_zero("BrightTi4", aggregates.bright_ti4),
        bright_ti5: or_zero("BrightTi5", aggregates.bright_ti5),
    }
}

fn or_zero(name: &str, value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            warn!("Feature {} is {}, substituting 0.0", name, v);
            0.0
        }
        None => {
            warn!("Feature {} is missing, substituting 0.0", name);
            0.0
        }
    }
}
