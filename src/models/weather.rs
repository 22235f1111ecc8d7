//! Weather reading model and compass conversion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Eight-point compass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassDirection {
    const SECTORS: [CompassDirection; 8] = [
        CompassDirection::N,
        CompassDirection::NE,
        CompassDirection::E,
        CompassDirection::SE,
        CompassDirection::S,
        CompassDirection::SW,
        CompassDirection::W,
        CompassDirection::NW,
    ];

    /// Bucket a bearing into 45° sectors offset by 22.5°.
    ///
    /// Sector boundaries belong to the clockwise neighbour: 22.5° is `NE`.
    #[must_use]
    pub fn from_bearing(degrees: f64) -> Self {
        let shifted = (degrees + 22.5).rem_euclid(360.0);
        let index = (shifted / 45.0).floor() as usize;
        Self::SECTORS[index % Self::SECTORS.len()]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NE => "NE",
            CompassDirection::E => "E",
            CompassDirection::SE => "SE",
            CompassDirection::S => "S",
            CompassDirection::SW => "SW",
            CompassDirection::W => "W",
            CompassDirection::NW => "NW",
        }
    }
}

impl fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions at a point, fetched fresh for every assessment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReading {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Direction the wind blows from, degrees clockwise from north
    pub wind_deg: f64,
    pub wind_dir: CompassDirection,
}

impl WeatherReading {
    #[must_use]
    pub fn new(temperature: f64, humidity: f64, wind_speed: f64, wind_deg: f64) -> Self {
        Self {
            temperature,
            humidity,
            wind_speed,
            wind_deg,
            wind_dir: CompassDirection::from_bearing(wind_deg),
        }
    }

    /// Direction the wind blows towards, degrees clockwise from north
    #[must_use]
    pub fn downwind_bearing(&self) -> f64 {
        (self.wind_deg + 180.0).rem_euclid(360.0)
    }

    /// Eastward and northward wind components in m/s
    #[must_use]
    pub fn wind_components(&self) -> (f64, f64) {
        let theta = self.wind_deg.to_radians();
        (-self.wind_speed * theta.sin(), -self.wind_speed * theta.cos())
    }

    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{} °C", self.temperature)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{} ({}°)", self.wind_dir, self.wind_deg)
    }
}
