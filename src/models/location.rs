//! Location and region models for geographic scoping

use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometers used by all spherical helpers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Plain latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Coordinate label used when no address is known
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

/// A resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Display name from the geocoder
    pub name: Option<String>,
}

impl Location {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Name for display, falling back to the formatted coordinates
    #[must_use]
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{:.4}, {:.4}", self.latitude, self.longitude))
    }
}

/// Bounding rectangle of a circle buffered around a center point.
///
/// Every remote-sensing query of an assessment is scoped to this extent.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Region {
    pub center: Coordinates,
    pub radius_km: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Region {
    /// Build the region around a center point
    #[must_use]
    pub fn around(center: Coordinates, radius_km: f64) -> Self {
        let dlat = (radius_km / EARTH_RADIUS_KM).to_degrees();
        let south = (center.latitude - dlat).max(-90.0);
        let north = (center.latitude + dlat).min(90.0);

        let cos_lat = center.latitude.to_radians().cos();
        let (west, east) = if cos_lat <= 1e-6 {
            (-180.0, 180.0)
        } else {
            let dlon = (radius_km / (EARTH_RADIUS_KM * cos_lat)).to_degrees();
            (
                (center.longitude - dlon).max(-180.0),
                (center.longitude + dlon).min(180.0),
            )
        };

        Self {
            center,
            radius_km,
            west,
            south,
            east,
            north,
        }
    }

    /// Closed outer ring in (lon, lat) order, as GeoJSON and Earth Engine expect
    #[must_use]
    pub fn ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ]
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}
