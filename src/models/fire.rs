//! Fire detections and labelled fire locations

use super::Coordinates;
use serde::{Deserialize, Serialize};

/// A thermal-anomaly point produced by hotspot vectorization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireDetection {
    pub coordinates: Coordinates,
    /// Mean `Bright_ti4` brightness temperature of the cluster in Kelvin
    pub brightness: Option<f64>,
}

/// A fire point with its human-readable label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireLocation {
    pub label: String,
    pub coordinates: Coordinates,
    pub brightness: Option<f64>,
}

/// Label → fire point mapping that keeps first-insertion order.
///
/// Inserting a label that is already present replaces that entry in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FireLocations {
    entries: Vec<FireLocation>,
}

impl FireLocations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: FireLocation) {
        match self.entries.iter_mut().find(|e| e.label == location.label) {
            Some(existing) => *existing = location,
            None => self.entries.push(location),
        }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&FireLocation> {
        self.entries.iter().find(|e| e.label == label)
    }

    #[must_use]
    pub fn first(&self) -> Option<&FireLocation> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FireLocation> {
        self.entries.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire(label: &str, lat: f64, lon: f64) -> FireLocation {
        FireLocation {
            label: label.to_string(),
            coordinates: Coordinates::new(lat, lon),
            brightness: None,
        }
    }

    #[test]
    fn test_collision_overwrites_in_place() {
        let mut fires = FireLocations::new();
        fires.insert(fire("Paradise, Butte County", 39.76, -121.62));
        fires.insert(fire("Chico, Butte County", 39.73, -121.84));
        fires.insert(fire("Paradise, Butte County", 39.77, -121.60));

        assert_eq!(fires.len(), 2);
        assert_eq!(
            fires.labels().collect::<Vec<_>>(),
            vec!["Paradise, Butte County", "Chico, Butte County"]
        );
        let paradise = fires.get("Paradise, Butte County").unwrap();
        assert_eq!(paradise.coordinates, Coordinates::new(39.77, -121.60));
    }

    #[test]
    fn test_empty() {
        let fires = FireLocations::new();
        assert!(fires.is_empty());
        assert!(fires.first().is_none());
    }
}
