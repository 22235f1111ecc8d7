//! Location Resolution Module
//!
//! This module turns user location input (coordinates or free-text names)
//! into a resolved [`Location`]. Any failure here aborts the assessment.

use crate::geocoding::GeocodingClient;
use crate::models::Location;
use crate::{FireWatchError, Result};
use tracing::debug;

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Place name, address or postal code
    Name(String),
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Parse location input, treating anything that is not a valid coordinate pair as a name
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FireWatchError::validation("Location cannot be empty"));
        }

        if let Ok((lat, lon)) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(lat, lon));
        }

        Ok(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from string like "38.58,-121.49" or "38.58 -121.49"
    fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(FireWatchError::validation(
                "Coordinates must be in format 'lat,lon'",
            ));
        }

        let lat = parts[0]
            .parse::<f64>()
            .map_err(|_| FireWatchError::validation(format!("Invalid latitude: {}", parts[0])))?;
        let lon = parts[1]
            .parse::<f64>()
            .map_err(|_| FireWatchError::validation(format!("Invalid longitude: {}", parts[1])))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(FireWatchError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(FireWatchError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }

        Ok((lat, lon))
    }
}

/// Service for resolving location inputs
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve user input into a location, without retries or fuzzy correction
    pub async fn resolve(geocoder: &GeocodingClient, input: &str) -> Result<Location> {
        debug!("Resolving location input: {:?}", input);

        let location = match LocationParser::parse(input)? {
            LocationInput::Coordinates(lat, lon) => Location::new(lat, lon),
            LocationInput::Name(name) => geocoder
                .geocode(&name)
                .await?
                .ok_or_else(|| FireWatchError::location_not_found(name))?,
        };

        debug!(
            "Resolved location: {} at ({}, {})",
            location.display_name(),
            location.latitude,
            location.longitude
        );

        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeocodingConfig;
    use crate::test_support::spawn_stub;
    use axum::{Json, Router, routing::get};
    use serde_json::json;

    #[test]
    fn test_location_parser_coordinates() {
        assert_eq!(
            LocationParser::parse("38.58,-121.49").unwrap(),
            LocationInput::Coordinates(38.58, -121.49)
        );
        assert_eq!(
            LocationParser::parse("38.58 -121.49").unwrap(),
            LocationInput::Coordinates(38.58, -121.49)
        );
    }

    #[test]
    fn test_out_of_range_coordinates_are_names() {
        assert!(matches!(
            LocationParser::parse("91.0,8.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationParser::parse("46.0,-181.0").unwrap(),
            LocationInput::Name(_)
        ));
        assert!(matches!(
            LocationParser::parse("46.0,8.0,0.0").unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_location_parser_names() {
        assert_eq!(
            LocationParser::parse("  New South Wales ").unwrap(),
            LocationInput::Name("New South Wales".to_string())
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let err = LocationParser::parse("   ").unwrap_err();
        assert!(matches!(err, FireWatchError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_resolve_coordinates_skips_geocoder() {
        let geocoder = GeocodingClient::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeocodingConfig::default()
        })
        .unwrap();

        let location = LocationResolver::resolve(&geocoder, "-33.86, 151.21").await.unwrap();
        assert_eq!(location, Location::new(-33.86, 151.21));
    }

    #[tokio::test]
    async fn test_resolve_unknown_name_is_invalid_location() {
        let router = Router::new().route("/search", get(|| async { Json(json!([])) }));
        let base_url = spawn_stub(router).await;
        let geocoder = GeocodingClient::new(&GeocodingConfig {
            base_url,
            ..GeocodingConfig::default()
        })
        .unwrap();

        let err = LocationResolver::resolve(&geocoder, "Atlantis").await.unwrap_err();
        assert!(matches!(err, FireWatchError::LocationNotFound { .. }));
        assert_eq!(err.user_message(), "Invalid location");
    }

    #[tokio::test]
    async fn test_resolve_with_unreachable_geocoder_fails() {
        let geocoder = GeocodingClient::new(&GeocodingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..GeocodingConfig::default()
        })
        .unwrap();

        let err = LocationResolver::resolve(&geocoder, "California").await.unwrap_err();
        assert!(matches!(err, FireWatchError::Geocoding { .. }));
    }
}
