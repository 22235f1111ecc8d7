//! Spherical helpers for the downwind spread overlay

use crate::models::{
    CompassDirection, Coordinates, EARTH_RADIUS_KM, SpreadProjection, WeatherReading,
};

/// Distance the spread projection reaches downwind
pub const SPREAD_DISTANCE_KM: f64 = 20.0;
/// Opening angle of the spread cone
pub const SPREAD_CONE_WIDTH_DEG: f64 = 60.0;
/// Arc subdivisions of the spread cone
pub const SPREAD_CONE_STEPS: usize = 10;

/// Point reached from `start` after `distance_km` along the initial `bearing_deg`
#[must_use]
pub fn destination_point(start: Coordinates, bearing_deg: f64, distance_km: f64) -> Coordinates {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = start.latitude.to_radians();
    let lon1 = start.longitude.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Coordinates::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Fan polygon around `direction_deg`: the center followed by `steps + 1` arc vertices
#[must_use]
pub fn sector_points(
    center: Coordinates,
    direction_deg: f64,
    radius_km: f64,
    width_deg: f64,
    steps: usize,
) -> Vec<Coordinates> {
    let start = direction_deg - width_deg / 2.0;
    let step = if steps == 0 {
        0.0
    } else {
        width_deg / steps as f64
    };

    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    points.extend((0..=steps).map(|i| destination_point(center, start + i as f64 * step, radius_km)));
    points
}

/// Spread geometry for a fire at `origin`, fanned out downwind of the reported wind
#[must_use]
pub fn project_spread(origin: Coordinates, weather: &WeatherReading) -> SpreadProjection {
    let bearing = weather.downwind_bearing();
    SpreadProjection {
        origin,
        bearing_deg: bearing,
        direction: CompassDirection::from_bearing(bearing),
        distance_km: SPREAD_DISTANCE_KM,
        endpoint: destination_point(origin, bearing, SPREAD_DISTANCE_KM),
        cone: sector_points(
            origin,
            bearing,
            SPREAD_DISTANCE_KM,
            SPREAD_CONE_WIDTH_DEG,
            SPREAD_CONE_STEPS,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_zero_distance_returns_start() {
        let end = destination_point(Coordinates::new(0.0, 0.0), 90.0, 0.0);
        assert!(end.latitude.abs() < 1e-12);
        assert!(end.longitude.abs() < 1e-12);
    }

    #[test]
    fn test_east_bearing_moves_along_equator() {
        let end = destination_point(Coordinates::new(0.0, 0.0), 90.0, 20.0);
        assert!(end.latitude.abs() < 1e-9);
        assert!(end.longitude > 0.0);
        let expected = (20.0 / EARTH_RADIUS_KM).to_degrees();
        assert!((end.longitude - expected).abs() < 1e-9);
    }

    #[test]
    fn test_north_bearing_increases_latitude() {
        let start = Coordinates::new(38.5, -121.5);
        let end = destination_point(start, 0.0, 20.0);
        assert!(end.latitude > start.latitude);
        assert!((end.longitude - start.longitude).abs() < 1e-9);
    }

    #[rstest]
    #[case(0.0, 0.0, 0.0, 10)]
    #[case(45.0, 7.0, 135.0, 10)]
    #[case(-33.9, 151.2, 300.0, 4)]
    #[case(64.1, -21.9, 10.0, 1)]
    fn test_sector_points_within_radius(
        #[case] lat: f64,
        #[case] lon: f64,
        #[case] direction: f64,
        #[case] steps: usize,
    ) {
        let center = Coordinates::new(lat, lon);
        let points = sector_points(center, direction, 20.0, 60.0, steps);

        assert_eq!(points.len(), steps + 2);
        assert_eq!(points[0], center);
        for point in &points {
            assert!(center.distance_km(point) <= 20.0 + 1e-6);
        }
        for point in &points[1..] {
            assert!((center.distance_km(point) - 20.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_project_spread_points_downwind() {
        // easterly wind pushes the fire west
        let weather = WeatherReading::new(30.0, 15.0, 6.0, 90.0);
        let origin = Coordinates::new(0.0, 0.0);
        let spread = project_spread(origin, &weather);

        assert_eq!(spread.cone.len(), SPREAD_CONE_STEPS + 2);
        assert_eq!(spread.distance_km, SPREAD_DISTANCE_KM);
        assert_eq!(spread.bearing_deg, 270.0);
        assert_eq!(spread.direction, CompassDirection::W);
        assert!(spread.endpoint.longitude < 0.0);
        assert!(spread.endpoint.latitude.abs() < 1e-9);
    }

    #[test]
    fn test_spread_endpoint_follows_wind_components() {
        let weather = WeatherReading::new(30.0, 15.0, 10.0, 0.0);
        let origin = Coordinates::new(0.0, 0.0);
        let spread = project_spread(origin, &weather);

        let (_, v) = weather.wind_components();
        assert!(v < 0.0);
        assert!(spread.endpoint.latitude < origin.latitude);
    }
}
