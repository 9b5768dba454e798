//! Unit tests for geographic math.

use stepquest::geo::{bearing_degrees, distance_meters, Coordinate};

#[test]
fn test_distance_between_known_cities() {
    let paris = Coordinate::new(48.8566, 2.3522);
    let london = Coordinate::new(51.5074, -0.1278);

    // Roughly 344 km apart
    let d = distance_meters(paris, london);
    assert!((d - 344_000.0).abs() < 2_000.0, "got {}", d);
}

#[test]
fn test_distance_is_nonnegative_for_odd_input() {
    // Inputs are unconstrained degrees; the result is still >= 0
    let a = Coordinate::new(-200.0, 431.0);
    let b = Coordinate::new(95.0, -380.0);
    assert!(distance_meters(a, b) >= 0.0);
}

#[test]
fn test_short_distance_precision() {
    // Two points ~100m apart along a meridian
    let a = Coordinate::new(40.7812, -73.9665);
    let b = Coordinate::new(40.7812 + 100.0 / 111_195.0, -73.9665);

    let d = distance_meters(a, b);
    assert!((d - 100.0).abs() < 0.5, "got {}", d);
}

#[test]
fn test_bearing_range() {
    let a = Coordinate::new(40.0, -74.0);
    for (lat, lon) in [(41.0, -74.0), (40.0, -73.0), (39.0, -74.0), (40.0, -75.0)] {
        let bearing = bearing_degrees(a, Coordinate::new(lat, lon));
        assert!((0.0..360.0).contains(&bearing), "got {}", bearing);
    }
}
