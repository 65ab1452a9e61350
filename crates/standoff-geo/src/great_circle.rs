//! Great-circle distance, bearing, and interpolation over `GeoPos` (§4.5).
//!
//! All angles in are degrees at the public boundary and radians internally.

use standoff_core::constants::{EARTH_RADIUS_KM, RADAR_HORIZON_COEFFICIENT};
use standoff_core::types::GeoPos;

fn to_radians(pos: GeoPos) -> (f64, f64) {
    (pos.lat.to_radians(), pos.lon.to_radians())
}

/// Great-circle distance between two points, in kilometers (haversine).
pub fn distance_km(a: GeoPos, b: GeoPos) -> f64 {
    let (lat1, lon1) = to_radians(a);
    let (lat2, lon2) = to_radians(b);

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` to `b`, in degrees clockwise from true north, `[0, 360)`.
pub fn initial_bearing_deg(a: GeoPos, b: GeoPos) -> f64 {
    let (lat1, lon1) = to_radians(a);
    let (lat2, lon2) = to_radians(b);
    let dlon = lon2 - lon1;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// Radar horizon distance contributed by a target's altitude (§4.8):
/// `k * sqrt(altitude_m)`, the standard refraction-corrected line-of-sight
/// approximation. Zero at ground level.
pub fn radar_horizon_km(altitude_m: f64) -> f64 {
    RADAR_HORIZON_COEFFICIENT * altitude_m.max(0.0).sqrt()
}

/// Point a fraction `t` (`0.0` at `a`, `1.0` at `b`) along the great-circle
/// arc between `a` and `b`, via spherical linear interpolation.
///
/// `t` is not clamped; callers extrapolating past `[0, 1]` get a point past
/// the endpoint along the same arc.
pub fn interpolate(a: GeoPos, b: GeoPos, t: f64) -> GeoPos {
    let (lat1, lon1) = to_radians(a);
    let (lat2, lon2) = to_radians(b);

    let d = distance_km(a, b) / EARTH_RADIUS_KM;
    if d.abs() < 1e-12 {
        return a;
    }

    let sin_d = d.sin();
    let coeff_a = ((1.0 - t) * d).sin() / sin_d;
    let coeff_b = (t * d).sin() / sin_d;

    let x = coeff_a * lat1.cos() * lon1.cos() + coeff_b * lat2.cos() * lon2.cos();
    let y = coeff_a * lat1.cos() * lon1.sin() + coeff_b * lat2.cos() * lon2.sin();
    let z = coeff_a * lat1.sin() + coeff_b * lat2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);

    GeoPos::new(lat.to_degrees(), lon.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = GeoPos::new(40.7, -74.0);
        assert!(distance_km(p, p) < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPos::new(40.7, -74.0);
        let b = GeoPos::new(51.5, -0.1);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-6);
    }

    #[test]
    fn new_york_to_london_is_roughly_right() {
        let nyc = GeoPos::new(40.7128, -74.0060);
        let london = GeoPos::new(51.5074, -0.1278);
        let d = distance_km(nyc, london);
        // Known great-circle distance is ~5570km.
        assert!((d - 5570.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn interpolation_endpoints_match_inputs() {
        let a = GeoPos::new(10.0, 20.0);
        let b = GeoPos::new(-5.0, 40.0);
        let start = interpolate(a, b, 0.0);
        let end = interpolate(a, b, 1.0);
        assert!((start.lat - a.lat).abs() < 1e-6);
        assert!((start.lon - a.lon).abs() < 1e-6);
        assert!((end.lat - b.lat).abs() < 1e-6);
        assert!((end.lon - b.lon).abs() < 1e-6);
    }

    #[test]
    fn interpolation_midpoint_is_closer_to_both_ends_than_full_distance() {
        let a = GeoPos::new(0.0, 0.0);
        let b = GeoPos::new(0.0, 90.0);
        let mid = interpolate(a, b, 0.5);
        let total = distance_km(a, b);
        let to_a = distance_km(a, mid);
        let to_b = distance_km(mid, b);
        assert!((to_a - total / 2.0).abs() < 1.0);
        assert!((to_b - total / 2.0).abs() < 1.0);
    }

    #[test]
    fn bearing_due_east_on_equator_is_ninety() {
        let a = GeoPos::new(0.0, 0.0);
        let b = GeoPos::new(0.0, 10.0);
        let bearing = initial_bearing_deg(a, b);
        assert!((bearing - 90.0).abs() < 0.5, "got {bearing}");
    }

    #[test]
    fn radar_horizon_is_zero_at_ground_level() {
        assert_eq!(radar_horizon_km(0.0), 0.0);
    }

    #[test]
    fn radar_horizon_grows_with_altitude() {
        let low = radar_horizon_km(1_000.0);
        let high = radar_horizon_km(100_000.0);
        assert!(high > low, "high={high} low={low}");
    }
}
