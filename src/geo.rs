use crate::models::Coordinates;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters. Non-finite input yields `f64::INFINITY`
/// so that callers comparing against a radius never match it.
pub fn distance_m(a: Coordinates, b: Coordinates) -> f64 {
    if !(a.lat.is_finite() && a.lng.is_finite() && b.lat.is_finite() && b.lng.is_finite()) {
        return f64::INFINITY;
    }
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

pub fn within_radius(center: Coordinates, point: Coordinates, radius_m: f64) -> bool {
    distance_m(center, point) <= radius_m
}

/// Point `meters` due north of `origin`.
#[cfg(test)]
pub(crate) fn offset_north(origin: Coordinates, meters: f64) -> Coordinates {
    let d_lat = (meters / EARTH_RADIUS_M).to_degrees();
    Coordinates::new(origin.lat + d_lat, origin.lng)
}

/// Linear interpolation between two points, `t` clamped to `[0, 1]`.
pub fn lerp(from: Coordinates, to: Coordinates, t: f64) -> Coordinates {
    let t = t.clamp(0.0, 1.0);
    Coordinates::new(
        from.lat + (to.lat - from.lat) * t,
        from.lng + (to.lng - from.lng) * t,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_CENTER;

    #[test]
    fn zero_distance_to_self() {
        assert!(distance_m(DEFAULT_CENTER, DEFAULT_CENTER).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(1.0, 0.0);
        let d = distance_m(a, b);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn offset_north_round_trips_through_distance() {
        let moved = offset_north(DEFAULT_CENTER, 500.0);
        let d = distance_m(DEFAULT_CENTER, moved);
        assert!((d - 500.0).abs() < 0.5, "got {d}");
    }

    #[test]
    fn nan_is_never_in_range() {
        let bad = Coordinates::new(f64::NAN, 0.0);
        assert_eq!(distance_m(DEFAULT_CENTER, bad), f64::INFINITY);
        assert!(!within_radius(DEFAULT_CENTER, bad, f64::MAX));
    }

    #[test]
    fn buenos_aires_mock_distances() {
        // Obelisco to Av. Corrientes 1200.
        let provider = Coordinates::new(-34.6050, -58.3850);
        let d = distance_m(DEFAULT_CENTER, provider);
        assert!(d > 300.0 && d < 400.0, "got {d}");
    }

    #[test]
    fn lerp_clamps() {
        let a = Coordinates::new(0.0, 0.0);
        let b = Coordinates::new(1.0, 2.0);
        assert_eq!(lerp(a, b, 0.5), Coordinates::new(0.5, 1.0));
        assert_eq!(lerp(a, b, 3.0), b);
        assert_eq!(lerp(a, b, -1.0), a);
    }
}
