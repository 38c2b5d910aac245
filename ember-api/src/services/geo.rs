/// Haversine distance in miles between two lat/lon points.
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const R_MILES: f64 = 3958.8; // Earth radius
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    R_MILES * c
}

/// Distance between two users along the geolocation fallback chain:
/// coordinates on both sides, else residence-string equality, else unknown.
/// Unknown (None) is deliberately not zero: the feed filter lets it through.
pub fn distance_between(
    a_geo: Option<(f64, f64)>,
    a_residence: Option<&str>,
    b_geo: Option<(f64, f64)>,
    b_residence: Option<&str>,
) -> Option<f64> {
    if let (Some((lat1, lon1)), Some((lat2, lon2))) = (a_geo, b_geo) {
        return Some(haversine_miles(lat1, lon1, lat2, lon2));
    }

    match (a_residence, b_residence) {
        (Some(a), Some(b)) if a.trim().eq_ignore_ascii_case(b.trim()) => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_same_point() {
        assert!(haversine_miles(40.0, -75.0, 40.0, -75.0) < 1e-9);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // The swipe-feed example pair: ~8.6mi apart, rounds to 9.
        let d = haversine_miles(40.0, -75.0, 40.1, -75.1);
        assert!((8.0..9.5).contains(&d), "got {d}");
        assert_eq!(d.round() as i32, 9);
    }

    #[test]
    fn falls_back_to_residence_equality() {
        let d = distance_between(None, Some("Philadelphia"), Some((40.0, -75.0)), Some(" philadelphia "));
        assert_eq!(d, Some(0.0));
    }

    #[test]
    fn different_residences_are_unknown() {
        let d = distance_between(None, Some("Philadelphia"), None, Some("Boston"));
        assert_eq!(d, None);
    }

    #[test]
    fn no_signal_at_all_is_unknown() {
        assert_eq!(distance_between(None, None, None, None), None);
    }

    #[test]
    fn coordinates_win_over_residence() {
        // Same residence strings but real coordinates present on both sides.
        let d = distance_between(
            Some((40.0, -75.0)),
            Some("Philadelphia"),
            Some((40.1, -75.1)),
            Some("Philadelphia"),
        );
        assert!(d.unwrap() > 1.0);
    }
}
