/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_campus_to_downtown() {
        // UFMG main campus
        let campus = (-19.8707, -43.9676);
        // Praça Sete, downtown Belo Horizonte
        let downtown = (-19.9320, -43.9385);

        let distance = haversine_distance(campus.0, campus.1, downtown.0, downtown.1);
        // Should be approximately 6-9 km
        assert!(distance > 5.0 && distance < 10.0);
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let d = haversine_distance(-19.87, -43.96, -19.87, -43.96);
        assert!(d.abs() < 1e-9);
    }
}
