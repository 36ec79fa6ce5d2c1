pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Only a complete pair is a point; a lone latitude or longitude is ignored.
    pub fn from_pair(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => Some(Self { lat, lon }),
            _ => None,
        }
    }
}

/// Great-circle distance in kilometres between `origin` (the query point)
/// and `target` (a stored hospital).
///
/// This has to stay term-for-term identical to `DISTANCE_SQL` in the DuckDB
/// repository so both backends agree on radius edges.
pub fn distance_km(origin: GeoPoint, target: GeoPoint) -> f64 {
    // cos^2 + sin^2 is not always exactly 1.0 in floating point, so a
    // coincident point would otherwise sit a few centimetres away.
    if origin == target {
        return 0.0;
    }
    let lat_q = origin.lat.to_radians();
    let lon_q = origin.lon.to_radians();
    let lat_h = target.lat.to_radians();
    let lon_h = target.lon.to_radians();

    let cos_angle = lat_q.cos() * lat_h.cos() * (lon_h - lon_q).cos() + lat_q.sin() * lat_h.sin();
    // Rounding can push the argument just past +/-1.
    EARTH_RADIUS_KM * cos_angle.clamp(-1.0, 1.0).acos()
}

pub fn within_radius(origin: GeoPoint, target: GeoPoint, radius_km: f64) -> bool {
    distance_km(origin, target) <= radius_km
}
