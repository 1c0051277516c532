use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = -6.2005)]
    pub latitude: f64,
    #[schema(example = 106.8165)]
    pub longitude: f64,
}

/// Circular region around a center coordinate. Built once from
/// configuration at startup, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllowedZone {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

#[derive(Debug, Clone)]
pub struct Geofence {
    zones: Vec<AllowedZone>,
}

impl Geofence {
    pub fn new(zones: Vec<AllowedZone>) -> Self {
        Self { zones }
    }

    /// An empty zone list means no restriction is configured, so any point
    /// is admitted. Otherwise the point must fall within at least one zone
    /// (boundary inclusive).
    pub fn is_within_allowed_zone(&self, point: GeoPoint) -> bool {
        if self.zones.is_empty() {
            return true;
        }

        self.zones
            .iter()
            .any(|zone| haversine_distance(point, zone.center) <= zone.radius_meters)
    }
}

/// Great-circle distance in meters between two points, haversine formula.
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}
