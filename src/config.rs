use crate::geofence::{AllowedZone, GeoPoint};
use anyhow::{Context, bail};
use serde::Deserialize;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,

    // Upstream provider; no API key means mock mode
    pub provider_base_url: Option<String>,
    pub provider_api_key: Option<String>,

    // Geofencing
    pub validate_location: bool,
    pub allowed_zones: Vec<AllowedZone>,

    pub allowed_origins: Option<Vec<String>>,
    pub app_env: String,
}

/// One entry of the `ALLOWED_ZONES` JSON array. `radiusMeters` is optional;
/// entries without it inherit `ZONE_RADIUS_METERS`.
#[derive(Deserialize)]
struct ZoneEntry {
    latitude: f64,
    longitude: f64,
    #[serde(rename = "radiusMeters")]
    radius_meters: Option<f64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let zone_radius_meters = parse_radius(
            &env::var("ZONE_RADIUS_METERS").unwrap_or_else(|_| "100".to_string()),
        )?;
        let allowed_zones = parse_zones(
            &env::var("ALLOWED_ZONES").unwrap_or_else(|_| "[]".to_string()),
            zone_radius_meters,
        )?;

        let provider_api_key = non_empty(env::var("PROVIDER_API_KEY").ok());
        let provider_base_url = non_empty(env::var("PROVIDER_BASE_URL").ok());
        if provider_api_key.is_some() && provider_base_url.is_none() {
            bail!("PROVIDER_BASE_URL must be set when PROVIDER_API_KEY is configured");
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            provider_base_url,
            provider_api_key,
            validate_location: parse_flag(
                &env::var("VALIDATE_LOCATION").unwrap_or_default(),
            ),
            allowed_zones,
            allowed_origins: parse_origins(env::var("ALLOWED_ORIGINS").ok().as_deref()),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Development mode exposes upstream error detail in 500 envelopes.
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim(), "true" | "1")
}

fn parse_radius(raw: &str) -> anyhow::Result<f64> {
    let radius: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("ZONE_RADIUS_METERS is not a number: {raw:?}"))?;
    if !radius.is_finite() || radius <= 0.0 {
        bail!("ZONE_RADIUS_METERS must be a positive number, got {raw:?}");
    }
    Ok(radius)
}

fn parse_zones(raw: &str, default_radius: f64) -> anyhow::Result<Vec<AllowedZone>> {
    let entries: Vec<ZoneEntry> = serde_json::from_str(raw).context(
        "ALLOWED_ZONES must be a JSON array of {latitude, longitude, radiusMeters?} objects",
    )?;

    let mut zones = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.latitude.is_finite() || entry.latitude.abs() > 90.0 {
            bail!("allowed zone latitude out of range: {}", entry.latitude);
        }
        if !entry.longitude.is_finite() || entry.longitude.abs() > 180.0 {
            bail!("allowed zone longitude out of range: {}", entry.longitude);
        }
        let radius_meters = entry.radius_meters.unwrap_or(default_radius);
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            bail!("allowed zone radius must be positive, got {radius_meters}");
        }

        zones.push(AllowedZone {
            center: GeoPoint {
                latitude: entry.latitude,
                longitude: entry.longitude,
            },
            radius_meters,
        });
    }

    Ok(zones)
}

fn parse_origins(raw: Option<&str>) -> Option<Vec<String>> {
    let origins: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() { None } else { Some(origins) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_true_and_one() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" true "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn zones_default_to_empty_list() {
        let zones = parse_zones("[]", 100.0).unwrap();
        assert!(zones.is_empty());
    }

    #[test]
    fn zones_inherit_default_radius() {
        let zones = parse_zones(r#"[{"latitude": -6.2, "longitude": 106.816}]"#, 150.0).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].center.latitude, -6.2);
        assert_eq!(zones[0].center.longitude, 106.816);
        assert_eq!(zones[0].radius_meters, 150.0);
    }

    #[test]
    fn zone_radius_can_be_overridden_per_entry() {
        let zones = parse_zones(
            r#"[
                {"latitude": -6.2, "longitude": 106.816, "radiusMeters": 50},
                {"latitude": -6.3, "longitude": 106.9}
            ]"#,
            100.0,
        )
        .unwrap();
        assert_eq!(zones[0].radius_meters, 50.0);
        assert_eq!(zones[1].radius_meters, 100.0);
    }

    #[test]
    fn malformed_zone_json_is_rejected() {
        assert!(parse_zones("not json", 100.0).is_err());
        assert!(parse_zones(r#"{"latitude": 1}"#, 100.0).is_err());
        assert!(parse_zones(r#"[{"latitude": 1}]"#, 100.0).is_err());
    }

    #[test]
    fn out_of_range_zone_coordinates_are_rejected() {
        assert!(parse_zones(r#"[{"latitude": 91.0, "longitude": 0.0}]"#, 100.0).is_err());
        assert!(parse_zones(r#"[{"latitude": 0.0, "longitude": -181.0}]"#, 100.0).is_err());
    }

    #[test]
    fn non_positive_zone_radius_is_rejected() {
        let raw = r#"[{"latitude": 0.0, "longitude": 0.0, "radiusMeters": 0}]"#;
        assert!(parse_zones(raw, 100.0).is_err());
        assert!(parse_zones(r#"[{"latitude": 0.0, "longitude": 0.0}]"#, -5.0).is_err());
    }

    #[test]
    fn radius_parsing_rejects_garbage() {
        assert!(parse_radius("100").is_ok());
        assert!(parse_radius("12.5").is_ok());
        assert!(parse_radius("meters").is_err());
        assert!(parse_radius("-3").is_err());
        assert!(parse_radius("0").is_err());
    }

    #[test]
    fn origins_split_on_commas() {
        let origins = parse_origins(Some("https://a.example, https://b.example"));
        assert_eq!(
            origins,
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert_eq!(parse_origins(Some("")), None);
        assert_eq!(parse_origins(None), None);
    }
}
