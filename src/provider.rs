use crate::config::Config;
use crate::geofence::GeoPoint;
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// ISO-8601 timestamp with millisecond precision, e.g. `2026-08-21T09:00:01.123Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockKind {
    In,
    Out,
}

impl ClockKind {
    pub fn verb(&self) -> &'static str {
        match self {
            ClockKind::In => "Clock in",
            ClockKind::Out => "Clock out",
        }
    }

    /// Lowercase form, used in error messages like "Invalid location for clock in".
    pub fn label(&self) -> &'static str {
        match self {
            ClockKind::In => "clock in",
            ClockKind::Out => "clock out",
        }
    }

    /// Key carrying the timestamp in response payloads.
    pub fn time_key(&self) -> &'static str {
        match self {
            ClockKind::In => "clockInTime",
            ClockKind::Out => "clockOutTime",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            ClockKind::In => "/attendance/clockin",
            ClockKind::Out => "/attendance/clockout",
        }
    }
}

/// One clock-in/clock-out request as seen by the provider. Built per
/// incoming request, immutable afterwards, never persisted here.
#[derive(Debug, Clone)]
pub struct AttendanceEvent {
    pub employee_id: String,
    pub timestamp: String,
    pub location: Option<GeoPoint>,
    pub notes: String,
    pub device_info: String,
    pub source_ip: String,
}

/// Wire body for the provider's clock endpoints (snake_case field names).
/// Exactly one of `clock_in_time` / `clock_out_time` is present; a missing
/// location is sent as an explicit `null`.
#[derive(Serialize)]
struct ClockPayload<'a> {
    employee_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    clock_in_time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clock_out_time: Option<&'a str>,
    location: Option<GeoPoint>,
    notes: &'a str,
    device_info: &'a str,
    ip_address: &'a str,
}

impl<'a> ClockPayload<'a> {
    fn from_event(kind: ClockKind, event: &'a AttendanceEvent) -> Self {
        Self {
            employee_id: &event.employee_id,
            clock_in_time: matches!(kind, ClockKind::In).then_some(event.timestamp.as_str()),
            clock_out_time: matches!(kind, ClockKind::Out).then_some(event.timestamp.as_str()),
            location: event.location,
            notes: &event.notes,
            device_info: &event.device_info,
            ip_address: &event.source_ip,
        }
    }
}

/// What the provider (or the mock) answered. `message` is a human-readable
/// success line; real read replies carry none.
#[derive(Debug)]
pub struct ProviderReply {
    pub message: Option<String>,
    pub data: Value,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Upstream client. The variant is chosen once at construction: with a
/// configured credential every call goes to the provider's REST API, without
/// one every call is answered locally with mock data. Handlers never see
/// which variant they hold.
pub enum ProviderClient {
    Real(RealProvider),
    Mock(MockProvider),
}

impl ProviderClient {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match &config.provider_api_key {
            Some(api_key) => {
                let base_url = config.provider_base_url.clone().context(
                    "PROVIDER_BASE_URL must be set when PROVIDER_API_KEY is configured",
                )?;
                Ok(ProviderClient::Real(RealProvider::new(
                    base_url,
                    api_key.clone(),
                )?))
            }
            None => {
                warn!("PROVIDER_API_KEY not set, provider calls will return mock data");
                Ok(ProviderClient::Mock(MockProvider))
            }
        }
    }

    /// Clock an employee in or out. One provider call, no retry.
    pub async fn clock(
        &self,
        kind: ClockKind,
        event: &AttendanceEvent,
    ) -> Result<ProviderReply, ProviderError> {
        match self {
            ProviderClient::Real(real) => real.clock(kind, event).await,
            ProviderClient::Mock(mock) => Ok(mock.clock(kind, event)),
        }
    }

    pub async fn attendance_records(
        &self,
        employee_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<ProviderReply, ProviderError> {
        match self {
            ProviderClient::Real(real) => {
                real.attendance_records(employee_id, start_date, end_date).await
            }
            ProviderClient::Mock(mock) => {
                Ok(mock.attendance_records(employee_id, start_date, end_date))
            }
        }
    }

    pub async fn attendance_summary(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<ProviderReply, ProviderError> {
        match self {
            ProviderClient::Real(real) => real.attendance_summary(employee_id, month, year).await,
            ProviderClient::Mock(mock) => Ok(mock.attendance_summary(employee_id, month, year)),
        }
    }
}

pub struct RealProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RealProvider {
    fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build provider HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn clock(
        &self,
        kind: ClockKind,
        event: &AttendanceEvent,
    ) -> Result<ProviderReply, ProviderError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, kind.endpoint()))
            .bearer_auth(&self.api_key)
            .json(&ClockPayload::from_event(kind, event))
            .send()
            .await?;
        let data = read_reply(response).await?;

        Ok(ProviderReply {
            message: Some(format!("{} successful", kind.verb())),
            data,
        })
    }

    async fn attendance_records(
        &self,
        employee_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<ProviderReply, ProviderError> {
        let response = self
            .http
            .get(format!("{}/attendance/records", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[
                ("employee_id", employee_id),
                ("start_date", start_date),
                ("end_date", end_date),
            ])
            .send()
            .await?;
        let data = read_reply(response).await?;

        Ok(ProviderReply { message: None, data })
    }

    async fn attendance_summary(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> Result<ProviderReply, ProviderError> {
        let response = self
            .http
            .get(format!("{}/attendance/summary", self.base_url))
            .bearer_auth(&self.api_key)
            .query(&[
                ("employee_id", employee_id.to_string()),
                ("month", month.to_string()),
                ("year", year.to_string()),
            ])
            .send()
            .await?;
        let data = read_reply(response).await?;

        Ok(ProviderReply { message: None, data })
    }
}

/// Non-2xx becomes `ProviderError::Status` with the body text attached. A
/// 2xx body that is empty or not JSON reads as `Value::Null`, not a failure.
async fn read_reply(response: reqwest::Response) -> Result<Value, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
}

/// Answers every call locally with deterministic data marked `mock: true`,
/// so the service stays usable without provider access.
pub struct MockProvider;

impl MockProvider {
    fn clock(&self, kind: ClockKind, event: &AttendanceEvent) -> ProviderReply {
        let mut data = serde_json::Map::new();
        data.insert("employeeId".to_string(), json!(event.employee_id));
        data.insert(kind.time_key().to_string(), json!(event.timestamp));
        data.insert("location".to_string(), json!(event.location));
        data.insert("notes".to_string(), json!(event.notes));
        data.insert("mock".to_string(), json!(true));

        ProviderReply {
            message: Some(format!(
                "{} successful (Mock Mode - Configure PROVIDER_API_KEY for real API)",
                kind.verb()
            )),
            data: Value::Object(data),
        }
    }

    fn attendance_records(
        &self,
        employee_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> ProviderReply {
        ProviderReply {
            message: Some(
                "Mock attendance data (Configure PROVIDER_API_KEY for real API)".to_string(),
            ),
            data: json!({
                "employeeId": employee_id,
                "period": {
                    "startDate": start_date,
                    "endDate": end_date,
                },
                "records": [
                    {
                        "date": Utc::now().format("%Y-%m-%d").to_string(),
                        "clockIn": "09:00:00",
                        "clockOut": "17:00:00",
                        "workingHours": 8,
                        "status": "Present",
                    }
                ],
                "mock": true,
            }),
        }
    }

    fn attendance_summary(&self, employee_id: &str, month: u32, year: i32) -> ProviderReply {
        ProviderReply {
            message: Some(
                "Mock attendance summary (Configure PROVIDER_API_KEY for real API)".to_string(),
            ),
            data: json!({
                "employeeId": employee_id,
                "period": format!("{year}-{month:02}"),
                "summary": {
                    "totalWorkingDays": 22,
                    "presentDays": 20,
                    "absentDays": 2,
                    "lateDays": 3,
                    "overtimeHours": 15,
                    "totalWorkingHours": 160,
                },
                "mock": true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, rt, web};
    use std::collections::HashMap;

    fn test_config(api_key: Option<&str>, base_url: Option<&str>) -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            provider_base_url: base_url.map(str::to_string),
            provider_api_key: api_key.map(str::to_string),
            validate_location: false,
            allowed_zones: Vec::new(),
            allowed_origins: None,
            app_env: "development".to_string(),
        }
    }

    fn sample_event(location: Option<GeoPoint>) -> AttendanceEvent {
        AttendanceEvent {
            employee_id: "EMP-001".to_string(),
            timestamp: "2026-08-21T09:00:00.000Z".to_string(),
            location,
            notes: "on site".to_string(),
            device_info: "TestAgent/1.0".to_string(),
            source_ip: "10.0.0.1".to_string(),
        }
    }

    #[test]
    fn missing_credential_selects_mock_provider() {
        let client = ProviderClient::from_config(&test_config(None, None)).unwrap();
        assert!(matches!(client, ProviderClient::Mock(_)));
    }

    #[test]
    fn credential_selects_real_provider() {
        let config = test_config(Some("secret"), Some("https://provider.example"));
        let client = ProviderClient::from_config(&config).unwrap();
        assert!(matches!(client, ProviderClient::Real(_)));
    }

    #[test]
    fn credential_without_base_url_is_a_startup_error() {
        let config = test_config(Some("secret"), None);
        assert!(ProviderClient::from_config(&config).is_err());
    }

    #[test]
    fn clock_payload_uses_wire_field_names() {
        let event = sample_event(Some(GeoPoint {
            latitude: -6.2005,
            longitude: 106.8165,
        }));
        let value = serde_json::to_value(ClockPayload::from_event(ClockKind::In, &event)).unwrap();

        assert_eq!(value["employee_id"], json!("EMP-001"));
        assert_eq!(value["clock_in_time"], json!("2026-08-21T09:00:00.000Z"));
        assert!(value.get("clock_out_time").is_none());
        assert_eq!(value["location"]["latitude"], json!(-6.2005));
        assert_eq!(value["location"]["longitude"], json!(106.8165));
        assert_eq!(value["notes"], json!("on site"));
        assert_eq!(value["device_info"], json!("TestAgent/1.0"));
        assert_eq!(value["ip_address"], json!("10.0.0.1"));
    }

    #[test]
    fn clock_out_payload_carries_clock_out_time_only() {
        let event = sample_event(None);
        let value = serde_json::to_value(ClockPayload::from_event(ClockKind::Out, &event)).unwrap();

        assert_eq!(value["clock_out_time"], json!("2026-08-21T09:00:00.000Z"));
        assert!(value.get("clock_in_time").is_none());
    }

    #[test]
    fn clock_payload_sends_explicit_null_location() {
        let event = sample_event(None);
        let value = serde_json::to_value(ClockPayload::from_event(ClockKind::In, &event)).unwrap();

        assert!(value.as_object().unwrap().contains_key("location"));
        assert_eq!(value["location"], Value::Null);
    }

    #[actix_web::test]
    async fn mock_clock_echoes_the_event() {
        let client = ProviderClient::from_config(&test_config(None, None)).unwrap();
        let event = sample_event(Some(GeoPoint {
            latitude: -6.2005,
            longitude: 106.8165,
        }));

        let reply = client.clock(ClockKind::In, &event).await.unwrap();

        assert_eq!(
            reply.message.as_deref(),
            Some("Clock in successful (Mock Mode - Configure PROVIDER_API_KEY for real API)")
        );
        assert_eq!(reply.data["employeeId"], json!("EMP-001"));
        assert_eq!(reply.data["clockInTime"], json!("2026-08-21T09:00:00.000Z"));
        assert_eq!(reply.data["location"]["latitude"], json!(-6.2005));
        assert_eq!(reply.data["notes"], json!("on site"));
        assert_eq!(reply.data["mock"], json!(true));
    }

    #[actix_web::test]
    async fn mock_clock_out_uses_clock_out_time_key() {
        let client = ProviderClient::from_config(&test_config(None, None)).unwrap();
        let event = sample_event(None);

        let reply = client.clock(ClockKind::Out, &event).await.unwrap();

        assert_eq!(reply.data["clockOutTime"], json!("2026-08-21T09:00:00.000Z"));
        assert!(reply.data.get("clockInTime").is_none());
        assert_eq!(reply.data["location"], Value::Null);
    }

    #[actix_web::test]
    async fn mock_records_carry_the_requested_window() {
        let client = ProviderClient::from_config(&test_config(None, None)).unwrap();

        let reply = client
            .attendance_records("EMP-007", "2026-08-01", "2026-08-31")
            .await
            .unwrap();

        assert_eq!(
            reply.message.as_deref(),
            Some("Mock attendance data (Configure PROVIDER_API_KEY for real API)")
        );
        assert_eq!(reply.data["employeeId"], json!("EMP-007"));
        assert_eq!(reply.data["period"]["startDate"], json!("2026-08-01"));
        assert_eq!(reply.data["period"]["endDate"], json!("2026-08-31"));
        assert_eq!(reply.data["records"][0]["workingHours"], json!(8));
        assert_eq!(reply.data["records"][0]["status"], json!("Present"));
        assert_eq!(reply.data["mock"], json!(true));
    }

    #[actix_web::test]
    async fn mock_summary_period_is_zero_padded() {
        let client = ProviderClient::from_config(&test_config(None, None)).unwrap();

        let reply = client.attendance_summary("EMP-007", 3, 2026).await.unwrap();

        assert_eq!(reply.data["period"], json!("2026-03"));
        assert_eq!(reply.data["summary"]["totalWorkingDays"], json!(22));
        assert_eq!(reply.data["summary"]["presentDays"], json!(20));
        assert_eq!(reply.data["mock"], json!(true));
    }

    #[test]
    fn timestamp_is_iso_8601_with_millis() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'), "expected Z suffix: {ts}");
        // 2026-08-21T09:00:01.123Z
        assert_eq!(ts.len(), 24, "unexpected length: {ts}");
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }

    /// Local upstream for driving the real provider over the wire: one route
    /// echoes the request, one fails, one answers 200 with no body.
    fn spawn_stub_upstream() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route(
                    "/attendance/records",
                    web::get().to(
                        |req: HttpRequest, query: web::Query<HashMap<String, String>>| async move {
                            let auth = req
                                .headers()
                                .get("authorization")
                                .and_then(|value| value.to_str().ok())
                                .unwrap_or_default()
                                .to_string();
                            HttpResponse::Ok().json(json!({ "auth": auth, "query": *query }))
                        },
                    ),
                )
                .route(
                    "/attendance/clockin",
                    web::post().to(|| async {
                        HttpResponse::ServiceUnavailable().json(json!({ "error": "maintenance" }))
                    }),
                )
                .route(
                    "/attendance/clockout",
                    web::post().to(|| async { HttpResponse::Ok().finish() }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        rt::spawn(server.run());
        format!("http://{addr}")
    }

    #[actix_web::test]
    async fn real_provider_forwards_record_queries_with_bearer_auth() {
        let base_url = spawn_stub_upstream();
        let config = test_config(Some("test-key"), Some(&base_url));
        let client = ProviderClient::from_config(&config).unwrap();

        let reply = client
            .attendance_records("EMP-007", "2026-08-01", "2026-08-31")
            .await
            .unwrap();

        assert!(reply.message.is_none());
        assert_eq!(reply.data["auth"], json!("Bearer test-key"));
        assert_eq!(reply.data["query"]["employee_id"], json!("EMP-007"));
        assert_eq!(reply.data["query"]["start_date"], json!("2026-08-01"));
        assert_eq!(reply.data["query"]["end_date"], json!("2026-08-31"));
    }

    #[actix_web::test]
    async fn real_provider_surfaces_upstream_status_errors() {
        let base_url = spawn_stub_upstream();
        let config = test_config(Some("test-key"), Some(&base_url));
        let client = ProviderClient::from_config(&config).unwrap();

        let err = client
            .clock(ClockKind::In, &sample_event(None))
            .await
            .unwrap_err();

        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 503);
                assert!(body.contains("maintenance"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn empty_2xx_reply_reads_as_success_with_no_data() {
        let base_url = spawn_stub_upstream();
        let config = test_config(Some("test-key"), Some(&base_url));
        let client = ProviderClient::from_config(&config).unwrap();

        let reply = client
            .clock(ClockKind::Out, &sample_event(None))
            .await
            .unwrap();

        assert_eq!(reply.message.as_deref(), Some("Clock out successful"));
        assert_eq!(reply.data, Value::Null);
    }
}
