use crate::config::Config;
use crate::error::ApiError;
use crate::geofence::{GeoPoint, Geofence};
use crate::provider::{AttendanceEvent, ClockKind, ProviderClient, ProviderReply, now_timestamp};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Months, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, instrument};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClockRequest {
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = -6.2005)]
    pub latitude: Option<f64>,
    #[schema(example = 106.8165)]
    pub longitude: Option<f64>,
    #[schema(example = "Working from office")]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

// -------------------- Shared validation --------------------

pub(crate) fn require_employee_id(employee_id: Option<&str>) -> Result<String, ApiError> {
    match employee_id {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(ApiError::Validation("Employee ID is required".to_string())),
    }
}

/// Resolve the coordinates of one clock action. With location validation
/// enabled both coordinates must be present, in range and inside the
/// geofence; disabled, whatever pair arrived is passed through untouched.
pub(crate) fn check_location(
    kind: ClockKind,
    latitude: Option<f64>,
    longitude: Option<f64>,
    config: &Config,
    geofence: &Geofence,
) -> Result<Option<GeoPoint>, ApiError> {
    if !config.validate_location {
        return Ok(latitude
            .zip(longitude)
            .map(|(latitude, longitude)| GeoPoint { latitude, longitude }));
    }

    let (latitude, longitude) = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => (latitude, longitude),
        _ => {
            return Err(ApiError::Validation(
                "Location coordinates are required".to_string(),
            ));
        }
    };

    if !coordinates_in_range(latitude, longitude) {
        return Err(ApiError::Validation(
            "Invalid location coordinates".to_string(),
        ));
    }

    let point = GeoPoint { latitude, longitude };
    if !geofence.is_within_allowed_zone(point) {
        return Err(ApiError::GeofenceRejected(format!(
            "Invalid location for {}",
            kind.label()
        )));
    }

    Ok(Some(point))
}

fn coordinates_in_range(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && latitude.abs() <= 90.0
        && longitude.abs() <= 180.0
}

pub(crate) fn device_info(req: &HttpRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("Unknown")
        .to_string()
}

pub(crate) fn source_ip(req: &HttpRequest) -> String {
    let info = req.connection_info();
    info.realip_remote_addr().unwrap_or("unknown").to_string()
}

/// The gateway contributes `employeeId` and the timestamp; on conflict the
/// provider's own fields win. Non-object provider payloads contribute
/// nothing.
pub(crate) fn merge_clock_data(
    kind: ClockKind,
    employee_id: &str,
    timestamp: &str,
    upstream: Value,
) -> Value {
    let mut data = serde_json::Map::new();
    data.insert("employeeId".to_string(), json!(employee_id));
    data.insert(kind.time_key().to_string(), json!(timestamp));
    if let Value::Object(extra) = upstream {
        data.extend(extra);
    }
    Value::Object(data)
}

fn envelope(reply: ProviderReply) -> HttpResponse {
    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), json!(true));
    if let Some(message) = reply.message {
        body.insert("message".to_string(), json!(message));
    }
    body.insert("data".to_string(), reply.data);
    HttpResponse::Ok().json(Value::Object(body))
}

async fn handle_clock(
    kind: ClockKind,
    req: HttpRequest,
    payload: ClockRequest,
    config: &Config,
    geofence: &Geofence,
    provider: &ProviderClient,
) -> Result<HttpResponse, ApiError> {
    let employee_id = require_employee_id(payload.employee_id.as_deref())?;
    let location = check_location(kind, payload.latitude, payload.longitude, config, geofence)?;

    let event = AttendanceEvent {
        employee_id: employee_id.clone(),
        timestamp: now_timestamp(),
        location,
        notes: payload.notes.unwrap_or_default(),
        device_info: device_info(&req),
        source_ip: source_ip(&req),
    };

    let reply = provider.clock(kind, &event).await.map_err(|e| {
        error!(error = %e, %employee_id, "{} request failed", kind.verb());
        ApiError::upstream(
            &format!("{} failed", kind.verb()),
            e,
            config.is_development(),
        )
    })?;

    let data = merge_clock_data(kind, &employee_id, &event.timestamp, reply.data);
    Ok(envelope(ProviderReply {
        message: reply.message,
        data,
    }))
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/clockin",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clock in recorded", body = Object, example = json!({
            "success": true,
            "message": "Clock in successful",
            "data": {
                "employeeId": "EMP-001",
                "clockInTime": "2026-08-21T09:00:01.123Z"
            }
        })),
        (status = 400, description = "Missing employee ID or rejected location", body = Object, example = json!({
            "success": false,
            "message": "Employee ID is required"
        })),
        (status = 500, description = "Provider call failed", body = Object, example = json!({
            "success": false,
            "message": "Clock in failed",
            "error": "Internal server error"
        }))
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "clock_in",
    skip(req, payload, config, geofence, provider),
    fields(employee_id = ?payload.employee_id)
)]
pub async fn clock_in(
    req: HttpRequest,
    payload: web::Json<ClockRequest>,
    config: web::Data<Config>,
    geofence: web::Data<Geofence>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    handle_clock(
        ClockKind::In,
        req,
        payload.into_inner(),
        config.get_ref(),
        geofence.get_ref(),
        provider.get_ref(),
    )
    .await
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/clockout",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clock out recorded", body = Object, example = json!({
            "success": true,
            "message": "Clock out successful",
            "data": {
                "employeeId": "EMP-001",
                "clockOutTime": "2026-08-21T17:30:00.456Z"
            }
        })),
        (status = 400, description = "Missing employee ID or rejected location", body = Object, example = json!({
            "success": false,
            "message": "Invalid location for clock out"
        })),
        (status = 500, description = "Provider call failed", body = Object, example = json!({
            "success": false,
            "message": "Clock out failed",
            "error": "Internal server error"
        }))
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "clock_out",
    skip(req, payload, config, geofence, provider),
    fields(employee_id = ?payload.employee_id)
)]
pub async fn clock_out(
    req: HttpRequest,
    payload: web::Json<ClockRequest>,
    config: web::Data<Config>,
    geofence: web::Data<Geofence>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    handle_clock(
        ClockKind::Out,
        req,
        payload.into_inner(),
        config.get_ref(),
        geofence.get_ref(),
        provider.get_ref(),
    )
    .await
}

/// Attendance records for one employee, default window = current month
#[utoipa::path(
    get,
    path = "/attendance/{employeeId}",
    params(
        ("employeeId" = String, Path, description = "Employee identifier"),
        ("startDate", Query, description = "Window start, YYYY-MM-DD (defaults to first day of the current month)"),
        ("endDate", Query, description = "Window end, YYYY-MM-DD (defaults to last day of the current month)")
    ),
    responses(
        (status = 200, description = "Attendance records", body = Object, example = json!({
            "success": true,
            "data": {
                "employeeId": "EMP-001",
                "records": []
            }
        })),
        (status = 500, description = "Provider call failed", body = Object, example = json!({
            "success": false,
            "message": "Failed to get attendance records",
            "error": "Internal server error"
        }))
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    path: web::Path<String>,
    query: web::Query<AttendanceQuery>,
    config: web::Data<Config>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = require_employee_id(Some(path.as_str()))?;
    let (default_start, default_end) = current_month_window();
    let start_date = non_blank(query.start_date.as_deref()).unwrap_or(default_start);
    let end_date = non_blank(query.end_date.as_deref()).unwrap_or(default_end);

    let reply = provider
        .attendance_records(&employee_id, &start_date, &end_date)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Attendance records request failed");
            ApiError::upstream(
                "Failed to get attendance records",
                e,
                config.is_development(),
            )
        })?;

    Ok(envelope(reply))
}

/// Monthly attendance summary for one employee
#[utoipa::path(
    get,
    path = "/attendance/{employeeId}/summary",
    params(
        ("employeeId" = String, Path, description = "Employee identifier"),
        ("month", Query, description = "Month 1-12 (defaults to the current month)"),
        ("year", Query, description = "Year (defaults to the current year)")
    ),
    responses(
        (status = 200, description = "Attendance summary", body = Object, example = json!({
            "success": true,
            "data": {
                "employeeId": "EMP-001",
                "period": "2026-08"
            }
        })),
        (status = 500, description = "Provider call failed", body = Object, example = json!({
            "success": false,
            "message": "Failed to get attendance summary",
            "error": "Internal server error"
        }))
    ),
    tag = "Attendance"
)]
pub async fn get_attendance_summary(
    path: web::Path<String>,
    query: web::Query<SummaryQuery>,
    config: web::Data<Config>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    let employee_id = require_employee_id(Some(path.as_str()))?;
    let now = Utc::now();
    let month = query.month.unwrap_or_else(|| now.month());
    let year = query.year.unwrap_or_else(|| now.year());

    let reply = provider
        .attendance_summary(&employee_id, month, year)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Attendance summary request failed");
            ApiError::upstream(
                "Failed to get attendance summary",
                e,
                config.is_development(),
            )
        })?;

    Ok(envelope(reply))
}

/// Blank query values count as absent.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

/// First and last day of the current calendar month, YYYY-MM-DD.
fn current_month_window() -> (String, String) {
    let today = Utc::now().date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    )
}
