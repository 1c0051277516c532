use crate::api::attendance::{
    check_location, device_info, merge_clock_data, require_employee_id, source_ip,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::geofence::{GeoPoint, Geofence};
use crate::provider::{AttendanceEvent, ClockKind, ProviderClient, now_timestamp};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkClockRequest {
    pub employees: Option<Vec<BulkEmployeeEntry>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkEmployeeEntry {
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    pub location: Option<GeoPoint>,
    #[schema(example = "Site visit")]
    pub notes: Option<String>,
}

/// Outcome of one entry. `employeeId` echoes the input and is omitted when
/// the entry never carried one.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkEntryResult {
    fn failure(employee_id: Option<String>, error: String) -> Self {
        Self {
            employee_id,
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Entries are processed strictly one at a time; a failing entry never
/// aborts the batch, so the response always carries one result per input.
async fn handle_bulk(
    kind: ClockKind,
    req: HttpRequest,
    payload: BulkClockRequest,
    config: &Config,
    geofence: &Geofence,
    provider: &ProviderClient,
) -> Result<HttpResponse, ApiError> {
    let employees = match payload.employees {
        Some(employees) if !employees.is_empty() => employees,
        _ => {
            return Err(ApiError::Validation(
                "Employees array is required".to_string(),
            ));
        }
    };

    let device_info = device_info(&req);
    let source_ip = source_ip(&req);

    let mut results = Vec::with_capacity(employees.len());
    for entry in employees {
        results
            .push(clock_entry(kind, entry, &device_info, &source_ip, config, geofence, provider).await);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": format!("Bulk {} completed", kind.label()),
        "results": results,
    })))
}

async fn clock_entry(
    kind: ClockKind,
    entry: BulkEmployeeEntry,
    device_info: &str,
    source_ip: &str,
    config: &Config,
    geofence: &Geofence,
    provider: &ProviderClient,
) -> BulkEntryResult {
    let employee_id = match require_employee_id(entry.employee_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return BulkEntryResult::failure(entry.employee_id, e.to_string()),
    };

    let location = match check_location(
        kind,
        entry.location.map(|point| point.latitude),
        entry.location.map(|point| point.longitude),
        config,
        geofence,
    ) {
        Ok(location) => location,
        Err(e) => return BulkEntryResult::failure(Some(employee_id), e.to_string()),
    };

    let event = AttendanceEvent {
        employee_id: employee_id.clone(),
        timestamp: now_timestamp(),
        location,
        notes: entry.notes.unwrap_or_default(),
        device_info: device_info.to_string(),
        source_ip: source_ip.to_string(),
    };

    match provider.clock(kind, &event).await {
        Ok(reply) => BulkEntryResult {
            employee_id: Some(employee_id.clone()),
            success: true,
            data: Some(merge_clock_data(
                kind,
                &employee_id,
                &event.timestamp,
                reply.data,
            )),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, %employee_id, "Bulk {} entry failed", kind.label());
            let detail = if config.is_development() {
                e.to_string()
            } else {
                "Internal server error".to_string()
            };
            BulkEntryResult::failure(Some(employee_id), detail)
        }
    }
}

/// Bulk clock-in endpoint
#[utoipa::path(
    post,
    path = "/bulk/clockin",
    request_body = BulkClockRequest,
    responses(
        (status = 200, description = "Per-entry results, one per input entry", body = Object, example = json!({
            "success": true,
            "message": "Bulk clock in completed",
            "results": [
                {
                    "employeeId": "EMP-001",
                    "success": true,
                    "data": { "employeeId": "EMP-001", "clockInTime": "2026-08-21T09:00:01.123Z" }
                },
                {
                    "employeeId": "EMP-002",
                    "success": false,
                    "error": "Invalid location for clock in"
                }
            ]
        })),
        (status = 400, description = "Missing or empty employees array", body = Object, example = json!({
            "success": false,
            "message": "Employees array is required"
        }))
    ),
    tag = "Bulk"
)]
pub async fn bulk_clock_in(
    req: HttpRequest,
    payload: web::Json<BulkClockRequest>,
    config: web::Data<Config>,
    geofence: web::Data<Geofence>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    handle_bulk(
        ClockKind::In,
        req,
        payload.into_inner(),
        config.get_ref(),
        geofence.get_ref(),
        provider.get_ref(),
    )
    .await
}

/// Bulk clock-out endpoint
#[utoipa::path(
    post,
    path = "/bulk/clockout",
    request_body = BulkClockRequest,
    responses(
        (status = 200, description = "Per-entry results, one per input entry", body = Object, example = json!({
            "success": true,
            "message": "Bulk clock out completed",
            "results": []
        })),
        (status = 400, description = "Missing or empty employees array", body = Object, example = json!({
            "success": false,
            "message": "Employees array is required"
        }))
    ),
    tag = "Bulk"
)]
pub async fn bulk_clock_out(
    req: HttpRequest,
    payload: web::Json<BulkClockRequest>,
    config: web::Data<Config>,
    geofence: web::Data<Geofence>,
    provider: web::Data<ProviderClient>,
) -> Result<HttpResponse, ApiError> {
    handle_bulk(
        ClockKind::Out,
        req,
        payload.into_inner(),
        config.get_ref(),
        geofence.get_ref(),
        provider.get_ref(),
    )
    .await
}
