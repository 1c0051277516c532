use crate::config::Config;
use crate::provider::now_timestamp;
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

const AVAILABLE_ROUTES: [&str; 8] = [
    "GET /",
    "GET /health",
    "POST /clockin",
    "POST /clockout",
    "GET /attendance/{employeeId}",
    "GET /attendance/{employeeId}/summary",
    "POST /bulk/clockin",
    "POST /bulk/clockout",
];

/// Liveness endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({
            "status": "OK",
            "message": "Attendance Gateway is running",
            "timestamp": "2026-08-21T09:00:01.123Z",
            "environment": "development",
            "version": "1.0.0"
        }))
    ),
    tag = "System"
)]
pub async fn health(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "message": "Attendance Gateway is running",
        "timestamp": now_timestamp(),
        "environment": config.app_env,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Service index
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Endpoint catalogue", body = Object, example = json!({
            "name": "Attendance Gateway API",
            "version": "1.0.0",
            "endpoints": { "health": "/health" },
            "documentation": "/swagger-ui/"
        }))
    ),
    tag = "System"
)]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "name": "Attendance Gateway API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "HR attendance proxy for employee clock in/out and attendance retrieval",
        "endpoints": {
            "health": "/health",
            "clockin": "/clockin",
            "clockout": "/clockout",
            "attendance": "/attendance/{employeeId}",
            "summary": "/attendance/{employeeId}/summary",
            "bulkClockin": "/bulk/clockin",
            "bulkClockout": "/bulk/clockout"
        },
        "documentation": "/swagger-ui/"
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "error": "Route not found",
        "message": format!("Cannot {} {}", req.method(), req.path()),
        "availableRoutes": AVAILABLE_ROUTES,
    }))
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({
        "error": "Method not allowed",
        "message": format!("Cannot {} {}", req.method(), req.path()),
        "availableRoutes": AVAILABLE_ROUTES,
    }))
}
