use crate::provider::ProviderError;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use serde_json::json;
use thiserror::Error;

/// Unified handler error. Every variant renders as a JSON envelope, so no
/// request ever ends in a bare framework error page.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    GeofenceRejected(String),

    #[error("{message}: {detail}")]
    Upstream { message: String, detail: String },
}

impl ApiError {
    /// Wrap a provider failure. The raw error text is only exposed when the
    /// service runs in development mode; production callers get a generic
    /// detail line.
    pub fn upstream(message: &str, err: ProviderError, expose_detail: bool) -> Self {
        let detail = if expose_detail {
            err.to_string()
        } else {
            "Internal server error".to_string()
        };
        ApiError::Upstream {
            message: message.to_string(),
            detail,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::GeofenceRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(message) | ApiError::GeofenceRejected(message) => {
                json!({ "success": false, "message": message })
            }
            ApiError::Upstream { message, detail } => {
                json!({ "success": false, "message": message, "error": detail })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Malformed JSON bodies get the same 400 envelope as handler validation.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid JSON body: {err}");
        let response =
            HttpResponse::BadRequest().json(json!({ "success": false, "message": message }));
        InternalError::from_response(err, response).into()
    })
}

/// Same treatment for unparseable query strings.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query string: {err}");
        let response =
            HttpResponse::BadRequest().json(json!({ "success": false, "message": message }));
        InternalError::from_response(err, response).into()
    })
}
