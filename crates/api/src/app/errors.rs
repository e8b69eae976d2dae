use core::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use saude_core::DomainError;
use saude_records::ProjectionError;

use crate::app::services::ServiceError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::RuleViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "rule_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

/// A stored vaccination that cannot be projected is a data-integrity fault.
pub fn projection_error_to_response(err: ProjectionError) -> axum::response::Response {
    tracing::error!(error = %err, "vaccination projection failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "projection_error", err.to_string())
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Projection(e) => projection_error_to_response(e),
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "write not persisted");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "mensagem": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path identifier, answering 400 `invalid_id` on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}
