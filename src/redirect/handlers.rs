use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::models::ErrorResponse;
use crate::service::{LinkService, ServiceError};

pub struct RedirectState {
    pub service: Arc<LinkService>,
    pub redirect_status: StatusCode,
}

/// Redirect to the original URL, counting the visit.
pub async fn redirect_url(
    State(state): State<Arc<RedirectState>>,
    Path(short_id): Path<String>,
) -> Response {
    match state.service.resolve(&short_id).await {
        Ok(target) => match HeaderValue::from_str(&target) {
            Ok(location) => {
                (state.redirect_status, [(header::LOCATION, location)]).into_response()
            }
            Err(_) => {
                // URLs are validated at creation, so this only happens for
                // rows written by something other than this service.
                tracing::error!(short_id = %short_id, "stored URL is not a valid Location header");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        },
        Err(ServiceError::NotFound) => error_body(StatusCode::NOT_FOUND, "URL not found"),
        Err(ServiceError::StoreTimeout) => {
            error_body(StatusCode::SERVICE_UNAVAILABLE, "storage operation timed out")
        }
        Err(err) => {
            tracing::error!(short_id = %short_id, error = %err, "redirect lookup failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
