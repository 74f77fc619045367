use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::models::{AnalyticsResponse, CreateLinkRequest, ErrorResponse, ShortenResponse};
use crate::service::{LinkService, ServiceError};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Map a service error to the HTTP status and payload the caller sees.
///
/// Internal store errors are not echoed back; their detail stays in the
/// logs.
pub fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ServiceError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::StoreTimeout => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::IdSpaceExhausted | ServiceError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let error = match &err {
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "storage failure");
            "Server error".to_string()
        }
        other => other.to_string(),
    };

    (status, Json(ErrorResponse { error }))
}

/// Create a new shortened URL.
pub async fn create_url(
    State(service): State<Arc<LinkService>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), (StatusCode, Json<ErrorResponse>)> {
    let shortened = service
        .shorten(&payload.original_url)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            original_url: shortened.link.original_url,
            short_url: shortened.short_url,
        }),
    ))
}

/// Click analytics for a single link.
pub async fn get_analytics(
    State(service): State<Arc<LinkService>>,
    Path(short_id): Path<String>,
) -> Result<Json<AnalyticsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let link = service.analytics(&short_id).await.map_err(error_response)?;

    Ok(Json(AnalyticsResponse {
        clicks: link.clicks,
        created_at: link.created_at,
        last_accessed: link.last_accessed,
    }))
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
