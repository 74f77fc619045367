use axum::{http::StatusCode, routing::get, Router};
use std::sync::Arc;

use crate::service::LinkService;

use super::handlers::{redirect_url, RedirectState};

pub fn create_redirect_router(service: Arc<LinkService>, redirect_status: StatusCode) -> Router {
    let state = Arc::new(RedirectState {
        service,
        redirect_status,
    });

    Router::new()
        .route("/{short_id}", get(redirect_url))
        .with_state(state)
}
