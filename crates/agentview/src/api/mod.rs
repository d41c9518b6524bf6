mod feedback;
mod logs;
mod sessions;
mod stats;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use agentview_feedback::{FeedbackError, FeedbackStore};
use agentview_sessions::EventSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn EventSource>,
    pub store: Arc<dyn FeedbackStore>,
}

pub fn create_router(source: Arc<dyn EventSource>, store: Arc<dyn FeedbackStore>) -> Router {
    let state = AppState { source, store };

    Router::new()
        .route("/get_all_log_entries", get(logs::get_all_log_entries))
        .route("/api/sessions", get(sessions::list_sessions))
        .route("/api/sessions/{id}", get(sessions::get_session))
        .route(
            "/api/sessions/{id}/feedback",
            get(sessions::get_session_feedback),
        )
        .route(
            "/api/feedback",
            get(feedback::list_feedback).post(feedback::create_feedback),
        )
        .route("/api/feedback/stats", get(stats::get_stats))
        .route(
            "/api/feedback/{id}",
            get(feedback::get_feedback)
                .patch(feedback::update_feedback)
                .delete(feedback::delete_feedback),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Caller mistakes are 400s; backend failures are 500s.
fn feedback_error(e: FeedbackError) -> (StatusCode, String) {
    let status = if e.is_invalid_input() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("Feedback store error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, e.to_string())
}

fn source_error(e: anyhow::Error) -> (StatusCode, String) {
    tracing::error!("Event source error: {:#}", e);
    (StatusCode::BAD_GATEWAY, format!("{:#}", e))
}
