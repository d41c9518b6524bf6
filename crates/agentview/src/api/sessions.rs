use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use agentview_feedback::FeedbackRecord;
use agentview_sessions::{build_sessions, Session};

use super::{feedback_error, source_error, AppState};

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Session>>, (StatusCode, String)> {
    let records = state.source.fetch_all().await.map_err(source_error)?;
    Ok(Json(build_sessions(records)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, (StatusCode, String)> {
    let records = state.source.fetch_all().await.map_err(source_error)?;

    build_sessions(records)
        .into_iter()
        .find(|s| s.session_id == id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session not found: {}", id)))
}

/// The first feedback recorded for a session.
pub async fn get_session_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackRecord>, (StatusCode, String)> {
    state
        .store
        .find_by_session(&id)
        .map_err(feedback_error)?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("No feedback for session: {}", id),
            )
        })
}
