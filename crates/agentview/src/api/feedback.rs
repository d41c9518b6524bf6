use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use agentview_feedback::{
    filter_feedback, FeedbackFilters, FeedbackPatch, FeedbackRecord, NewFeedback,
};

use super::{feedback_error, AppState};

pub async fn list_feedback(
    State(state): State<AppState>,
    Query(filters): Query<FeedbackFilters>,
) -> Result<Json<Vec<FeedbackRecord>>, (StatusCode, String)> {
    let records = state.store.list().map_err(feedback_error)?;
    let filtered = filter_feedback(&records, &filters).map_err(feedback_error)?;

    Ok(Json(filtered))
}

pub async fn create_feedback(
    State(state): State<AppState>,
    Json(new): Json<NewFeedback>,
) -> Result<(StatusCode, Json<FeedbackRecord>), (StatusCode, String)> {
    let record = state.store.create(new).map_err(feedback_error)?;
    tracing::info!("Saved feedback {} for session {}", record.id, record.session_id);

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FeedbackRecord>, (StatusCode, String)> {
    state
        .store
        .get(&id)
        .map_err(feedback_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<FeedbackPatch>,
) -> Result<Json<FeedbackRecord>, (StatusCode, String)> {
    state
        .store
        .update(&id, patch)
        .map_err(feedback_error)?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.store.delete(&id).map_err(feedback_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Feedback not found: {}", id))
}
