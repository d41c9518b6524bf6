use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use agentview_feedback::{compute_analytics, filter_feedback, FeedbackFilters, FeedbackStats};

use super::{feedback_error, AppState};

pub async fn get_stats(
    State(state): State<AppState>,
    Query(filters): Query<FeedbackFilters>,
) -> Result<Json<FeedbackStats>, (StatusCode, String)> {
    let records = state.store.list().map_err(feedback_error)?;
    let filtered = filter_feedback(&records, &filters).map_err(feedback_error)?;

    Ok(Json(compute_analytics(&filtered)))
}
