use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use agentview_sessions::{EventRecord, LogEntries};

use super::{source_error, AppState};

/// Every event record from the configured source, in the log server envelope.
pub async fn get_all_log_entries(
    State(state): State<AppState>,
) -> Result<Json<LogEntries<EventRecord>>, (StatusCode, String)> {
    let records = state.source.fetch_all().await.map_err(source_error)?;
    Ok(Json(LogEntries::new(records)))
}
