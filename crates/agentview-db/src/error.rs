use agentview_feedback::FeedbackError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),
}

impl From<DbError> for FeedbackError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Feedback(inner) => inner,
            other => FeedbackError::storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
