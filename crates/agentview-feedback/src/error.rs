use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("Invalid value for {field}: '{value}'")]
    InvalidFilterValue { field: &'static str, value: String },

    #[error("{field} must be between 1 and 5, got {value}")]
    InvalidRating { field: String, value: u8 },

    #[error("Storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FeedbackError {
    /// Wrap a backend failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FeedbackError::Storage(Box::new(err))
    }

    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, FeedbackError::Storage(_))
    }
}

pub type Result<T> = std::result::Result<T, FeedbackError>;
