//! Feedback records for agent sessions.
//!
//! This crate holds the feedback data model, the filter engine, the analytics
//! aggregator and the [`FeedbackStore`] seam that persistence backends
//! implement. Everything except the store is pure.

pub mod analytics;
pub mod error;
pub mod filter;
pub mod store;
pub mod types;

pub use analytics::{
    compute_analytics, CategoryCount, FeedbackStats, TrendPoint, RECENT_TRENDS_LIMIT,
};
pub use error::{FeedbackError, Result};
pub use filter::{filter_feedback, FeedbackFilters, ResolvedFilters};
pub use store::{new_record, FeedbackStore, MemoryFeedbackStore};
pub use types::{
    Complexity, FeedbackPatch, FeedbackRecord, IssueType, NewFeedback, PromptFeedback,
    TaskCategory, MAX_RATING, MIN_RATING,
};
