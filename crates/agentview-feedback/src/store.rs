use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{FeedbackPatch, FeedbackRecord, NewFeedback};

/// Persistence for feedback records.
///
/// `list` returns records in creation order. Updating or deleting an id that
/// does not exist is a no-op reported through the return value.
pub trait FeedbackStore: Send + Sync {
    /// Validate, assign an id and the current time, and persist.
    fn create(&self, new: NewFeedback) -> Result<FeedbackRecord>;

    fn list(&self) -> Result<Vec<FeedbackRecord>>;

    fn get(&self, id: &str) -> Result<Option<FeedbackRecord>>;

    /// The earliest created record for the session.
    fn find_by_session(&self, session_id: &str) -> Result<Option<FeedbackRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|r| r.session_id == session_id))
    }

    /// Merge `patch` into the record. Returns `None` when the id is unknown.
    fn update(&self, id: &str, patch: FeedbackPatch) -> Result<Option<FeedbackRecord>>;

    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> Result<bool>;
}

/// Generate the identity for a new record.
pub fn new_record(new: NewFeedback) -> Result<FeedbackRecord> {
    new.validate()?;
    Ok(new.into_record(Uuid::new_v4().to_string(), Utc::now()))
}

/// In-process store backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryFeedbackStore {
    records: Mutex<Vec<FeedbackRecord>>,
}

impl MemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, kept in the given order.
    pub fn with_records(records: Vec<FeedbackRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn records(&self) -> MutexGuard<'_, Vec<FeedbackRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn create(&self, new: NewFeedback) -> Result<FeedbackRecord> {
        let record = new_record(new)?;
        self.records().push(record.clone());
        tracing::debug!("Created feedback {} for session {}", record.id, record.session_id);
        Ok(record)
    }

    fn list(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.records().clone())
    }

    fn get(&self, id: &str) -> Result<Option<FeedbackRecord>> {
        Ok(self.records().iter().find(|r| r.id == id).cloned())
    }

    fn find_by_session(&self, session_id: &str) -> Result<Option<FeedbackRecord>> {
        Ok(self
            .records()
            .iter()
            .find(|r| r.session_id == session_id)
            .cloned())
    }

    fn update(&self, id: &str, patch: FeedbackPatch) -> Result<Option<FeedbackRecord>> {
        patch.validate()?;
        let mut records = self.records();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            tracing::debug!("No feedback {} to update", id);
            return Ok(None);
        };
        record.apply(patch);
        Ok(Some(record.clone()))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.records();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
