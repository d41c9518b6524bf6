//! Feedback store for persistent session feedback.

use std::str::FromStr;
use std::sync::MutexGuard;

use agentview_feedback::{
    new_record, Complexity, FeedbackPatch, FeedbackRecord, FeedbackStore, NewFeedback,
    PromptFeedback, TaskCategory,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::Database;

const COLUMNS: &str = "id, session_id, timestamp, overall_accuracy, overall_satisfaction, \
    task_completed, task_completion_notes, code_quality, response_relevance, efficiency, \
    what_worked_well, what_needs_improvement, additional_comments, user_role, task_category, \
    complexity, prompt_feedback";

/// Feedback store with a borrowed connection. Rows come back in insertion
/// order.
pub struct Feedback<'db> {
    conn: MutexGuard<'db, Connection>,
}

impl<'db> Feedback<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Insert a new record.
    pub fn insert(&self, record: &FeedbackRecord) -> Result<()> {
        let prompt_feedback = encode_prompt_feedback(record)?;
        self.conn.execute(
            &format!(
                "INSERT INTO feedback ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                COLUMNS
            ),
            params![
                record.id,
                record.session_id,
                encode_timestamp(&record.timestamp),
                record.overall_accuracy,
                record.overall_satisfaction,
                record.task_completed,
                record.task_completion_notes,
                record.code_quality,
                record.response_relevance,
                record.efficiency,
                record.what_worked_well,
                record.what_needs_improvement,
                record.additional_comments,
                record.user_role,
                record.task_category.map(|c| c.as_str()),
                record.complexity.map(|c| c.as_str()),
                prompt_feedback,
            ],
        )?;
        Ok(())
    }

    /// Overwrite every mutable column of an existing record. Returns whether
    /// a row was updated.
    pub fn replace(&self, record: &FeedbackRecord) -> Result<bool> {
        let prompt_feedback = encode_prompt_feedback(record)?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE feedback SET
                session_id = ?2,
                overall_accuracy = ?3,
                overall_satisfaction = ?4,
                task_completed = ?5,
                task_completion_notes = ?6,
                code_quality = ?7,
                response_relevance = ?8,
                efficiency = ?9,
                what_worked_well = ?10,
                what_needs_improvement = ?11,
                additional_comments = ?12,
                user_role = ?13,
                task_category = ?14,
                complexity = ?15,
                prompt_feedback = ?16
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.session_id,
                record.overall_accuracy,
                record.overall_satisfaction,
                record.task_completed,
                record.task_completion_notes,
                record.code_quality,
                record.response_relevance,
                record.efficiency,
                record.what_worked_well,
                record.what_needs_improvement,
                record.additional_comments,
                record.user_role,
                record.task_category.map(|c| c.as_str()),
                record.complexity.map(|c| c.as_str()),
                prompt_feedback,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Result<Option<FeedbackRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM feedback WHERE id = ?1", COLUMNS),
                params![id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// The earliest inserted record for a session.
    pub fn find_by_session(&self, session_id: &str) -> Result<Option<FeedbackRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM feedback WHERE session_id = ?1 ORDER BY rowid LIMIT 1",
                    COLUMNS
                ),
                params![session_id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// List every record in insertion order.
    pub fn list(&self) -> Result<Vec<FeedbackRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM feedback ORDER BY rowid", COLUMNS))?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Delete a record by ID.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM feedback WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<FeedbackRecord> {
        let timestamp: String = row.get(2)?;
        let task_category: Option<String> = row.get(14)?;
        let complexity: Option<String> = row.get(15)?;
        let prompt_feedback: Option<String> = row.get(16)?;

        Ok(FeedbackRecord {
            id: row.get(0)?,
            session_id: row.get(1)?,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| conversion_error(2, e))?,
            overall_accuracy: row.get(3)?,
            overall_satisfaction: row.get(4)?,
            task_completed: row.get(5)?,
            task_completion_notes: row.get(6)?,
            code_quality: row.get(7)?,
            response_relevance: row.get(8)?,
            efficiency: row.get(9)?,
            what_worked_well: row.get(10)?,
            what_needs_improvement: row.get(11)?,
            additional_comments: row.get(12)?,
            user_role: row.get(13)?,
            task_category: parse_column::<TaskCategory>(14, task_category)?,
            complexity: parse_column::<Complexity>(15, complexity)?,
            prompt_feedback: prompt_feedback
                .map(|json| serde_json::from_str::<Vec<PromptFeedback>>(&json))
                .transpose()
                .map_err(|e| conversion_error(16, e))?,
        })
    }
}

impl FeedbackStore for Database {
    fn create(&self, new: NewFeedback) -> agentview_feedback::Result<FeedbackRecord> {
        let record = new_record(new)?;
        self.feedback().insert(&record)?;
        tracing::debug!("Created feedback {} for session {}", record.id, record.session_id);
        Ok(record)
    }

    fn list(&self) -> agentview_feedback::Result<Vec<FeedbackRecord>> {
        Ok(self.feedback().list()?)
    }

    fn get(&self, id: &str) -> agentview_feedback::Result<Option<FeedbackRecord>> {
        Ok(self.feedback().get(id)?)
    }

    fn find_by_session(
        &self,
        session_id: &str,
    ) -> agentview_feedback::Result<Option<FeedbackRecord>> {
        Ok(self.feedback().find_by_session(session_id)?)
    }

    fn update(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> agentview_feedback::Result<Option<FeedbackRecord>> {
        patch.validate()?;
        let store = self.feedback();
        let Some(mut record) = store.get(id)? else {
            tracing::debug!("No feedback {} to update", id);
            return Ok(None);
        };
        record.apply(patch);
        store.replace(&record)?;
        Ok(Some(record))
    }

    fn delete(&self, id: &str) -> agentview_feedback::Result<bool> {
        Ok(self.feedback().delete(id)?)
    }
}

fn encode_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_prompt_feedback(record: &FeedbackRecord) -> Result<Option<String>> {
    Ok(record
        .prompt_feedback
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

fn parse_column<T: FromStr<Err = String>>(
    index: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<T>> {
    value
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|msg| conversion_error(index, msg))
}

fn conversion_error(
    index: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err.into())
}
