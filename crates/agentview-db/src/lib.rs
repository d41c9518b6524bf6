//! Database layer for agentview.
//!
//! Provides a `Database` struct that owns the SQLite connection and hands out
//! the feedback store. `Database` also implements
//! [`agentview_feedback::FeedbackStore`] so it can be injected wherever the
//! in-memory store is.

mod error;
mod feedback;

pub use error::{DbError, Result};
pub use feedback::Feedback;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the default location.
    ///
    /// The default location is `~/.local/share/agentview/agentview.db`.
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::default_path())
    }

    /// Open or create a database at a specific path, creating parent
    /// directories as needed.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        tracing::debug!("Opened feedback database at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agentview")
            .join("agentview.db")
    }

    /// Access the feedback store.
    pub fn feedback(&self) -> Feedback<'_> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Feedback::new(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS feedback (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                overall_accuracy INTEGER NOT NULL,
                overall_satisfaction INTEGER NOT NULL,
                task_completed INTEGER NOT NULL,
                task_completion_notes TEXT,
                code_quality INTEGER,
                response_relevance INTEGER,
                efficiency INTEGER,
                what_worked_well TEXT,
                what_needs_improvement TEXT,
                additional_comments TEXT,
                user_role TEXT,
                task_category TEXT,
                complexity TEXT,
                prompt_feedback TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_feedback_session_id ON feedback(session_id);
            "#,
        )?;
        Ok(())
    }
}
