//! Goal Journal Store
//!
//! Append-only persistence delegate for goal snapshots and audit records.
//! SQLite-backed by default; the trait keeps the manager decoupled from
//! the concrete store so tests can substitute an in-memory recorder.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// One journal record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    /// Record kind, e.g. "goal_created", "goal_updated", "goal_rejected"
    pub kind: String,
    /// Subject id this record is about (usually a goal id)
    pub subject_id: String,
    /// JSON payload (a goal snapshot or outcome summary)
    pub content: String,
    pub created_at: i64,
}

impl JournalEntry {
    pub fn new(kind: &str, subject_id: &str, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            subject_id: subject_id.to_string(),
            content: content.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Abstract append-friendly store; the manager treats it as write-mostly
#[async_trait]
pub trait MemoryDelegate: Send + Sync {
    /// Append one record; existing records are never overwritten
    async fn store_entry(&self, entry: JournalEntry) -> Result<()>;

    /// Substring search over kind, subject and content, newest first
    async fn search_entries(&self, query: &str, limit: Option<usize>) -> Result<Vec<JournalEntry>>;

    /// Delete matching records, returning how many were removed
    async fn delete_entries(&self, query: &str) -> Result<usize>;
}

/// SQLite-backed journal
pub struct SqliteJournal {
    conn: Mutex<Connection>,
}

impl SqliteJournal {
    /// In-memory journal, mainly for tests
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Open or create the journal database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        let journal = Self {
            conn: Mutex::new(conn),
        };
        journal.init_schema()?;

        info!("Journal opened: {}", path.as_ref().display());
        Ok(journal)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS journal (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_journal_subject ON journal(subject_id);
            CREATE INDEX IF NOT EXISTS idx_journal_kind ON journal(kind);
            CREATE INDEX IF NOT EXISTS idx_journal_created ON journal(created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn load_entry(row: &rusqlite::Row) -> rusqlite::Result<JournalEntry> {
        Ok(JournalEntry {
            id: row.get(0)?,
            kind: row.get(1)?,
            subject_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl MemoryDelegate for SqliteJournal {
    async fn store_entry(&self, entry: JournalEntry) -> Result<()> {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        conn.execute(
            "INSERT INTO journal (id, kind, subject_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.kind,
                entry.subject_id,
                entry.content,
                entry.created_at,
            ],
        )?;
        Ok(())
    }

    async fn search_entries(&self, query: &str, limit: Option<usize>) -> Result<Vec<JournalEntry>> {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let pattern = format!("%{}%", query);
        let limit = limit.unwrap_or(100) as i64;

        let mut stmt = conn.prepare(
            "SELECT id, kind, subject_id, content, created_at
             FROM journal
             WHERE kind LIKE ?1 OR subject_id LIKE ?1 OR content LIKE ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;

        let entries = stmt
            .query_map(params![pattern, limit], Self::load_entry)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }

    async fn delete_entries(&self, query: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let pattern = format!("%{}%", query);
        let removed = conn.execute(
            "DELETE FROM journal
             WHERE kind LIKE ?1 OR subject_id LIKE ?1 OR content LIKE ?1",
            params![pattern],
        )?;
        Ok(removed)
    }
}
