//! SQLite database for transcription records

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::config::Settings;
use crate::storage::models::{FailureMarker, NewTranscription, TranscriptionRecord};

/// Database wrapper for memoscribe
pub struct Database {
    conn: Connection,
}

const CURRENT_SCHEMA_VERSION: i64 = 1;

const RECORD_COLUMNS: &str =
    "id, user_id, storage_path, transcription_text, language, processed_at, metadata, error";

impl Database {
    /// Open or create the database
    pub fn open(settings: &Settings) -> Result<Self> {
        let db_path = settings.database_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::open_path(&db_path)
    }

    /// Open database at a specific path (useful for testing)
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let current_version = self.schema_version()?;
        if current_version > CURRENT_SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is newer than supported version {}",
                current_version,
                CURRENT_SCHEMA_VERSION
            );
        }

        if current_version < 1 {
            self.migrate_to_v1()?;
            self.set_schema_version(1)?;
        }

        Ok(())
    }

    /// Current schema version tracked in PRAGMA user_version.
    pub fn schema_version(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?)
    }

    fn set_schema_version(&self, version: i64) -> Result<()> {
        self.conn
            .execute(&format!("PRAGMA user_version = {}", version), [])?;
        Ok(())
    }

    fn migrate_to_v1(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS transcriptions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                storage_path TEXT NOT NULL UNIQUE,
                transcription_text TEXT,
                language TEXT,
                processed_at INTEGER NOT NULL,
                metadata TEXT,
                error TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_transcriptions_user_id
                ON transcriptions(user_id);
            CREATE INDEX IF NOT EXISTS idx_transcriptions_processed_at
                ON transcriptions(processed_at DESC);
            "#,
        )?;

        Ok(())
    }

    /// Insert or overwrite the record for a storage path, clearing any earlier error
    pub fn upsert_transcription(&self, row: &NewTranscription) -> Result<TranscriptionRecord> {
        let metadata_json = serde_json::to_string(&row.metadata)?;

        let record = self.conn.query_row(
            &format!(
                r#"
                INSERT INTO transcriptions (id, user_id, storage_path, transcription_text, language, processed_at, metadata, error)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)
                ON CONFLICT(storage_path) DO UPDATE SET
                    user_id = excluded.user_id,
                    transcription_text = excluded.transcription_text,
                    language = excluded.language,
                    processed_at = excluded.processed_at,
                    metadata = excluded.metadata,
                    error = NULL
                RETURNING {RECORD_COLUMNS}
                "#
            ),
            params![
                uuid::Uuid::new_v4().to_string(),
                row.user_id,
                row.storage_path,
                row.transcription_text,
                row.language,
                row.processed_at.timestamp_millis(),
                metadata_json,
            ],
            |r| Ok(Self::row_to_record(r)),
        )?;

        record
    }

    /// Set the error marker for a storage path, keeping any earlier transcription text
    pub fn mark_failed(&self, marker: &FailureMarker) -> Result<TranscriptionRecord> {
        let record = self.conn.query_row(
            &format!(
                r#"
                INSERT INTO transcriptions (id, user_id, storage_path, processed_at, error)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(storage_path) DO UPDATE SET
                    error = excluded.error,
                    processed_at = excluded.processed_at
                RETURNING {RECORD_COLUMNS}
                "#
            ),
            params![
                uuid::Uuid::new_v4().to_string(),
                marker.user_id,
                marker.storage_path,
                marker.processed_at.timestamp_millis(),
                marker.error,
            ],
            |r| Ok(Self::row_to_record(r)),
        )?;

        record
    }

    /// Get the record for a storage path
    pub fn get_transcription(&self, storage_path: &str) -> Result<Option<TranscriptionRecord>> {
        let result = self
            .conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM transcriptions WHERE storage_path = ?1"),
                params![storage_path],
                |row| Ok(Self::row_to_record(row)),
            )
            .optional()?;

        match result {
            Some(r) => Ok(Some(r?)),
            None => Ok(None),
        }
    }

    /// List records, most recently processed first
    pub fn list_transcriptions(&self, limit: usize) -> Result<Vec<TranscriptionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}
             FROM transcriptions
             ORDER BY processed_at DESC
             LIMIT ?1"
        ))?;

        let records = stmt
            .query_map(params![limit], |row| Ok(Self::row_to_record(row)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Total number of records
    pub fn count_transcriptions(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM transcriptions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // Helper to convert a row to a TranscriptionRecord
    fn row_to_record(row: &rusqlite::Row) -> Result<TranscriptionRecord> {
        let processed_millis: i64 = row.get(5)?;
        let metadata_json: Option<String> = row.get(6)?;

        let metadata = metadata_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .context("Corrupt transcription metadata")?;

        Ok(TranscriptionRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            storage_path: row.get(2)?,
            transcription_text: row.get(3)?,
            language: row.get(4)?,
            processed_at: timestamp_from_millis(processed_millis),
            metadata,
            error: row.get(7)?,
        })
    }
}

fn timestamp_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::RecordMetadata;
    use crate::transcription::Segment;
    use rusqlite::Connection;
    use tempfile::tempdir;

    fn new_row(storage_path: &str, text: &str) -> NewTranscription {
        NewTranscription {
            user_id: "u1".to_string(),
            storage_path: storage_path.to_string(),
            transcription_text: text.to_string(),
            language: "en".to_string(),
            processed_at: Utc::now(),
            metadata: RecordMetadata {
                duration: 1.5,
                segments_count: 1,
                segments: vec![Segment {
                    start: 0.0,
                    end: 1.5,
                    text: text.to_string(),
                }],
            },
        }
    }

    fn marker(storage_path: &str, error: &str) -> FailureMarker {
        FailureMarker {
            user_id: "u1".to_string(),
            storage_path: storage_path.to_string(),
            error: error.to_string(),
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_database() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.count_transcriptions().unwrap(), 0);
    }

    #[test]
    fn test_new_database_sets_schema_version() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
    }

    #[test]
    fn test_upsert_overwrites_same_storage_path() {
        let db = Database::open_in_memory().unwrap();

        let first = db.upsert_transcription(&new_row("memo.webm", "first")).unwrap();
        let second = db.upsert_transcription(&new_row("memo.webm", "second")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.transcription_text.as_deref(), Some("second"));
        assert_eq!(db.count_transcriptions().unwrap(), 1);
    }

    #[test]
    fn test_mark_failed_creates_record_without_text() {
        let db = Database::open_in_memory().unwrap();

        let record = db.mark_failed(&marker("memo-2.webm", "boom")).unwrap();
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.transcription_text.is_none());
        assert!(record.metadata.is_none());
    }

    #[test]
    fn test_mark_failed_keeps_stale_text_and_success_clears_error() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_transcription(&new_row("memo.webm", "old text")).unwrap();

        let failed = db.mark_failed(&marker("memo.webm", "boom")).unwrap();
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert_eq!(failed.transcription_text.as_deref(), Some("old text"));

        let ok = db.upsert_transcription(&new_row("memo.webm", "new text")).unwrap();
        assert!(ok.error.is_none());
        assert_eq!(ok.transcription_text.as_deref(), Some("new text"));
    }

    #[test]
    fn test_list_orders_by_processed_at() {
        let db = Database::open_in_memory().unwrap();

        let mut older = new_row("a.webm", "a");
        older.processed_at = Utc.timestamp_millis_opt(1_000).unwrap();
        let mut newer = new_row("b.webm", "b");
        newer.processed_at = Utc.timestamp_millis_opt(2_000).unwrap();
        db.upsert_transcription(&older).unwrap();
        db.upsert_transcription(&newer).unwrap();

        let records = db.list_transcriptions(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].storage_path, "b.webm");

        let records = db.list_transcriptions(1).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_reopening_file_database_keeps_records() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("memoscribe.db");

        {
            let db = Database::open_path(&db_path).unwrap();
            db.upsert_transcription(&new_row("memo.webm", "persisted")).unwrap();
        }

        let db = Database::open_path(&db_path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
        let record = db.get_transcription("memo.webm").unwrap().unwrap();
        assert_eq!(record.transcription_text.as_deref(), Some("persisted"));
        assert_eq!(record.metadata.unwrap().segments.len(), 1);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("future.db");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
        drop(conn);

        let err = match Database::open_path(&db_path) {
            Ok(_) => panic!("expected newer schema to be rejected"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("newer than supported"));
    }
}
