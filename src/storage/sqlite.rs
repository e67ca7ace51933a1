//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::prospect::{Prospect, Signal, SignalKind, SocialPlatform};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Assets, EmailRecord, ProspectSummary, SocialMediaRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use uuid::Uuid;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn signal_values(&self, prospect_id: &str, kind: &SignalKind) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT value FROM prospect_signals WHERE prospect_id = ?1 AND kind = ?2 ORDER BY id",
        )?;
        let values = stmt
            .query_map(params![prospect_id, kind.to_db_string()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    }
}

impl Storage for SqliteStorage {
    // ===== Writes =====

    fn save_prospect(&mut self, prospect: &mut Prospect) -> StorageResult<String> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT id FROM prospects WHERE url = ?1",
                params![prospect.url()],
                |row| row.get(0),
            )
            .optional()?;

        let prospect_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE prospects SET
                        first_name = COALESCE(NULLIF(?2, ''), first_name),
                        middle_name = COALESCE(NULLIF(?3, ''), middle_name),
                        last_name = COALESCE(NULLIF(?4, ''), last_name)
                     WHERE id = ?1",
                    params![
                        id,
                        prospect.first_name(),
                        prospect.middle_name(),
                        prospect.last_name()
                    ],
                )?;
                id
            }
            None => {
                let id = prospect
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                tx.execute(
                    "INSERT INTO prospects (id, url, first_name, middle_name, last_name, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        id,
                        prospect.url(),
                        prospect.first_name(),
                        prospect.middle_name(),
                        prospect.last_name(),
                        now
                    ],
                )?;
                id
            }
        };

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO prospect_signals
                    (prospect_id, kind, value, confidence, validated_by_user, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for signal in prospect.signals() {
                inserted += stmt.execute(params![
                    prospect_id,
                    signal.kind.to_db_string(),
                    signal.value,
                    signal.confidence,
                    signal.validated_by_user,
                    now
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            prospect_id = %prospect_id,
            inserted,
            skipped = prospect.signals().len() - inserted,
            "Saved prospect signals"
        );

        prospect.id = Some(prospect_id.clone());
        Ok(prospect_id)
    }

    fn delete_prospect(&mut self, prospect_id: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM prospect_signals WHERE prospect_id = ?1",
            params![prospect_id],
        )?;
        let deleted = tx.execute("DELETE FROM prospects WHERE id = ?1", params![prospect_id])?;
        if deleted == 0 {
            // dropping the transaction rolls it back
            return Err(StorageError::ProspectNotFound(prospect_id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    // ===== Reads =====

    fn list_prospects(&self) -> StorageResult<Vec<ProspectSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, first_name, middle_name, last_name, created_at
             FROM prospects ORDER BY created_at, rowid",
        )?;
        let prospects = stmt
            .query_map([], summary_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prospects)
    }

    fn get_prospect(&self, prospect_id: &str) -> StorageResult<ProspectSummary> {
        self.conn
            .query_row(
                "SELECT id, url, first_name, middle_name, last_name, created_at
                 FROM prospects WHERE id = ?1",
                params![prospect_id],
                summary_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::ProspectNotFound(prospect_id.to_string()))
    }

    fn get_emails(&self, prospect_id: &str) -> StorageResult<Vec<EmailRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT value, confidence, validated_by_user FROM prospect_signals
             WHERE prospect_id = ?1 AND kind = ?2
             ORDER BY confidence DESC, id",
        )?;
        let emails = stmt
            .query_map(
                params![prospect_id, SignalKind::Email.to_db_string()],
                |row| {
                    Ok(EmailRecord {
                        email: row.get(0)?,
                        confidence: row.get(1)?,
                        validated_by_user: row.get(2)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(emails)
    }

    fn get_social_media(&self, prospect_id: &str) -> StorageResult<Vec<SocialMediaRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT value, confidence, validated_by_user FROM prospect_signals
             WHERE prospect_id = ?1 AND kind = ?2
             ORDER BY confidence DESC, id LIMIT 1",
        )?;

        let mut records = Vec::new();
        for platform in SocialPlatform::ALL {
            let kind = SignalKind::Social(platform).to_db_string();
            let best = stmt
                .query_row(params![prospect_id, kind], |row| {
                    Ok(SocialMediaRecord {
                        platform,
                        url: row.get(0)?,
                        confidence: row.get(1)?,
                        validated_by_user: row.get(2)?,
                    })
                })
                .optional()?;
            records.extend(best);
        }
        Ok(records)
    }

    fn get_assets(&self, prospect_id: &str) -> StorageResult<Assets> {
        Ok(Assets {
            icons: self.signal_values(prospect_id, &SignalKind::Icon)?,
        })
    }

    fn get_tags(&self, prospect_id: &str) -> StorageResult<Vec<String>> {
        self.signal_values(prospect_id, &SignalKind::Tag)
    }

    fn get_description(&self, prospect_id: &str) -> StorageResult<Option<String>> {
        let description = self
            .conn
            .query_row(
                "SELECT value FROM prospect_signals
                 WHERE prospect_id = ?1 AND kind = ?2 ORDER BY id LIMIT 1",
                params![prospect_id, SignalKind::Description.to_db_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(description)
    }

    fn get_signals(&self, prospect_id: &str, kind: &SignalKind) -> StorageResult<Vec<Signal>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, value, confidence, validated_by_user FROM prospect_signals
             WHERE prospect_id = ?1 AND kind = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![prospect_id, kind.to_db_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, bool>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(kind, value, confidence, validated_by_user)| {
                let kind = SignalKind::from_db_string(&kind)
                    .ok_or(StorageError::UnknownSignalKind(kind))?;
                let mut signal = Signal::new(kind, value, confidence);
                signal.validated_by_user = validated_by_user;
                Ok(signal)
            })
            .collect()
    }
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProspectSummary> {
    Ok(ProspectSummary {
        id: row.get(0)?,
        url: row.get(1)?,
        first_name: row.get(2)?,
        middle_name: row.get(3)?,
        last_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}
