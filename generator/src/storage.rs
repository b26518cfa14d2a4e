//! Autosave slot and JSON import/export for certificate records.
//!
//! The autosave slot is a single row in an SQLite table, keyed by the
//! configured storage key, holding the record and the selected template id.
//! A slot whose record no longer deserializes or no longer validates is
//! treated as empty.

use crate::config::GeneratorConfig;
use crate::error::{CertificateError, ImportError};
use crate::security::validate;
use chrono::Utc;
use common::model::certificate::CertificateRecord;
use log::{debug, info, warn};
use rusqlite::{params, Connection};
use std::path::Path;

/// What the autosave slot holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Autosaved {
    pub record: CertificateRecord,
    pub template_id: String,
}

pub struct AutosaveStore {
    conn: Connection,
    key: String,
}

impl AutosaveStore {
    pub fn open(path: &Path, key: &str) -> Result<Self, CertificateError> {
        Self::with_connection(Connection::open(path)?, key)
    }

    /// Opens `config.autosave_db` under `config.storage_key`.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, CertificateError> {
        Self::open(&config.autosave_db, &config.storage_key)
    }

    pub fn in_memory(key: &str) -> Result<Self, CertificateError> {
        Self::with_connection(Connection::open_in_memory()?, key)
    }

    fn with_connection(conn: Connection, key: &str) -> Result<Self, CertificateError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS autosave (
                storage_key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                template_id TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }

    pub fn save(
        &self,
        record: &CertificateRecord,
        template_id: &str,
    ) -> Result<(), CertificateError> {
        let payload = serde_json::to_string(record)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO autosave (storage_key, payload, template_id, saved_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![&self.key, &payload, template_id, Utc::now().to_rfc3339()],
        )?;
        debug!("Autosaved certificate {}", record.id);
        Ok(())
    }

    /// The saved slot, or `None` when it is empty, unreadable or fails validation.
    pub fn load(&self) -> Option<Autosaved> {
        let row: Result<(String, String), rusqlite::Error> = self.conn.query_row(
            "SELECT payload, template_id FROM autosave WHERE storage_key = ?1",
            params![&self.key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );
        match row {
            Ok((payload, template_id)) => {
                let record: CertificateRecord = match serde_json::from_str(&payload) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Ignoring unreadable autosave data: {}", e);
                        return None;
                    }
                };
                let report = validate(&record);
                if !report.is_valid {
                    warn!(
                        "Ignoring invalid autosave data: {}",
                        report.errors.join(", ")
                    );
                    return None;
                }
                Some(Autosaved {
                    record,
                    template_id,
                })
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                warn!("Could not read autosave slot: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), CertificateError> {
        self.conn.execute(
            "DELETE FROM autosave WHERE storage_key = ?1",
            params![&self.key],
        )?;
        info!("Cleared autosave slot {}", self.key);
        Ok(())
    }
}

pub fn export_json(record: &CertificateRecord) -> Result<String, CertificateError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Parses and re-validates a record. Nothing is returned unless both succeed.
pub fn import_json(text: &str) -> Result<CertificateRecord, ImportError> {
    let record: CertificateRecord = serde_json::from_str(text)?;
    let report = validate(&record);
    if !report.is_valid {
        return Err(ImportError::Invalid(report.errors));
    }
    Ok(record)
}
