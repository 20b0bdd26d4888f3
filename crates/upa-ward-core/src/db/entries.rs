//! Key-value entry operations.

use rusqlite::OptionalExtension;
use serde_json::Value;

use super::{Database, DbResult};

impl Database {
    /// Get the raw JSON text stored under a key.
    pub fn get_entry(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Store raw JSON text under a key, replacing any previous value.
    pub fn set_entry(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            [key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove_entry(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Load the document array stored under a key. A missing key is an empty collection.
    pub fn load_documents(&self, key: &str) -> DbResult<Vec<Value>> {
        match self.get_entry(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the whole document array stored under a key.
    pub fn store_documents(&self, key: &str, documents: &[Value]) -> DbResult<()> {
        let raw = serde_json::to_string(documents)?;
        self.set_entry(key, &raw)
    }
}
