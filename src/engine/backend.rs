//! Session Backends: raw string key-value substrates for the progress store.
//!
//! The backend knows nothing about cases or tasks. It stores opaque
//! strings under string keys; namespacing and decoding live in `store.rs`.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session database error")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to serialize session value")]
    Serialize(#[from] serde_json::Error),
}

/// Keyed string storage scoped to one session.
pub trait SessionBackend {
    /// Returns the raw value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the substrate cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the substrate cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key` if present.
    ///
    /// # Errors
    /// Returns an error if the substrate cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Lists every key starting with `prefix`, in ascending order.
    ///
    /// # Errors
    /// Returns an error if the substrate cannot be read.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Removes every key starting with `prefix`.
    ///
    /// # Errors
    /// Returns an error if any key cannot be listed or removed.
    fn remove_prefix(&mut self, prefix: &str) -> Result<(), StoreError> {
        for key in self.keys_with_prefix(prefix)? {
            self.remove(&key)?;
        }
        Ok(())
    }
}

/// In-process backend. Contents live as long as the value does.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn remove_prefix(&mut self, prefix: &str) -> Result<(), StoreError> {
        self.entries.retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

/// Backend persisted in the `session` table of a `SQLite` database.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Wraps a connection whose schema has been migrated by `Db`.
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SessionBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM session WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM session WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map(params![prefix], |row| row.get(0))?;

        let mut keys = Vec::new();
        for k in rows {
            keys.push(k?);
        }
        Ok(keys)
    }

    fn remove_prefix(&mut self, prefix: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM session WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(())
    }
}
