//! Session database: location, connection and schema.

use super::settings::Settings;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub struct Db;

impl Db {
    /// Creates the data directory and the session database schema.
    ///
    /// # Errors
    /// Returns error if directory creation, DB opening, or migration fails.
    pub fn init(settings: &Settings) -> Result<()> {
        if !settings.data_dir.exists() {
            fs::create_dir_all(&settings.data_dir).with_context(|| {
                format!("Failed to create {}", settings.data_dir.display())
            })?;
        }

        Self::open(&settings.db_path())?;
        Ok(())
    }

    /// Connects to an existing session database.
    ///
    /// # Errors
    /// Returns error if the database file does not exist or cannot be opened.
    pub fn connect(settings: &Settings) -> Result<Connection> {
        let db_path = settings.db_path();
        if !db_path.exists() {
            anyhow::bail!("Session not initialized. Run `casework init` first.");
        }
        Self::open(&db_path)
    }

    /// Opens (creating if needed) a database file and applies the schema.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path).context("Failed to open database")?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    /// Opens a throwaway database that lives as long as the connection.
    ///
    /// # Errors
    /// Returns error if migration fails.
    pub fn open_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::migrate(&conn)?;
        Ok(conn)
    }

    /// Applies the schema migrations.
    fn migrate(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .context("Failed to create session table")?;

        Ok(())
    }
}
