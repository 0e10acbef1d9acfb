//! Handler for the `clear` command.

use anyhow::Result;
use casework::engine::backend::SqliteBackend;
use casework::engine::db::Db;
use casework::engine::seed::clear_session_data;
use casework::engine::settings::Settings;
use casework::engine::store::TaskProgressStore;
use colored::Colorize;

/// Removes all recorded progress so every case shows its fixture status.
///
/// # Errors
/// Returns error if the session is not initialized.
pub fn handle(settings: &Settings) -> Result<()> {
    let conn = Db::connect(settings)?;
    let mut store = TaskProgressStore::new(SqliteBackend::new(conn), &settings.namespace);
    clear_session_data(&mut store);
    println!("{} Session cleared", "✓".green());
    Ok(())
}
