//! Handler for the `export` command.

use anyhow::Result;
use casework::engine::backend::SqliteBackend;
use casework::engine::db::Db;
use casework::engine::settings::Settings;
use casework::engine::store::TaskProgressStore;

/// Prints the session as a seed bundle on stdout.
///
/// # Errors
/// Returns error if the session is not initialized.
pub fn handle(settings: &Settings) -> Result<()> {
    let conn = Db::connect(settings)?;
    let store = TaskProgressStore::new(SqliteBackend::new(conn), &settings.namespace);
    println!("{}", serde_json::to_string_pretty(&store.export_seed())?);
    Ok(())
}
