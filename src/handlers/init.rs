//! Handler for the `init` command.

use anyhow::Result;
use casework::engine::db::Db;
use casework::engine::settings::Settings;
use colored::Colorize;

/// Initializes the session database.
///
/// # Errors
/// Returns error if database initialization fails.
pub fn handle(settings: &Settings) -> Result<()> {
    Db::init(settings)?;
    println!("{} Initialized {}", "✓".green(), settings.db_path().display());
    Ok(())
}
