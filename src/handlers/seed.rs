//! Handler for the `seed` command.

use super::Session;
use anyhow::{Context, Result};
use casework::engine::settings::Settings;
use casework::engine::store::SeedBundle;
use colored::Colorize;
use std::fs;

/// Loads the seed bundle from the fixtures directory.
///
/// # Errors
/// Returns error if the bundle cannot be read or the session cannot be opened.
pub fn handle(settings: &Settings, refresh: bool) -> Result<()> {
    let raw = fs::read_to_string(&settings.seed_file)
        .with_context(|| format!("Failed to read {}", settings.seed_file.display()))?;
    let bundle: SeedBundle = serde_json::from_str(&raw).context("Malformed seed bundle")?;
    let mut session = Session::open(settings)?;

    if refresh {
        session.store.refresh_seed(&bundle);
    } else if !session.store.load_seed(&bundle) {
        println!(
            "{} Session already has data; use --refresh to replace it.",
            "•".dimmed()
        );
        return Ok(());
    }

    println!(
        "{} Loaded progress for {} case(s)",
        "✓".green(),
        bundle.task_statuses.len()
    );
    Ok(())
}
