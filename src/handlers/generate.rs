//! Handler for the `generate` command.

use super::Session;
use anyhow::Result;
use casework::engine::seed::seed_realistic_task_data;
use casework::engine::settings::Settings;
use colored::Colorize;

/// Fills the session with random progress matching each case's fixture status.
///
/// # Errors
/// Returns error if the session cannot be opened.
pub fn handle(settings: &Settings) -> Result<()> {
    let mut session = Session::open(settings)?;
    let mut rng = rand::thread_rng();
    let summary = seed_realistic_task_data(
        &session.cases,
        &session.workflows,
        &mut session.store,
        &mut rng,
    );
    println!(
        "{} Generated {} task(s) across {} case(s)",
        "✓".green(),
        summary.tasks,
        summary.cases
    );
    Ok(())
}
