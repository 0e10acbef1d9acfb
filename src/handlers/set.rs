//! Handler for the `set` command.

use super::Session;
use anyhow::{Context, Result};
use casework::engine::settings::Settings;
use casework::engine::types::TaskStatus;
use colored::Colorize;

/// Records the status of a single task.
///
/// # Errors
/// Returns error if the status label is invalid or the task is unknown.
pub fn handle(settings: &Settings, case_id: &str, stage_id: &str, task_id: &str, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse().context("Invalid task status")?;
    let mut session = Session::open(settings)?;
    session.require_task(case_id, stage_id, task_id)?;

    session
        .store
        .write_task_status(case_id, stage_id, task_id, status);

    let (case, _) = session.require_case(case_id)?;
    let shown = session.engine().display_status(case_id, case.status);
    println!(
        "{} [{}] {stage_id}/{task_id} → {}",
        "✓".green(),
        case_id.yellow(),
        status
    );
    println!("   Case status: {}", super::paint_status(shown));
    Ok(())
}
