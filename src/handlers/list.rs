//! Handler for the `list` command.

use super::{paint_status, Session};
use anyhow::Result;
use casework::engine::settings::Settings;
use colored::Colorize;

/// Lists every case with its fixture status and display status.
///
/// # Errors
/// Returns error if the session cannot be opened.
pub fn handle(settings: &Settings) -> Result<()> {
    let session = Session::open(settings)?;
    let engine = session.engine();

    println!("{} All Cases:", "📋".cyan());

    for case in session.cases.all() {
        let shown = engine.display_status(&case.case_id, case.status);
        let recorded = !session.store.read_task_statuses(&case.case_id).is_empty();
        let origin = if recorded {
            format!("fixture: {}", case.status).dimmed()
        } else {
            "fixture".dimmed()
        };
        println!(
            "   [{}] {:<24} {} ({})",
            case.case_id.blue(),
            case.case_type,
            paint_status(shown),
            origin
        );
    }
    Ok(())
}
