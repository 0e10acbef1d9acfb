//! Handler for the `show` command.

use super::Session;
use anyhow::Result;
use casework::engine::settings::Settings;
use colored::Colorize;

/// Prints the saved answers for a task.
///
/// # Errors
/// Returns error if the task is unknown or the session cannot be opened.
pub fn handle(settings: &Settings, case_id: &str, stage_id: &str, task_id: &str) -> Result<()> {
    let session = Session::open(settings)?;
    session.require_task(case_id, stage_id, task_id)?;

    let status = session
        .store
        .read_task_statuses(case_id)
        .get(stage_id, task_id);
    println!(
        "{} [{}] {stage_id}/{task_id} ({})",
        "📝".cyan(),
        case_id.yellow(),
        status.to_string().dimmed()
    );

    let Some(record) = session.store.read_task_answers(case_id, stage_id, task_id) else {
        println!("   No answers saved.");
        return Ok(());
    };

    for (question, value) in &record.form_data {
        println!("   {}: {}", question.bold(), value);
    }
    let completion = if record.is_completed { "complete" } else { "draft" };
    println!("   Saved {} as {}", record.last_saved.dimmed(), completion);
    Ok(())
}
