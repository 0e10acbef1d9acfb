//! Handler for the `why` command.

use super::{paint_status, Session};
use anyhow::{Context, Result};
use casework::engine::settings::Settings;
use casework::engine::status::{CaseReport, StageProgress};
use colored::Colorize;

/// Explains how a case's display status was reached.
///
/// # Errors
/// Returns error if the case is unknown or the session cannot be opened.
pub fn handle(settings: &Settings, case_id: &str, json: bool) -> Result<()> {
    let session = Session::open(settings)?;
    session.require_case(case_id)?;
    let report = session
        .engine()
        .explain(case_id)
        .with_context(|| format!("Unknown case '{case_id}'"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} [{}] {}",
        "🔎".cyan(),
        report.case_id.cyan().bold(),
        paint_status(report.display_status)
    );
    println!("   Type:    {}", report.case_type);
    println!("   Fixture: {}", report.static_status.to_string().dimmed());
    println!();

    println!("   {}", explanation(&report));
    println!();
    for stage in &report.stages {
        print_stage(stage, report.deciding_stage.as_deref() == Some(stage.stage_id.as_str()));
    }

    if !report.divergences.is_empty() {
        println!();
        println!("   {} Answers and status disagree:", "⚠".yellow());
        for d in &report.divergences {
            let answers = if d.answers_completed { "complete" } else { "draft" };
            println!("     - {}: status {}, answers {}", d.task, d.status, answers);
        }
    }
    Ok(())
}

fn explanation(report: &CaseReport) -> String {
    if !report.has_progress {
        return "No task progress recorded; showing the fixture status.".to_string();
    }
    match &report.deciding_stage {
        Some(stage) => format!("'{stage}' is the first stage with unfinished tasks."),
        None => "Triage, review and outcome are all completed.".to_string(),
    }
}

fn print_stage(stage: &StageProgress, deciding: bool) {
    let marker = if deciding {
        "→".yellow()
    } else if stage.all_completed() {
        "✓".green()
    } else {
        "○".dimmed()
    };
    println!(
        "   {} {:<10} {}/{} completed, {} started",
        marker, stage.stage_id, stage.completed, stage.total, stage.started
    );
}
