//! Handler for the `status` command.

use super::{paint_status, Session};
use anyhow::Result;
use casework::engine::settings::Settings;
use casework::engine::types::CaseStatus;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct StatusView<'a> {
    case_id: &'a str,
    case_type: &'a str,
    static_status: CaseStatus,
    display_status: CaseStatus,
}

/// Shows the display status of one case.
///
/// # Errors
/// Returns error if the case is unknown or the session cannot be opened.
pub fn handle(settings: &Settings, case_id: &str, json: bool) -> Result<()> {
    let session = Session::open(settings)?;
    let (case, _) = session.require_case(case_id)?;
    let shown = session.engine().display_status(&case.case_id, case.status);

    if json {
        let view = StatusView {
            case_id: &case.case_id,
            case_type: &case.case_type,
            static_status: case.status,
            display_status: shown,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} [{}] {}",
        "📊".cyan(),
        case.case_id.yellow(),
        paint_status(shown)
    );
    if shown != case.status {
        println!("   Fixture status: {}", case.status.to_string().dimmed());
    }
    Ok(())
}
