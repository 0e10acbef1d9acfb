//! Handler for the `answer` command.

use super::Session;
use anyhow::{bail, Result};
use casework::engine::settings::Settings;
use casework::engine::types::{AnswerValue, TaskAnswerRecord, TaskStatus};
use colored::Colorize;
use std::collections::BTreeMap;

/// Saves a full answer record for a task and updates its status.
///
/// # Errors
/// Returns error if a field is malformed or the task is unknown.
pub fn handle(
    settings: &Settings,
    case_id: &str,
    stage_id: &str,
    task_id: &str,
    fields: &[String],
    complete: bool,
) -> Result<()> {
    let form_data = parse_fields(fields)?;
    let mut session = Session::open(settings)?;
    session.require_task(case_id, stage_id, task_id)?;

    let record = TaskAnswerRecord::new(form_data, complete);
    let status = if complete {
        TaskStatus::Completed
    } else {
        TaskStatus::InProgress
    };
    session
        .store
        .write_task_answers(case_id, stage_id, task_id, &record);
    session
        .store
        .write_task_status(case_id, stage_id, task_id, status);

    println!(
        "{} Saved {} answer(s) for [{}] {stage_id}/{task_id} ({})",
        "✓".green(),
        record.form_data.len(),
        case_id.yellow(),
        status
    );
    Ok(())
}

/// Parses `question=value` pairs. A repeated question becomes a list.
fn parse_fields(fields: &[String]) -> Result<BTreeMap<String, AnswerValue>> {
    let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for field in fields {
        let Some((question, value)) = field.split_once('=') else {
            bail!("Expected question=value, got '{field}'");
        };
        let question = question.trim();
        if question.is_empty() {
            bail!("Missing question id in '{field}'");
        }
        raw.entry(question.to_string())
            .or_default()
            .push(value.to_string());
    }

    Ok(raw
        .into_iter()
        .map(|(question, mut values)| {
            let value = if values.len() == 1 {
                scalar(values.remove(0))
            } else {
                AnswerValue::List(values)
            };
            (question, value)
        })
        .collect())
}

fn scalar(value: String) -> AnswerValue {
    match value.as_str() {
        "true" => AnswerValue::Bool(true),
        "false" => AnswerValue::Bool(false),
        _ => value
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map_or(AnswerValue::Text(value), AnswerValue::Number),
    }
}
