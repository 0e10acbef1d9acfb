//! Core types for the casework system.
//!
//! Note: `CaseStatus` is what users see. It is never stored; the
//! engine in `status.rs` derives it from the stored `TaskStatus` values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Label that could not be parsed into a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown case status '{0}' (expected Received, Triage, Review, Outcome or Closed)")]
    CaseStatus(String),
    #[error("unknown task status '{0}' (expected not-started, in-progress or completed)")]
    TaskStatus(String),
}

/// Case-level workflow status, ordered by how far through the workflow
/// the case has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    Received,
    Triage,
    Review,
    Outcome,
    Closed,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Received,
        CaseStatus::Triage,
        CaseStatus::Review,
        CaseStatus::Outcome,
        CaseStatus::Closed,
    ];

    /// Returns the display color hint for terminal rendering.
    #[must_use]
    pub fn color_hint(&self) -> &'static str {
        match self {
            CaseStatus::Received => "white",
            CaseStatus::Triage => "yellow",
            CaseStatus::Review => "blue",
            CaseStatus::Outcome => "magenta",
            CaseStatus::Closed => "green",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "Received"),
            Self::Triage => write!(f, "Triage"),
            Self::Review => write!(f, "Review"),
            Self::Outcome => write!(f, "Outcome"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for CaseStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::CaseStatus(s.to_string()))
    }
}

/// Lifecycle state of a single task. Absent means `NotStarted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// True once any work has been recorded against the task.
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Completed)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ParseError::TaskStatus(other.to_string())),
        }
    }
}

/// Identity of a task across a workflow: the stage it lives in plus its
/// id within that stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    pub stage_id: String,
    pub task_id: String,
}

impl TaskKey {
    #[must_use]
    pub fn new(stage_id: &str, task_id: &str) -> Self {
        Self {
            stage_id: stage_id.to_string(),
            task_id: task_id.to_string(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stage_id, self.task_id)
    }
}

/// Serialized shape of a `TaskStatusMap`: `{ stageId: { taskId: status } }`.
type NestedStatuses = BTreeMap<String, BTreeMap<String, TaskStatus>>;

/// Per-case record of explicitly written task states.
///
/// An empty map means nothing was ever written for the case, which the
/// status engine treats differently from "everything not started".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NestedStatuses", into = "NestedStatuses")]
pub struct TaskStatusMap {
    entries: BTreeMap<TaskKey, TaskStatus>,
}

impl TaskStatusMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored status for a task, `NotStarted` when absent.
    #[must_use]
    pub fn get(&self, stage_id: &str, task_id: &str) -> TaskStatus {
        self.entries
            .get(&TaskKey::new(stage_id, task_id))
            .copied()
            .unwrap_or_default()
    }

    /// Inserts or replaces a single entry.
    pub fn set(&mut self, stage_id: &str, task_id: &str, status: TaskStatus) {
        self.entries.insert(TaskKey::new(stage_id, task_id), status);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskKey, &TaskStatus)> {
        self.entries.iter()
    }
}

impl From<NestedStatuses> for TaskStatusMap {
    fn from(nested: NestedStatuses) -> Self {
        let mut map = Self::new();
        for (stage_id, tasks) in nested {
            for (task_id, status) in tasks {
                map.set(&stage_id, &task_id, status);
            }
        }
        map
    }
}

impl From<TaskStatusMap> for NestedStatuses {
    fn from(map: TaskStatusMap) -> Self {
        let mut nested = NestedStatuses::new();
        for (key, status) in map.entries {
            nested
                .entry(key.stage_id)
                .or_default()
                .insert(key.task_id, status);
        }
        nested
    }
}

/// A single form answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

/// Answers submitted for one task's form.
///
/// Note: `is_completed` is written alongside, not derived from, the
/// task's entry in `TaskStatusMap`. The two may disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnswerRecord {
    pub form_data: BTreeMap<String, AnswerValue>,
    pub is_completed: bool,
    pub last_saved: String,
}

impl TaskAnswerRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(form_data: BTreeMap<String, AnswerValue>, is_completed: bool) -> Self {
        Self {
            form_data,
            is_completed,
            last_saved: chrono::Utc::now().to_rfc3339(),
        }
    }
}
