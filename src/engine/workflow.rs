//! Read-only fixtures: the case catalog and per-case-type workflows.

use super::types::CaseStatus;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key of the workflow used when a case type has no entry of its own.
pub const DEFAULT_WORKFLOW: &str = "default";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed fixture {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("workflow config has no '{DEFAULT_WORKFLOW}' entry")]
    MissingDefault,
}

/// The workflow stages whose completion drives case status, in the
/// order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Triage,
    Review,
    Outcome,
}

impl StageKind {
    pub const ORDER: [StageKind; 3] = [StageKind::Triage, StageKind::Review, StageKind::Outcome];

    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            StageKind::Triage => "triage",
            StageKind::Review => "review",
            StageKind::Outcome => "outcome",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|kind| kind.id() == id)
    }

    /// Case status when this is the first incomplete stage and some of
    /// its tasks have been started.
    #[must_use]
    pub fn active_status(&self) -> CaseStatus {
        match self {
            StageKind::Triage => CaseStatus::Triage,
            StageKind::Review => CaseStatus::Review,
            StageKind::Outcome => CaseStatus::Outcome,
        }
    }

    /// Case status when this is the first incomplete stage and none of
    /// its tasks have been touched.
    #[must_use]
    pub fn waiting_status(&self) -> CaseStatus {
        match self {
            StageKind::Triage => CaseStatus::Received,
            StageKind::Review => CaseStatus::Triage,
            StageKind::Outcome => CaseStatus::Review,
        }
    }
}

/// A case record from the fixture data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Case {
    #[serde(rename = "CaseID")]
    pub case_id: String,
    pub case_type: String,
    pub status: CaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Radio,
    Select,
    Checkbox,
    Text,
    Textarea,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    pub id: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub stages: Vec<Stage>,
}

impl Workflow {
    #[must_use]
    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    #[must_use]
    pub fn task(&self, stage_id: &str, task_id: &str) -> Option<&Task> {
        self.stage(stage_id)?.tasks.iter().find(|t| t.id == task_id)
    }
}

/// Lowercases a case type and collapses runs of whitespace, `_` and `-`
/// into a single `-`.
#[must_use]
pub fn normalize_case_type(case_type: &str) -> String {
    case_type
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Workflows keyed by normalized case type.
#[derive(Debug, Clone)]
pub struct WorkflowRegistry {
    default: Workflow,
    by_type: BTreeMap<String, Workflow>,
}

impl WorkflowRegistry {
    /// Builds a registry, normalizing keys.
    ///
    /// # Errors
    /// Returns `FixtureError::MissingDefault` if there is no default workflow.
    pub fn new(workflows: BTreeMap<String, Workflow>) -> Result<Self, FixtureError> {
        let mut by_type: BTreeMap<_, _> = workflows
            .into_iter()
            .map(|(k, v)| (normalize_case_type(&k), v))
            .collect();
        let default = by_type
            .remove(DEFAULT_WORKFLOW)
            .ok_or(FixtureError::MissingDefault)?;
        Ok(Self { default, by_type })
    }

    /// Loads the registry from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        Self::new(read_json(path)?)
    }

    /// Workflow for a case type, falling back to the default.
    #[must_use]
    pub fn resolve(&self, case_type: &str) -> &Workflow {
        self.by_type
            .get(&normalize_case_type(case_type))
            .unwrap_or(&self.default)
    }
}

/// All cases known to the fixture data.
#[derive(Debug, Clone, Default)]
pub struct CaseCatalog {
    cases: Vec<Case>,
}

impl CaseCatalog {
    #[must_use]
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    /// Loads the catalog from a JSON array of case records.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        Ok(Self::new(read_json(path)?))
    }

    #[must_use]
    pub fn get(&self, case_id: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.case_id == case_id)
    }

    #[must_use]
    pub fn all(&self) -> &[Case] {
        &self.cases
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FixtureError> {
    let raw = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| FixtureError::Json {
        path: path.to_path_buf(),
        source,
    })
}
