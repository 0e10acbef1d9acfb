pub mod answer;
pub mod clear;
pub mod export;
pub mod generate;
pub mod init;
pub mod list;
pub mod seed;
pub mod set;
pub mod show;
pub mod status;
pub mod why;

use anyhow::{bail, Context, Result};
use casework::engine::backend::SqliteBackend;
use casework::engine::db::Db;
use casework::engine::settings::Settings;
use casework::engine::status::StatusEngine;
use casework::engine::store::TaskProgressStore;
use casework::engine::types::CaseStatus;
use casework::engine::workflow::{Case, CaseCatalog, Workflow, WorkflowRegistry};
use colored::{ColoredString, Colorize};

/// Fixtures plus the persistent progress store, opened for one command.
pub struct Session {
    pub cases: CaseCatalog,
    pub workflows: WorkflowRegistry,
    pub store: TaskProgressStore<SqliteBackend>,
}

impl Session {
    /// Connects to the session database and loads the fixtures.
    ///
    /// # Errors
    /// Returns error if the session is not initialized or a fixture is unreadable.
    pub fn open(settings: &Settings) -> Result<Self> {
        let conn = Db::connect(settings)?;
        let cases = CaseCatalog::load(&settings.cases_file).context("Failed to load cases")?;
        let workflows =
            WorkflowRegistry::load(&settings.workflows_file).context("Failed to load workflows")?;
        Ok(Self {
            cases,
            workflows,
            store: TaskProgressStore::new(SqliteBackend::new(conn), &settings.namespace),
        })
    }

    #[must_use]
    pub fn engine(&self) -> StatusEngine<'_, SqliteBackend> {
        StatusEngine::new(&self.cases, &self.workflows, &self.store)
    }

    /// Looks up a case and its workflow.
    ///
    /// # Errors
    /// Returns error if the case is not in the fixtures.
    pub fn require_case(&self, case_id: &str) -> Result<(&Case, &Workflow)> {
        let Some(case) = self.cases.get(case_id) else {
            bail!("Unknown case '{case_id}'");
        };
        Ok((case, self.workflows.resolve(&case.case_type)))
    }

    /// Checks that a task exists in the case's workflow.
    ///
    /// # Errors
    /// Returns error if the case, stage or task is unknown.
    pub fn require_task(&self, case_id: &str, stage_id: &str, task_id: &str) -> Result<()> {
        let (case, workflow) = self.require_case(case_id)?;
        if workflow.stage(stage_id).is_none() {
            bail!("Case [{}] has no stage '{stage_id}'", case.case_id);
        }
        if workflow.task(stage_id, task_id).is_none() {
            bail!("Stage '{stage_id}' of case [{}] has no task '{task_id}'", case.case_id);
        }
        Ok(())
    }
}

pub fn paint_status(status: CaseStatus) -> ColoredString {
    status.to_string().color(status.color_hint())
}
