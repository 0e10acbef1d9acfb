//! Status Engine: Computes case status from recorded task progress.
//!
//! This module answers "where is this case in its workflow right now?"
//! by walking the case's stages against its `TaskStatusMap`. Nothing is
//! cached; every call recomputes from the store, so callers may invoke
//! it once per rendered row.

use super::backend::SessionBackend;
use super::store::TaskProgressStore;
use super::types::{CaseStatus, TaskKey, TaskStatus, TaskStatusMap};
use super::workflow::{CaseCatalog, Stage, StageKind, Workflow, WorkflowRegistry};
use serde::Serialize;

/// Completion counts for one stage of a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageProgress {
    pub stage_id: String,
    pub total: usize,
    pub completed: usize,
    pub started: usize,
}

impl StageProgress {
    #[must_use]
    pub fn measure(stage: &Stage, map: &TaskStatusMap) -> Self {
        let statuses: Vec<TaskStatus> = stage
            .tasks
            .iter()
            .map(|task| map.get(&stage.id, &task.id))
            .collect();
        Self {
            stage_id: stage.id.clone(),
            total: statuses.len(),
            completed: statuses.iter().filter(|s| s.is_completed()).count(),
            started: statuses.iter().filter(|s| s.is_started()).count(),
        }
    }

    /// Vacuously true for a stage without tasks.
    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.completed == self.total
    }

    #[must_use]
    pub fn any_started(&self) -> bool {
        self.started > 0
    }
}

/// Derives case status from a workflow and a map of task states.
///
/// Stages are evaluated strictly in `StageKind::ORDER`. The first stage
/// that is not fully completed decides the result; a stage the workflow
/// leaves out, or one with no tasks, counts as completed.
#[must_use]
pub fn derive_status(workflow: &Workflow, map: &TaskStatusMap) -> CaseStatus {
    first_open_stage(workflow, map).map_or(CaseStatus::Closed, |(kind, progress)| {
        if progress.any_started() {
            kind.active_status()
        } else {
            kind.waiting_status()
        }
    })
}

fn first_open_stage(workflow: &Workflow, map: &TaskStatusMap) -> Option<(StageKind, StageProgress)> {
    StageKind::ORDER.into_iter().find_map(|kind| {
        let stage = workflow.stage(kind.id())?;
        let progress = StageProgress::measure(stage, map);
        (!progress.all_completed()).then_some((kind, progress))
    })
}

/// A task whose answer record and stored status disagree about completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub task: String,
    pub status: String,
    pub answers_completed: bool,
}

/// Everything needed to explain a case's display status.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub case_id: String,
    pub case_type: String,
    pub static_status: CaseStatus,
    pub display_status: CaseStatus,
    pub has_progress: bool,
    pub deciding_stage: Option<String>,
    pub stages: Vec<StageProgress>,
    pub divergences: Vec<Divergence>,
}

pub struct StatusEngine<'a, B> {
    cases: &'a CaseCatalog,
    workflows: &'a WorkflowRegistry,
    store: &'a TaskProgressStore<B>,
}

impl<'a, B: SessionBackend> StatusEngine<'a, B> {
    #[must_use]
    pub fn new(
        cases: &'a CaseCatalog,
        workflows: &'a WorkflowRegistry,
        store: &'a TaskProgressStore<B>,
    ) -> Self {
        Self {
            cases,
            workflows,
            store,
        }
    }

    /// Workflow for a known case.
    #[must_use]
    pub fn workflow_for(&self, case_id: &str) -> Option<&'a Workflow> {
        let case = self.cases.get(case_id)?;
        Some(self.workflows.resolve(&case.case_type))
    }

    /// Status to show for a case.
    ///
    /// Returns `static_status` untouched while nothing has been recorded
    /// for the case, otherwise the derived status.
    #[must_use]
    pub fn display_status(&self, case_id: &str, static_status: CaseStatus) -> CaseStatus {
        let map = self.store.read_task_statuses(case_id);
        if map.is_empty() {
            return static_status;
        }
        self.calculate_case_status(case_id, &map)
    }

    /// Derives status from `map` using the case's workflow.
    ///
    /// Unknown cases report `Received`.
    #[must_use]
    pub fn calculate_case_status(&self, case_id: &str, map: &TaskStatusMap) -> CaseStatus {
        match self.workflow_for(case_id) {
            Some(workflow) => derive_status(workflow, map),
            None => CaseStatus::Received,
        }
    }

    /// Builds a breakdown of a known case's progress.
    #[must_use]
    pub fn explain(&self, case_id: &str) -> Option<CaseReport> {
        let case = self.cases.get(case_id)?;
        let workflow = self.workflows.resolve(&case.case_type);
        let map = self.store.read_task_statuses(case_id);

        let stages = workflow
            .stages
            .iter()
            .map(|stage| StageProgress::measure(stage, &map))
            .collect();
        let deciding_stage = if map.is_empty() {
            None
        } else {
            first_open_stage(workflow, &map).map(|(kind, _)| kind.id().to_string())
        };

        Some(CaseReport {
            case_id: case.case_id.clone(),
            case_type: case.case_type.clone(),
            static_status: case.status,
            display_status: self.display_status(case_id, case.status),
            has_progress: !map.is_empty(),
            deciding_stage,
            stages,
            divergences: self.divergences(case_id, workflow, &map),
        })
    }

    fn divergences(&self, case_id: &str, workflow: &Workflow, map: &TaskStatusMap) -> Vec<Divergence> {
        let mut found = Vec::new();
        for stage in &workflow.stages {
            for task in &stage.tasks {
                let Some(answers) = self.store.read_task_answers(case_id, &stage.id, &task.id)
                else {
                    continue;
                };
                let status = map.get(&stage.id, &task.id);
                if answers.is_completed != status.is_completed() {
                    found.push(Divergence {
                        task: TaskKey::new(&stage.id, &task.id).to_string(),
                        status: status.to_string(),
                        answers_completed: answers.is_completed,
                    });
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::MemoryBackend;
    use crate::engine::types::TaskAnswerRecord;
    use crate::engine::workflow::Case;
    use std::collections::BTreeMap;

    fn workflow(json: serde_json::Value) -> Workflow {
        serde_json::from_value(json).unwrap()
    }

    fn standard() -> Workflow {
        workflow(serde_json::json!({ "stages": [
            { "id": "triage", "tasks": [ { "id": "t1" }, { "id": "t2" } ] },
            { "id": "review", "tasks": [ { "id": "r1" }, { "id": "r2" } ] },
            { "id": "outcome", "tasks": [ { "id": "o1" }, { "id": "o2" } ] }
        ] }))
    }

    fn fixtures() -> (CaseCatalog, WorkflowRegistry) {
        let cases = CaseCatalog::new(vec![
            Case {
                case_id: "C1".into(),
                case_type: "default".into(),
                status: CaseStatus::Received,
            },
            Case {
                case_id: "C2".into(),
                case_type: "Fraud".into(),
                status: CaseStatus::Outcome,
            },
        ]);
        let mut workflows = BTreeMap::new();
        workflows.insert("default".to_string(), standard());
        workflows.insert(
            "fraud".to_string(),
            workflow(serde_json::json!({ "stages": [
                { "id": "triage", "tasks": [ { "id": "f1" } ] },
                { "id": "review", "tasks": [] },
                { "id": "outcome", "tasks": [ { "id": "f2" } ] }
            ] })),
        );
        (cases, WorkflowRegistry::new(workflows).unwrap())
    }

    fn map(entries: &[(&str, &str, TaskStatus)]) -> TaskStatusMap {
        let mut m = TaskStatusMap::new();
        for (stage, task, status) in entries {
            m.set(stage, task, *status);
        }
        m
    }

    const ALL_TASKS: [(&str, &str); 6] = [
        ("triage", "t1"),
        ("triage", "t2"),
        ("review", "r1"),
        ("review", "r2"),
        ("outcome", "o1"),
        ("outcome", "o2"),
    ];

    /// Every assignment of the three task states to the standard workflow.
    fn every_map() -> Vec<TaskStatusMap> {
        let states = [TaskStatus::NotStarted, TaskStatus::InProgress, TaskStatus::Completed];
        let mut maps = vec![TaskStatusMap::new()];
        for (stage, task) in ALL_TASKS {
            maps = maps
                .into_iter()
                .flat_map(|m| {
                    states.into_iter().map(move |s| {
                        let mut next = m.clone();
                        next.set(stage, task, s);
                        next
                    })
                })
                .collect();
        }
        maps
    }

    #[test]
    fn test_triage_partially_done() {
        let m = map(&[
            ("triage", "t1", TaskStatus::Completed),
            ("triage", "t2", TaskStatus::InProgress),
        ]);
        assert_eq!(derive_status(&standard(), &m), CaseStatus::Triage);
    }

    #[test]
    fn test_review_in_progress() {
        let m = map(&[
            ("triage", "t1", TaskStatus::Completed),
            ("triage", "t2", TaskStatus::Completed),
            ("review", "r1", TaskStatus::InProgress),
        ]);
        assert_eq!(derive_status(&standard(), &m), CaseStatus::Review);
    }

    #[test]
    fn test_untouched_next_stage_reports_previous() {
        let m = map(&[
            ("triage", "t1", TaskStatus::Completed),
            ("triage", "t2", TaskStatus::Completed),
        ]);
        assert_eq!(derive_status(&standard(), &m), CaseStatus::Triage);

        let m = map(&[("triage", "t1", TaskStatus::NotStarted)]);
        assert_eq!(derive_status(&standard(), &m), CaseStatus::Received);
    }

    #[test]
    fn test_all_completed_is_closed() {
        let entries: Vec<_> = ALL_TASKS
            .iter()
            .map(|(s, t)| (*s, *t, TaskStatus::Completed))
            .collect();
        assert_eq!(derive_status(&standard(), &map(&entries)), CaseStatus::Closed);
    }

    #[test]
    fn test_closed_iff_every_task_completed() {
        for m in every_map() {
            let all_done = ALL_TASKS
                .iter()
                .all(|(s, t)| m.get(s, t) == TaskStatus::Completed);
            assert_eq!(derive_status(&standard(), &m) == CaseStatus::Closed, all_done);
        }
    }

    #[test]
    fn test_completing_a_task_never_lowers_status() {
        let wf = standard();
        for m in every_map() {
            let before = derive_status(&wf, &m);
            for (stage, task) in ALL_TASKS {
                let mut more = m.clone();
                more.set(stage, task, TaskStatus::Completed);
                assert!(derive_status(&wf, &more) >= before, "{m:?} + {stage}/{task}");
            }
        }
    }

    #[test]
    fn test_outcome_changes_do_not_move_earlier_conclusions() {
        let wf = standard();
        for m in every_map() {
            let earlier_done = ALL_TASKS[..4].iter().all(|(s, t)| m.get(s, t).is_completed());
            if earlier_done {
                continue;
            }
            let before = derive_status(&wf, &m);
            let mut other = m.clone();
            other.set("outcome", "o1", TaskStatus::Completed);
            other.set("outcome", "o2", TaskStatus::InProgress);
            assert_eq!(derive_status(&wf, &other), before);
        }
    }

    #[test]
    fn test_empty_and_missing_stages_are_skipped() {
        let wf = workflow(serde_json::json!({ "stages": [
            { "id": "triage", "tasks": [] },
            { "id": "outcome", "tasks": [ { "id": "o1" } ] }
        ] }));
        assert_eq!(derive_status(&wf, &map(&[])), CaseStatus::Review);
        let done = map(&[("outcome", "o1", TaskStatus::Completed)]);
        assert_eq!(derive_status(&wf, &done), CaseStatus::Closed);
    }

    #[test]
    fn test_unknown_stage_ids_do_not_block() {
        let wf = workflow(serde_json::json!({ "stages": [
            { "id": "triage", "tasks": [ { "id": "t1" } ] },
            { "id": "appeal", "tasks": [ { "id": "a1" } ] }
        ] }));
        let m = map(&[("triage", "t1", TaskStatus::Completed)]);
        assert_eq!(derive_status(&wf, &m), CaseStatus::Closed);
    }

    #[test]
    fn test_fallback_when_nothing_recorded() {
        let (cases, workflows) = fixtures();
        let store = TaskProgressStore::new(MemoryBackend::new(), "t");
        let engine = StatusEngine::new(&cases, &workflows, &store);
        for status in CaseStatus::ALL {
            assert_eq!(engine.display_status("C1", status), status);
            assert_eq!(engine.display_status("nobody", status), status);
        }
    }

    #[test]
    fn test_display_status_uses_progress_and_is_repeatable() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        store.write_task_status("C1", "triage", "t1", TaskStatus::InProgress);

        let engine = StatusEngine::new(&cases, &workflows, &store);
        assert_eq!(engine.display_status("C1", CaseStatus::Closed), CaseStatus::Triage);
        assert_eq!(engine.display_status("C1", CaseStatus::Closed), CaseStatus::Triage);
    }

    #[test]
    fn test_not_started_write_still_counts_as_progress() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        store.write_task_status("C1", "triage", "t1", TaskStatus::NotStarted);
        let engine = StatusEngine::new(&cases, &workflows, &store);
        assert_eq!(engine.display_status("C1", CaseStatus::Outcome), CaseStatus::Received);
    }

    #[test]
    fn test_unknown_case_with_progress_is_received() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        store.write_task_status("ghost", "triage", "t1", TaskStatus::Completed);
        let engine = StatusEngine::new(&cases, &workflows, &store);
        assert_eq!(engine.display_status("ghost", CaseStatus::Closed), CaseStatus::Received);
    }

    #[test]
    fn test_case_type_workflow_with_empty_stage() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        store.write_task_status("C2", "triage", "f1", TaskStatus::Completed);
        {
            let engine = StatusEngine::new(&cases, &workflows, &store);
            assert_eq!(engine.display_status("C2", CaseStatus::Outcome), CaseStatus::Review);
        }
        store.write_task_status("C2", "outcome", "f2", TaskStatus::Completed);
        let engine = StatusEngine::new(&cases, &workflows, &store);
        assert_eq!(engine.display_status("C2", CaseStatus::Outcome), CaseStatus::Closed);
    }

    #[test]
    fn test_clear_restores_fallback() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        for (stage, task) in ALL_TASKS {
            store.write_task_status("C1", stage, task, TaskStatus::Completed);
        }
        assert_eq!(
            StatusEngine::new(&cases, &workflows, &store).display_status("C1", CaseStatus::Received),
            CaseStatus::Closed
        );

        store.clear_all();
        assert_eq!(
            StatusEngine::new(&cases, &workflows, &store).display_status("C1", CaseStatus::Received),
            CaseStatus::Received
        );
    }

    #[test]
    fn test_demo_fixtures_with_seed_bundle() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let cases = CaseCatalog::load(&dir.join("cases.json")).unwrap();
        let workflows = WorkflowRegistry::load(&dir.join("workflows.json")).unwrap();
        let raw = std::fs::read_to_string(dir.join("seed.json")).unwrap();
        let bundle: crate::engine::store::SeedBundle = serde_json::from_str(&raw).unwrap();

        let mut store = TaskProgressStore::new(MemoryBackend::new(), "demo");
        assert!(store.load_seed(&bundle));
        let engine = StatusEngine::new(&cases, &workflows, &store);

        let shown = |id: &str| engine.display_status(id, cases.get(id).unwrap().status);
        assert_eq!(shown("CW-1001"), CaseStatus::Received);
        assert_eq!(shown("CW-1002"), CaseStatus::Triage);
        assert_eq!(shown("CW-1003"), CaseStatus::Review);
        assert_eq!(shown("CW-1005"), CaseStatus::Closed);
        assert_eq!(shown("CW-1004"), CaseStatus::Outcome);
    }

    #[test]
    fn test_explain_reports_stages_and_divergence() {
        let (cases, workflows) = fixtures();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        store.write_task_status("C1", "triage", "t1", TaskStatus::Completed);
        store.write_task_status("C1", "triage", "t2", TaskStatus::InProgress);
        store.write_task_answers("C1", "triage", "t2", &TaskAnswerRecord::new(BTreeMap::new(), true));
        store.write_task_answers("C1", "triage", "t1", &TaskAnswerRecord::new(BTreeMap::new(), true));

        let engine = StatusEngine::new(&cases, &workflows, &store);
        let report = engine.explain("C1").unwrap();
        assert_eq!(report.display_status, CaseStatus::Triage);
        assert_eq!(report.deciding_stage.as_deref(), Some("triage"));
        assert_eq!(report.stages[0].completed, 1);
        assert_eq!(report.stages[0].started, 2);
        assert_eq!(report.divergences.len(), 1);
        assert_eq!(report.divergences[0].task, "triage/t2");
        assert!(engine.explain("missing").is_none());
    }
}
