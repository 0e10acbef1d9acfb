//! Demo data generator and session reset.
//!
//! Nothing here is used when deriving status. The generator fills a
//! session with progress that looks plausible for each case's static
//! status so the prototype has something to show. Its output is random
//! on purpose.

use super::backend::SessionBackend;
use super::store::TaskProgressStore;
use super::types::{AnswerValue, CaseStatus, TaskAnswerRecord, TaskStatus};
use super::workflow::{CaseCatalog, QuestionKind, Stage, StageKind, Task, Workflow, WorkflowRegistry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::info;

const SHORT_ANSWERS: &[&str] = &[
    "Confirmed with the reporting party",
    "See attached correspondence",
    "No further action required",
    "Referred to the compliance team",
    "Awaiting supporting documents",
];

const LONG_ANSWERS: &[&str] = &[
    "Initial assessment complete. The evidence supplied is consistent with the original report and no conflicting information was found.",
    "The firm responded within the deadline. Their explanation addresses most of the concerns raised, though some records remain outstanding.",
    "Reviewed the submitted documents against the relevant rules. A follow-up request has been drafted to clarify the remaining gaps.",
    "Discussed with the case officer. Agreed that the matter meets the threshold for further review and should proceed to the next stage.",
];

/// Chance that a task after the first in a partially started stage is
/// marked in progress.
const IN_PROGRESS_CHANCE: f64 = 0.5;

/// What the generator wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub cases: usize,
    pub tasks: usize,
}

/// Stages to complete outright and the stage to leave part-way, for a
/// case whose fixture status is `status`.
fn target_pattern(status: CaseStatus) -> (&'static [StageKind], Option<StageKind>) {
    match status {
        CaseStatus::Received => (&[], None),
        CaseStatus::Triage => (&[], Some(StageKind::Triage)),
        CaseStatus::Review => (&[StageKind::Triage], Some(StageKind::Review)),
        CaseStatus::Outcome => (&[StageKind::Triage, StageKind::Review], Some(StageKind::Outcome)),
        CaseStatus::Closed => (&StageKind::ORDER, None),
    }
}

/// Task states for a case, in workflow order.
fn plan_case<'w, R: Rng>(
    status: CaseStatus,
    workflow: &'w Workflow,
    rng: &mut R,
) -> Vec<(&'w Stage, &'w Task, TaskStatus)> {
    let mut plan = Vec::new();
    if status == CaseStatus::Closed {
        for stage in &workflow.stages {
            for task in &stage.tasks {
                plan.push((stage, task, TaskStatus::Completed));
            }
        }
        return plan;
    }

    let (complete, partial) = target_pattern(status);
    for kind in complete {
        if let Some(stage) = workflow.stage(kind.id()) {
            for task in &stage.tasks {
                plan.push((stage, task, TaskStatus::Completed));
            }
        }
    }
    if let Some(stage) = partial.and_then(|kind| workflow.stage(kind.id())) {
        for (i, task) in stage.tasks.iter().enumerate() {
            if i == 0 {
                plan.push((stage, task, TaskStatus::Completed));
            } else if rng.gen_bool(IN_PROGRESS_CHANCE) {
                plan.push((stage, task, TaskStatus::InProgress));
            }
        }
    }
    plan
}

/// Plausible answers for every question on a task's form.
pub fn synthesize_answers<R: Rng>(task: &Task, rng: &mut R) -> BTreeMap<String, AnswerValue> {
    let mut form = BTreeMap::new();
    for question in &task.questions {
        let value = match question.kind {
            QuestionKind::Radio | QuestionKind::Select => question
                .options
                .choose(rng)
                .map(|o| AnswerValue::Text(o.clone())),
            QuestionKind::Checkbox if !question.options.is_empty() => {
                let count = rng.gen_range(1..=question.options.len());
                let picked = question
                    .options
                    .choose_multiple(rng, count)
                    .cloned()
                    .collect();
                Some(AnswerValue::List(picked))
            }
            QuestionKind::Text => SHORT_ANSWERS
                .choose(rng)
                .map(|s| AnswerValue::Text((*s).to_string())),
            QuestionKind::Textarea => LONG_ANSWERS
                .choose(rng)
                .map(|s| AnswerValue::Text((*s).to_string())),
            QuestionKind::Checkbox | QuestionKind::Other => None,
        };
        if let Some(value) = value {
            form.insert(question.id.clone(), value);
        }
    }
    form
}

/// Writes demo progress for every known case, shaped by its static status.
pub fn seed_realistic_task_data<B: SessionBackend, R: Rng>(
    cases: &CaseCatalog,
    workflows: &WorkflowRegistry,
    store: &mut TaskProgressStore<B>,
    rng: &mut R,
) -> SeedSummary {
    let mut summary = SeedSummary::default();
    for case in cases.all() {
        let workflow = workflows.resolve(&case.case_type);
        let plan = plan_case(case.status, workflow, rng);
        if plan.is_empty() {
            continue;
        }
        summary.cases += 1;
        for (stage, task, status) in plan {
            store.write_task_status(&case.case_id, &stage.id, &task.id, status);
            let record = TaskAnswerRecord::new(synthesize_answers(task, rng), status.is_completed());
            store.write_task_answers(&case.case_id, &stage.id, &task.id, &record);
            summary.tasks += 1;
        }
    }
    info!(cases = summary.cases, tasks = summary.tasks, "generated demo task data");
    summary
}

/// Resets the session to its static baseline.
pub fn clear_session_data<B: SessionBackend>(store: &mut TaskProgressStore<B>) {
    store.clear_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::MemoryBackend;
    use crate::engine::status::StatusEngine;
    use crate::engine::workflow::Case;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn workflows() -> WorkflowRegistry {
        let json = serde_json::json!({ "default": { "stages": [
            { "id": "triage", "tasks": [
                { "id": "t1", "questions": [
                    { "id": "risk", "type": "radio", "options": ["low", "high"] },
                    { "id": "notes", "type": "textarea" }
                ] },
                { "id": "t2", "questions": [ { "id": "summary", "type": "text" } ] }
            ] },
            { "id": "review", "tasks": [
                { "id": "r1", "questions": [
                    { "id": "areas", "type": "checkbox", "options": ["a", "b", "c"] },
                    { "id": "when", "type": "date" }
                ] },
                { "id": "r2" },
                { "id": "r3" }
            ] },
            { "id": "outcome", "tasks": [ { "id": "o1" }, { "id": "o2" } ] }
        ] } });
        WorkflowRegistry::new(serde_json::from_value(json).unwrap()).unwrap()
    }

    fn catalog() -> CaseCatalog {
        CaseCatalog::new(
            CaseStatus::ALL
                .into_iter()
                .map(|status| Case {
                    case_id: format!("{status}-1"),
                    case_type: "anything".into(),
                    status,
                })
                .collect(),
        )
    }

    #[test]
    fn test_seeded_status_matches_fixture_status() {
        let cases = catalog();
        let workflows = workflows();
        for seed in 0..20 {
            let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
            let mut rng = StdRng::seed_from_u64(seed);
            seed_realistic_task_data(&cases, &workflows, &mut store, &mut rng);

            let engine = StatusEngine::new(&cases, &workflows, &store);
            for case in cases.all() {
                let shown = engine.display_status(&case.case_id, case.status);
                assert_eq!(shown, case.status, "seed {seed}, case {}", case.case_id);
            }
        }
    }

    #[test]
    fn test_received_cases_are_untouched() {
        let cases = catalog();
        let workflows = workflows();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        let summary =
            seed_realistic_task_data(&cases, &workflows, &mut store, &mut StdRng::seed_from_u64(7));

        assert_eq!(summary.cases, 4);
        assert!(store.read_task_statuses("Received-1").is_empty());
        assert!(store.read_task_answers("Received-1", "triage", "t1").is_none());
    }

    #[test]
    fn test_partial_stage_first_task_completed() {
        let cases = catalog();
        let workflows = workflows();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        seed_realistic_task_data(&cases, &workflows, &mut store, &mut StdRng::seed_from_u64(3));

        let review = store.read_task_statuses("Review-1");
        assert_eq!(review.get("triage", "t2"), TaskStatus::Completed);
        assert_eq!(review.get("review", "r1"), TaskStatus::Completed);
        assert_ne!(review.get("review", "r2"), TaskStatus::Completed);
        assert_eq!(review.get("outcome", "o1"), TaskStatus::NotStarted);
    }

    #[test]
    fn test_answers_follow_question_types() {
        let cases = catalog();
        let workflows = workflows();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        seed_realistic_task_data(&cases, &workflows, &mut store, &mut StdRng::seed_from_u64(11));

        let t1 = store.read_task_answers("Closed-1", "triage", "t1").unwrap();
        assert!(t1.is_completed);
        assert!(matches!(&t1.form_data["risk"], AnswerValue::Text(v) if v == "low" || v == "high"));
        assert!(matches!(&t1.form_data["notes"], AnswerValue::Text(v) if LONG_ANSWERS.contains(&v.as_str())));

        let r1 = store.read_task_answers("Closed-1", "review", "r1").unwrap();
        let AnswerValue::List(areas) = &r1.form_data["areas"] else {
            panic!("checkbox answer should be a list");
        };
        assert!(!areas.is_empty() && areas.len() <= 3);
        assert!(!r1.form_data.contains_key("when"));
    }

    #[test]
    fn test_clear_session_data() {
        let cases = catalog();
        let workflows = workflows();
        let mut store = TaskProgressStore::new(MemoryBackend::new(), "t");
        seed_realistic_task_data(&cases, &workflows, &mut store, &mut StdRng::seed_from_u64(1));
        assert!(!store.is_empty());

        clear_session_data(&mut store);
        assert!(store.is_empty());
    }
}
