//! Task Progress Store: per-case task states and form answers.
//!
//! Every read degrades to "no data" and every write is best-effort.
//! Nothing here returns an error to the caller; failures are logged.

use super::backend::{SessionBackend, StoreError};
use super::types::{TaskAnswerRecord, TaskStatus, TaskStatusMap};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const STATUS_SEGMENT: &str = "status";
const ANSWERS_SEGMENT: &str = "answers";

/// Answer records nested as `{ caseId: { stageId: { taskId: record } } }`.
pub type TaskDataTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, TaskAnswerRecord>>>;

/// A pre-baked snapshot of session progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBundle {
    #[serde(default)]
    pub task_statuses: BTreeMap<String, TaskStatusMap>,
    #[serde(default)]
    pub task_data: TaskDataTree,
}

impl SeedBundle {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.task_statuses.is_empty() && self.task_data.is_empty()
    }
}

/// Decodes a raw read, treating backend failures and corrupt payloads
/// as absent.
fn parse_or_default<T: DeserializeOwned + Default>(
    key: &str,
    raw: Result<Option<String>, StoreError>,
) -> T {
    match raw {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "discarding corrupt session entry");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "session read failed; treating as empty");
            T::default()
        }
    }
}

pub struct TaskProgressStore<B> {
    backend: B,
    namespace: String,
    /// Key prefix: the JSON-quoted namespace and a `:`. Quoting keeps a
    /// namespace from matching the keys of another that extends it.
    root: String,
}

impl<B: SessionBackend> TaskProgressStore<B> {
    /// Creates a store writing under `namespace` in `backend`.
    #[must_use]
    pub fn new(backend: B, namespace: &str) -> Self {
        Self {
            backend,
            namespace: namespace.to_string(),
            root: format!("{}:", serde_json::json!(namespace)),
        }
    }

    #[cfg(test)]
    fn into_backend(self) -> B {
        self.backend
    }

    fn status_key(&self, case_id: &str) -> String {
        format!("{}{STATUS_SEGMENT}:{case_id}", self.root)
    }

    // Ids are JSON-encoded so that no id content can forge a key boundary.
    fn answers_key(&self, case_id: &str, stage_id: &str, task_id: &str) -> String {
        let ids = serde_json::json!([case_id, stage_id, task_id]);
        format!("{}{ANSWERS_SEGMENT}:{ids}", self.root)
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StoreError::from)
            .and_then(|raw| self.backend.set(key, &raw));
        if let Err(e) = result {
            warn!(key, error = %e, "session write failed; change dropped");
        }
    }

    /// Stored task states for a case. Empty when nothing was written.
    #[must_use]
    pub fn read_task_statuses(&self, case_id: &str) -> TaskStatusMap {
        let key = self.status_key(case_id);
        parse_or_default(&key, self.backend.get(&key))
    }

    /// Merges one task state into the case's map and persists the map.
    pub fn write_task_status(
        &mut self,
        case_id: &str,
        stage_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) {
        let mut map = self.read_task_statuses(case_id);
        map.set(stage_id, task_id, status);
        debug!(case_id, stage_id, task_id, %status, "writing task status");
        let key = self.status_key(case_id);
        self.persist(&key, &map);
    }

    #[must_use]
    pub fn read_task_answers(
        &self,
        case_id: &str,
        stage_id: &str,
        task_id: &str,
    ) -> Option<TaskAnswerRecord> {
        let key = self.answers_key(case_id, stage_id, task_id);
        parse_or_default(&key, self.backend.get(&key))
    }

    /// Replaces the whole answer record for a task.
    pub fn write_task_answers(
        &mut self,
        case_id: &str,
        stage_id: &str,
        task_id: &str,
        record: &TaskAnswerRecord,
    ) {
        debug!(case_id, stage_id, task_id, fields = record.form_data.len(), "writing task answers");
        let key = self.answers_key(case_id, stage_id, task_id);
        self.persist(&key, record);
    }

    /// True when nothing is stored under this store's namespace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self.backend.keys_with_prefix(&self.root) {
            Ok(keys) => keys.is_empty(),
            Err(e) => {
                warn!(error = %e, "session listing failed; treating as empty");
                true
            }
        }
    }

    /// Removes every entry under the namespace.
    pub fn clear_all(&mut self) {
        match self.backend.remove_prefix(&self.root) {
            Ok(()) => info!(namespace = %self.namespace, "cleared session data"),
            Err(e) => warn!(error = %e, "failed to clear session data"),
        }
    }

    /// Loads `bundle` unless the namespace already holds data.
    ///
    /// Returns whether the bundle was loaded.
    pub fn load_seed(&mut self, bundle: &SeedBundle) -> bool {
        if !self.is_empty() {
            debug!("session already populated; skipping seed");
            return false;
        }
        self.write_bundle(bundle);
        true
    }

    /// Clears the namespace and loads `bundle`.
    pub fn refresh_seed(&mut self, bundle: &SeedBundle) {
        self.clear_all();
        self.write_bundle(bundle);
    }

    fn write_bundle(&mut self, bundle: &SeedBundle) {
        for (case_id, map) in &bundle.task_statuses {
            let key = self.status_key(case_id);
            self.persist(&key, map);
        }
        for (case_id, stages) in &bundle.task_data {
            for (stage_id, tasks) in stages {
                for (task_id, record) in tasks {
                    self.write_task_answers(case_id, stage_id, task_id, record);
                }
            }
        }
        info!(
            cases = bundle.task_statuses.len(),
            answered_cases = bundle.task_data.len(),
            "loaded seed bundle"
        );
    }

    /// Snapshots the namespace as a bundle that `load_seed` can replay.
    #[must_use]
    pub fn export_seed(&self) -> SeedBundle {
        let mut bundle = SeedBundle::default();
        let keys = match self.backend.keys_with_prefix(&self.root) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "session listing failed; exporting nothing");
                return bundle;
            }
        };

        let status_prefix = format!("{}{STATUS_SEGMENT}:", self.root);
        let answers_prefix = format!("{}{ANSWERS_SEGMENT}:", self.root);
        for key in keys {
            if let Some(case_id) = key.strip_prefix(&status_prefix) {
                let map = self.read_task_statuses(case_id);
                if !map.is_empty() {
                    bundle.task_statuses.insert(case_id.to_string(), map);
                }
            } else if let Some(ids) = key.strip_prefix(&answers_prefix) {
                let Ok([case_id, stage_id, task_id]) = serde_json::from_str::<[String; 3]>(ids)
                else {
                    warn!(key, "skipping unrecognised answers key");
                    continue;
                };
                if let Some(record) = self.read_task_answers(&case_id, &stage_id, &task_id) {
                    bundle
                        .task_data
                        .entry(case_id)
                        .or_default()
                        .entry(stage_id)
                        .or_default()
                        .insert(task_id, record);
                }
            }
        }
        bundle
    }
}
