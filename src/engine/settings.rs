//! Settings: where the session lives and where fixtures are read from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DATA_DIR: &str = ".casework";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub db_file: String,
    pub cases_file: PathBuf,
    pub workflows_file: PathBuf,
    pub seed_file: PathBuf,
    /// Prefix for every key the progress store writes.
    pub namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

impl Settings {
    /// Default layout relative to `root`.
    #[must_use]
    pub fn rooted_at(root: &Path) -> Self {
        let fixtures = root.join("fixtures");
        Self {
            data_dir: root.join(DATA_DIR),
            db_file: "session.db".to_string(),
            cases_file: fixtures.join("cases.json"),
            workflows_file: fixtures.join("workflows.json"),
            seed_file: fixtures.join("seed.json"),
            namespace: "casework".to_string(),
        }
    }

    /// Loads `.casework/settings.json` if present, otherwise defaults.
    ///
    /// # Errors
    /// Returns an error if the settings file exists but is unreadable or malformed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Path::new(DATA_DIR).join(SETTINGS_FILE))
    }

    /// Loads settings from `path`, falling back to defaults if it is missing.
    ///
    /// # Errors
    /// Returns an error if the file exists but is unreadable or malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Malformed settings in {}", path.display()))
    }

    /// Points every fixture path at files inside `dir`.
    #[must_use]
    pub fn with_fixtures_dir(mut self, dir: &Path) -> Self {
        self.cases_file = dir.join("cases.json");
        self.workflows_file = dir.join("workflows.json");
        self.seed_file = dir.join("seed.json");
        self
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}
