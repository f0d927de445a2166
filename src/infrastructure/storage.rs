use crate::domain::baseline::Baseline;
use crate::domain::error::{AppError, Result};
use crate::domain::test_step::{ensure_unique_requirement_ids, TestStep};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BASELINE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_COLLISION_SUFFIX: u32 = 100;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").unwrap());

/// One pretty-printed JSON file per baseline, named `{project}_{timestamp}.json`.
/// A second save for the same project within the same second gets `_N` appended.
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, project_name: &str, urs_text: &str, steps: &[TestStep]) -> Result<Baseline> {
        let timestamp = Local::now().format(BASELINE_TIMESTAMP_FORMAT).to_string();
        self.save_with_timestamp(project_name, urs_text, steps, &timestamp)
    }

    pub(crate) fn save_with_timestamp(
        &self,
        project_name: &str,
        urs_text: &str,
        steps: &[TestStep],
        timestamp: &str,
    ) -> Result<Baseline> {
        validate_name(project_name, "project name")?;
        ensure_unique_requirement_ids(steps)?;
        ensure_dir(&self.dir)?;

        for attempt in 0..MAX_COLLISION_SUFFIX {
            let baseline_id = if attempt == 0 {
                format!("{}_{}", project_name, timestamp)
            } else {
                format!("{}_{}_{}", project_name, timestamp, attempt)
            };
            let path = self.path_for(&baseline_id);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            };

            let baseline = Baseline {
                baseline_id: baseline_id.clone(),
                project_name: project_name.to_string(),
                timestamp: timestamp.to_string(),
                urs_text: urs_text.to_string(),
                test_steps: steps.to_vec(),
                requirements_count: steps.len(),
            };
            let json = serde_json::to_string_pretty(&baseline)
                .map_err(|e| AppError::Internal(format!("Failed to serialize baseline: {}", e)))?;
            file.write_all(json.as_bytes())?;

            info!(baseline_id = %baseline_id, requirements = steps.len(), "Saved baseline");
            return Ok(baseline);
        }

        Err(AppError::Internal(format!(
            "Too many baselines for '{}' at {}",
            project_name, timestamp
        )))
    }

    pub fn get(&self, baseline_id: &str) -> Result<Baseline> {
        validate_name(baseline_id, "baseline id")?;
        let path = self.path_for(baseline_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("baseline '{}'", baseline_id)))
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Internal(format!("Corrupt baseline '{}': {}", baseline_id, e)))
    }

    /// Baseline ids for a project, newest first.
    pub fn list(&self, project_name: &str) -> Result<Vec<String>> {
        validate_name(project_name, "project name")?;
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let pattern = Regex::new(&format!(
            r"^{}_(\d{{8}}_\d{{6}})(?:_(\d+))?\.json$",
            regex::escape(project_name)
        ))
        .map_err(|e| AppError::Internal(format!("Invalid baseline pattern: {}", e)))?;

        let mut found: Vec<(String, u32, String)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let file_name = entry?.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(caps) = pattern.captures(file_name) {
                let timestamp = caps[1].to_string();
                let suffix = caps
                    .get(2)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(0);
                let id = file_name.trim_end_matches(".json").to_string();
                found.push((timestamp, suffix, id));
            }
        }

        found.sort_by(|a, b| (&b.0, b.1).cmp(&(&a.0, a.1)));
        debug!(project = %project_name, count = found.len(), "Listed baselines");
        Ok(found.into_iter().map(|(_, _, id)| id).collect())
    }

    pub fn latest(&self, project_name: &str) -> Result<Option<Baseline>> {
        match self.list(project_name)?.first() {
            Some(id) => self.get(id).map(Some),
            None => Ok(None),
        }
    }

    fn path_for(&self, baseline_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", baseline_id))
    }
}

fn validate_name(value: &str, what: &str) -> Result<()> {
    if NAME_PATTERN.is_match(value) && value != "." && value != ".." {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "Invalid {} '{}': use 1-100 letters, digits, '.', '_' or '-'",
            what, value
        )))
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_step::step;

    fn steps() -> Vec<TestStep> {
        vec![step(1, "REQ-1", "Login", "User logs in")]
    }

    #[test]
    fn latest_picks_newest_timestamp_for_project_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path());

        store
            .save_with_timestamp("alpha", "v1", &steps(), "20240101_090000")
            .unwrap();
        store
            .save_with_timestamp("alpha", "v2", &steps(), "20240315_120000")
            .unwrap();
        store
            .save_with_timestamp("alpha2", "other", &steps(), "20251231_235959")
            .unwrap();

        let latest = store.latest("alpha").unwrap().unwrap();
        assert_eq!(latest.baseline_id, "alpha_20240315_120000");
        assert_eq!(latest.urs_text, "v2");
        assert_eq!(latest.requirements_count, 1);
    }

    #[test]
    fn same_second_saves_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path());

        let first = store
            .save_with_timestamp("proj", "first", &steps(), "20240101_090000")
            .unwrap();
        let second = store
            .save_with_timestamp("proj", "second", &steps(), "20240101_090000")
            .unwrap();

        assert_eq!(first.baseline_id, "proj_20240101_090000");
        assert_eq!(second.baseline_id, "proj_20240101_090000_1");
        assert_eq!(store.get(&first.baseline_id).unwrap().urs_text, "first");
        assert_eq!(store.latest("proj").unwrap().unwrap().urs_text, "second");
    }

    #[test]
    fn missing_project_has_no_latest_and_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path().join("not-created-yet"));

        assert!(store.latest("ghost").unwrap().is_none());
        assert!(matches!(
            store.get("ghost_20240101_000000"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn rejects_path_like_project_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = BaselineStore::new(dir.path());
        assert!(matches!(
            store.save("../etc", "x", &steps()),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            store.get(".."),
            Err(AppError::ValidationError(_))
        ));
    }
}
