//! Export and import of the goal collection as JSON files.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::SyncError;
use crate::model::Goal;

/// File name used for an export made on `day`.
pub fn export_file_name(day: NaiveDate) -> String {
    format!("goals-{}.json", day.format("%Y-%m-%d"))
}

/// Pretty-printed JSON for `goals`.
pub fn export_goals(goals: &[Goal]) -> Result<String, SyncError> {
    serde_json::to_string_pretty(goals)
        .map_err(|e| SyncError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Write an export file into `dir` and return its path.
pub fn write_export(goals: &[Goal], dir: &Path, day: NaiveDate) -> Result<PathBuf, SyncError> {
    let path = dir.join(export_file_name(day));
    std::fs::write(&path, export_goals(goals)?)?;
    tracing::info!("Exported {} goals to {}", goals.len(), path.display());
    Ok(path)
}

/// Parse import content. Anything other than a JSON array of goals is
/// rejected rather than coerced.
pub fn parse_import(content: &str) -> Result<ImportPlan, SyncError> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|_| SyncError::ImportInvalid("Invalid JSON file".to_string()))?;

    if !value.is_array() {
        return Err(SyncError::ImportInvalid(
            "Expected a list of goals".to_string(),
        ));
    }

    let goals: Vec<Goal> = serde_json::from_value(value)
        .map_err(|e| SyncError::ImportInvalid(format!("Not a list of goals: {}", e)))?;

    Ok(ImportPlan { goals })
}

/// Read and parse an import file.
pub fn read_import(path: &Path) -> Result<ImportPlan, SyncError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        tracing::warn!("Failed to read import file {}: {}", path.display(), e);
        SyncError::ImportInvalid("Failed to read file".to_string())
    })?;
    parse_import(&content)
}

/// A parsed import waiting for the user's go-ahead.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    goals: Vec<Goal>,
}

impl ImportPlan {
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Confirmation question shown before replacing anything.
    pub fn prompt(&self) -> String {
        format!(
            "Import {} goals? This will replace your current goals.",
            self.goals.len()
        )
    }

    /// Replace `current` with the imported goals if `confirm` agrees.
    /// Returns whether the replacement happened.
    pub fn apply(self, current: &mut Vec<Goal>, confirm: impl FnOnce(&str) -> bool) -> bool {
        if !confirm(&self.prompt()) {
            tracing::info!("Import of {} goals declined", self.goals.len());
            return false;
        }
        tracing::info!("Imported {} goals", self.goals.len());
        *current = self.goals;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersistedState;

    #[test]
    fn test_export_file_name() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(export_file_name(day), "goals-2026-10-17.json");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let result = parse_import("{ goals: oops");
        assert!(matches!(result, Err(SyncError::ImportInvalid(_))));
    }

    #[test]
    fn test_non_array_is_rejected() {
        assert!(matches!(parse_import("{\"id\": 1}"), Err(SyncError::ImportInvalid(_))));
        assert!(matches!(parse_import("[{\"nope\": true}]"), Err(SyncError::ImportInvalid(_))));
    }

    #[test]
    fn test_declined_import_keeps_goals() {
        let mut current = PersistedState::builtin().goals;
        let plan = parse_import(&export_goals(&current[..2]).unwrap()).unwrap();

        assert!(!plan.apply(&mut current, |_| false));
        assert_eq!(current.len(), 6);
    }

    #[test]
    fn test_export_then_import_replaces_goals() {
        let dir = tempfile::tempdir().unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let exported = PersistedState::builtin().goals[..3].to_vec();

        let path = write_export(&exported, dir.path(), day).unwrap();
        let plan = read_import(&path).unwrap();
        assert_eq!(plan.prompt(), "Import 3 goals? This will replace your current goals.");

        let mut current = PersistedState::builtin().goals;
        let mut asked = String::new();
        assert!(plan.apply(&mut current, |q| {
            asked = q.to_string();
            true
        }));
        assert_eq!(current, exported);
        assert!(asked.starts_with("Import 3 goals"));
    }

    #[test]
    fn test_unreadable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_import(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(SyncError::ImportInvalid(msg)) if msg == "Failed to read file"));
    }
}
