//! Persisted dashboard data: goals, shortcut items and the document that
//! carries them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Goal priority. Unrecognized values read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Low,
    #[default]
    #[serde(other)]
    Medium,
}

/// One day's snapshot of a goal's completion percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Calendar day, e.g. `Sat Oct 17 2026`
    pub date: String,
    /// Completion percentage, 0-100
    pub progress: f64,
}

/// A numeric progress goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub current: f64,
    pub target: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Goal {
    /// Completion percentage. Zero when the target is not positive.
    pub fn progress_percent(&self) -> f64 {
        if self.target > 0.0 {
            self.current / self.target * 100.0
        } else {
            0.0
        }
    }
}

/// A quick-link shortcut, used for both favorites and apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub favicon: Option<String>,
}

/// Everything the dashboard persists, written as a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub goals: Vec<Goal>,
    pub favorites: Vec<ShortcutItem>,
    pub apps: Vec<ShortcutItem>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PersistedState {
    /// The dataset shown when neither the remote store nor the local cache
    /// has anything to offer.
    pub fn builtin() -> Self {
        let goal = |id: i64,
                    title: &str,
                    current: f64,
                    target: f64,
                    unit: &str,
                    color: &str,
                    icon: &str,
                    category: &str,
                    priority: Priority,
                    notes: &str| Goal {
            id,
            title: title.to_string(),
            current,
            target,
            unit: unit.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            category: category.to_string(),
            priority,
            notes: notes.to_string(),
            history: Vec::new(),
        };

        Self {
            goals: vec![
                goal(1, "Read 50 Books", 32.0, 50.0, "books", "#0078D4", "📚", "Learning", Priority::High, "Focus on non-fiction this year"),
                goal(2, "Run 1000 Miles", 645.0, 1000.0, "miles", "#0078D4", "🏃", "Health", Priority::High, ""),
                goal(3, "Save $10,000", 7250.0, 10000.0, "dollars", "#107c10", "💰", "Finance", Priority::High, ""),
                goal(4, "Learn Spanish", 180.0, 365.0, "days", "#ffaa44", "🇪🇸", "Learning", Priority::Medium, "Daily practice with Duolingo"),
                goal(5, "Write 100 Blog Posts", 47.0, 100.0, "posts", "#d13438", "✍️", "Creative", Priority::Medium, ""),
                goal(6, "Complete 12 Online Courses", 8.0, 12.0, "courses", "#0078D4", "🎓", "Learning", Priority::Low, ""),
            ],
            favorites: Vec::new(),
            apps: Vec::new(),
            last_updated: None,
        }
    }
}
