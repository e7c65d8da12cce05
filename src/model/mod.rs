//! The progress document model
//!
//! One `ProgressStorage` document per user profile, owning the full
//! path → module → section hierarchy plus global stats and achievements.
//! Nested records have no identity or lifecycle outside their parent.

use std::collections::HashMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Schema version stamped into every persisted document
pub const SCHEMA_VERSION: &str = "1";

/// Current unix timestamp in seconds
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs() as i64)
}

/// Lifecycle state shared by sections, modules and exercises
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Root persisted document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressStorage {
    /// Schema version; mismatches trigger migration on load
    pub version: String,

    /// Owning user/profile identifier
    pub user_id: String,

    /// Progress per learning path (key is path id)
    #[serde(default)]
    pub paths: HashMap<String, PathProgress>,

    /// Global stats and achievements
    pub stats: LearningStats,

    /// Unix timestamp of the last save
    pub last_updated: i64,
}

impl ProgressStorage {
    /// Fresh, empty document for a user
    pub fn new(user_id: &str) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            user_id: user_id.to_string(),
            paths: HashMap::new(),
            stats: LearningStats::new(user_id),
            last_updated: unix_now(),
        }
    }

    /// Mean of every recorded quiz score across the document, rounded
    /// to the nearest integer. Zero when no quiz has been taken.
    pub fn average_quiz_score(&self) -> u8 {
        let scores: Vec<u32> = self
            .paths
            .values()
            .flat_map(|p| &p.module_progress)
            .flat_map(|m| &m.section_progress)
            .flat_map(|s| &s.quiz_results)
            .map(|q| u32::from(q.score))
            .collect();

        if scores.is_empty() {
            return 0;
        }

        let sum: u32 = scores.iter().sum();
        ((sum as f64 / scores.len() as f64).round() as u32).min(100) as u8
    }
}

/// Progress for a top-level learning path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathProgress {
    pub path_id: String,
    pub user_id: String,

    /// When the path was first touched
    pub started_at: i64,

    /// Last time any node under this path was accessed
    pub last_accessed_at: i64,

    /// Ordered module records, created lazily
    #[serde(default)]
    pub module_progress: Vec<ModuleProgress>,

    /// Total minutes spent across the path
    pub total_time_spent: u32,

    /// `round(100 * completed_modules / total_modules)`, 0 when empty
    pub completion_percentage: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl PathProgress {
    pub fn new(path_id: &str, user_id: &str, now: i64) -> Self {
        Self {
            path_id: path_id.to_string(),
            user_id: user_id.to_string(),
            started_at: now,
            last_accessed_at: now,
            module_progress: Vec::new(),
            total_time_spent: 0,
            completion_percentage: 0,
            completed_at: None,
        }
    }

    /// Find a module record by id
    pub fn module(&self, module_id: &str) -> Option<&ModuleProgress> {
        self.module_progress.iter().find(|m| m.module_id == module_id)
    }

    /// Find a module record by id, mutably
    pub fn module_mut(&mut self, module_id: &str) -> Option<&mut ModuleProgress> {
        self.module_progress.iter_mut().find(|m| m.module_id == module_id)
    }

    /// Recompute `completion_percentage` from module statuses
    pub fn recompute_completion(&mut self) {
        let total = self.module_progress.len();
        if total == 0 {
            self.completion_percentage = 0;
            return;
        }

        let completed = self
            .module_progress
            .iter()
            .filter(|m| m.status == ProgressStatus::Completed)
            .count();

        self.completion_percentage = ((100.0 * completed as f64 / total as f64).round()) as u8;
    }
}

/// Progress for a module within a path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub module_id: String,
    pub path_id: String,

    /// Derived from section statuses, never set directly
    pub status: ProgressStatus,

    /// Ordered section records, created lazily
    #[serde(default)]
    pub section_progress: Vec<SectionProgress>,

    /// Minutes spent in this module
    pub time_spent: u32,

    pub attempts: u32,
    pub bookmarked: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl ModuleProgress {
    pub fn new(module_id: &str, path_id: &str) -> Self {
        Self {
            module_id: module_id.to_string(),
            path_id: path_id.to_string(),
            status: ProgressStatus::NotStarted,
            section_progress: Vec::new(),
            time_spent: 0,
            attempts: 0,
            bookmarked: false,
            completed_at: None,
        }
    }

    /// Find a section record by id
    pub fn section(&self, section_id: &str) -> Option<&SectionProgress> {
        self.section_progress.iter().find(|s| s.section_id == section_id)
    }

    /// Find a section record by id, mutably
    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut SectionProgress> {
        self.section_progress.iter_mut().find(|s| s.section_id == section_id)
    }

    /// Module status as a pure function of its sections: completed iff
    /// all sections are completed, not-started iff all are not-started,
    /// otherwise in-progress. An empty section list is not-started.
    pub fn derive_status(sections: &[SectionProgress]) -> ProgressStatus {
        if sections.is_empty() {
            return ProgressStatus::NotStarted;
        }
        if sections.iter().all(|s| s.status == ProgressStatus::Completed) {
            return ProgressStatus::Completed;
        }
        if sections.iter().all(|s| s.status == ProgressStatus::NotStarted) {
            return ProgressStatus::NotStarted;
        }
        ProgressStatus::InProgress
    }

    /// Re-derive `status` from the current sections, stamping
    /// `completed_at` on the transition into completed.
    pub fn refresh_status(&mut self, now: i64) {
        let status = Self::derive_status(&self.section_progress);
        if status == ProgressStatus::Completed && self.status != ProgressStatus::Completed {
            self.completed_at = Some(now);
        }
        if status != ProgressStatus::Completed {
            self.completed_at = None;
        }
        self.status = status;
    }
}

/// Progress for the smallest trackable content unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionProgress {
    pub section_id: String,
    pub module_id: String,

    pub status: ProgressStatus,

    /// Minutes spent in this section
    pub time_spent: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,

    /// Final score (0-100), if the section was scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,

    /// Latest result per exercise (upserted by exercise id)
    #[serde(default)]
    pub exercise_results: Vec<ExerciseResult>,

    /// Full quiz attempt history (always appended)
    #[serde(default)]
    pub quiz_results: Vec<QuizResult>,
}

impl SectionProgress {
    pub fn new(section_id: &str, module_id: &str) -> Self {
        Self {
            section_id: section_id.to_string(),
            module_id: module_id.to_string(),
            status: ProgressStatus::NotStarted,
            time_spent: 0,
            started_at: None,
            completed_at: None,
            score: None,
            exercise_results: Vec::new(),
            quiz_results: Vec::new(),
        }
    }
}

/// Result of a single exercise; resubmission replaces the prior record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseResult {
    pub exercise_id: String,
    pub status: ProgressStatus,
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_code: Option<String>,

    #[serde(default)]
    pub hints_used: Vec<String>,

    pub time_spent: u32,
    pub attempts: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<i64>,
}

/// One quiz attempt; attempts accumulate as history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResult {
    pub quiz_id: String,
    pub score: u8,
    pub passed: bool,

    #[serde(default)]
    pub answers: Vec<QuizAnswer>,

    pub time_spent: u32,
    pub attempts: u32,
    pub submitted_at: i64,
}

/// A single answered question within a quiz attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
    pub points: u32,
}

/// Global stats, one per document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningStats {
    pub user_id: String,

    /// Total minutes across all paths
    pub total_time_spent: u32,

    pub modules_completed: u32,
    pub paths_completed: u32,

    /// Consecutive calendar days (UTC) with tracked activity
    pub current_streak: u32,
    pub longest_streak: u32,

    /// Unix timestamp of the last tracked activity, 0 if never active
    pub last_active_date: i64,

    /// Earned badges, unique by id, append-only
    #[serde(default)]
    pub achievements: Vec<Achievement>,

    /// Mean quiz score across the document, 0-100
    pub average_score: u8,
}

impl LearningStats {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            total_time_spent: 0,
            modules_completed: 0,
            paths_completed: 0,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: 0,
            achievements: Vec::new(),
            average_score: 0,
        }
    }

    /// Is an achievement with this id already recorded?
    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }
}

/// Category of an achievement badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Module,
    Path,
    Streak,
}

/// A one-time badge awarded when a milestone condition first holds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique key; the evaluator never inserts a duplicate
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub title: String,
    pub description: String,
    pub earned_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
