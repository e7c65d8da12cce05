//! Progress tracking service
//!
//! `ProgressTracker` owns the storage codec and applies one logical event
//! per call: load the document, mutate it, re-derive module status and
//! path completion, persist. Callers never observe a half-updated
//! document, and storage failures degrade to in-memory state.

pub mod achievements;
pub mod streak;

use thiserror::Error;

use crate::model::{
    unix_now, ExerciseResult, LearningStats, ModuleProgress, PathProgress, ProgressStatus,
    ProgressStorage, QuizResult, SectionProgress,
};
use crate::store::{ProgressCodec, ProgressStore};

/// Errors surfaced to callers of the tracker
#[derive(Debug, Clone, Error)]
pub enum ProgressError {
    /// Scores are percentages; anything above 100 is a caller bug
    #[error("Score {0} is out of range (0-100)")]
    InvalidScore(u8),
}

/// Partial update merged into a section; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct SectionUpdate {
    pub status: Option<ProgressStatus>,
    pub score: Option<u8>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

/// Scope of a progress reset, carrying the identifiers it needs
#[derive(Debug, Clone)]
pub enum ResetScope {
    /// Reinitialize a single section; siblings keep their state
    Section { path_id: String, module_id: String, section_id: String },
    /// Reinitialize a module to not-started with no sections
    Module { path_id: String, module_id: String },
    /// Remove the path entry from the document entirely
    Path { path_id: String },
}

/// One instance per running application, holding the store handle
pub struct ProgressTracker {
    codec: ProgressCodec,
}

impl ProgressTracker {
    pub fn new(store: Box<dyn ProgressStore>, user_id: &str) -> Self {
        Self { codec: ProgressCodec::new(store, user_id) }
    }

    /// Snapshot of the full document
    pub fn storage(&self) -> ProgressStorage {
        self.codec.load()
    }

    /// Snapshot of the global stats
    pub fn stats(&self) -> LearningStats {
        self.codec.load().stats
    }

    // --- Hierarchy accessors (get-or-create) ---

    /// Path record, created and persisted on first touch
    pub fn path_progress(&self, path_id: &str) -> PathProgress {
        let mut doc = self.codec.load();
        let now = unix_now();
        if ensure_path(&mut doc, path_id, now) {
            self.codec.save(&mut doc);
        }
        doc.paths[path_id].clone()
    }

    /// Module record, creating its path first if needed
    pub fn module_progress(&self, path_id: &str, module_id: &str) -> ModuleProgress {
        let mut doc = self.codec.load();
        let now = unix_now();
        if ensure_module(&mut doc, path_id, module_id, now) {
            self.codec.save(&mut doc);
        }
        doc.paths[path_id].module(module_id).cloned().expect("module just ensured")
    }

    /// Section record, creating its module and path first if needed
    pub fn section_progress(
        &self,
        path_id: &str,
        module_id: &str,
        section_id: &str,
    ) -> SectionProgress {
        let mut doc = self.codec.load();
        let now = unix_now();
        if ensure_section(&mut doc, path_id, module_id, section_id, now) {
            self.codec.save(&mut doc);
        }
        doc.paths[path_id]
            .module(module_id)
            .and_then(|m| m.section(section_id))
            .cloned()
            .expect("section just ensured")
    }

    // --- Mutators ---

    /// Merge a partial update into a section and re-derive module status
    /// and path completion. Silently no-ops when the module or section
    /// does not exist.
    pub fn update_section(
        &self,
        path_id: &str,
        module_id: &str,
        section_id: &str,
        update: SectionUpdate,
    ) -> Result<(), ProgressError> {
        if let Some(score) = update.score {
            validate_score(score)?;
        }

        let mut doc = self.codec.load();
        let now = unix_now();

        let Some(path) = doc.paths.get_mut(path_id) else { return Ok(()) };
        let Some(module) = path.module_mut(module_id) else { return Ok(()) };
        let Some(section) = module.section_mut(section_id) else { return Ok(()) };

        if let Some(status) = update.status {
            section.status = status;
        }
        if update.score.is_some() {
            section.score = update.score;
        }
        if update.started_at.is_some() {
            section.started_at = update.started_at;
        }
        if update.completed_at.is_some() {
            section.completed_at = update.completed_at;
        }

        module.refresh_status(now);
        path.recompute_completion();
        path.last_accessed_at = now;

        self.codec.save(&mut doc);
        Ok(())
    }

    /// Move a section to in-progress, stamping `started_at` on first start
    pub fn start_section(&self, path_id: &str, module_id: &str, section_id: &str) {
        let mut doc = self.codec.load();
        let now = unix_now();
        ensure_section(&mut doc, path_id, module_id, section_id, now);

        let path = doc.paths.get_mut(path_id).expect("path just ensured");
        let module = path.module_mut(module_id).expect("module just ensured");
        let section = module.section_mut(section_id).expect("section just ensured");

        if section.status == ProgressStatus::NotStarted {
            section.status = ProgressStatus::InProgress;
        }
        if section.started_at.is_none() {
            section.started_at = Some(now);
        }

        module.refresh_status(now);
        path.recompute_completion();
        path.last_accessed_at = now;

        self.codec.save(&mut doc);
    }

    /// Add minutes to the section, module, path and global totals, and
    /// advance the daily learning streak.
    pub fn add_time_spent(&self, path_id: &str, module_id: &str, section_id: &str, minutes: u32) {
        let mut doc = self.codec.load();
        let now = unix_now();
        ensure_section(&mut doc, path_id, module_id, section_id, now);

        let path = doc.paths.get_mut(path_id).expect("path just ensured");
        let module = path.module_mut(module_id).expect("module just ensured");
        let section = module.section_mut(section_id).expect("section just ensured");

        section.time_spent += minutes;
        module.time_spent += minutes;
        path.total_time_spent += minutes;
        path.last_accessed_at = now;

        doc.stats.total_time_spent += minutes;
        streak::record_activity(&mut doc.stats, now);

        self.codec.save(&mut doc);
    }

    /// Complete a section with an optional score, then evaluate
    /// achievements for the owning module and path.
    pub fn mark_section_complete(
        &self,
        path_id: &str,
        module_id: &str,
        section_id: &str,
        score: Option<u8>,
    ) -> Result<(), ProgressError> {
        if let Some(score) = score {
            validate_score(score)?;
        }

        let mut doc = self.codec.load();
        let now = unix_now();
        ensure_section(&mut doc, path_id, module_id, section_id, now);

        let path = doc.paths.get_mut(path_id).expect("path just ensured");
        let module = path.module_mut(module_id).expect("module just ensured");
        let section = module.section_mut(section_id).expect("section just ensured");

        section.status = ProgressStatus::Completed;
        section.completed_at = Some(now);
        if score.is_some() {
            section.score = score;
        }

        module.refresh_status(now);
        path.recompute_completion();
        path.last_accessed_at = now;

        achievements::evaluate(&mut doc, path_id, module_id, now);

        self.codec.save(&mut doc);
        Ok(())
    }

    /// Record an exercise result, replacing any prior result for the
    /// same exercise id within the section.
    pub fn add_exercise_result(
        &self,
        path_id: &str,
        module_id: &str,
        section_id: &str,
        result: ExerciseResult,
    ) {
        let mut doc = self.codec.load();
        let now = unix_now();
        ensure_section(&mut doc, path_id, module_id, section_id, now);

        let path = doc.paths.get_mut(path_id).expect("path just ensured");
        path.last_accessed_at = now;
        let module = path.module_mut(module_id).expect("module just ensured");
        let section = module.section_mut(section_id).expect("section just ensured");

        match section.exercise_results.iter_mut().find(|e| e.exercise_id == result.exercise_id) {
            Some(existing) => *existing = result,
            None => section.exercise_results.push(result),
        }

        self.codec.save(&mut doc);
    }

    /// Record a quiz attempt. Attempts accumulate as history, and the
    /// global average score is recomputed over every quiz in the document.
    pub fn add_quiz_result(
        &self,
        path_id: &str,
        module_id: &str,
        section_id: &str,
        result: QuizResult,
    ) -> Result<(), ProgressError> {
        validate_score(result.score)?;

        let mut doc = self.codec.load();
        let now = unix_now();
        ensure_section(&mut doc, path_id, module_id, section_id, now);

        let path = doc.paths.get_mut(path_id).expect("path just ensured");
        path.last_accessed_at = now;
        let module = path.module_mut(module_id).expect("module just ensured");
        let section = module.section_mut(section_id).expect("section just ensured");

        section.quiz_results.push(result);
        doc.stats.average_score = doc.average_quiz_score();

        self.codec.save(&mut doc);
        Ok(())
    }

    /// Reset progress at section, module or path granularity
    pub fn reset(&self, scope: ResetScope) {
        let mut doc = self.codec.load();
        let now = unix_now();

        let changed = match scope {
            ResetScope::Section { path_id, module_id, section_id } => {
                reset_section(&mut doc, &path_id, &module_id, &section_id, now)
            }
            ResetScope::Module { path_id, module_id } => {
                let Some(path) = doc.paths.get_mut(&path_id) else { return };
                let Some(module) = path.module_mut(&module_id) else { return };
                *module = ModuleProgress::new(&module_id, &path_id);
                path.recompute_completion();
                path.completed_at = None;
                true
            }
            ResetScope::Path { path_id } => doc.paths.remove(&path_id).is_some(),
        };

        if changed {
            self.codec.save(&mut doc);
        }
    }
}

fn validate_score(score: u8) -> Result<(), ProgressError> {
    if score > 100 {
        return Err(ProgressError::InvalidScore(score));
    }
    Ok(())
}

fn reset_section(
    doc: &mut ProgressStorage,
    path_id: &str,
    module_id: &str,
    section_id: &str,
    now: i64,
) -> bool {
    let Some(path) = doc.paths.get_mut(path_id) else { return false };
    let Some(module) = path.module_mut(module_id) else { return false };
    let Some(section) = module.section_mut(section_id) else { return false };

    *section = SectionProgress::new(section_id, module_id);
    module.refresh_status(now);
    path.recompute_completion();
    path.completed_at = None;
    true
}

/// Create the path record if missing; returns whether it was created
fn ensure_path(doc: &mut ProgressStorage, path_id: &str, now: i64) -> bool {
    if doc.paths.contains_key(path_id) {
        return false;
    }
    let user_id = doc.user_id.clone();
    doc.paths.insert(path_id.to_string(), PathProgress::new(path_id, &user_id, now));
    true
}

/// Create the module (and its path) if missing; returns whether anything
/// was created
fn ensure_module(doc: &mut ProgressStorage, path_id: &str, module_id: &str, now: i64) -> bool {
    let mut created = ensure_path(doc, path_id, now);
    let path = doc.paths.get_mut(path_id).expect("path just ensured");
    if path.module(module_id).is_none() {
        path.module_progress.push(ModuleProgress::new(module_id, path_id));
        created = true;
    }
    created
}

/// Create the section (and its module and path) if missing
fn ensure_section(
    doc: &mut ProgressStorage,
    path_id: &str,
    module_id: &str,
    section_id: &str,
    now: i64,
) -> bool {
    let mut created = ensure_module(doc, path_id, module_id, now);
    let module = doc
        .paths
        .get_mut(path_id)
        .and_then(|p| p.module_mut(module_id))
        .expect("module just ensured");
    if module.section(section_id).is_none() {
        module.section_progress.push(SectionProgress::new(section_id, module_id));
        created = true;
    }
    created
}
