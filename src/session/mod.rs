//! Reactive binding layer for presentation code
//!
//! A `ProgressSession` is scoped to one `(path, module?, section?)` triple.
//! It materializes the hierarchy on construction, and after every action it
//! re-reads the persisted document and publishes a fresh immutable snapshot
//! to its observers, so what the UI renders is always what was saved.

use crate::model::{
    ExerciseResult, LearningStats, ModuleProgress, PathProgress, QuizResult, SectionProgress,
};
use crate::tracker::{ProgressError, ProgressTracker, ResetScope, SectionUpdate};

/// Immutable view of the session's scope plus global stats
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub path: Option<PathProgress>,
    pub module: Option<ModuleProgress>,
    pub section: Option<SectionProgress>,
    pub stats: LearningStats,
}

type Observer = Box<dyn Fn(&ProgressSnapshot)>;

/// Read/update surface bound to one position in the hierarchy
pub struct ProgressSession {
    tracker: ProgressTracker,
    path_id: String,
    module_id: Option<String>,
    section_id: Option<String>,
    snapshot: ProgressSnapshot,
    observers: Vec<Observer>,
    last_error: Option<ProgressError>,
}

impl ProgressSession {
    /// Open a session, creating any missing hierarchy nodes
    pub fn new(
        tracker: ProgressTracker,
        path_id: &str,
        module_id: Option<&str>,
        section_id: Option<&str>,
    ) -> Self {
        tracker.path_progress(path_id);
        if let Some(module_id) = module_id {
            tracker.module_progress(path_id, module_id);
            if let Some(section_id) = section_id {
                tracker.section_progress(path_id, module_id, section_id);
            }
        }

        let mut session = Self {
            tracker,
            path_id: path_id.to_string(),
            module_id: module_id.map(str::to_string),
            section_id: section_id.map(str::to_string),
            snapshot: ProgressSnapshot {
                path: None,
                module: None,
                section: None,
                stats: LearningStats::new(""),
            },
            observers: Vec::new(),
            last_error: None,
        };
        session.snapshot = session.read_snapshot();
        session
    }

    /// Current snapshot, consistent with the last persisted state
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    /// Error from the most recent failed action, if any
    pub fn last_error(&self) -> Option<&ProgressError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Register an observer invoked with every republished snapshot
    pub fn subscribe(&mut self, observer: impl Fn(&ProgressSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // --- Actions ---

    /// Mark the scoped section as started
    pub fn start_section(&mut self) {
        if let Some((module_id, section_id)) = self.section_scope() {
            self.tracker.start_section(&self.path_id, &module_id, &section_id);
        }
        self.republish();
    }

    /// Complete the scoped section with an optional score
    pub fn complete_section(&mut self, score: Option<u8>) -> Result<(), ProgressError> {
        let result = match self.section_scope() {
            Some((module_id, section_id)) => self
                .tracker
                .mark_section_complete(&self.path_id, &module_id, &section_id, score),
            None => Ok(()),
        };
        self.finish(result)
    }

    /// Add elapsed minutes to the scoped section
    pub fn add_time(&mut self, minutes: u32) {
        if let Some((module_id, section_id)) = self.section_scope() {
            self.tracker.add_time_spent(&self.path_id, &module_id, &section_id, minutes);
        }
        self.republish();
    }

    /// Merge a partial update into the scoped section
    pub fn update_section(&mut self, update: SectionUpdate) -> Result<(), ProgressError> {
        let result = match self.section_scope() {
            Some((module_id, section_id)) => {
                self.tracker.update_section(&self.path_id, &module_id, &section_id, update)
            }
            None => Ok(()),
        };
        self.finish(result)
    }

    /// Record a quiz attempt against the scoped section
    pub fn record_quiz(&mut self, result: QuizResult) -> Result<(), ProgressError> {
        let outcome = match self.section_scope() {
            Some((module_id, section_id)) => {
                self.tracker.add_quiz_result(&self.path_id, &module_id, &section_id, result)
            }
            None => Ok(()),
        };
        self.finish(outcome)
    }

    /// Record an exercise result against the scoped section
    pub fn record_exercise(&mut self, result: ExerciseResult) {
        if let Some((module_id, section_id)) = self.section_scope() {
            self.tracker.add_exercise_result(&self.path_id, &module_id, &section_id, result);
        }
        self.republish();
    }

    /// Reset progress at any granularity
    pub fn reset(&mut self, scope: ResetScope) {
        self.tracker.reset(scope);
        self.republish();
    }

    fn section_scope(&self) -> Option<(String, String)> {
        match (&self.module_id, &self.section_id) {
            (Some(m), Some(s)) => Some((m.clone(), s.clone())),
            _ => None,
        }
    }

    fn finish(&mut self, result: Result<(), ProgressError>) -> Result<(), ProgressError> {
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        self.republish();
        result
    }

    /// Re-read the persisted document and notify observers
    fn republish(&mut self) {
        self.snapshot = self.read_snapshot();
        for observer in &self.observers {
            observer(&self.snapshot);
        }
    }

    fn read_snapshot(&self) -> ProgressSnapshot {
        let doc = self.tracker.storage();
        let path = doc.paths.get(&self.path_id).cloned();
        let module = match (&path, &self.module_id) {
            (Some(p), Some(m)) => p.module(m).cloned(),
            _ => None,
        };
        let section = match (&module, &self.section_id) {
            (Some(m), Some(s)) => m.section(s).cloned(),
            _ => None,
        };

        ProgressSnapshot { path, module, section, stats: doc.stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgressStatus;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session(section: Option<&str>) -> ProgressSession {
        let tracker = ProgressTracker::new(Box::new(MemoryStore::new()), "u1");
        ProgressSession::new(tracker, "p1", Some("m1"), section)
    }

    #[test]
    fn new_session_materializes_scope() {
        let session = session(Some("s1"));
        let snap = session.snapshot();
        assert!(snap.path.is_some());
        assert!(snap.module.is_some());
        assert!(snap.section.is_some());
        assert_eq!(snap.section.as_ref().unwrap().status, ProgressStatus::NotStarted);
    }

    #[test]
    fn actions_republish_fresh_snapshots() {
        let mut session = session(Some("s1"));
        session.start_section();
        assert_eq!(
            session.snapshot().section.as_ref().unwrap().status,
            ProgressStatus::InProgress
        );

        session.complete_section(Some(88)).unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.section.as_ref().unwrap().status, ProgressStatus::Completed);
        assert_eq!(snap.section.as_ref().unwrap().score, Some(88));
        assert_eq!(snap.module.as_ref().unwrap().status, ProgressStatus::Completed);
        assert_eq!(snap.path.as_ref().unwrap().completion_percentage, 100);
        assert!(snap.stats.achievements.iter().any(|a| a.id == "first-module"));
    }

    #[test]
    fn observers_see_every_mutation() {
        let mut session = session(Some("s1"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.subscribe(move |snap| {
            sink.borrow_mut().push(snap.section.as_ref().unwrap().status);
        });

        session.start_section();
        session.complete_section(None).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![ProgressStatus::InProgress, ProgressStatus::Completed]
        );
    }

    #[test]
    fn failed_action_lands_in_error_slot() {
        let mut session = session(Some("s1"));
        let result = session.complete_section(Some(200));
        assert!(result.is_err());
        assert!(matches!(session.last_error(), Some(ProgressError::InvalidScore(200))));

        session.clear_error();
        assert!(session.last_error().is_none());
    }

    #[test]
    fn section_actions_without_section_scope_are_noops() {
        let mut session = session(None);
        session.start_section();
        session.add_time(10);
        session.complete_section(Some(90)).unwrap();

        let snap = session.snapshot();
        assert!(snap.section.is_none());
        assert_eq!(snap.stats.total_time_spent, 0);
        assert!(snap.module.as_ref().unwrap().section_progress.is_empty());
    }

    #[test]
    fn add_time_flows_into_stats_and_streak() {
        let mut session = session(Some("s1"));
        session.add_time(20);

        let snap = session.snapshot();
        assert_eq!(snap.section.as_ref().unwrap().time_spent, 20);
        assert_eq!(snap.stats.total_time_spent, 20);
        assert_eq!(snap.stats.current_streak, 1);
    }

    #[test]
    fn reset_path_empties_the_snapshot() {
        let mut session = session(Some("s1"));
        session.complete_section(None).unwrap();

        session.reset(ResetScope::Path { path_id: "p1".into() });
        assert!(session.snapshot().path.is_none());
        assert!(session.snapshot().section.is_none());
    }
}
