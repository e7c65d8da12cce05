//! Achievement evaluation
//!
//! Runs after every section completion. Each badge is one-time: the id is
//! the uniqueness key, and the counter increments are fused with the award
//! so the "first module" check and the per-module badge can never disagree.

use serde_json::json;
use tracing::debug;

use crate::model::{Achievement, AchievementKind, ProgressStatus, ProgressStorage};

/// Evaluate all badge conditions after a completion event in
/// `path_id`/`module_id`. Safe to call repeatedly for the same event.
pub fn evaluate(doc: &mut ProgressStorage, path_id: &str, module_id: &str, now: i64) {
    award_module(doc, path_id, module_id, now);
    award_path(doc, path_id, now);
    award_streaks(doc, now);
}

fn award_module(doc: &mut ProgressStorage, path_id: &str, module_id: &str, now: i64) {
    let Some(module) = doc.paths.get(path_id).and_then(|p| p.module(module_id)) else {
        return;
    };
    if module.status != ProgressStatus::Completed {
        return;
    }

    let id = format!("module-{module_id}");
    if doc.stats.has_achievement(&id) {
        return;
    }

    // First-ever module check happens before the counter moves, and both
    // happen before the per-module badge lands, as one atomic step.
    if doc.stats.modules_completed == 0 {
        push(
            doc,
            Achievement {
                id: "first-module".into(),
                kind: AchievementKind::Module,
                title: "First Steps".into(),
                description: "Completed your first module".into(),
                earned_at: now,
                metadata: None,
            },
        );
    }

    doc.stats.modules_completed += 1;
    push(
        doc,
        Achievement {
            id,
            kind: AchievementKind::Module,
            title: "Module Complete".into(),
            description: format!("Completed module {module_id}"),
            earned_at: now,
            metadata: Some(json!({ "module_id": module_id, "path_id": path_id })),
        },
    );
}

fn award_path(doc: &mut ProgressStorage, path_id: &str, now: i64) {
    let Some(path) = doc.paths.get_mut(path_id) else {
        return;
    };
    if path.completion_percentage != 100 {
        return;
    }
    if path.completed_at.is_none() {
        path.completed_at = Some(now);
    }

    let id = format!("path-{path_id}");
    if doc.stats.has_achievement(&id) {
        return;
    }

    doc.stats.paths_completed += 1;
    push(
        doc,
        Achievement {
            id,
            kind: AchievementKind::Path,
            title: "Path Complete".into(),
            description: format!("Completed learning path {path_id}"),
            earned_at: now,
            metadata: Some(json!({ "path_id": path_id })),
        },
    );
}

fn award_streaks(doc: &mut ProgressStorage, now: i64) {
    if doc.stats.current_streak == 7 && !doc.stats.has_achievement("week-streak") {
        push(
            doc,
            Achievement {
                id: "week-streak".into(),
                kind: AchievementKind::Streak,
                title: "Week Streak".into(),
                description: "Learned 7 days in a row".into(),
                earned_at: now,
                metadata: None,
            },
        );
    }

    if doc.stats.current_streak == 30 && !doc.stats.has_achievement("month-streak") {
        push(
            doc,
            Achievement {
                id: "month-streak".into(),
                kind: AchievementKind::Streak,
                title: "Month Streak".into(),
                description: "Learned 30 days in a row".into(),
                earned_at: now,
                metadata: None,
            },
        );
    }
}

fn push(doc: &mut ProgressStorage, achievement: Achievement) {
    debug!("Awarding achievement {:?}", achievement.id);
    doc.stats.achievements.push(achievement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleProgress, PathProgress, SectionProgress};

    fn doc_with_completed_module() -> ProgressStorage {
        let mut doc = ProgressStorage::new("u1");
        let mut path = PathProgress::new("p1", "u1", 0);
        let mut module = ModuleProgress::new("m1", "p1");
        let mut section = SectionProgress::new("s1", "m1");
        section.status = ProgressStatus::Completed;
        module.section_progress.push(section);
        module.refresh_status(10);
        path.module_progress.push(module);
        path.recompute_completion();
        doc.paths.insert("p1".into(), path);
        doc
    }

    fn ids(doc: &ProgressStorage) -> Vec<&str> {
        doc.stats.achievements.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn first_completed_module_awards_both_badges() {
        let mut doc = doc_with_completed_module();
        evaluate(&mut doc, "p1", "m1", 100);

        assert!(ids(&doc).contains(&"first-module"));
        assert!(ids(&doc).contains(&"module-m1"));
        assert_eq!(doc.stats.modules_completed, 1);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let mut doc = doc_with_completed_module();
        evaluate(&mut doc, "p1", "m1", 100);
        evaluate(&mut doc, "p1", "m1", 200);
        evaluate(&mut doc, "p1", "m1", 300);

        let first = ids(&doc).iter().filter(|id| **id == "first-module").count();
        let per_module = ids(&doc).iter().filter(|id| **id == "module-m1").count();
        assert_eq!(first, 1);
        assert_eq!(per_module, 1);
        assert_eq!(doc.stats.modules_completed, 1);
    }

    #[test]
    fn second_module_skips_first_module_badge() {
        let mut doc = doc_with_completed_module();
        evaluate(&mut doc, "p1", "m1", 100);

        let path = doc.paths.get_mut("p1").unwrap();
        let mut module = ModuleProgress::new("m2", "p1");
        let mut section = SectionProgress::new("s2", "m2");
        section.status = ProgressStatus::Completed;
        module.section_progress.push(section);
        module.refresh_status(150);
        path.module_progress.push(module);
        path.recompute_completion();

        evaluate(&mut doc, "p1", "m2", 200);

        let first = ids(&doc).iter().filter(|id| **id == "first-module").count();
        assert_eq!(first, 1);
        assert!(ids(&doc).contains(&"module-m2"));
        assert_eq!(doc.stats.modules_completed, 2);
    }

    #[test]
    fn full_path_awards_path_badge_once() {
        let mut doc = doc_with_completed_module();
        evaluate(&mut doc, "p1", "m1", 100);
        evaluate(&mut doc, "p1", "m1", 200);

        let path_badges = ids(&doc).iter().filter(|id| **id == "path-p1").count();
        assert_eq!(path_badges, 1);
        assert_eq!(doc.stats.paths_completed, 1);
        assert_eq!(doc.paths["p1"].completed_at, Some(100));
    }

    #[test]
    fn incomplete_module_awards_nothing() {
        let mut doc = ProgressStorage::new("u1");
        let mut path = PathProgress::new("p1", "u1", 0);
        let mut module = ModuleProgress::new("m1", "p1");
        module.section_progress.push(SectionProgress::new("s1", "m1"));
        module.refresh_status(10);
        path.module_progress.push(module);
        path.recompute_completion();
        doc.paths.insert("p1".into(), path);

        evaluate(&mut doc, "p1", "m1", 100);
        assert!(doc.stats.achievements.is_empty());
        assert_eq!(doc.stats.modules_completed, 0);
    }

    #[test]
    fn streak_badges_at_exact_thresholds() {
        let mut doc = doc_with_completed_module();
        doc.stats.current_streak = 7;
        evaluate(&mut doc, "p1", "m1", 100);
        assert!(ids(&doc).contains(&"week-streak"));
        assert!(!ids(&doc).contains(&"month-streak"));

        doc.stats.current_streak = 30;
        evaluate(&mut doc, "p1", "m1", 200);
        assert!(ids(&doc).contains(&"month-streak"));

        // Re-evaluating at the same streak adds nothing
        evaluate(&mut doc, "p1", "m1", 300);
        let week = ids(&doc).iter().filter(|id| **id == "week-streak").count();
        assert_eq!(week, 1);
    }
}
