//! Learning streak calculation
//!
//! A streak counts consecutive UTC calendar days with at least one tracked
//! activity. Comparison is on the date portion only, so two activities at
//! 00:05 and 23:55 of the same day are one streak day.

use crate::model::LearningStats;

const SECONDS_PER_DAY: i64 = 86_400;

/// UTC day number for a unix timestamp
pub fn utc_day(ts: i64) -> i64 {
    ts.div_euclid(SECONDS_PER_DAY)
}

/// Apply one tracked activity at `now` to the streak counters.
///
/// Same day: no change. Exactly one day later: streak extends. More than
/// one day later (or first-ever activity): streak restarts at 1.
/// `last_active_date` is always moved to `now`.
pub fn record_activity(stats: &mut LearningStats, now: i64) {
    if stats.last_active_date == 0 {
        stats.current_streak = 1;
    } else {
        let elapsed_days = utc_day(now) - utc_day(stats.last_active_date);
        match elapsed_days {
            0 => {}
            1 => stats.current_streak += 1,
            _ => stats.current_streak = 1,
        }
    }

    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.last_active_date = now;
}
