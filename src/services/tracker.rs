//! Sakinah tracker aggregation: streaks, daily recap, monthly calendar.
//!
//! All functions here are pure over pre-fetched rows; handlers inject the
//! reference date, so everything is deterministic and testable without a
//! database.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::activity::{ActivityLog, ActivityType};

/// Daily goal table: one of each per day counts as the goal achieved.
pub const DAILY_GOALS: [ActivityType; 3] = [
    ActivityType::QuranReading,
    ActivityType::DzikirSession,
    ActivityType::JournalWriting,
];

/// Current streak ending at `reference`.
///
/// `dates` must hold distinct calendar days sorted descending. Walks
/// backward one day at a time and stops at the first gap.
pub fn current_streak(dates: &[NaiveDate], reference: NaiveDate) -> i32 {
    let mut streak = 0i32;
    let mut check_date = reference;

    for date in dates {
        if *date == check_date {
            streak += 1;
            check_date -= chrono::Duration::days(1);
        } else if *date < check_date {
            break;
        }
    }

    streak
}

/// Longest run of consecutive days anywhere in the history.
///
/// `dates` must hold distinct calendar days sorted descending.
pub fn longest_streak(dates: &[NaiveDate]) -> i32 {
    let mut longest = 0i32;
    let mut streak = 0i32;
    let mut prev_date: Option<NaiveDate> = None;

    for date in dates.iter().rev() {
        if let Some(prev) = prev_date {
            if *date == prev + chrono::Duration::days(1) {
                streak += 1;
            } else {
                longest = longest.max(streak);
                streak = 1;
            }
        } else {
            streak = 1;
        }
        prev_date = Some(*date);
    }

    longest.max(streak)
}

#[derive(Debug, Serialize)]
pub struct DailyRecap {
    pub date: NaiveDate,
    pub activities: BTreeMap<String, TypeBreakdown>,
    pub total_activities: i64,
    pub total_duration_seconds: i64,
    pub completion_rate: f64,
    pub mood_trend: Option<String>,
    pub goals: GoalsReport,
}

#[derive(Debug, Default, Serialize)]
pub struct TypeBreakdown {
    pub count: i64,
    pub total_duration_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct GoalsReport {
    pub goals: Vec<GoalStatus>,
    pub achieved: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct GoalStatus {
    pub activity_type: ActivityType,
    pub achieved: bool,
}

pub fn build_daily_recap(date: NaiveDate, logs: &[ActivityLog]) -> DailyRecap {
    let mut activities: BTreeMap<String, TypeBreakdown> = BTreeMap::new();
    let mut total_duration_seconds = 0i64;
    let mut completed = 0i64;

    for log in logs {
        let entry = activities
            .entry(log.activity_type.as_str().to_string())
            .or_default();
        entry.count += 1;
        entry.total_duration_seconds += log.duration_seconds as i64;
        total_duration_seconds += log.duration_seconds as i64;
        if log.completion_percentage >= 100 {
            completed += 1;
        }
    }

    let total_activities = logs.len() as i64;
    let completion_rate = if total_activities > 0 {
        completed as f64 / total_activities as f64 * 100.0
    } else {
        0.0
    };

    let goals: Vec<GoalStatus> = DAILY_GOALS
        .iter()
        .map(|goal| GoalStatus {
            activity_type: *goal,
            achieved: logs.iter().any(|l| l.activity_type == *goal),
        })
        .collect();
    let achieved = goals.iter().filter(|g| g.achieved).count();

    DailyRecap {
        date,
        activities,
        total_activities,
        total_duration_seconds,
        completion_rate,
        mood_trend: mood_trend(logs),
        goals: GoalsReport {
            goals,
            achieved,
            total: DAILY_GOALS.len(),
        },
    }
}

/// Most frequent `mood_after` value in the day's activity metadata.
/// Ties go to the value seen first in row order.
fn mood_trend(logs: &[ActivityLog]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for log in logs {
        if let Some(mood) = log.metadata.get("mood_after").and_then(|v| v.as_str()) {
            match counts.iter_mut().find(|(m, _)| *m == mood) {
                Some((_, n)) => *n += 1,
                None => counts.push((mood, 1)),
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (mood, n) in counts {
        if best.map_or(true, |(_, best_n)| n > best_n) {
            best = Some((mood, n));
        }
    }

    best.map(|(mood, _)| mood.to_string())
}

/// One (date, type) aggregate row out of the monthly group-by query.
#[derive(Debug, FromRow)]
pub struct DayTypeRollup {
    pub activity_date: NaiveDate,
    pub activity_type: ActivityType,
    pub activity_count: i64,
    pub total_duration_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyRecap {
    pub year: i32,
    pub month: u32,
    /// One entry per calendar day, zero-filled for days without activity.
    pub days: BTreeMap<NaiveDate, DayCell>,
    pub total_activities: i64,
    pub total_duration_seconds: i64,
    pub active_days: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct DayCell {
    pub total_activities: i64,
    pub total_duration_seconds: i64,
    pub by_type: BTreeMap<String, i64>,
}

/// Returns `None` for an invalid year/month combination.
pub fn build_monthly_recap(year: i32, month: u32, rows: &[DayTypeRollup]) -> Option<MonthlyRecap> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    let mut days: BTreeMap<NaiveDate, DayCell> = BTreeMap::new();
    let mut day = first;
    while day < next_month {
        days.insert(day, DayCell::default());
        day += chrono::Duration::days(1);
    }

    let mut total_activities = 0i64;
    let mut total_duration_seconds = 0i64;

    for row in rows {
        // Rows outside the month would corrupt the calendar; the query is
        // bounded, so just skip anything unexpected.
        let Some(cell) = days.get_mut(&row.activity_date) else {
            continue;
        };
        cell.total_activities += row.activity_count;
        cell.total_duration_seconds += row.total_duration_seconds;
        *cell
            .by_type
            .entry(row.activity_type.as_str().to_string())
            .or_insert(0) += row.activity_count;
        total_activities += row.activity_count;
        total_duration_seconds += row.total_duration_seconds;
    }

    let active_days = days.values().filter(|c| c.total_activities > 0).count();

    Some(MonthlyRecap {
        year,
        month,
        days,
        total_activities,
        total_duration_seconds,
        active_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn log(
        activity_type: ActivityType,
        duration: i32,
        completion: i32,
        metadata: serde_json::Value,
    ) -> ActivityLog {
        ActivityLog {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            activity_type,
            activity_title: None,
            reference_id: None,
            reference_table: None,
            duration_seconds: duration,
            completion_percentage: completion,
            metadata,
            activity_date: date(2026, 8, 27),
            activity_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            created_at: Utc::now(),
        }
    }

    // ── current_streak ───────────────────────────────────────────────────

    #[test]
    fn streak_zero_without_activity() {
        assert_eq!(current_streak(&[], date(2026, 8, 27)), 0);
    }

    #[test]
    fn streak_one_when_only_today() {
        let dates = vec![date(2026, 8, 27)];
        assert_eq!(current_streak(&dates, date(2026, 8, 27)), 1);
    }

    #[test]
    fn streak_counts_back_to_first_gap() {
        // Activity on the 27th, 26th, 25th; gap on the 24th; more on the 23rd.
        let dates = vec![
            date(2026, 8, 27),
            date(2026, 8, 26),
            date(2026, 8, 25),
            date(2026, 8, 23),
        ];
        assert_eq!(current_streak(&dates, date(2026, 8, 27)), 3);
    }

    #[test]
    fn streak_zero_when_reference_day_has_no_activity() {
        let dates = vec![date(2026, 8, 26), date(2026, 8, 25)];
        assert_eq!(current_streak(&dates, date(2026, 8, 27)), 0);
    }

    #[test]
    fn streak_k_days_back_from_reference() {
        let reference = date(2026, 8, 27);
        for k in 1i64..=10 {
            let dates: Vec<NaiveDate> = (0..k)
                .map(|i| reference - chrono::Duration::days(i))
                .collect();
            assert_eq!(current_streak(&dates, reference), k as i32);
        }
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let dates = vec![date(2026, 9, 1), date(2026, 8, 31), date(2026, 8, 30)];
        assert_eq!(current_streak(&dates, date(2026, 9, 1)), 3);
    }

    // ── longest_streak ───────────────────────────────────────────────────

    #[test]
    fn longest_streak_finds_historic_run() {
        let dates = vec![
            date(2026, 8, 27),
            date(2026, 8, 20),
            date(2026, 8, 19),
            date(2026, 8, 18),
            date(2026, 8, 17),
        ];
        assert_eq!(longest_streak(&dates), 4);
    }

    #[test]
    fn longest_streak_empty_is_zero() {
        assert_eq!(longest_streak(&[]), 0);
    }

    // ── build_daily_recap ────────────────────────────────────────────────

    #[test]
    fn recap_empty_day() {
        let recap = build_daily_recap(date(2026, 8, 27), &[]);
        assert_eq!(recap.total_activities, 0);
        assert_eq!(recap.completion_rate, 0.0);
        assert!(recap.mood_trend.is_none());
        assert_eq!(recap.goals.achieved, 0);
    }

    #[test]
    fn recap_completion_rate_is_percentage_of_finished() {
        let logs = vec![
            log(ActivityType::QuranReading, 300, 100, serde_json::json!({})),
            log(ActivityType::DzikirSession, 120, 50, serde_json::json!({})),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.completion_rate, 50.0);
        assert_eq!(recap.total_duration_seconds, 420);
    }

    #[test]
    fn recap_completion_rate_hundred_when_all_finished() {
        let logs = vec![
            log(ActivityType::QuranReading, 60, 100, serde_json::json!({})),
            log(ActivityType::QuranReading, 60, 120, serde_json::json!({})),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.completion_rate, 100.0);
    }

    #[test]
    fn recap_groups_by_type() {
        let logs = vec![
            log(ActivityType::QuranReading, 60, 0, serde_json::json!({})),
            log(ActivityType::QuranReading, 90, 0, serde_json::json!({})),
            log(ActivityType::BreathingExercise, 180, 0, serde_json::json!({})),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.activities["quran_reading"].count, 2);
        assert_eq!(recap.activities["quran_reading"].total_duration_seconds, 150);
        assert_eq!(recap.activities["breathing_exercise"].count, 1);
    }

    #[test]
    fn recap_mood_trend_is_mode_of_metadata() {
        let logs = vec![
            log(
                ActivityType::BreathingExercise,
                60,
                100,
                serde_json::json!({ "mood_after": "tenang" }),
            ),
            log(
                ActivityType::DzikirSession,
                60,
                100,
                serde_json::json!({ "mood_after": "tenang" }),
            ),
            log(
                ActivityType::QuranReading,
                60,
                100,
                serde_json::json!({ "mood_after": "senang" }),
            ),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.mood_trend.as_deref(), Some("tenang"));
    }

    #[test]
    fn recap_mood_trend_tie_takes_first_seen() {
        let logs = vec![
            log(
                ActivityType::BreathingExercise,
                60,
                100,
                serde_json::json!({ "mood_after": "senang" }),
            ),
            log(
                ActivityType::DzikirSession,
                60,
                100,
                serde_json::json!({ "mood_after": "tenang" }),
            ),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.mood_trend.as_deref(), Some("senang"));
    }

    #[test]
    fn recap_goals_checked_against_fixed_table() {
        let logs = vec![
            log(ActivityType::QuranReading, 60, 100, serde_json::json!({})),
            log(ActivityType::JournalWriting, 60, 100, serde_json::json!({})),
        ];
        let recap = build_daily_recap(date(2026, 8, 27), &logs);
        assert_eq!(recap.goals.total, 3);
        assert_eq!(recap.goals.achieved, 2);
        let dzikir = recap
            .goals
            .goals
            .iter()
            .find(|g| g.activity_type == ActivityType::DzikirSession)
            .unwrap();
        assert!(!dzikir.achieved);
    }

    // ── build_monthly_recap ──────────────────────────────────────────────

    #[test]
    fn monthly_map_has_every_day_of_month() {
        let recap = build_monthly_recap(2026, 2, &[]).unwrap();
        assert_eq!(recap.days.len(), 28);
        let leap = build_monthly_recap(2028, 2, &[]).unwrap();
        assert_eq!(leap.days.len(), 29);
        let august = build_monthly_recap(2026, 8, &[]).unwrap();
        assert_eq!(august.days.len(), 31);
    }

    #[test]
    fn monthly_zero_fills_quiet_days() {
        let rows = vec![DayTypeRollup {
            activity_date: date(2026, 8, 10),
            activity_type: ActivityType::DzikirSession,
            activity_count: 3,
            total_duration_seconds: 540,
        }];
        let recap = build_monthly_recap(2026, 8, &rows).unwrap();
        assert_eq!(recap.days[&date(2026, 8, 10)].total_activities, 3);
        assert_eq!(recap.days[&date(2026, 8, 11)].total_activities, 0);
        assert_eq!(recap.active_days, 1);
        assert_eq!(recap.total_activities, 3);
        assert_eq!(recap.total_duration_seconds, 540);
    }

    #[test]
    fn monthly_merges_types_per_day() {
        let rows = vec![
            DayTypeRollup {
                activity_date: date(2026, 8, 10),
                activity_type: ActivityType::QuranReading,
                activity_count: 1,
                total_duration_seconds: 600,
            },
            DayTypeRollup {
                activity_date: date(2026, 8, 10),
                activity_type: ActivityType::JournalWriting,
                activity_count: 2,
                total_duration_seconds: 300,
            },
        ];
        let recap = build_monthly_recap(2026, 8, &rows).unwrap();
        let cell = &recap.days[&date(2026, 8, 10)];
        assert_eq!(cell.total_activities, 3);
        assert_eq!(cell.by_type["quran_reading"], 1);
        assert_eq!(cell.by_type["journal_writing"], 2);
    }

    #[test]
    fn monthly_rejects_invalid_month() {
        assert!(build_monthly_recap(2026, 13, &[]).is_none());
        assert!(build_monthly_recap(2026, 0, &[]).is_none());
    }
}
