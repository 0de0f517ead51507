//! Mood statistic recomputation.
//!
//! The per-day statistic is never patched incrementally: every mood
//! mutation triggers a full re-read of that day's entries. O(entries) per
//! mutation, but days hold a handful of rows at most.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::mood::MoodType;

#[derive(Debug, PartialEq)]
pub struct DayMoodSummary {
    pub senang_count: i32,
    pub biasa_saja_count: i32,
    pub sedih_count: i32,
    pub murung_count: i32,
    pub marah_count: i32,
    pub dominant_mood: MoodType,
    pub mood_score: f64,
    pub total_entries: i32,
}

/// Counts, dominant mood and weighted score for one day's entries.
/// Returns `None` for an empty day. Dominant ties break by the fixed
/// priority senang > biasa_saja > sedih > murung > marah.
pub fn summarize_day(entries: &[MoodType]) -> Option<DayMoodSummary> {
    if entries.is_empty() {
        return None;
    }

    let count_of = |m: MoodType| entries.iter().filter(|e| **e == m).count() as i32;

    let mut dominant_mood = MoodType::Senang;
    let mut best = -1i32;
    for mood in MoodType::ALL {
        let n = count_of(mood);
        if n > best {
            best = n;
            dominant_mood = mood;
        }
    }

    let total_entries = entries.len() as i32;
    let mood_score =
        entries.iter().map(|m| m.score()).sum::<i32>() as f64 / total_entries as f64;

    Some(DayMoodSummary {
        senang_count: count_of(MoodType::Senang),
        biasa_saja_count: count_of(MoodType::BiasaSaja),
        sedih_count: count_of(MoodType::Sedih),
        murung_count: count_of(MoodType::Murung),
        marah_count: count_of(MoodType::Marah),
        dominant_mood,
        mood_score,
        total_entries,
    })
}

/// Full recompute + upsert of the (user, date) statistic row. Concurrent
/// callers race on the upsert; last write wins.
pub async fn recompute_day_statistic(
    db: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<(), sqlx::Error> {
    let entries = sqlx::query_scalar::<_, MoodType>(
        r#"
        SELECT mood_type FROM mood_entries
        WHERE user_id = $1 AND entry_date = $2
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;

    let Some(summary) = summarize_day(&entries) else {
        sqlx::query("DELETE FROM mood_statistics WHERE user_id = $1 AND stat_date = $2")
            .bind(user_id)
            .bind(date)
            .execute(db)
            .await?;
        return Ok(());
    };

    sqlx::query(
        r#"
        INSERT INTO mood_statistics (
            user_id, stat_date,
            senang_count, biasa_saja_count, sedih_count, murung_count, marah_count,
            dominant_mood, mood_score, total_entries, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
        ON CONFLICT (user_id, stat_date) DO UPDATE SET
            senang_count = $3,
            biasa_saja_count = $4,
            sedih_count = $5,
            murung_count = $6,
            marah_count = $7,
            dominant_mood = $8,
            mood_score = $9,
            total_entries = $10,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(summary.senang_count)
    .bind(summary.biasa_saja_count)
    .bind(summary.sedih_count)
    .bind(summary.murung_count)
    .bind(summary.marah_count)
    .bind(summary.dominant_mood)
    .bind(summary.mood_score)
    .bind(summary.total_entries)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use MoodType::*;

    #[test]
    fn empty_day_has_no_summary() {
        assert!(summarize_day(&[]).is_none());
    }

    #[test]
    fn score_is_weighted_average_over_fixed_scale() {
        // senang=5, biasa_saja=3, sedih=2 → (5+3+2)/3
        let summary = summarize_day(&[Senang, BiasaSaja, Sedih]).unwrap();
        assert!((summary.mood_score - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.total_entries, 3);
    }

    #[test]
    fn murung_and_marah_both_score_one() {
        let summary = summarize_day(&[Murung, Marah]).unwrap();
        assert_eq!(summary.mood_score, 1.0);
    }

    #[test]
    fn dominant_is_mode_of_counts() {
        let summary = summarize_day(&[Sedih, Sedih, Senang]).unwrap();
        assert_eq!(summary.dominant_mood, Sedih);
        assert_eq!(summary.sedih_count, 2);
        assert_eq!(summary.senang_count, 1);
    }

    #[test]
    fn dominant_tie_breaks_by_fixed_priority() {
        // senang then sedih logged the same day, 1–1 tie → senang wins.
        let summary = summarize_day(&[Sedih, Senang]).unwrap();
        assert_eq!(summary.dominant_mood, Senang);

        // murung vs marah tie → murung has higher priority.
        let summary = summarize_day(&[Marah, Murung]).unwrap();
        assert_eq!(summary.dominant_mood, Murung);
    }

    #[test]
    fn counts_cover_all_five_categories() {
        let summary =
            summarize_day(&[Senang, Senang, BiasaSaja, Sedih, Murung, Marah]).unwrap();
        assert_eq!(summary.senang_count, 2);
        assert_eq!(summary.biasa_saja_count, 1);
        assert_eq!(summary.sedih_count, 1);
        assert_eq!(summary.murung_count, 1);
        assert_eq!(summary.marah_count, 1);
        assert_eq!(summary.total_entries, 6);
        // (5+5+3+2+1+1)/6
        assert!((summary.mood_score - 17.0 / 6.0).abs() < 1e-9);
    }
}
