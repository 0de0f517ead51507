use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood_type: MoodType,
    pub note: Option<String>,
    pub entry_date: NaiveDate,
    pub entry_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// The five fixed mood categories. Ordering here doubles as the
/// tie-break priority when a day's counts are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MoodType {
    Senang,
    BiasaSaja,
    Sedih,
    Murung,
    Marah,
}

impl MoodType {
    pub const ALL: [MoodType; 5] = [
        MoodType::Senang,
        MoodType::BiasaSaja,
        MoodType::Sedih,
        MoodType::Murung,
        MoodType::Marah,
    ];

    /// Fixed 5-point scale used for the weighted mood score.
    pub fn score(&self) -> i32 {
        match self {
            MoodType::Senang => 5,
            MoodType::BiasaSaja => 3,
            MoodType::Sedih => 2,
            MoodType::Murung => 1,
            MoodType::Marah => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodType::Senang => "senang",
            MoodType::BiasaSaja => "biasa_saja",
            MoodType::Sedih => "sedih",
            MoodType::Murung => "murung",
            MoodType::Marah => "marah",
        }
    }
}

/// Derived per-day aggregate, unique per (user, date).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodStatistic {
    pub user_id: Uuid,
    pub stat_date: NaiveDate,
    pub senang_count: i32,
    pub biasa_saja_count: i32,
    pub sedih_count: i32,
    pub murung_count: i32,
    pub marah_count: i32,
    pub dominant_mood: MoodType,
    pub mood_score: f64,
    pub total_entries: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMoodEntryRequest {
    pub mood_type: MoodType,
    pub note: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub entry_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMoodEntryRequest {
    pub mood_type: Option<MoodType>,
    pub note: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MoodEntryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
