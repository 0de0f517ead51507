use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One user action, recorded once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub activity_title: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_table: Option<String>,
    pub duration_seconds: i32,
    pub completion_percentage: i32,
    pub metadata: serde_json::Value,
    pub activity_date: NaiveDate,
    pub activity_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    QuranReading,
    DzikirSession,
    BreathingExercise,
    AudioRelaxation,
    JournalWriting,
    QalbuChat,
    PsychologyMaterial,
    AppOpen,
    MoodTracking,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::QuranReading => "quran_reading",
            ActivityType::DzikirSession => "dzikir_session",
            ActivityType::BreathingExercise => "breathing_exercise",
            ActivityType::AudioRelaxation => "audio_relaxation",
            ActivityType::JournalWriting => "journal_writing",
            ActivityType::QalbuChat => "qalbu_chat",
            ActivityType::PsychologyMaterial => "psychology_material",
            ActivityType::AppOpen => "app_open",
            ActivityType::MoodTracking => "mood_tracking",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityLogRequest {
    pub activity_type: ActivityType,
    pub activity_title: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_table: Option<String>,
    pub duration_seconds: Option<i32>,
    pub completion_percentage: Option<i32>,
    pub metadata: Option<serde_json::Value>,
    pub activity_date: Option<NaiveDate>,
    pub activity_time: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityLogQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub activity_type: Option<ActivityType>,
}

#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    /// Omitted → overall streak across every activity type.
    pub activity_type: Option<ActivityType>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct StreakInfo {
    pub activity_type: Option<ActivityType>,
    pub reference_date: NaiveDate,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_active_days: i64,
}
