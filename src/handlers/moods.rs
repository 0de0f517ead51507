use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{ApiResponse, DeleteResponse};
use crate::error::{AppError, AppResult};
use crate::models::mood::{
    CreateMoodEntryRequest, MoodEntry, MoodEntryQuery, MoodStatistic, UpdateMoodEntryRequest,
};
use crate::services::mood_stats;
use crate::AppState;

/// Primary mood-selection flow: one entry per day, upserted at the
/// application layer. A second check-in the same day overwrites the
/// day's latest entry instead of adding another.
pub async fn checkin_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodEntryRequest>,
) -> AppResult<Json<ApiResponse<MoodEntry>>> {
    let now = Utc::now();
    let entry_date = body.entry_date.unwrap_or_else(|| now.date_naive());
    let entry_time = body.entry_time.unwrap_or_else(|| now.time());

    let existing = sqlx::query_as::<_, MoodEntry>(
        r#"
        SELECT * FROM mood_entries
        WHERE user_id = $1 AND entry_date = $2
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .bind(entry_date)
    .fetch_optional(&state.db)
    .await?;

    let entry = if let Some(existing) = existing {
        sqlx::query_as::<_, MoodEntry>(
            r#"
            UPDATE mood_entries
            SET mood_type = $2, note = $3, entry_time = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(existing.id)
        .bind(body.mood_type)
        .bind(&body.note)
        .bind(entry_time)
        .fetch_one(&state.db)
        .await?
    } else {
        insert_entry(&state, auth_user.id, &body, entry_date, entry_time).await?
    };

    mood_stats::recompute_day_statistic(&state.db, auth_user.id, entry_date).await?;

    Ok(Json(ApiResponse::ok("Mood recorded", entry)))
}

/// Direct creation; unlike the check-in flow this may produce several
/// entries for the same day.
pub async fn create_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodEntryRequest>,
) -> AppResult<Json<ApiResponse<MoodEntry>>> {
    let now = Utc::now();
    let entry_date = body.entry_date.unwrap_or_else(|| now.date_naive());
    let entry_time = body.entry_time.unwrap_or_else(|| now.time());

    let entry = insert_entry(&state, auth_user.id, &body, entry_date, entry_time).await?;

    mood_stats::recompute_day_statistic(&state.db, auth_user.id, entry_date).await?;

    Ok(Json(ApiResponse::ok("Mood recorded", entry)))
}

pub async fn update_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateMoodEntryRequest>,
) -> AppResult<Json<ApiResponse<MoodEntry>>> {
    let existing = fetch_owned_entry(&state, auth_user.id, entry_id).await?;

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        UPDATE mood_entries
        SET mood_type = COALESCE($2, mood_type),
            note = COALESCE($3, note),
            entry_date = COALESCE($4, entry_date)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(body.mood_type)
    .bind(&body.note)
    .bind(body.entry_date)
    .fetch_one(&state.db)
    .await?;

    // Moving an entry across days dirties both days' statistics.
    mood_stats::recompute_day_statistic(&state.db, auth_user.id, entry.entry_date).await?;
    if existing.entry_date != entry.entry_date {
        mood_stats::recompute_day_statistic(&state.db, auth_user.id, existing.entry_date).await?;
    }

    Ok(Json(ApiResponse::ok("Mood updated", entry)))
}

pub async fn delete_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeleteResponse>>> {
    let existing = fetch_owned_entry(&state, auth_user.id, entry_id).await?;

    sqlx::query("DELETE FROM mood_entries WHERE id = $1")
        .bind(entry_id)
        .execute(&state.db)
        .await?;

    mood_stats::recompute_day_statistic(&state.db, auth_user.id, existing.entry_date).await?;

    Ok(Json(ApiResponse::ok(
        "Mood deleted",
        DeleteResponse {
            deleted: true,
            id: entry_id,
        },
    )))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodEntryQuery>,
) -> AppResult<Json<ApiResponse<Vec<MoodEntry>>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let entries = sqlx::query_as::<_, MoodEntry>(
        r#"
        SELECT * FROM mood_entries
        WHERE user_id = $1 AND entry_date BETWEEN $2 AND $3
        ORDER BY entry_date DESC, entry_time DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok("Mood entries retrieved", entries)))
}

pub async fn mood_statistics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodEntryQuery>,
) -> AppResult<Json<ApiResponse<Vec<MoodStatistic>>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let stats = sqlx::query_as::<_, MoodStatistic>(
        r#"
        SELECT * FROM mood_statistics
        WHERE user_id = $1 AND stat_date BETWEEN $2 AND $3
        ORDER BY stat_date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok("Mood statistics retrieved", stats)))
}

async fn insert_entry(
    state: &AppState,
    user_id: Uuid,
    body: &CreateMoodEntryRequest,
    entry_date: chrono::NaiveDate,
    entry_time: chrono::NaiveTime,
) -> AppResult<MoodEntry> {
    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (id, user_id, mood_type, note, entry_date, entry_time)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(body.mood_type)
    .bind(&body.note)
    .bind(entry_date)
    .bind(entry_time)
    .fetch_one(&state.db)
    .await?;

    Ok(entry)
}

/// 404 for an unknown id, 403 when the entry belongs to someone else.
async fn fetch_owned_entry(
    state: &AppState,
    user_id: Uuid,
    entry_id: Uuid,
) -> AppResult<MoodEntry> {
    let entry = sqlx::query_as::<_, MoodEntry>("SELECT * FROM mood_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Mood entry not found".into()))?;

    if entry.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(entry)
}
