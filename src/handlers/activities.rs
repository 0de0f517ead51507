use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::models::activity::{
    ActivityLog, ActivityLogQuery, CreateActivityLogRequest, StreakInfo, StreakQuery,
};
use crate::services::tracker;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DailyRecapQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyRecapQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn create_activity(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateActivityLogRequest>,
) -> AppResult<Json<ApiResponse<ActivityLog>>> {
    if let Some(duration) = body.duration_seconds {
        if duration < 0 {
            return Err(AppError::Validation(
                "duration_seconds must be >= 0".into(),
            ));
        }
    }
    if let Some(completion) = body.completion_percentage {
        if !(0..=100).contains(&completion) {
            return Err(AppError::Validation(
                "completion_percentage must be between 0 and 100".into(),
            ));
        }
    }

    let now = Utc::now();
    let activity_date = body.activity_date.unwrap_or_else(|| now.date_naive());
    let activity_time = body.activity_time.unwrap_or_else(|| now.time());

    let log = sqlx::query_as::<_, ActivityLog>(
        r#"
        INSERT INTO activity_logs (
            id, user_id, activity_type, activity_title, reference_id, reference_table,
            duration_seconds, completion_percentage, metadata, activity_date, activity_time
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.activity_type)
    .bind(&body.activity_title)
    .bind(body.reference_id)
    .bind(&body.reference_table)
    .bind(body.duration_seconds.unwrap_or(0))
    .bind(body.completion_percentage.unwrap_or(0))
    .bind(body.metadata.as_ref().unwrap_or(&serde_json::json!({})))
    .bind(activity_date)
    .bind(activity_time)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok("Activity logged", log)))
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ActivityLogQuery>,
) -> AppResult<Json<ApiResponse<Vec<ActivityLog>>>> {
    let start = query
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive() - chrono::Duration::days(30));
    let end = query.end_date.unwrap_or_else(|| Utc::now().date_naive());

    let logs = if let Some(activity_type) = query.activity_type {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE user_id = $1 AND activity_type = $2 AND activity_date BETWEEN $3 AND $4
            ORDER BY activity_date DESC, activity_time DESC
            "#,
        )
        .bind(auth_user.id)
        .bind(activity_type)
        .bind(start)
        .bind(end)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE user_id = $1 AND activity_date BETWEEN $2 AND $3
            ORDER BY activity_date DESC, activity_time DESC
            "#,
        )
        .bind(auth_user.id)
        .bind(start)
        .bind(end)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(ApiResponse::ok("Activities retrieved", logs)))
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StreakQuery>,
) -> AppResult<Json<ApiResponse<StreakInfo>>> {
    let reference_date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let dates = if let Some(activity_type) = query.activity_type {
        sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT DISTINCT activity_date FROM activity_logs
            WHERE user_id = $1 AND activity_type = $2
            ORDER BY activity_date DESC
            "#,
        )
        .bind(auth_user.id)
        .bind(activity_type)
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT DISTINCT activity_date FROM activity_logs
            WHERE user_id = $1
            ORDER BY activity_date DESC
            "#,
        )
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?
    };

    let info = StreakInfo {
        activity_type: query.activity_type,
        reference_date,
        current_streak: tracker::current_streak(&dates, reference_date),
        longest_streak: tracker::longest_streak(&dates),
        total_active_days: dates.len() as i64,
    };

    Ok(Json(ApiResponse::ok("Streak computed", info)))
}

pub async fn daily_recap(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DailyRecapQuery>,
) -> AppResult<Json<ApiResponse<tracker::DailyRecap>>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let logs = sqlx::query_as::<_, ActivityLog>(
        r#"
        SELECT * FROM activity_logs
        WHERE user_id = $1 AND activity_date = $2
        ORDER BY activity_time ASC, created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(date)
    .fetch_all(&state.db)
    .await?;

    let recap = tracker::build_daily_recap(date, &logs);

    Ok(Json(ApiResponse::ok("Daily recap built", recap)))
}

pub async fn monthly_recap(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MonthlyRecapQuery>,
) -> AppResult<Json<ApiResponse<tracker::MonthlyRecap>>> {
    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());

    if !(1..=12).contains(&month) {
        return Err(AppError::Validation("month must be between 1 and 12".into()));
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation("invalid year/month".into()))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| AppError::Validation("invalid year/month".into()))?;

    let rows = sqlx::query_as::<_, tracker::DayTypeRollup>(
        r#"
        SELECT
            activity_date,
            activity_type,
            COUNT(*) AS activity_count,
            COALESCE(SUM(duration_seconds), 0)::bigint AS total_duration_seconds
        FROM activity_logs
        WHERE user_id = $1 AND activity_date >= $2 AND activity_date < $3
        GROUP BY activity_date, activity_type
        ORDER BY activity_date ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(first)
    .bind(next_month)
    .fetch_all(&state.db)
    .await?;

    let recap = tracker::build_monthly_recap(year, month, &rows)
        .ok_or_else(|| AppError::Validation("invalid year/month".into()))?;

    Ok(Json(ApiResponse::ok("Monthly recap built", recap)))
}
