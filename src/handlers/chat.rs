use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::ApiResponse;
use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityType;
use crate::models::chat::{ChatConversation, ChatMessage, ChatSender};
use crate::models::mood::MoodType;
use crate::services::qalbu::{self, ChatOutcome};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 4000, message = "Message must be 1-4000 characters"))]
    pub message: String,
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    pub reply: String,
    pub ai_response_type: String,
    pub ai_sources: Option<serde_json::Value>,
    pub meta: ChatMeta,
}

#[derive(Debug, Serialize)]
pub struct ChatMeta {
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    pub prior_emotion: Option<MoodType>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub helpful: bool,
    pub comment: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    body.validate()?;

    let conversation = match body.conversation_id {
        Some(id) => fetch_owned_conversation(&state, auth_user.id, id).await?,
        None => create_conversation(&state, auth_user.id, &body.message).await?,
    };

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, conversation_id, sender, content)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation.id)
    .bind(ChatSender::User)
    .bind(&body.message)
    .execute(&state.db)
    .await?;

    // Latest mood logged today gives the AI service emotional context.
    let prior_emotion = sqlx::query_scalar::<_, MoodType>(
        r#"
        SELECT mood_type FROM mood_entries
        WHERE user_id = $1 AND entry_date = $2
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(auth_user.id)
    .bind(Utc::now().date_naive())
    .fetch_optional(&state.db)
    .await?;

    let outcome = qalbu::send_chat(
        &state.http,
        &state.config,
        &body.message,
        prior_emotion.map(|m| m.as_str()),
        conversation.id,
    )
    .await;

    let (reply, response_type, sources, degraded_reason) = match outcome {
        ChatOutcome::Answered(r) => (r.reply, r.response_type, r.sources, None),
        ChatOutcome::Degraded { reason } => {
            tracing::warn!(
                conversation_id = %conversation.id,
                reason = %reason,
                "Qalbu service unavailable, serving fallback reply"
            );
            (
                qalbu::FALLBACK_REPLY.to_string(),
                qalbu::FALLBACK_RESPONSE_TYPE.to_string(),
                None,
                Some(reason),
            )
        }
    };

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, conversation_id, sender, content, response_type, sources)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(conversation.id)
    .bind(ChatSender::Assistant)
    .bind(&reply)
    .bind(&response_type)
    .bind(&sources)
    .execute(&state.db)
    .await?;

    sqlx::query("UPDATE chat_conversations SET updated_at = NOW() WHERE id = $1")
        .bind(conversation.id)
        .execute(&state.db)
        .await?;

    // Best-effort tracker event; a failure here must not lose the reply.
    let log_result = sqlx::query(
        r#"
        INSERT INTO activity_logs (
            id, user_id, activity_type, activity_title, reference_id, reference_table,
            duration_seconds, completion_percentage, metadata, activity_date, activity_time
        )
        VALUES ($1, $2, $3, $4, $5, 'chat_conversations', 0, 100, '{}', $6, $7)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(ActivityType::QalbuChat)
    .bind("Qalbu chat session")
    .bind(conversation.id)
    .bind(Utc::now().date_naive())
    .bind(Utc::now().time())
    .execute(&state.db)
    .await;
    if let Err(e) = log_result {
        tracing::warn!(error = %e, "Failed to record chat activity event");
    }

    let degraded = degraded_reason.is_some();
    Ok(Json(ApiResponse::ok(
        "Chat reply ready",
        ChatResponse {
            conversation_id: conversation.id,
            reply,
            ai_response_type: response_type,
            ai_sources: sources,
            meta: ChatMeta {
                degraded,
                degraded_reason,
                prior_emotion,
            },
        },
    )))
}

pub async fn message_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(message_id): Path<Uuid>,
    Json(body): Json<FeedbackRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let owner = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT c.user_id FROM chat_messages m
        JOIN chat_conversations c ON c.id = m.conversation_id
        WHERE m.id = $1
        "#,
    )
    .bind(message_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Message not found".into()))?;

    if owner != auth_user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("UPDATE chat_messages SET helpful = $2 WHERE id = $1")
        .bind(message_id)
        .bind(body.helpful)
        .execute(&state.db)
        .await?;

    // Forwarding is best-effort with a short timeout; the client gets a
    // 200 whether or not the AI service accepted it.
    if let Err(e) = qalbu::send_feedback(
        &state.http,
        &state.config,
        message_id,
        body.helpful,
        body.comment.as_deref(),
    )
    .await
    {
        tracing::warn!(message_id = %message_id, error = %e, "Feedback forward failed");
    }

    Ok(Json(ApiResponse::ok(
        "Feedback recorded",
        serde_json::json!({ "message_id": message_id, "helpful": body.helpful }),
    )))
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ApiResponse<Vec<ChatConversation>>>> {
    let conversations = sqlx::query_as::<_, ChatConversation>(
        r#"
        SELECT * FROM chat_conversations
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok(
        "Conversations retrieved",
        conversations,
    )))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<ChatMessage>>>> {
    let _conversation = fetch_owned_conversation(&state, auth_user.id, conversation_id).await?;

    let messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT * FROM chat_messages
        WHERE conversation_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ApiResponse::ok("Messages retrieved", messages)))
}

async fn create_conversation(
    state: &AppState,
    user_id: Uuid,
    first_message: &str,
) -> AppResult<ChatConversation> {
    let title: String = first_message.chars().take(60).collect();

    let conversation = sqlx::query_as::<_, ChatConversation>(
        r#"
        INSERT INTO chat_conversations (id, user_id, title)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .fetch_one(&state.db)
    .await?;

    Ok(conversation)
}

async fn fetch_owned_conversation(
    state: &AppState,
    user_id: Uuid,
    conversation_id: Uuid,
) -> AppResult<ChatConversation> {
    let conversation =
        sqlx::query_as::<_, ChatConversation>("SELECT * FROM chat_conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or(AppError::NotFound("Conversation not found".into()))?;

    if conversation.user_id != user_id {
        return Err(AppError::Forbidden);
    }

    Ok(conversation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_rejects_empty_message() {
        let req = ChatRequest {
            message: String::new(),
            conversation_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn chat_request_accepts_plain_message() {
        let req = ChatRequest {
            message: "Bagaimana cara menenangkan hati?".into(),
            conversation_id: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn chat_response_serializes_fallback_shape() {
        let resp = ChatResponse {
            conversation_id: Uuid::new_v4(),
            reply: qalbu::FALLBACK_REPLY.into(),
            ai_response_type: qalbu::FALLBACK_RESPONSE_TYPE.into(),
            ai_sources: None,
            meta: ChatMeta {
                degraded: true,
                degraded_reason: Some("request failed: connection refused".into()),
                prior_emotion: None,
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["ai_response_type"], "fallback");
        assert!(!json["reply"].as_str().unwrap().is_empty());
        assert_eq!(json["meta"]["degraded"], true);
    }
}
