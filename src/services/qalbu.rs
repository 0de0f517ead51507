//! Client for the external Qalbu AI chat service.
//!
//! The proxy never bubbles a downstream failure to the mobile client:
//! every failure path collapses into `ChatOutcome::Degraded`, which the
//! handler turns into a 200 response carrying the canned fallback reply.

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;

/// Canned Indonesian-language apology used whenever the AI service is down.
pub const FALLBACK_REPLY: &str = "Maaf, saat ini saya sedang mengalami gangguan. \
    Silakan coba lagi beberapa saat lagi, ya. Semoga hatimu senantiasa tenang.";

pub const FALLBACK_RESPONSE_TYPE: &str = "fallback";

#[derive(Debug, Clone)]
pub struct QalbuReply {
    pub reply: String,
    pub response_type: String,
    pub sources: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum ChatOutcome {
    Answered(QalbuReply),
    Degraded { reason: String },
}

#[derive(Debug, Deserialize)]
struct QalbuServiceResponse {
    response: String,
    #[serde(default)]
    response_type: Option<String>,
    #[serde(default)]
    sources: Option<serde_json::Value>,
}

pub async fn send_chat(
    client: &reqwest::Client,
    config: &Config,
    message: &str,
    prior_emotion: Option<&str>,
    conversation_id: Uuid,
) -> ChatOutcome {
    let url = format!("{}/chat", config.qalbu_base_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .timeout(Duration::from_secs(config.qalbu_chat_timeout_secs))
        .json(&serde_json::json!({
            "message": message,
            "prior_emotion": prior_emotion,
            "conversation_id": conversation_id,
        }))
        .send()
        .await;

    let response = match response {
        Ok(r) => r,
        Err(e) => {
            return ChatOutcome::Degraded {
                reason: format!("request failed: {e}"),
            }
        }
    };

    if !response.status().is_success() {
        return ChatOutcome::Degraded {
            reason: format!("service returned {}", response.status()),
        };
    }

    match response.json::<QalbuServiceResponse>().await {
        Ok(body) => ChatOutcome::Answered(QalbuReply {
            reply: body.response,
            response_type: body.response_type.unwrap_or_else(|| "answer".into()),
            sources: body.sources,
        }),
        Err(e) => ChatOutcome::Degraded {
            reason: format!("malformed service response: {e}"),
        },
    }
}

/// Fire-and-forget feedback forwarding; the caller absorbs any error.
pub async fn send_feedback(
    client: &reqwest::Client,
    config: &Config,
    message_id: Uuid,
    helpful: bool,
    comment: Option<&str>,
) -> anyhow::Result<()> {
    let url = format!("{}/feedback", config.qalbu_base_url.trim_end_matches('/'));

    let response = client
        .post(&url)
        .timeout(Duration::from_secs(config.qalbu_feedback_timeout_secs))
        .json(&serde_json::json!({
            "message_id": message_id,
            "helpful": helpful,
            "comment": comment,
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        anyhow::bail!("feedback forward returned {}", response.status());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> Config {
        Config {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: String::new(),
            qalbu_base_url: base_url.into(),
            qalbu_chat_timeout_secs: 1,
            qalbu_feedback_timeout_secs: 1,
        }
    }

    #[test]
    fn fallback_reply_is_nonempty_indonesian() {
        assert!(!FALLBACK_REPLY.is_empty());
        assert!(FALLBACK_REPLY.starts_with("Maaf"));
    }

    #[tokio::test]
    async fn unreachable_service_degrades() {
        // Nothing listens on port 9; connection is refused immediately.
        let client = reqwest::Client::new();
        let config = test_config("http://127.0.0.1:9");
        let outcome = send_chat(&client, &config, "Assalamualaikum", None, Uuid::new_v4()).await;
        match outcome {
            ChatOutcome::Degraded { reason } => assert!(!reason.is_empty()),
            ChatOutcome::Answered(_) => panic!("expected degraded outcome"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_fails_feedback() {
        let client = reqwest::Client::new();
        let config = test_config("http://127.0.0.1:9");
        let result = send_feedback(&client, &config, Uuid::new_v4(), true, None).await;
        assert!(result.is_err());
    }

    #[test]
    fn service_response_parses_with_optional_fields() {
        let body: QalbuServiceResponse =
            serde_json::from_str(r#"{"response":"Wa'alaikumsalam"}"#).unwrap();
        assert_eq!(body.response, "Wa'alaikumsalam");
        assert!(body.response_type.is_none());
        assert!(body.sources.is_none());
    }
}
