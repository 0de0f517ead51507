use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Resolves a bearer token to its owner. Token issuance lives in the
/// account service; this side only stores SHA-256 digests.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?;

    let digest = token_digest(token);

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM access_tokens WHERE token_digest = $1",
    )
    .bind(&digest)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    // Best-effort usage timestamp; failure here must not reject the request.
    let _ = sqlx::query("UPDATE access_tokens SET last_used_at = NOW() WHERE token_digest = $1")
        .bind(&digest)
        .execute(&state.db)
        .await;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}

pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_hex_sha256() {
        let digest = token_digest("token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable across calls
        assert_eq!(digest, token_digest("token"));
        assert_ne!(digest, token_digest("other"));
    }
}
