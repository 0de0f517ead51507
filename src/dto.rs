//! Shared API contract types.
//!
//! Every endpoint wraps its payload in the envelope the mobile client
//! expects: `{ "success": bool, "message": string, "data": ... }`. Errors
//! use the sibling shape produced by `AppError::into_response`.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: uuid::Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_success_and_data() {
        let resp = ApiResponse::ok("Mood recorded", serde_json::json!({ "id": 1 }));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Mood recorded");
        assert_eq!(json["data"]["id"], 1);
    }
}
