//! # Response Envelope
//!
//! Every operation answers with the same shape:
//!
//! ```json
//! { "success": true,  "message": "Order placed", "order": { ... } }
//! { "success": false, "error": "Order not found: 42", "code": "NOT_FOUND" }
//! ```
//!
//! The payload is flattened into the envelope, so payload types must
//! serialize as maps (structs or internally tagged enums).

use serde::Serialize;

use crate::error::{ApiError, ErrorCode};

/// Uniform result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,

    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            error: None,
            code: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            message: Some(message.into()),
            ..ApiResponse::ok(data)
        }
    }

    pub fn failure(err: ApiError) -> Self {
        ApiResponse {
            success: false,
            message: None,
            error: Some(err.message),
            code: Some(err.code),
            data: None,
        }
    }

    /// Builds the envelope for an operation result.
    pub fn from_result(result: Result<T, ApiError>, message: impl Into<String>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok_with_message(data, message),
            Err(err) => ApiResponse::failure(err),
        }
    }

    /// HTTP status equivalent: 200 on success.
    pub fn http_status(&self) -> u16 {
        self.code.map(|c| c.http_status()).unwrap_or(200)
    }

    /// Payload of a successful response.
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Placed {
        order_id: String,
    }

    #[test]
    fn test_success_flattens_payload() {
        let response = ApiResponse::ok_with_message(
            Placed {
                order_id: "o-1".to_string(),
            },
            "Order placed",
        );

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "success": true, "message": "Order placed", "order_id": "o-1" })
        );
        assert_eq!(response.http_status(), 200);
    }

    #[test]
    fn test_failure_carries_code() {
        let response: ApiResponse<Placed> =
            ApiResponse::failure(ApiError::not_found("Order", "o-9"));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "success": false, "error": "Order not found: o-9", "code": "NOT_FOUND" })
        );
        assert_eq!(response.http_status(), 404);
    }
}
