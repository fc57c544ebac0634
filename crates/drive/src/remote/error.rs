//! Per-item batch failure

use serde_json::Value;

/// Error reasons the Drive API uses for failures worth repeating
const TRANSIENT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "sharingRateLimitExceeded",
    "backendError",
    "internalError",
];

/// A single ownership transfer inside a batch failed
///
/// `status` is the HTTP status of the item's response, or 0 when no response
/// was received for it (transport failure, malformed batch response).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP {status}{}: {message}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
pub struct ItemError {
    pub status: u16,
    pub reason: Option<String>,
    pub message: String,
}

impl ItemError {
    pub fn new(status: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            message: message.into(),
        }
    }

    /// Failure without an HTTP response for the item
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, None, message)
    }

    /// Build an error from an item's status and JSON error body
    ///
    /// Expects the Google error envelope
    /// `{"error": {"message": ..., "errors": [{"reason": ...}]}}` and falls
    /// back to the raw body when it doesn't match.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().and_then(|v| v.get("error"));

        let message = error
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string());

        let reason = error
            .and_then(|e| e.get("errors"))
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("reason"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self::new(status, reason, message)
    }

    /// Whether repeating the request may succeed (rate limits, server errors)
    pub fn is_transient(&self) -> bool {
        if self.status == 0 || self.status == 429 || self.status >= 500 {
            return true;
        }
        self.reason
            .as_deref()
            .is_some_and(|r| TRANSIENT_REASONS.contains(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_google_error_body() {
        let body = r#"{
            "error": {
                "code": 403,
                "message": "Rate limit exceeded. User message: \"Sorry, you have exceeded your sharing quota.\"",
                "errors": [{
                    "domain": "global",
                    "reason": "sharingRateLimitExceeded",
                    "message": "Rate limit exceeded."
                }]
            }
        }"#;

        let err = ItemError::from_response(403, body);
        assert_eq!(err.status, 403);
        assert_eq!(err.reason.as_deref(), Some("sharingRateLimitExceeded"));
        assert!(err.message.starts_with("Rate limit exceeded"));
        assert!(err.is_transient());
    }

    #[test]
    fn test_forbidden_is_permanent() {
        let body = r#"{"error":{"code":403,"message":"Insufficient permissions","errors":[{"reason":"forbidden"}]}}"#;
        let err = ItemError::from_response(403, body);
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "HTTP 403 (forbidden): Insufficient permissions");
    }

    #[test]
    fn test_server_and_transport_errors_are_transient() {
        assert!(ItemError::from_response(500, r#"{"error":{"message":"Internal Error"}}"#).is_transient());
        assert!(ItemError::new(429, None, "slow down").is_transient());
        assert!(ItemError::transport("connection reset").is_transient());
    }

    #[test]
    fn test_non_json_body_kept_as_message() {
        let err = ItemError::from_response(404, "Not Found\n");
        assert_eq!(err.message, "Not Found");
        assert_eq!(err.reason, None);
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }
}
