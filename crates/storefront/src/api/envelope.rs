//! Normalized response envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;
use super::tokens::TokenPayload;

const DEFAULT_SUCCESS_MESSAGE: &str = "Success";
const DEFAULT_FAILURE_MESSAGE: &str = "An error occurred";

/// Every API call resolves to one of these, success or failure.
///
/// `data` holds the decoded response body on success. On failure `error`
/// holds the response body if the server sent one, or the transport error
/// text when no response arrived (in which case `status` is 500).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub status: u16,
    pub message: String,
    pub error: Option<Value>,
    #[serde(skip)]
    transport_failure: bool,
}

impl ApiResponse {
    /// Build the envelope for an HTTP response that arrived.
    pub(crate) fn from_parts(status: u16, body: Option<Value>) -> Self {
        let body_message = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if (200..300).contains(&status) {
            Self {
                success: true,
                message: body_message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
                data: body,
                status,
                error: None,
                transport_failure: false,
            }
        } else {
            Self {
                success: false,
                data: None,
                status,
                message: body_message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
                error: body,
                transport_failure: false,
            }
        }
    }

    /// Build the envelope for a request that never got a response
    /// (connection refused, DNS failure, timeout).
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            data: None,
            status: 500,
            error: Some(Value::String(message.clone())),
            message,
            transport_failure: true,
        }
    }

    /// Parse a raw response body. Empty bodies become `None`; bodies that
    /// are not JSON are kept as a string.
    pub(crate) fn parse_body(text: &str) -> Option<Value> {
        if text.trim().is_empty() {
            return None;
        }
        Some(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }

    /// True when no HTTP response was received.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        self.transport_failure
    }

    /// True for a 401 response.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        !self.success && !self.transport_failure && self.status == 401
    }

    /// True when this is a success envelope carrying an `accessToken`.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.success && TokenPayload::extract(self.data.as_ref()).is_some()
    }

    /// Decode `data` as `T` without consuming the envelope.
    ///
    /// Returns `None` on failure envelopes or when the data does not match.
    #[must_use]
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        if !self.success {
            return None;
        }
        serde_json::from_value(self.data.clone().unwrap_or(Value::Null)).ok()
    }

    /// Convert into `Ok(data as T)` or the matching [`ApiError`].
    ///
    /// A missing body decodes as JSON `null`, so `T = ()` or `Option<_>`
    /// accept empty success responses.
    ///
    /// # Errors
    ///
    /// Returns an error for failure envelopes or undecodable data.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(self.into_error());
        }
        serde_json::from_value(self.data.unwrap_or(Value::Null)).map_err(ApiError::Decode)
    }

    /// The error this envelope represents. Meaningful on failure envelopes.
    #[must_use]
    pub fn into_error(self) -> ApiError {
        if self.transport_failure {
            ApiError::Transport(self.message)
        } else {
            ApiError::Status {
                status: self.status,
                message: self.message,
                body: self.error,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_message_from_body() {
        let response = ApiResponse::from_parts(200, Some(json!({"message": "Logged in"})));
        assert!(response.success);
        assert_eq!(response.message, "Logged in");
        assert!(response.error.is_none());

        let response = ApiResponse::from_parts(204, None);
        assert!(response.success);
        assert_eq!(response.message, "Success");
    }

    #[test]
    fn test_failure_keeps_body_as_error() {
        let body = json!({"message": "Invalid email or password", "code": "BAD_CREDENTIALS"});
        let response = ApiResponse::from_parts(401, Some(body.clone()));
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.message, "Invalid email or password");
        assert_eq!(response.error, Some(body));
        assert!(response.is_unauthorized());

        let response = ApiResponse::from_parts(502, None);
        assert_eq!(response.message, "An error occurred");
    }

    #[test]
    fn test_transport_failure_shape() {
        let response = ApiResponse::transport("operation timed out");
        assert!(!response.success);
        assert_eq!(response.status, 500);
        assert!(response.is_transport_failure());
        assert!(!response.is_unauthorized());
        assert!(matches!(
            response.into_error(),
            ApiError::Transport(msg) if msg == "operation timed out"
        ));
    }

    #[test]
    fn test_has_access_token() {
        let body = json!({"accessToken": "a1", "refreshToken": "r1"});
        assert!(ApiResponse::from_parts(200, Some(body.clone())).has_access_token());
        assert!(!ApiResponse::from_parts(400, Some(body)).has_access_token());
        assert!(!ApiResponse::from_parts(201, Some(json!({"message": "created"}))).has_access_token());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(ApiResponse::parse_body("  "), None);
        assert_eq!(ApiResponse::parse_body("{\"a\":1}"), Some(json!({"a": 1})));
        assert_eq!(
            ApiResponse::parse_body("Bad Gateway"),
            Some(Value::String("Bad Gateway".to_string()))
        );
    }

    #[test]
    fn test_into_result() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Payload {
            count: u32,
        }

        let ok = ApiResponse::from_parts(200, Some(json!({"count": 3})));
        assert_eq!(ok.data_as::<Payload>(), Some(Payload { count: 3 }));
        assert_eq!(ok.into_result::<Payload>().unwrap(), Payload { count: 3 });

        let empty = ApiResponse::from_parts(204, None);
        empty.into_result::<()>().unwrap();

        let wrong_shape = ApiResponse::from_parts(200, Some(json!({"count": "three"})));
        assert!(matches!(
            wrong_shape.into_result::<Payload>(),
            Err(ApiError::Decode(_))
        ));

        let failed = ApiResponse::from_parts(404, Some(json!({"message": "Product not found"})));
        assert!(matches!(
            failed.into_result::<Payload>(),
            Err(ApiError::Status { status: 404, message, .. }) if message == "Product not found"
        ));
    }
}
