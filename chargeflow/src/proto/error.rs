//! Error envelopes returned by the payments backend.
//!
//! The backend is not consistent about how it reports failures. Three shapes
//! are recognized:
//!
//! ```json
//! { "status": 400, "error": { "code": "invalid_card", "message": "Card declined", "details": [] } }
//! { "status": 400, "errors": [ { "code": "missing_field", "message": "amount is required" } ] }
//! { "status": 400, "messages": [ "amount is required", "currency is required" ] }
//! ```
//!
//! Anything else is left unparsed and classified as unknown by the taxonomy.

use serde::{Deserialize, Serialize};

/// A backend error body in one of the recognized shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorEnvelope {
    /// A single error object under `error`.
    Single {
        /// HTTP status echoed by the backend.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// The error.
        error: ApiErrorObject,
    },
    /// A list of error objects under `errors`.
    List {
        /// HTTP status echoed by the backend.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// The errors, in backend order.
        errors: Vec<ApiErrorObject>,
    },
    /// A list of plain messages under `messages`.
    Messages {
        /// HTTP status echoed by the backend.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// The messages, in backend order.
        messages: Vec<String>,
    },
}

/// One error object inside an [`ApiErrorEnvelope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorObject {
    /// Machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Gateway-level details, when the failure came from a downstream gateway.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Gateway-specific detail attached to an [`ApiErrorObject`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Gateway error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_specific_code: Option<String>,
    /// Gateway error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_specific_description: Option<String>,
    /// Detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiErrorObject {
    /// Returns the most specific non-blank message carried by this object.
    fn best_message(&self) -> Option<&str> {
        non_blank(self.message.as_deref()).or_else(|| {
            self.details.iter().find_map(|detail| {
                non_blank(detail.gateway_specific_description.as_deref())
                    .or_else(|| non_blank(detail.message.as_deref()))
            })
        })
    }
}

impl ApiErrorEnvelope {
    /// Parses an error body, returning `None` when it matches no known shape.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// Returns the status echoed in the body, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Single { status, .. } | Self::List { status, .. } | Self::Messages { status, .. } => {
                *status
            }
        }
    }

    /// Returns the first error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Single { error, .. } => non_blank(error.code.as_deref()),
            Self::List { errors, .. } => errors.iter().find_map(|e| non_blank(e.code.as_deref())),
            Self::Messages { .. } => None,
        }
    }

    /// Returns a displayable message assembled from the body.
    ///
    /// Multiple messages are joined with `"; "`. Returns `None` when every
    /// message is missing or blank.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let parts: Vec<&str> = match self {
            Self::Single { error, .. } => error.best_message().into_iter().collect(),
            Self::List { errors, .. } => errors.iter().filter_map(ApiErrorObject::best_message).collect(),
            Self::Messages { messages, .. } => messages
                .iter()
                .filter_map(|m| non_blank(Some(m.as_str())))
                .collect(),
        };
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_error_object() {
        let body = r#"{"status":400,"error":{"code":"invalid_card","message":"Card declined"}}"#;
        let envelope = ApiErrorEnvelope::parse(body).unwrap();
        assert!(matches!(envelope, ApiErrorEnvelope::Single { .. }));
        assert_eq!(envelope.status(), Some(400));
        assert_eq!(envelope.code(), Some("invalid_card"));
        assert_eq!(envelope.message().as_deref(), Some("Card declined"));
    }

    #[test]
    fn test_single_error_falls_back_to_gateway_detail() {
        let body = r#"{"error":{"code":"gateway_error","message":" ","details":[{"gateway_specific_description":"Insufficient funds"}]}}"#;
        let envelope = ApiErrorEnvelope::parse(body).unwrap();
        assert_eq!(envelope.message().as_deref(), Some("Insufficient funds"));
    }

    #[test]
    fn test_parse_list_of_errors() {
        let body = r#"{"status":422,"errors":[{"code":"missing_field","message":"amount is required"},{"message":"currency is required"}]}"#;
        let envelope = ApiErrorEnvelope::parse(body).unwrap();
        assert!(matches!(envelope, ApiErrorEnvelope::List { .. }));
        assert_eq!(envelope.code(), Some("missing_field"));
        assert_eq!(
            envelope.message().as_deref(),
            Some("amount is required; currency is required")
        );
    }

    #[test]
    fn test_parse_messages_list() {
        let body = r#"{"status":400,"messages":["token expired",""]}"#;
        let envelope = ApiErrorEnvelope::parse(body).unwrap();
        assert!(matches!(envelope, ApiErrorEnvelope::Messages { .. }));
        assert_eq!(envelope.code(), None);
        assert_eq!(envelope.message().as_deref(), Some("token expired"));
    }

    #[test]
    fn test_unrecognized_bodies_do_not_parse() {
        assert!(ApiErrorEnvelope::parse("<html>Bad Gateway</html>").is_none());
        assert!(ApiErrorEnvelope::parse(r#"{"error":"nope"}"#).is_none());
        assert!(ApiErrorEnvelope::parse(r#"{"status":500}"#).is_none());
    }

    #[test]
    fn test_empty_messages_yield_none() {
        let envelope = ApiErrorEnvelope::parse(r#"{"messages":[]}"#).unwrap();
        assert_eq!(envelope.message(), None);
    }
}
