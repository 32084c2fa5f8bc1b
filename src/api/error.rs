//! Client-side classification of failed API calls.
//!
//! Every failure ends up as one of three kinds: the request never completed
//! (transport), the server answered with a non-success status, or a success
//! body could not be decoded. Components turn these into displayable strings
//! with [`ApiError::describe`]; nothing here is ever shown raw.

use std::collections::BTreeMap;
use thiserror::Error;

/// Message shown when the contact API rejects the session
pub const SESSION_EXPIRED: &str = "Session expired or invalid. Please log in again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned {status} {reason}")]
    Status {
        status: u16,
        reason: String,
        /// Message the server put in the error body, if any
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error from a raw response body.
    ///
    /// A JSON object's `error` field wins. A JSON object of field messages
    /// (validation failures) is joined into one line. Any other non-empty,
    /// non-JSON body is taken verbatim.
    pub fn from_response(status: u16, reason: Option<&str>, body: &str) -> Self {
        Self::Status {
            status,
            reason: reason
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string()),
            message: extract_message(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 and 403 both mean the session is no longer usable
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } => Some(m.as_str()),
            _ => None,
        }
    }

    /// Displayable message: the server's own text, else `{failed}: {reason}`
    /// for status errors, else `generic` when no response was usable.
    pub fn describe(&self, failed: &str, generic: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(m), ..
            } => m.clone(),
            ApiError::Status { reason, .. } => format!("{}: {}", failed, reason),
            ApiError::Transport(_) | ApiError::Decode(_) => generic.to_string(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            if let Some(serde_json::Value::String(error)) = map.get("error") {
                return Some(error.clone());
            }

            let fields: BTreeMap<&String, &str> = map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k, s)))
                .collect();
            if fields.is_empty() {
                return None;
            }
            Some(
                fields
                    .iter()
                    .map(|(field, msg)| format!("{}: {}", field, msg))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
        Ok(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_preferred() {
        let err = ApiError::from_response(409, Some("Conflict"), r#"{"error":"Contact exists"}"#);
        assert_eq!(err.server_message(), Some("Contact exists"));
        assert_eq!(err.describe("Failed", "generic"), "Contact exists");
    }

    #[test]
    fn test_field_errors_joined_in_key_order() {
        let body = r#"{"lastName":"too long","firstName":"This field cannot be blank."}"#;
        let err = ApiError::from_response(400, Some("Bad Request"), body);
        assert_eq!(
            err.server_message(),
            Some("firstName: This field cannot be blank.; lastName: too long")
        );
    }

    #[test]
    fn test_plain_text_body_used_verbatim() {
        let err = ApiError::from_response(400, Some("Bad Request"), "Password change failed");
        assert_eq!(err.server_message(), Some("Password change failed"));
    }

    #[test]
    fn test_empty_body_falls_back_to_reason() {
        let err = ApiError::from_response(500, Some("Internal Server Error"), "");
        assert_eq!(err.server_message(), None);
        assert_eq!(
            err.describe("Failed to fetch contacts", "Could not load contacts."),
            "Failed to fetch contacts: Internal Server Error"
        );

        let err = ApiError::from_response(599, None, "{}");
        assert_eq!(err.describe("Login failed", "x"), "Login failed: 599");
    }

    #[test]
    fn test_unauthorized_statuses() {
        assert!(ApiError::from_response(401, None, "").is_unauthorized());
        assert!(ApiError::from_response(403, None, "").is_unauthorized());
        assert!(!ApiError::from_response(404, None, "").is_unauthorized());
        assert!(!ApiError::Transport("refused".into()).is_unauthorized());
    }

    #[test]
    fn test_transport_uses_generic_message() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(
            err.describe("Login failed", "An error occurred during login."),
            "An error occurred during login."
        );
    }
}
