//! REST transport for the contact-management API.
//!
//! Components talk to the server only through [`ContactApi`], so every flow
//! can run against [`HttpContactApi`] in production and an in-memory fake in
//! tests.

mod client;
mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use client::HttpContactApi;
pub use error::{ApiError, SESSION_EXPIRED};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contacts::{Contact, ContactPayload};

/// Body of the login and register calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

/// Successful login body. Both fields are optional on the wire; the auth
/// flow rejects a response missing either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// One page of the contact list, optionally filtered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
}

impl PageQuery {
    /// The search text is trimmed and dropped when nothing is left
    pub fn new(page: u32, size: u32, search: &str) -> Self {
        let search = search.trim();
        Self {
            page,
            size,
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

/// Operations exposed by the contact-management server.
#[async_trait]
pub trait ContactApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;
    async fn change_password(
        &self,
        token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), ApiError>;
    async fn list_contacts(&self, token: &str, query: &PageQuery) -> Result<Vec<Contact>, ApiError>;
    async fn create_contact(&self, token: &str, payload: &ContactPayload)
        -> Result<Contact, ApiError>;
    async fn update_contact(
        &self,
        token: &str,
        id: i64,
        payload: &ContactPayload,
    ) -> Result<Contact, ApiError>;
    async fn delete_contact(&self, token: &str, id: i64) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_trims_search() {
        let query = PageQuery::new(2, 10, "  ada ");
        assert_eq!(query.search.as_deref(), Some("ada"));
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "2".to_string()),
                ("size", "10".to_string()),
                ("search", "ada".to_string())
            ]
        );
    }

    #[test]
    fn test_page_query_drops_blank_search() {
        let query = PageQuery::new(0, 10, "   ");
        assert_eq!(query.search, None);
        assert_eq!(query.to_params().len(), 2);
    }

    #[test]
    fn test_login_response_missing_fields() {
        let resp: LoginResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(resp.token.as_deref(), Some("abc"));
        assert_eq!(resp.username, None);
    }
}
