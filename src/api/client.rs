use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::{
    ApiError, ChangePasswordRequest, ContactApi, Credentials, LoginResponse, PageQuery,
};
use crate::contacts::{Contact, ContactPayload};

/// [`ContactApi`] over HTTP.
pub struct HttpContactApi {
    client: Client,
    base_url: String,
}

impl HttpContactApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and turn any non-success status into [`ApiError::Status`]
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(
            status.as_u16(),
            status.canonical_reason(),
            &body,
        ))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ContactApi for HttpContactApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(credentials);
        let response = self.send(request).await?;
        Self::json(response).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("/api/auth/register"))
            .json(credentials);
        self.send(request).await?;
        Ok(())
    }

    async fn change_password(
        &self,
        token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url("/api/auth/change-password"))
            .bearer_auth(token)
            .json(request);
        self.send(request).await?;
        Ok(())
    }

    async fn list_contacts(&self, token: &str, query: &PageQuery) -> Result<Vec<Contact>, ApiError> {
        let request = self
            .client
            .get(self.url("/api/contacts"))
            .bearer_auth(token)
            .query(&query.to_params());
        let response = self.send(request).await?;
        Self::json(response).await
    }

    async fn create_contact(
        &self,
        token: &str,
        payload: &ContactPayload,
    ) -> Result<Contact, ApiError> {
        let request = self
            .client
            .post(self.url("/api/contacts"))
            .bearer_auth(token)
            .json(payload);
        let response = self.send(request).await?;
        Self::json(response).await
    }

    async fn update_contact(
        &self,
        token: &str,
        id: i64,
        payload: &ContactPayload,
    ) -> Result<Contact, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/api/contacts/{}", id)))
            .bearer_auth(token)
            .json(payload);
        let response = self.send(request).await?;
        Self::json(response).await
    }

    async fn delete_contact(&self, token: &str, id: i64) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/api/contacts/{}", id)))
            .bearer_auth(token);
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpContactApi::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(api.url("/api/contacts"), "http://localhost:8080/api/contacts");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on loopback is not expected to accept HTTP
        let api = HttpContactApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = api.list_contacts("tok", &PageQuery::new(0, 10, "")).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
