use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AuthToken, BookmarkPatch, BookmarkQuery, Category, Collection, Credentials, NewBookmark,
    NewCategory, NewCollection, NewTag, RawBookmark, Registration, Suggestion, Tag, User,
};
use crate::session::Session;

use super::MarklyApi;

/// Authenticated HTTP client for the Markly backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<RwLock<Session>>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<RwLock<Session>>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("markly/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.session.read().await.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-2xx response into an error. A 401 on an authenticated call
    /// ends the session.
    async fn check(&self, response: Response, authenticated: bool) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && authenticated {
            tracing::warn!("Session rejected by the API, logging out");
            self.session.write().await.clear()?;
            return Err(AppError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(status, &body);
        tracing::debug!("API error {}: {}", status, message);

        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(message));
        }
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.check(builder.send().await?, true).await?;
        Ok(response.json().await?)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<()> {
        self.check(builder.send().await?, true).await?;
        Ok(())
    }
}

/// Pull a human readable message out of an error body: the JSON `error` field,
/// then `message`, then the raw text, then the status reason.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.trim().is_empty() {
                    return message.trim().to_string();
                }
            }
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') {
        return text.to_string();
    }

    status
        .canonical_reason()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn bookmark_path(id: &str) -> String {
    format!("/bookmarks/{}", urlencoding::encode(id))
}

#[async_trait]
impl MarklyApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await?;
        let response = self.check(response, false).await?;
        let auth: AuthToken = response.json().await?;

        if auth.token.trim().is_empty() {
            return Err(anyhow::anyhow!("Login response did not include a token").into());
        }

        self.session.write().await.set_token(auth.token)?;
        tracing::info!("Logged in as {}", credentials.email);
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(registration)
            .send()
            .await?;
        self.check(response, false).await?;
        Ok(())
    }

    async fn me(&self) -> Result<User> {
        self.fetch(self.request(Method::GET, "/me").await).await
    }

    async fn list_bookmarks(&self, query: &BookmarkQuery) -> Result<Vec<RawBookmark>> {
        let builder = self.request(Method::GET, "/bookmarks").await;
        let builder = if query.is_empty() {
            builder
        } else {
            builder.query(query)
        };
        self.fetch(builder).await
    }

    async fn get_bookmark(&self, id: &str) -> Result<RawBookmark> {
        self.fetch(self.request(Method::GET, &bookmark_path(id)).await)
            .await
    }

    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<RawBookmark> {
        let builder = self.request(Method::POST, "/bookmarks").await.json(bookmark);
        self.fetch(builder).await
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> Result<()> {
        let builder = self
            .request(Method::PUT, &bookmark_path(id))
            .await
            .json(patch);
        self.execute(builder).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.fetch(self.request(Method::GET, "/categories").await)
            .await
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let builder = self.request(Method::POST, "/categories").await.json(category);
        self.fetch(builder).await
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        self.fetch(self.request(Method::GET, "/collections").await)
            .await
    }

    async fn create_collection(&self, collection: &NewCollection) -> Result<Collection> {
        let builder = self
            .request(Method::POST, "/collections")
            .await
            .json(collection);
        self.fetch(builder).await
    }

    async fn delete_collection(&self, id: &str) -> Result<()> {
        let path = format!("/collections/{}", urlencoding::encode(id));
        self.execute(self.request(Method::DELETE, &path).await)
            .await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.fetch(self.request(Method::GET, "/tags").await).await
    }

    async fn list_user_tags(&self) -> Result<Vec<Tag>> {
        self.fetch(self.request(Method::GET, "/tags/user").await)
            .await
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        let builder = self.request(Method::POST, "/tags").await.json(tag);
        self.fetch(builder).await
    }

    async fn summarize(&self, id: &str) -> Result<()> {
        let path = format!("/agent/summarize/{}", urlencoding::encode(id));
        self.execute(self.request(Method::POST, &path).await).await
    }

    async fn suggestions(&self) -> Result<Vec<Suggestion>> {
        self.fetch(self.request(Method::GET, "/agent/suggestions").await)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins_over_message() {
        let body = r#"{"error":"url already saved","message":"conflict"}"#;
        assert_eq!(
            extract_error_message(StatusCode::CONFLICT, body),
            "url already saved"
        );
    }

    #[test]
    fn test_message_field_used_when_no_error() {
        let body = r#"{"message":"name is required"}"#;
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, body),
            "name is required"
        );
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(
            extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, "database down\n"),
            "database down"
        );
    }

    #[test]
    fn test_empty_body_falls_back_to_reason() {
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, ""),
            "Bad Gateway"
        );
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, r#"{"detail":"x"}"#),
            "Bad Request"
        );
    }

    #[test]
    fn test_bookmark_path_encodes_id() {
        assert_eq!(bookmark_path("abc"), "/bookmarks/abc");
        assert_eq!(bookmark_path("a/b"), "/bookmarks/a%2Fb");
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(dir.path().join("session.toml")).unwrap();
        let config = Config {
            api_base_url: "http://localhost:8080/api/".to_string(),
            ..Config::default()
        };
        let client = ApiClient::new(&config, Arc::new(RwLock::new(session)));

        assert_eq!(client.url("/bookmarks"), "http://localhost:8080/api/bookmarks");
    }
}
