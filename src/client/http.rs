//! HTTP implementation of [`AuthBackend`]

use super::dto::{error_message, AuthGrant, Credentials, Identity, Registration, RegistrationResponse};
use super::AuthBackend;
use crate::config::ApiConfig;
use crate::session::AuthError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTER_FAILED: &str = "Registration failed. Please check your details.";
const SESSION_INVALID: &str = "Your session has expired. Please sign in again.";
const LOGOUT_FAILED: &str = "Sign-out failed on the server.";

/// Fitness API client over HTTP
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    /// Create a client for the service at `base_url` (e.g. "http://localhost:8000")
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, AuthError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(AuthError::from)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self, AuthError> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into an authentication error
    async fn rejection(response: Response, fallback: &str) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
        tracing::debug!("Request rejected with {}: {}", status, message);
        AuthError::Authentication(message)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        let response = self
            .client
            .post(self.url("/api/login/"))
            .json(credentials)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, LOGIN_FAILED).await);
        }

        Ok(response.json::<AuthGrant>().await?)
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, AuthError> {
        let response = self
            .client
            .post(self.url("/api/register/"))
            .json(registration)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, REGISTER_FAILED).await);
        }

        let created: RegistrationResponse = response.json().await?;
        tracing::info!("Registered account {} (id {})", created.user.username, created.user.id);

        // Registration does not issue a token; sign in with the new account
        self.login(&registration.credentials()).await
    }

    async fn current_user(&self, token: &str) -> Result<Identity, AuthError> {
        let response = self
            .client
            .get(self.url("/api/me/"))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, SESSION_INVALID).await);
        }

        Ok(response.json::<Identity>().await?)
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("/api/logout/"))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response, LOGOUT_FAILED).await);
        }

        Ok(())
    }
}
