use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Settings, session::CompanySummary, store::FondData};

/// Shared slot holding the current `Authorization` header value.
///
/// Written only by the session service; read by the client when a request is
/// built, so outbound requests always carry the latest converged token.
pub type AuthHeaderSlot = Arc<RwLock<Option<String>>>;

pub fn new_auth_header_slot() -> AuthHeaderSlot {
    Arc::new(RwLock::new(None))
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the backend no longer accepts the token.
    #[error("unauthorized")]
    Unauthorized,
    /// 404: the resource does not exist for this user.
    #[error("not found")]
    NotFound,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub unread_messages: u32,
    pub unread_notifications: u32,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    key: String,
}

/// Typed client for the backend endpoints the session layer consumes.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthHeaderSlot,
}

impl ApiClient {
    pub fn new(settings: &Settings, auth: AuthHeaderSlot) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut rb = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(h) = self.auth.read().clone() {
            rb = rb.header(reqwest::header::AUTHORIZATION, h);
        }
        rb
    }

    async fn send_json<T: DeserializeOwned>(rb: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let resp = rb.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            reqwest::StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            s => Err(ApiError::Status(s.as_u16())),
        }
    }

    /// The company currently held by the authenticated user.
    pub async fn active_company(&self) -> Result<CompanySummary, ApiError> {
        Self::send_json(self.get("/companies/get/active/")).await
    }

    /// Unread message and notification counts for the navbar badges.
    pub async fn unread(&self) -> Result<UnreadCounts, ApiError> {
        Self::send_json(self.get("/social/unread/")).await
    }

    /// The user's fond membership record. 404 means "not a member".
    pub async fn fond_user_data(&self) -> Result<FondData, ApiError> {
        Self::send_json(self.get("/fonds/user_data/")).await
    }

    /// Exchanges credentials for an API token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let rb = self
            .http
            .post(format!("{}{}", self.base_url, "/social/login/"))
            .json(&LoginRequest { username, password });
        let resp: LoginResponse = Self::send_json(rb).await?;
        Ok(resp.key)
    }
}
