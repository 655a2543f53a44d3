//! Identity handshake and the authenticated request primitive.
//!
//! The OAuth flow itself belongs to an external collaborator behind
//! [`IdentityHandshake`]. An [`AuthSession`] exists only once that
//! handshake has finished, and it is the only way to obtain a
//! [`HubClient`], so nothing can reach the network before identity is
//! established.

use crate::endpoints::{HUB_API_VERSION, HUB_API_VERSION_HEADER};
use crate::error::{HostError, HostResult};
use async_trait::async_trait;
use hubwidget_types::{HubConfig, RequestParams};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a completed identity handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// An access token was obtained.
    Token(String),
    /// Credentials were skipped; requests go out unauthenticated.
    Anonymous,
}

/// External identity handshake (OAuth against the Hub).
#[async_trait]
pub trait IdentityHandshake: Send + Sync {
    /// Runs the handshake to completion. Errors abort the instantiation.
    async fn init(&self, config: &HubConfig) -> HostResult<AuthState>;
}

/// Handshake that hands out a pre-issued access token.
#[derive(Debug, Clone)]
pub struct StaticTokenHandshake {
    token: String,
}

impl StaticTokenHandshake {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityHandshake for StaticTokenHandshake {
    async fn init(&self, _config: &HubConfig) -> HostResult<AuthState> {
        if self.token.is_empty() {
            return Err(HostError::Auth("empty access token".into()));
        }
        Ok(AuthState::Token(self.token.clone()))
    }
}

/// Handshake for pages that skip credentials entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousHandshake;

#[async_trait]
impl IdentityHandshake for AnonymousHandshake {
    async fn init(&self, _config: &HubConfig) -> HostResult<AuthState> {
        Ok(AuthState::Anonymous)
    }
}

/// A finished identity handshake.
pub struct AuthSession {
    config: HubConfig,
    state: AuthState,
    client: HubClient,
}

impl AuthSession {
    /// Runs the handshake and builds the authenticated client.
    pub async fn init(handshake: &dyn IdentityHandshake, config: HubConfig) -> HostResult<Self> {
        debug!(server_uri = %config.server_uri, client_id = %config.client_id, "Starting identity handshake");

        let state = handshake.init(&config).await.map_err(|e| match e {
            HostError::Auth(_) => e,
            other => HostError::Auth(other.to_string()),
        })?;

        let token = match &state {
            AuthState::Token(token) => Some(token.clone()),
            AuthState::Anonymous => None,
        };
        let client = HubClient::new(&config.server_uri, token)?;

        info!(
            server_uri = %config.server_uri,
            anonymous = token_is_absent(&state),
            "Identity handshake complete"
        );

        Ok(Self {
            config,
            state,
            client,
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_anonymous(&self) -> bool {
        token_is_absent(&self.state)
    }

    /// The authenticated request primitive.
    pub fn client(&self) -> &HubClient {
        &self.client
    }
}

fn token_is_absent(state: &AuthState) -> bool {
    matches!(state, AuthState::Anonymous)
}

/// Authenticated HTTP client for the Hub and the services it lists.
#[derive(Clone)]
pub struct HubClient {
    http: Client,
    server_uri: String,
    token: Option<String>,
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("server_uri", &self.server_uri)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl HubClient {
    fn new(server_uri: &str, token: Option<String>) -> HostResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            server_uri: server_uri.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Hub base URL without a trailing slash.
    pub fn server_uri(&self) -> &str {
        &self.server_uri
    }

    /// Sends an authenticated request and decodes the body.
    ///
    /// JSON bodies are parsed, an empty body is `null`, and any other body
    /// is returned as a string.
    pub async fn request(&self, url: &str, params: &RequestParams) -> HostResult<Value> {
        let method_name = params.method_name();
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| HostError::InvalidRequest(format!("unsupported method '{method_name}'")))?;

        let mut builder = self
            .http
            .request(method, url)
            .header(HUB_API_VERSION_HEADER, HUB_API_VERSION);
        if !params.query.is_empty() {
            builder = builder.query(&params.query);
        }
        for (name, value) in &params.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &params.body {
            builder = builder.json(body);
        }

        debug!(method = %method_name, url = %url, "Hub request");
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Hub request failed");
            return Err(HostError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    /// GETs `url` and deserializes the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> HostResult<T> {
        let body = self.request(url, &RequestParams::get()).await?;
        Ok(serde_json::from_value(body)?)
    }
}
