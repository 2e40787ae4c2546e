//! OAuth2 client-credentials tokens for AgentCore runtimes.
//!
//! Each agent's Cognito machine client lives in Parameter Store under the
//! agent's prefix. [`TokenCache`] loads those four values, performs the
//! `client_credentials` grant and keeps the bearer token for
//! [`DEFAULT_TOKEN_TTL`] (58 minutes and 20 seconds, safely under Cognito's
//! one-hour expiry).

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::aws::{AwsError, ParameterStore};

/// How long a fetched token is reused.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3500);

/// Timeout for the token endpoint call.
pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(15);

/// Parameter names under an agent's prefix.
pub mod fields {
    pub const CLIENT_ID: &str = "machine_client_id";
    pub const CLIENT_SECRET: &str = "machine_client_secret";
    pub const TOKEN_URL: &str = "cognito_token_url";
    pub const SCOPE: &str = "cognito_auth_scope";
}

/// Errors from loading credentials or calling the token endpoint.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required parameter is not set.
    #[error("missing parameter {0}")]
    MissingParameter(String),

    /// Parameter Store could not be read.
    #[error("parameter store error: {0}")]
    ParameterStore(#[from] AwsError),

    /// The token endpoint rejected the grant.
    #[error("token endpoint returned HTTP {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    /// The token endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The token endpoint answered with something that is not a token.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be built.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Source of wall-clock time for cache freshness.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cognito machine-client settings for one agent.
#[derive(Clone)]
pub struct M2mCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub scope: String,
}

impl std::fmt::Debug for M2mCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("M2mCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("token_url", &self.token_url)
            .field("scope", &self.scope)
            .finish()
    }
}

impl M2mCredentials {
    /// Load the four machine-client parameters under `prefix`.
    pub async fn load(store: &dyn ParameterStore, prefix: &str) -> Result<Self, AuthError> {
        let prefix = prefix.trim_end_matches('/');
        Ok(Self {
            client_id: read_required(store, prefix, fields::CLIENT_ID).await?,
            client_secret: read_required(store, prefix, fields::CLIENT_SECRET).await?,
            token_url: read_required(store, prefix, fields::TOKEN_URL).await?,
            scope: read_required(store, prefix, fields::SCOPE).await?,
        })
    }
}

async fn read_required(
    store: &dyn ParameterStore,
    prefix: &str,
    field: &str,
) -> Result<String, AuthError> {
    let name = format!("{}/{}", prefix, field);
    store
        .get_optional(&name)
        .await?
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingParameter(name))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    fetched_at: DateTime<Utc>,
}

/// Process-wide bearer token cache keyed by agent id.
pub struct TokenCache {
    http: reqwest::Client,
    store: Arc<dyn ParameterStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("ttl", &self.ttl)
            .field("cached_agents", &self.entries.lock().len())
            .finish()
    }
}

/// Builder for [`TokenCache`].
pub struct TokenCacheBuilder {
    store: Arc<dyn ParameterStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    timeout: Duration,
}

impl TokenCacheBuilder {
    /// Override the freshness window (default: 3500s).
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the token endpoint timeout (default: 15s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<TokenCache, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to create HTTP client: {}", e)))?;
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Configuration(format!("invalid token ttl: {}", e)))?;

        Ok(TokenCache {
            http,
            store: self.store,
            clock: self.clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        })
    }
}

impl TokenCache {
    pub fn builder(store: Arc<dyn ParameterStore>) -> TokenCacheBuilder {
        TokenCacheBuilder {
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TOKEN_TTL,
            timeout: DEFAULT_TOKEN_TIMEOUT,
        }
    }

    /// Cache with default TTL, timeout and system clock.
    pub fn new(store: Arc<dyn ParameterStore>) -> Result<Self, AuthError> {
        Self::builder(store).build()
    }

    /// Bearer token for `agent_id`, or `None` if one cannot be obtained.
    ///
    /// Failures are logged, not returned; callers must treat `None` as an
    /// authentication failure.
    pub async fn token(&self, agent_id: &str, ssm_prefix: &str) -> Option<String> {
        match self.fetch(agent_id, ssm_prefix).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(
                    agent = agent_id,
                    prefix = ssm_prefix,
                    error = %e,
                    "failed to obtain access token"
                );
                None
            }
        }
    }

    /// Bearer token for `agent_id`, reusing a cached one while it is fresh.
    pub async fn fetch(&self, agent_id: &str, ssm_prefix: &str) -> Result<String, AuthError> {
        if let Some(token) = self.cached(agent_id) {
            tracing::debug!(agent = agent_id, "using cached access token");
            return Ok(token);
        }
        self.refresh(agent_id, ssm_prefix).await
    }

    /// Fetch a new token regardless of the cache and store it.
    pub async fn refresh(&self, agent_id: &str, ssm_prefix: &str) -> Result<String, AuthError> {
        let credentials = M2mCredentials::load(self.store.as_ref(), ssm_prefix).await?;
        let token = self.request_token(&credentials).await?;

        self.entries.lock().insert(
            agent_id.to_string(),
            CachedToken {
                token: token.clone(),
                fetched_at: self.clock.now(),
            },
        );
        tracing::info!(agent = agent_id, "fetched new access token");
        Ok(token)
    }

    /// Cached token for `agent_id` if it is still inside the freshness window.
    pub fn cached(&self, agent_id: &str) -> Option<String> {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(agent_id)
            .filter(|entry| now - entry.fetched_at < self.ttl)
            .map(|entry| entry.token.clone())
    }

    /// Drop the cached token for `agent_id`.
    pub fn invalidate(&self, agent_id: &str) {
        self.entries.lock().remove(agent_id);
    }

    async fn request_token(&self, credentials: &M2mCredentials) -> Result<String, AuthError> {
        let mut form = vec![("grant_type", "client_credentials")];
        if !credentials.scope.is_empty() {
            form.push(("scope", credentials.scope.as_str()));
        }

        let response = self
            .http
            .post(&credentials.token_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        if parsed.access_token.is_empty() {
            return Err(AuthError::InvalidResponse("empty access_token".to_string()));
        }
        Ok(parsed.access_token)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
