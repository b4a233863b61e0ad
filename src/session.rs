//! Bearer-token session management
//!
//! A [`Session`] owns the single live [`Credential`] of a client. Readers take
//! the fast path while the credential is younger than the configured maximum
//! age; once it goes stale, the first task to notice takes the refresh lock,
//! re-checks staleness, and performs one refresh call. Tasks that queued on the
//! lock meanwhile find the new credential and return without a network call.

use crate::config::Credentials;
use crate::endpoints;
use crate::error::{AuthError, Result, truncate_body};
use crate::types::Event;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::time::Instant;

/// Token pair returned by the login and refresh endpoints
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer token sent on every authenticated call
    pub access_token: String,
    /// Token exchanged for a new pair on refresh
    pub refresh_token: String,
    /// Token kind reported by the server (usually "bearer")
    pub token_type: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Refresh request body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    access_token: &'a str,
    refresh_token: &'a str,
}

/// A token pair plus the instant it was established
#[derive(Clone, Debug)]
pub struct Credential {
    tokens: TokenPair,
    established_at: Instant,
}

impl Credential {
    /// Credential established now
    pub fn new(tokens: TokenPair) -> Self {
        Self::established_at(tokens, Instant::now())
    }

    /// Credential established at a given instant
    pub fn established_at(tokens: TokenPair, at: Instant) -> Self {
        Self {
            tokens,
            established_at: at,
        }
    }

    /// Token pair
    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    /// Whether more than `max_age` has elapsed since the credential was established
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.established_at.elapsed() > max_age
    }

    /// Value of the `authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.tokens.access_token)
    }
}

/// Owner of the live credential and its refresh protocol
#[derive(Debug)]
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    max_age: Duration,
    credential: RwLock<Credential>,
    refresh_lock: Mutex<()>,
    refreshes: AtomicU64,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl Session {
    /// Wrap an established credential
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        max_age: Duration,
        credential: Credential,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            max_age,
            credential: RwLock::new(credential),
            refresh_lock: Mutex::new(()),
            refreshes: AtomicU64::new(0),
            event_tx: None,
        }
    }

    /// Publish [`Event::TokenRefreshed`] on the given channel
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Exchange operator identity for a first token pair (unauthenticated call)
    pub async fn login(
        http: &reqwest::Client,
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<TokenPair> {
        let url = endpoints::login_url(base_url);
        tracing::info!(url = %url, email = %credentials.email, "logging in");

        let response = http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        let tokens = read_token_response(response, "login").await?;
        tracing::info!("login succeeded");
        Ok(tokens)
    }

    /// Current `authorization` header value, refreshing the credential first if stale
    pub async fn auth_header(&self) -> Result<String> {
        {
            let credential = self.credential.read().await;
            if !credential.is_stale(self.max_age) {
                return Ok(credential.bearer());
            }
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited for the lock
        let current = {
            let credential = self.credential.read().await;
            if !credential.is_stale(self.max_age) {
                tracing::debug!("token already refreshed by a concurrent task");
                return Ok(credential.bearer());
            }
            credential.tokens.clone()
        };

        tracing::info!("token expired, refreshing");
        let fresh = Credential::new(self.request_refresh(&current).await?);
        let header = fresh.bearer();
        *self.credential.write().await = fresh;

        self.refreshes.fetch_add(1, Ordering::Relaxed);
        if let Some(tx) = &self.event_tx {
            tx.send(Event::TokenRefreshed).ok();
        }
        tracing::info!("token refreshed");

        Ok(header)
    }

    /// Snapshot of the live credential
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    /// Number of successful refresh calls performed by this session
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    async fn request_refresh(&self, current: &TokenPair) -> Result<TokenPair> {
        let url = endpoints::refresh_token_url(&self.base_url);
        let body = RefreshRequest {
            access_token: &current.access_token,
            refresh_token: &current.refresh_token,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(AuthError::Transport)?;

        read_token_response(response, "refresh").await
    }
}

async fn read_token_response(
    response: reqwest::Response,
    endpoint: &'static str,
) -> Result<TokenPair> {
    let status = response.status();
    let body = response.text().await.map_err(AuthError::Transport)?;

    if !status.is_success() {
        tracing::error!(endpoint, status = status.as_u16(), "token request rejected");
        return Err(AuthError::Rejected {
            endpoint,
            status: status.as_u16(),
            body: truncate_body(&body),
        }
        .into());
    }

    serde_json::from_str(&body).map_err(|e| AuthError::InvalidTokenResponse(e).into())
}
