//! Bearer credential lifecycle for the flight-search API.
//!
//! [`TokenManager`] owns the only copy of the access token. Callers never see
//! it directly; they hand a request to [`TokenManager::authorize`] and get it
//! back with the `Authorization` header attached. A credential is refreshed
//! once it is within [`REFRESH_MARGIN_MS`] of expiring.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{ApiError, AuthError};

/// Credentials closer than this to expiry are treated as stale.
pub const REFRESH_MARGIN_MS: i64 = 5 * 60 * 1000;

const TOKEN_PATH: &str = "v1/security/oauth2/token";

/// Access token as returned by the authority's token endpoint.
#[derive(Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
}

/// A bearer token and the wall-clock instant it stops being accepted.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at_epoch_ms: i64,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at_epoch_ms: i64) -> Self {
        Self {
            token: token.into(),
            expires_at_epoch_ms,
        }
    }

    // Negative lifetimes count as already expired; huge ones saturate.
    fn from_grant(grant: TokenGrant, now_ms: i64) -> Self {
        let lifetime_ms = grant.expires_in.max(0).saturating_mul(1000);
        Self::new(grant.access_token, now_ms.saturating_add(lifetime_ms))
    }

    pub fn expires_at_epoch_ms(&self) -> i64 {
        self.expires_at_epoch_ms
    }

    /// Whether the credential is still usable at `now_ms`, margin included.
    pub fn is_fresh_at(&self, now_ms: i64) -> bool {
        self.expires_at_epoch_ms > now_ms.saturating_add(REFRESH_MARGIN_MS)
    }
}

// Keep the token out of logs and panic messages.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at_epoch_ms", &self.expires_at_epoch_ms)
            .finish()
    }
}

/// Something that can exchange client identity for a fresh access token.
#[async_trait]
pub trait CredentialAuthority: Send + Sync {
    async fn grant(&self) -> Result<TokenGrant, AuthError>;
}

/// OAuth2 client-credentials exchange against `{base}/v1/security/oauth2/token`.
pub struct HttpAuthority {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl HttpAuthority {
    pub fn new(
        http: Client,
        base_url: &Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            token_url: base_url.join(TOKEN_PATH)?,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    fn token_request(&self) -> RequestBuilder {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        self.http.post(self.token_url.clone()).form(&form)
    }
}

#[async_trait]
impl CredentialAuthority for HttpAuthority {
    async fn grant(&self) -> Result<TokenGrant, AuthError> {
        let response = self.token_request().send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AuthError::Rejected { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Holds the current credential and refreshes it on demand.
///
/// Concurrent callers that find the credential stale queue behind a single
/// refresh instead of each hitting the token endpoint.
pub struct TokenManager {
    authority: Arc<dyn CredentialAuthority>,
    credential: RwLock<Option<Credential>>,
    refresh_gate: Mutex<()>,
}

impl TokenManager {
    pub fn new(authority: Arc<dyn CredentialAuthority>) -> Self {
        Self {
            authority,
            credential: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Starts out holding `credential`, as if a previous exchange had issued it.
    pub fn with_credential(authority: Arc<dyn CredentialAuthority>, credential: Credential) -> Self {
        Self {
            authority,
            credential: RwLock::new(Some(credential)),
            refresh_gate: Mutex::new(()),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Makes sure a fresh credential is held, exchanging for a new one if needed.
    ///
    /// On failure the previously held credential (if any) is left untouched.
    pub async fn ensure_valid(&self) -> Result<(), ApiError> {
        self.current_token().await.map(|_| ())
    }

    /// Attaches the current bearer token to `request`.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.current_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn current_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited on the gate.
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        debug!("Access token missing or inside refresh margin, requesting a new one");
        let grant = self.authority.grant().await.map_err(|e| {
            warn!("Credential exchange failed: {}", e);
            ApiError::AuthenticationFailed(e)
        })?;

        let credential = Credential::from_grant(grant, now_ms());
        info!(
            "Obtained access token valid until {}",
            credential.expires_at_epoch_ms()
        );
        let token = credential.token.clone();
        *self.credential.write().await = Some(credential);
        Ok(token)
    }

    async fn fresh_token(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .filter(|c| c.is_fresh_at(now_ms()))
            .map(|c| c.token.clone())
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
