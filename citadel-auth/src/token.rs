//! OAuth-style client-credentials bearer-token holder with expiry refresh
//! (spec §4.9).

use chrono::{DateTime, Utc};
use citadel_keystore::ApiError;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::AuthError;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: DateTime<Utc>,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Holds `(apiKeyId, apiSecret)` and the current `(token, expiresAt)`.
/// Concurrent refreshes are idempotent by design — the last writer wins.
pub struct TokenAuthenticator {
    http: reqwest::Client,
    token_url: String,
    api_key_id: String,
    api_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenAuthenticator {
    pub fn new(http: reqwest::Client, token_url: String, api_key_id: String, api_secret: String) -> Self {
        Self {
            http,
            token_url,
            api_key_id,
            api_secret,
            cached: RwLock::new(None),
        }
    }

    /// Returns the current `Authorization: Bearer <token>` value, refreshing
    /// first if absent or expired.
    pub async fn bearer_header(&self) -> Result<String, AuthError> {
        if let Some(token) = self.valid_cached_token().await {
            return Ok(format!("Bearer {token}"));
        }
        let token = self.refresh().await?;
        Ok(format!("Bearer {token}"))
    }

    /// Bypasses the cache entirely. The storage layer's single
    /// refresh-and-retry on a 401 calls this rather than `bearer_header`,
    /// since a cache hit that the server has since invalidated would
    /// otherwise return the same stale token forever.
    pub async fn force_refresh_bearer_header(&self) -> Result<String, AuthError> {
        let token = self.refresh().await?;
        Ok(format!("Bearer {token}"))
    }

    async fn valid_cached_token(&self) -> Option<String> {
        let guard = self.cached.read().await;
        let cached = guard.as_ref()?;
        if Utc::now() >= cached.expires_at {
            return None;
        }
        Some(cached.token.clone())
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        tracing::info!(token_url = %self.token_url, "refreshing storage access token");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.api_key_id, Some(&self.api_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            tracing::warn!("token refresh failed: unauthorized");
            return Err(AuthError::Api(ApiError::Unauthorized));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "token refresh failed");
            return Err(AuthError::Api(ApiError::Http(status.as_u16())));
        }

        let parsed: TokenResponse = response.json().await?;
        let token = parsed.access_token.clone();

        let mut guard = self.cached.write().await;
        *guard = Some(CachedToken {
            token: parsed.access_token,
            expires_at: parsed.expires_at,
        });

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_authenticator_has_no_cached_token() {
        let http = reqwest::Client::new();
        let auth = TokenAuthenticator::new(
            http,
            "https://example.invalid/v1/auth/token".to_string(),
            "key-id".to_string(),
            "secret".to_string(),
        );
        assert!(auth.valid_cached_token().await.is_none());
    }

    #[tokio::test]
    async fn unexpired_cached_token_is_reused_without_a_refresh() {
        let http = reqwest::Client::new();
        let auth = TokenAuthenticator::new(
            http,
            "https://example.invalid/v1/auth/token".to_string(),
            "key-id".to_string(),
            "secret".to_string(),
        );
        *auth.cached.write().await = Some(CachedToken {
            token: "cached-token".to_string(),
            expires_at: Utc::now() + chrono::Duration::minutes(5),
        });

        assert_eq!(auth.bearer_header().await.unwrap(), "Bearer cached-token");
    }

    #[tokio::test]
    async fn expired_cached_token_is_not_reused() {
        let http = reqwest::Client::new();
        let auth = TokenAuthenticator::new(
            http,
            "https://example.invalid/v1/auth/token".to_string(),
            "key-id".to_string(),
            "secret".to_string(),
        );
        *auth.cached.write().await = Some(CachedToken {
            token: "stale-token".to_string(),
            expires_at: Utc::now() - chrono::Duration::minutes(5),
        });

        assert!(auth.valid_cached_token().await.is_none());
    }
}
