//! Bearer-token acquisition from the DWAB authorization server
//!
//! Every request to a local TM instance (REST and WebSocket alike) carries
//! a bearer token issued by DWAB's OAuth endpoint. Tokens expire, so the
//! authenticator caches the current token with its expiry and refreshes on
//! demand. The cache is shared process-wide: concurrent callers that find
//! the token missing or expired single-flight one refresh request and all
//! await its result.

use serde::Deserialize;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Default DWAB OAuth token endpoint.
pub const TOKEN_ENDPOINT: &str = "https://auth.vextm.dwabtech.com/oauth2/token";

/// Third-party API credentials issued for a TM event.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Credential expiry, milliseconds since the UNIX epoch. Expired
    /// credentials fail locally without a network round trip.
    pub expiration_date: u64,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("authorization credentials have expired")]
    CredentialsExpired,

    #[error("authorization credentials are invalid")]
    CredentialsInvalid,

    #[error("could not obtain a bearer token: {0}")]
    TokenRequest(String),
}

#[derive(Debug, Clone, Deserialize)]
struct BearerToken {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Process-wide bearer-token source, safe to share across connections.
pub struct BearerAuthenticator {
    credentials: Credentials,
    endpoint: String,
    http: reqwest::Client,
    // Async mutex held across the refresh request: that is what makes
    // concurrent ensure() calls single-flight.
    cache: tokio::sync::Mutex<Option<CachedToken>>,
}

impl BearerAuthenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: TOKEN_ENDPOINT.to_string(),
            http: reqwest::Client::new(),
            cache: tokio::sync::Mutex::new(None),
        }
    }

    /// Override the token endpoint (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Return a valid access token, refreshing if the cached one is
    /// missing or expired.
    pub async fn ensure(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.refresh().await?;
        let access_token = token.access_token.clone();
        *cache = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(access_token)
    }

    /// Pre-load the cache so tests can exercise consumers without a
    /// reachable token endpoint.
    #[cfg(test)]
    pub(crate) async fn seed_token(&self, token: &str) {
        *self.cache.lock().await = Some(CachedToken {
            access_token: token.into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });
    }

    async fn refresh(&self) -> Result<BearerToken, AuthError> {
        if self.credentials.expiration_date < unix_millis() {
            return Err(AuthError::CredentialsExpired);
        }

        debug!("refreshing bearer token");

        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenRequest(e.to_string()))?;

        if !response.status().is_success() {
            #[derive(Deserialize)]
            struct OAuthError {
                error: String,
            }

            return match response.json::<OAuthError>().await {
                Ok(body) if body.error == "invalid_client" => Err(AuthError::CredentialsInvalid),
                Ok(body) => Err(AuthError::TokenRequest(body.error)),
                Err(e) => Err(AuthError::TokenRequest(e.to_string())),
            };
        }

        response
            .json::<BearerToken>()
            .await
            .map_err(|e| AuthError::TokenRequest(e.to_string()))
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expiration_date: u64) -> Credentials {
        Credentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            expiration_date,
        }
    }

    #[tokio::test]
    async fn expired_credentials_fail_without_network() {
        // Unroutable endpoint: a network attempt would error differently.
        let auth = BearerAuthenticator::new(credentials(0))
            .with_endpoint("http://127.0.0.1:1/oauth2/token");

        assert!(matches!(
            auth.ensure().await,
            Err(AuthError::CredentialsExpired)
        ));
    }

    #[tokio::test]
    async fn cached_token_is_reused() {
        let auth = BearerAuthenticator::new(credentials(u64::MAX))
            .with_endpoint("http://127.0.0.1:1/oauth2/token");

        // Seed the cache; ensure() must not hit the (unroutable) endpoint.
        *auth.cache.lock().await = Some(CachedToken {
            access_token: "cached".into(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });

        assert_eq!(auth.ensure().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn expired_cache_triggers_refresh() {
        let auth = BearerAuthenticator::new(credentials(0))
            .with_endpoint("http://127.0.0.1:1/oauth2/token");

        *auth.cache.lock().await = Some(CachedToken {
            access_token: "stale".into(),
            expires_at: Instant::now() - Duration::from_secs(1),
        });

        // Refresh path runs and fails on the expired credentials.
        assert!(matches!(
            auth.ensure().await,
            Err(AuthError::CredentialsExpired)
        ));
    }
}
