//! OAuth2 access token cache.
//!
//! A [`TokenCache`] is a cheap, cloneable handle to one shared token slot.
//! Clients share the process-wide cache from [`TokenCache::global`] unless
//! they are given their own. The slot is guarded by a single async mutex so
//! that "read, or fetch and store" happens as one critical section: callers
//! racing on an empty cache trigger exactly one password grant.

use crate::{error::DelineaResult, secrets::OAuthTokenResponse};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, future::Future, sync::Arc};
use tokio::sync::Mutex;

static GLOBAL: Lazy<TokenCache> = Lazy::new(TokenCache::new);

/// Where the bearer token for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenSource {
    /// Reused from the cache
    Cached = 1,
    /// Freshly issued by the server's token endpoint
    Server = 2,
}

impl TryFrom<u8> for TokenSource {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cached),
            2 => Ok(Self::Server),
            other => Err(other),
        }
    }
}

/// Access/refresh token pair issued by `oauth2/token`.
#[derive(Clone)]
pub struct TokenPair {
    /// Bearer token sent on API calls
    pub access_token: SecretString,
    /// Refresh token, if the server issued one
    pub refresh_token: Option<SecretString>,
    /// Token type reported by the server (normally `bearer`)
    pub token_type: String,
    /// Lifetime in seconds reported by the server
    pub expires_in: u64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl From<OAuthTokenResponse> for TokenPair {
    fn from(resp: OAuthTokenResponse) -> Self {
        Self {
            access_token: SecretString::from(resp.access_token),
            refresh_token: resp.refresh_token.map(SecretString::from),
            token_type: resp.token_type,
            expires_in: resp.expires_in,
        }
    }
}

/// Shared, mutex-guarded token slot.
#[derive(Clone, Default)]
pub struct TokenCache {
    slot: Arc<Mutex<Option<TokenPair>>>,
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Create an empty cache isolated from every other cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the process-wide cache.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Whether two handles point at the same slot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Current token pair, if any.
    pub async fn get(&self) -> Option<TokenPair> {
        self.slot.lock().await.clone()
    }

    /// Replace the cached pair.
    pub async fn set(&self, pair: TokenPair) {
        *self.slot.lock().await = Some(pair);
    }

    /// Drop both the access and refresh token.
    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    /// Return the cached access token, or run `fetch` and cache its result.
    ///
    /// The lock is held while `fetch` runs. If `fetch` fails the cache is
    /// left empty and the error is returned.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `fetch`.
    pub async fn access_token_or_fetch<F, Fut>(
        &self,
        fetch: F,
    ) -> DelineaResult<(SecretString, TokenSource)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DelineaResult<TokenPair>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(pair) = slot.as_ref() {
            return Ok((pair.access_token.clone(), TokenSource::Cached));
        }

        let pair = fetch().await?;
        let access = pair.access_token.clone();
        *slot = Some(pair);
        Ok((access, TokenSource::Server))
    }

    /// Clear the cache if it still holds `stale`.
    ///
    /// Returns `false` when another caller already replaced the token, in
    /// which case the newer token is kept.
    pub async fn invalidate(&self, stale: &SecretString) -> bool {
        let mut slot = self.slot.lock().await;
        let matches = slot
            .as_ref()
            .is_some_and(|pair| pair.access_token.expose_secret() == stale.expose_secret());
        if matches {
            *slot = None;
        }
        matches
    }
}
