//! Secret Server HTTP client with shared token caching.

use crate::{
    config::DelineaConfig,
    error::{DelineaError, DelineaResult},
    secrets::{
        ACCESS_DENIED_MARKER, DEFAULT_IDENTITY_SLUG, DEFAULT_SECRET_SLUG, EXPIRED_TOKEN_MARKER,
        OAuthTokenResponse, OtpCode, SECRET_NAME_SLUG, SecretSummary, strip_quotes,
    },
    token::{TokenCache, TokenPair, TokenSource},
};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Authenticated transport shared by every call a [`SecretClient`] makes.
#[derive(Debug)]
struct Session {
    config: DelineaConfig,
    http: Client,
    tokens: TokenCache,
    request_id: Uuid,
    /// `TokenSource` discriminant of the last token used, 0 before any call.
    last_source: AtomicU8,
}

impl Session {
    async fn access_token(&self) -> DelineaResult<SecretString> {
        let (token, source) = self
            .tokens
            .access_token_or_fetch(|| self.request_token())
            .await?;

        self.last_source.store(source as u8, Ordering::Relaxed);
        Ok(token)
    }

    /// OAuth2 password grant against `oauth2/token`.
    async fn request_token(&self) -> DelineaResult<TokenPair> {
        let url = self.config.endpoint("oauth2/token");
        let form = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.expose_secret()),
        ];

        let response = self.http.post(&url).form(&form).send().await?;
        let body = read_success(response).await?;
        let oauth: OAuthTokenResponse = serde_json::from_str(&body)?;

        info!(
            request_id = %self.request_id,
            expires_in = oauth.expires_in,
            refresh_token = oauth.refresh_token.is_some(),
            "Obtained access token from server"
        );
        Ok(oauth.into())
    }

    /// Single GET attempt. Checks status and the access-denied marker.
    async fn send_get(&self, path: &str) -> DelineaResult<(String, SecretString)> {
        let token = self.access_token().await?;
        let url = self.config.endpoint(path);
        debug!(request_id = %self.request_id, path, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        let body = read_success(response).await?;

        if body.contains(ACCESS_DENIED_MARKER) {
            return Err(DelineaError::AccessDenied);
        }
        Ok((body, token))
    }

    async fn get(&self, path: &str) -> DelineaResult<String> {
        let (body, token) = self.send_get(path).await?;
        if !body.contains(EXPIRED_TOKEN_MARKER) {
            return Ok(body);
        }

        warn!(
            request_id = %self.request_id,
            path,
            "Deleting token and repeating request"
        );
        self.tokens.invalidate(&token).await;

        // The retry is not checked for the expired-token marker again.
        let (body, _) = self.send_get(path).await?;
        Ok(body)
    }

    async fn post<T>(&self, path: &str, form: &T) -> DelineaResult<String>
    where
        T: Serialize + ?Sized,
    {
        let token = self.access_token().await?;
        let url = self.config.endpoint(path);
        debug!(request_id = %self.request_id, path, "POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.expose_secret())
            .form(form)
            .send()
            .await?;
        read_success(response).await
    }
}

async fn read_success(response: Response) -> DelineaResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(DelineaError::status(status, body))
    }
}

/// Builder for [`SecretClient`].
#[derive(Debug)]
pub struct SecretClientBuilder {
    config: DelineaConfig,
    secret_id: i64,
    identity_slug: String,
    secret_slug: String,
    tokens: Option<TokenCache>,
    http: Option<Client>,
}

impl SecretClientBuilder {
    /// Field slug resolved by [`SecretClient::identity`].
    ///
    /// [`SECRET_NAME_SLUG`] selects the secret's display name.
    #[must_use]
    pub fn identity_slug(mut self, slug: impl Into<String>) -> Self {
        self.identity_slug = slug.into();
        self
    }

    /// Field slug resolved by [`SecretClient::secret`].
    #[must_use]
    pub fn secret_slug(mut self, slug: impl Into<String>) -> Self {
        self.secret_slug = slug.into();
        self
    }

    /// Use `cache` instead of the process-wide token cache.
    #[must_use]
    pub fn token_cache(mut self, cache: TokenCache) -> Self {
        self.tokens = Some(cache);
        self
    }

    /// Use a prebuilt HTTP client.
    #[must_use]
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client and fetch the secret summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be fetched or parsed.
    pub async fn connect(self) -> DelineaResult<SecretClient> {
        let http = match self.http {
            Some(http) => http,
            None => self.config.build_http_client()?,
        };

        let session = Session {
            config: self.config,
            http,
            tokens: self.tokens.unwrap_or_else(TokenCache::global),
            request_id: Uuid::new_v4(),
            last_source: AtomicU8::new(0),
        };
        info!(
            request_id = %session.request_id,
            secret_id = self.secret_id,
            "Initializing credential request"
        );

        let body = session
            .get(&format!("api/v1/secrets/{}/summary", self.secret_id))
            .await?;
        let summary: SecretSummary = serde_json::from_str(&body)?;
        debug!(
            request_id = %session.request_id,
            template_id = summary.secret_template_id,
            "Fetched secret summary"
        );

        Ok(SecretClient {
            session,
            secret_id: self.secret_id,
            identity_slug: self.identity_slug,
            secret_slug: self.secret_slug,
            summary,
            identity: OnceCell::new(),
            secret: OnceCell::new(),
        })
    }
}

/// One secret lookup: summary at construction, fields resolved on demand.
///
/// `identity` and `secret` are fetched at most once per client; failed
/// resolutions are not cached and may be retried.
#[derive(Debug)]
pub struct SecretClient {
    session: Session,
    secret_id: i64,
    identity_slug: String,
    secret_slug: String,
    summary: SecretSummary,
    identity: OnceCell<String>,
    secret: OnceCell<SecretString>,
}

impl SecretClient {
    /// Start building a client for `secret_id` with default field slugs.
    #[must_use]
    pub fn builder(config: DelineaConfig, secret_id: i64) -> SecretClientBuilder {
        SecretClientBuilder {
            config,
            secret_id,
            identity_slug: DEFAULT_IDENTITY_SLUG.to_string(),
            secret_slug: DEFAULT_SECRET_SLUG.to_string(),
            tokens: None,
            http: None,
        }
    }

    /// Connect with default field slugs and the process-wide token cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the summary cannot be fetched or parsed.
    pub async fn connect(config: DelineaConfig, secret_id: i64) -> DelineaResult<Self> {
        Self::builder(config, secret_id).connect().await
    }

    /// Secret identifier.
    #[must_use]
    pub const fn secret_id(&self) -> i64 {
        self.secret_id
    }

    /// Correlation identifier of this lookup.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.session.request_id
    }

    /// Template id from the summary.
    #[must_use]
    pub const fn template_id(&self) -> i64 {
        self.summary.secret_template_id
    }

    /// Display name from the summary.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.summary.name
    }

    /// Configured identity slug.
    #[must_use]
    pub fn identity_slug(&self) -> &str {
        &self.identity_slug
    }

    /// Configured secret slug.
    #[must_use]
    pub fn secret_slug(&self) -> &str {
        &self.secret_slug
    }

    /// Provenance of the bearer token used by the most recent call.
    #[must_use]
    pub fn last_token_source(&self) -> Option<TokenSource> {
        TokenSource::try_from(self.session.last_source.load(Ordering::Relaxed)).ok()
    }

    /// Identity (username) of the credential.
    ///
    /// Service-account templates and [`SECRET_NAME_SLUG`] resolve to the
    /// display name without a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the field request fails.
    #[instrument(skip(self), fields(request_id = %self.session.request_id, secret_id = self.secret_id))]
    pub async fn identity(&self) -> DelineaResult<&str> {
        self.identity
            .get_or_try_init(|| async {
                if self.identity_slug == SECRET_NAME_SLUG || self.summary.name_is_identity() {
                    debug!("Using secret name as identity");
                    return Ok(self.summary.name.clone());
                }
                self.field(&self.identity_slug).await
            })
            .await
            .map(String::as_str)
    }

    /// Secret value (password) of the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the field request fails.
    #[instrument(skip(self), fields(request_id = %self.session.request_id, secret_id = self.secret_id))]
    pub async fn secret(&self) -> DelineaResult<&SecretString> {
        self.secret
            .get_or_try_init(|| async {
                self.field(&self.secret_slug).await.map(SecretString::from)
            })
            .await
    }

    /// Current one-time-password code. Fetched on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no code is returned.
    pub async fn otp(&self) -> DelineaResult<String> {
        self.otp_codes()
            .await?
            .into_iter()
            .next()
            .map(|otp| otp.code)
            .ok_or(DelineaError::EmptyOtpResponse(self.secret_id))
    }

    /// All one-time-password codes the server returns for this secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a code list.
    #[instrument(skip(self), fields(request_id = %self.session.request_id, secret_id = self.secret_id))]
    pub async fn otp_codes(&self) -> DelineaResult<Vec<OtpCode>> {
        let body = self
            .get(&format!("api/v1/one-time-password-code/{}", self.secret_id))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Authenticated GET relative to the base URL, returning the body.
    ///
    /// Retries once with a fresh token if the server reports the token as
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or an
    /// access-denied body.
    pub async fn get(&self, path: &str) -> DelineaResult<String> {
        self.session.get(path).await
    }

    /// Authenticated form POST relative to the base URL. Never retried.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post<T>(&self, path: &str, form: &T) -> DelineaResult<String>
    where
        T: Serialize + ?Sized,
    {
        self.session.post(path, form).await
    }

    async fn field(&self, slug: &str) -> DelineaResult<String> {
        let body = self
            .get(&format!("api/v1/secrets/{}/fields/{slug}", self.secret_id))
            .await?;
        Ok(strip_quotes(&body).to_string())
    }
}
