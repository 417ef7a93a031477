//! Delinea client configuration.

use crate::error::{DelineaError, DelineaResult};
use reqwest::{Client, ClientBuilder};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, time::Duration};

/// Environment variable holding the Secret Server base URL.
pub const ENV_BASE_URL: &str = "SSAPP_BASEURL";
/// Environment variable holding the service account username.
pub const ENV_USERNAME: &str = "SSAPP_USERNAME";
/// Environment variable holding the service account password.
pub const ENV_PASSWORD: &str = "SSAPP_PASSWORD";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SSAPP_TIMEOUT_SECS";

/// Delinea client configuration.
#[derive(Clone)]
pub struct DelineaConfig {
    /// Secret Server base URL (e.g. `https://vault.example.com/SecretServer`)
    pub base_url: String,
    /// Service account username for the password grant
    pub username: String,
    /// Service account password for the password grant
    pub password: SecretString,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for DelineaConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("delinea-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl fmt::Debug for DelineaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelineaConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DelineaConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            ..Default::default()
        }
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> DelineaResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> DelineaResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DelineaError::invalid_config(format!("{name} is not set")))
        };

        let mut config = Self::new(
            required(ENV_BASE_URL)?,
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
        );

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                DelineaError::invalid_config(format!("Invalid {ENV_TIMEOUT_SECS}: {e}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check that the configuration can be used for live calls.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is empty or the base URL is not an
    /// absolute `http`/`https` URL.
    pub fn validate(&self) -> DelineaResult<()> {
        if self.username.trim().is_empty() {
            return Err(DelineaError::invalid_config(format!("{ENV_USERNAME} is not set")));
        }
        if self.password.expose_secret().is_empty() {
            return Err(DelineaError::invalid_config(format!("{ENV_PASSWORD} is not set")));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| DelineaError::invalid_config(format!("Invalid {ENV_BASE_URL}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(DelineaError::invalid_config(format!(
                "Invalid {ENV_BASE_URL}: unsupported scheme {other}"
            ))),
        }
    }

    /// Join an API path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Build the HTTP client used for all Secret Server calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built (e.g., TLS initialization fails).
    pub fn build_http_client(&self) -> DelineaResult<Client> {
        ClientBuilder::new()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(&self.user_agent)
            .use_rustls_tls()
            .build()
            .map_err(DelineaError::Http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = DelineaConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("delinea-client/"));
    }

    #[test]
    fn test_from_lookup() {
        let config = DelineaConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://vault.example.com/SecretServer/"),
            (ENV_USERNAME, "svc-reader"),
            (ENV_PASSWORD, "hunter2"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.username, "svc-reader");
        assert_eq!(config.password.expose_secret(), "hunter2");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_variable_rejected() {
        let err = DelineaConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://vault.example.com"),
            (ENV_USERNAME, "svc-reader"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD));

        let err = DelineaConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "  "),
            (ENV_USERNAME, "svc-reader"),
            (ENV_PASSWORD, "hunter2"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_BASE_URL));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = DelineaConfig::new("vault.example.com", "u", "p");
        assert!(matches!(config.validate(), Err(DelineaError::InvalidConfig(_))));

        let config = DelineaConfig::new("ftp://vault.example.com", "u", "p");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let result = DelineaConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "https://vault.example.com"),
            (ENV_USERNAME, "svc-reader"),
            (ENV_PASSWORD, "hunter2"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_joining() {
        let with_slash = DelineaConfig::new("https://vault.example.com/SecretServer/", "u", "p");
        let without_slash = DelineaConfig::new("https://vault.example.com/SecretServer", "u", "p");

        assert_eq!(
            with_slash.endpoint("oauth2/token"),
            "https://vault.example.com/SecretServer/oauth2/token"
        );
        assert_eq!(
            without_slash.endpoint("/api/v1/secrets/7/summary"),
            "https://vault.example.com/SecretServer/api/v1/secrets/7/summary"
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = DelineaConfig::new("https://vault.example.com", "svc-reader", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("svc-reader"));
    }

    #[test]
    fn test_build_client() {
        let config = DelineaConfig::new("https://vault.example.com", "u", "p")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent");
        assert_eq!(config.user_agent, "test-agent");
        assert!(config.build_http_client().is_ok());
    }
}
