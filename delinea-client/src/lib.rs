//! Delinea Secret Server client.
//!
//! Resolves a secret's identity, secret value and one-time-password code over
//! the Secret Server REST API, authenticating with the OAuth2 password grant
//! and sharing the resulting bearer token through a [`TokenCache`].
//!
//! ```no_run
//! use delinea_client::{DelineaConfig, SecretClient};
//! use secrecy::ExposeSecret;
//!
//! # async fn run() -> delinea_client::DelineaResult<()> {
//! let config = DelineaConfig::from_env()?;
//! let cred = SecretClient::connect(config, 1234).await?;
//! println!(
//!     "id: {} ident: {} secret: {}",
//!     cred.secret_id(),
//!     cred.identity().await?,
//!     cred.secret().await?.expose_secret()
//! );
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod secrets;
pub mod token;

pub use client::{SecretClient, SecretClientBuilder};
pub use config::DelineaConfig;
pub use error::{DelineaError, DelineaResult};
pub use secrets::{OtpCode, SECRET_NAME_SLUG};
pub use token::{TokenCache, TokenPair, TokenSource};
