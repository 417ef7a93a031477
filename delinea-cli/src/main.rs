// Delinea CLI
//
// Prompts for a secret id and prints its identity and secret.

mod telemetry;

use anyhow::{Context, Result};
use delinea_client::{DelineaConfig, SecretClient};
use dialoguer::Input;
use secrecy::ExposeSecret;
use tracing::debug;

fn format_credential(secret_id: i64, identity: &str, secret: &str) -> String {
    format!("id: {secret_id} ident: {identity} secret: {secret}")
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing(&telemetry::TracingConfig::from_env());

    let config = DelineaConfig::from_env().context("Failed to load Secret Server configuration")?;
    debug!(?config, "Loaded configuration");

    let secret_id: i64 = Input::new()
        .with_prompt("Enter secret_id to retrieve")
        .interact_text()
        .context("Failed to read secret_id")?;

    let cred = SecretClient::connect(config, secret_id)
        .await
        .with_context(|| format!("Failed to look up secret {secret_id}"))?;

    let identity = cred
        .identity()
        .await
        .context("Failed to resolve identity")?;
    let secret = cred.secret().await.context("Failed to resolve secret")?;

    println!(
        "{}",
        format_credential(cred.secret_id(), identity, secret.expose_secret())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_credential() {
        assert_eq!(
            format_credential(1234, "svc-acct", "P@ssw0rd"),
            "id: 1234 ident: svc-acct secret: P@ssw0rd"
        );
    }
}
