//! Secret Server wire types.

use serde::Deserialize;

/// Templates whose identity is the secret's display name rather than a field.
pub const NAME_AS_IDENTITY_TEMPLATES: [i64; 2] = [
    6041, // IAM - Service Account
    6047, // IAM - High Risk Service Account
];

/// Identity slug meaning "use the secret's display name".
pub const SECRET_NAME_SLUG: &str = "$self._sec_name";

/// Default identity field slug.
pub const DEFAULT_IDENTITY_SLUG: &str = "username";

/// Default secret field slug.
pub const DEFAULT_SECRET_SLUG: &str = "password";

/// Marker Secret Server places in the body when access is denied.
pub const ACCESS_DENIED_MARKER: &str = "API_AccessDenied";

/// Marker Secret Server places in the body when the bearer token is stale.
pub const EXPIRED_TOKEN_MARKER: &str = "Authentication failed or expired token";

/// `POST oauth2/token` response.
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `GET api/v1/secrets/{id}/summary` response (fields the client consumes).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSummary {
    pub secret_template_id: i64,
    pub name: String,
}

impl SecretSummary {
    /// Whether this secret's template uses the display name as identity.
    #[must_use]
    pub fn name_is_identity(&self) -> bool {
        NAME_AS_IDENTITY_TEMPLATES.contains(&self.secret_template_id)
    }
}

/// One element of `GET api/v1/one-time-password-code/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpCode {
    pub code: String,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub remaining_seconds: u64,
}

/// Strip the JSON quoting Secret Server wraps around field values.
#[must_use]
pub fn strip_quotes(body: &str) -> &str {
    body.trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_deserialize() {
        let summary: SecretSummary = serde_json::from_str(
            r#"{"id":1234,"name":"svc-build","secretTemplateId":6041,"folderId":3}"#,
        )
        .unwrap();
        assert_eq!(summary.name, "svc-build");
        assert!(summary.name_is_identity());

        let summary: SecretSummary =
            serde_json::from_str(r#"{"name":"db","secretTemplateId":6003}"#).unwrap();
        assert!(!summary.name_is_identity());
    }

    #[test]
    fn test_otp_deserialize() {
        let codes: Vec<OtpCode> = serde_json::from_str(
            r#"[{"code":"492039","durationSeconds":30,"remainingSeconds":12}]"#,
        )
        .unwrap();
        assert_eq!(codes[0].code, "492039");
        assert_eq!(codes[0].remaining_seconds, 12);
    }

    #[test]
    fn test_token_response_without_refresh() {
        let resp: OAuthTokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"bearer","expires_in":1200}"#)
                .unwrap();
        assert_eq!(resp.access_token, "abc");
        assert!(resp.refresh_token.is_none());
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"hello\""), "hello");
        assert_eq!(strip_quotes("hello"), "hello");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("\"he said \"hi\"\""), "he said \"hi");
    }
}
