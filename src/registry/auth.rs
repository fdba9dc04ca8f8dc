// ABOUTME: Registry identity and push credentials.
// ABOUTME: Resolves the account id and decodes the registry authorization token.

use super::error::RegistryError;
use crate::types::Region;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Credentials for pushing to a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryAuth {
    /// Username.
    pub username: String,
    /// Password or token.
    pub password: String,
    /// Registry server (e.g., "123456789012.dkr.ecr.eu-central-1.amazonaws.com").
    pub server: Option<String>,
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field(
                "password",
                &format_args!("<REDACTED, length {}>", self.password.len()),
            )
            .field("server", &self.server)
            .finish()
    }
}

/// Account identity and push authorization.
#[async_trait]
pub trait RegistryAuthenticator: Send + Sync {
    /// Account id that owns the registry.
    async fn account_id(&self, region: &Region) -> Result<String, RegistryError>;

    /// Obtain and decode push credentials for the registry of `region`.
    async fn authorization(&self, region: &Region) -> Result<RegistryAuth, RegistryError>;
}

/// Decode a base64 `user:password` authorization token.
pub fn decode_authorization_token(
    token: &str,
    server: Option<&str>,
) -> Result<RegistryAuth, RegistryError> {
    let decoded = STANDARD
        .decode(token.trim())
        .map_err(|e| RegistryError::Unauthorized(format!("invalid authorization token: {}", e)))?;
    let decoded = String::from_utf8(decoded).map_err(|_| {
        RegistryError::Unauthorized("authorization token is not valid UTF-8".to_string())
    })?;

    let (username, password) = decoded.split_once(':').ok_or_else(|| {
        RegistryError::Unauthorized("invalid authorization token format".to_string())
    })?;

    Ok(RegistryAuth {
        username: username.to_string(),
        password: password.to_string(),
        server: server.map(|s| s.trim_start_matches("https://").to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_user_and_password() {
        let token = STANDARD.encode("AWS:s3cr3t:with:colons");
        let auth = decode_authorization_token(&token, Some("https://1.dkr.ecr.x.amazonaws.com"))
            .unwrap();
        assert_eq!(auth.username, "AWS");
        assert_eq!(auth.password, "s3cr3t:with:colons");
        assert_eq!(auth.server.as_deref(), Some("1.dkr.ecr.x.amazonaws.com"));
    }

    #[test]
    fn rejects_token_without_separator() {
        let token = STANDARD.encode("no-separator");
        assert!(matches!(
            decode_authorization_token(&token, None),
            Err(RegistryError::Unauthorized(_))
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let auth = RegistryAuth {
            username: "AWS".to_string(),
            password: "hunter2".to_string(),
            server: None,
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<REDACTED, length 7>"));
    }
}
