//! Authentication module for lesionscan.
//!
//! A single admin account exchanges its username and password for a signed
//! bearer token; protected routes verify that token on every request.

// Panics in authentication code can lead to security vulnerabilities.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod credentials;
mod middleware;
mod token;

pub use credentials::{hash_password, AdminCredentials};
pub use middleware::{require_bearer, AuthState};
pub use token::{decode_token, encode_token, Claims, SigningKey, TokenError, TokenIssuer};

use crate::config::AuthConfig;
use crate::error::{LesionError, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Authentication result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    /// Authenticated subject (the admin username).
    pub subject: String,
    /// Expiry as a Unix timestamp, if the token carries one.
    pub expires_at: Option<u64>,
}

/// Credential check plus token issue/verify for the admin account.
#[derive(Debug)]
pub struct Authenticator {
    credentials: AdminCredentials,
    issuer: TokenIssuer,
}

impl Authenticator {
    /// Create an authenticator issuing tokens to the admin username.
    pub fn new(credentials: AdminCredentials, key: SigningKey, ttl: Option<Duration>) -> Self {
        let issuer = TokenIssuer::new(key, credentials.username()).with_ttl(ttl);
        Self {
            credentials,
            issuer,
        }
    }

    /// Build from configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let credentials = AdminCredentials::new(&config.admin_username, &config.admin_password_hash)?;
        let key = SigningKey::new(&config.signing_key).map_err(|e| LesionError::InvalidConfig {
            field: "auth.signing_key".to_string(),
            reason: e.to_string(),
        })?;

        if config.token_ttl.is_none() {
            warn!("auth.token_ttl is not set; issued tokens never expire");
        }

        Ok(Self::new(credentials, key, config.token_ttl))
    }

    /// Exchange a username/password pair for a token.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        if !self.credentials.matches(username, password) {
            warn!(username = %username, "Login rejected");
            return Err(LesionError::Unauthorized(
                "Incorrect username or password".to_string(),
            ));
        }

        let token = self
            .issuer
            .issue()
            .map_err(|e| LesionError::Internal(format!("Failed to issue token: {}", e)))?;
        info!(username = %username, "Issued access token");
        Ok(token)
    }

    /// Verify a bearer token.
    pub fn verify(&self, token: &str) -> std::result::Result<AuthInfo, TokenError> {
        self.issuer.verify(token)
    }

    /// The admin username.
    pub fn admin_username(&self) -> &str {
        self.credentials.username()
    }
}
