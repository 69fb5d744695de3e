//! HS256 access tokens.
//!
//! Tokens are compact JWS strings: `header.payload.signature`, each segment
//! base64url without padding. Only `HS256` headers are accepted.

use super::AuthInfo;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const ALGORITHM: &str = "HS256";
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Keys shorter than this are accepted with a warning.
const SHORT_KEY_BYTES: usize = 32;

/// Why a token was not issued or not accepted.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,
    #[error("Bad token signature")]
    BadSignature,
    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,
    #[error("Token has expired")]
    Expired,
    #[error("Token subject is not permitted")]
    WrongSubject,
    #[error("Token lifetime {0:?} is out of range")]
    LifetimeOutOfRange(Duration),
    #[error("Unusable signing key: {0}")]
    BadKey(String),
}

/// HMAC-SHA256 key used to sign and check tokens.
#[derive(Clone)]
pub struct SigningKey {
    mac: Hmac<Sha256>,
}

impl SigningKey {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::BadKey("key is empty".to_string()));
        }
        if secret.len() < SHORT_KEY_BYTES {
            tracing::warn!(
                bytes = secret.len(),
                "Signing key is shorter than {SHORT_KEY_BYTES} bytes"
            );
        }

        let mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| TokenError::BadKey(e.to_string()))?;
        Ok(Self { mac })
    }

    fn sign(&self, input: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time signature check.
    fn verify(&self, input: &str, signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(input.as_bytes());
        mac.verify_slice(signature).is_ok()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl Claims {
    /// Claims for `subject`. `iat`/`exp` are only set when `ttl` is.
    pub fn for_subject(
        subject: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Result<Self, TokenError> {
        let now = unix_now();
        let exp = ttl
            .map(|ttl| {
                now.checked_add(ttl.as_secs())
                    .ok_or(TokenError::LifetimeOutOfRange(ttl))
            })
            .transpose()?;

        Ok(Self {
            sub: subject.into(),
            iat: exp.map(|_| now),
            exp,
        })
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

/// Sign `claims` into a compact token string.
pub fn encode_token(claims: &Claims, key: &SigningKey) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(HEADER_JSON),
        URL_SAFE_NO_PAD.encode(payload)
    );
    let signature = URL_SAFE_NO_PAD.encode(key.sign(&signing_input));
    Ok(format!("{signing_input}.{signature}"))
}

/// Check the signature, then the algorithm, then expiry.
pub fn decode_token(token: &str, key: &SigningKey) -> Result<Claims, TokenError> {
    let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let (header, payload) = signing_input
        .split_once('.')
        .ok_or(TokenError::Malformed)?;
    if payload.contains('.') {
        return Err(TokenError::Malformed);
    }

    if !key.verify(signing_input, &segment(signature)?) {
        return Err(TokenError::BadSignature);
    }

    let header: Header =
        serde_json::from_slice(&segment(header)?).map_err(|_| TokenError::Malformed)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::UnsupportedAlgorithm);
    }

    let claims: Claims =
        serde_json::from_slice(&segment(payload)?).map_err(|_| TokenError::Malformed)?;
    if claims.is_expired(unix_now()) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn segment(encoded: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::Malformed)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Issues and checks tokens for the one permitted subject.
#[derive(Clone)]
pub struct TokenIssuer {
    key: SigningKey,
    subject: String,
    ttl: Option<Duration>,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, subject: impl Into<String>) -> Self {
        Self {
            key,
            subject: subject.into(),
            ttl: None,
        }
    }

    /// Lifetime of issued tokens; `None` issues tokens without `exp`.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn issue(&self) -> Result<String, TokenError> {
        let claims = Claims::for_subject(self.subject.as_str(), self.ttl)?;
        encode_token(&claims, &self.key)
    }

    pub fn verify(&self, token: &str) -> Result<AuthInfo, TokenError> {
        let claims = decode_token(token, &self.key)?;
        if claims.sub != self.subject {
            return Err(TokenError::WrongSubject);
        }

        Ok(AuthInfo {
            subject: claims.sub,
            expires_at: claims.exp,
        })
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("subject", &self.subject)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
