//! Admin credential storage and checking.

use crate::error::{LesionError, Result};
use sha2::{Digest, Sha256};

/// Hash a password into the stored form (lowercase hex SHA-256).
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// The single admin account.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password_hash: Vec<u8>,
}

impl AdminCredentials {
    /// Create credentials from a username and a hex password hash.
    pub fn new(username: impl Into<String>, password_hash_hex: &str) -> Result<Self> {
        let password_hash = hex::decode(password_hash_hex.trim()).map_err(|e| {
            LesionError::InvalidConfig {
                field: "auth.admin_password_hash".to_string(),
                reason: e.to_string(),
            }
        })?;
        if password_hash.len() != 32 {
            return Err(LesionError::InvalidConfig {
                field: "auth.admin_password_hash".to_string(),
                reason: format!("Expected 32 bytes, got {}", password_hash.len()),
            });
        }

        Ok(Self {
            username: username.into(),
            password_hash,
        })
    }

    /// The admin username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a username/password pair.
    ///
    /// Both comparisons always run so a wrong username costs the same as a
    /// wrong password.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        // Usernames are compared as digests so their lengths do not leak.
        let user_ok = digests_equal(
            &Sha256::digest(username.as_bytes()),
            &Sha256::digest(self.username.as_bytes()),
        );
        let pass_ok = digests_equal(&Sha256::digest(password.as_bytes()), &self.password_hash);
        user_ok & pass_ok
    }
}

/// Compare without stopping at the first differing byte.
fn digests_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> AdminCredentials {
        AdminCredentials::new("medicalSociety", &hash_password("medicalsociety1298!")).unwrap()
    }

    #[test]
    fn test_hash_password() {
        // sha256("abc")
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_password("x").len(), 64);
    }

    #[test]
    fn test_matching_pair() {
        assert!(credentials().matches("medicalSociety", "medicalsociety1298!"));
    }

    #[test]
    fn test_mismatching_pairs() {
        let creds = credentials();
        assert!(!creds.matches("medicalSociety", "wrong"));
        assert!(!creds.matches("medicalsociety", "medicalsociety1298!"));
        assert!(!creds.matches("", ""));
        assert!(!creds.matches("medicalSociety ", "medicalsociety1298!"));
        assert!(!creds.matches("medicalSociety", "medicalsociety1298! "));
    }

    #[test]
    fn test_digests_equal() {
        assert!(digests_equal(b"abc", b"abc"));
        assert!(!digests_equal(b"abc", b"abd"));
        assert!(!digests_equal(b"abc", b"ab"));
    }

    #[test]
    fn test_invalid_hash() {
        assert!(AdminCredentials::new("admin", "zz").is_err());
        assert!(AdminCredentials::new("admin", "abcd").is_err());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("medicalSociety"));
        assert!(!debug.contains(&hash_password("medicalsociety1298!")));
    }
}
