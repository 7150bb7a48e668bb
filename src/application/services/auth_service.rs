//! Authentication service for the administrative API.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Validates Bearer tokens against the configured `ADMIN_TOKEN`.
///
/// Only an HMAC-SHA256 digest of the admin token is kept in memory, keyed by a
/// random per-process secret. Presented tokens are hashed with the same key and
/// compared in constant time.
pub struct AuthService {
    key: [u8; 32],
    expected: Vec<u8>,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `admin_token` - the single accepted token
    pub fn new(admin_token: &str) -> Self {
        let mut key = [0u8; 32];
        rand::rng().fill(&mut key);

        let expected = Self::mac(&key, admin_token).finalize().into_bytes().to_vec();

        Self { key, expected }
    }

    fn mac(key: &[u8], token: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(token.as_bytes());
        mac
    }

    /// Authenticates a raw token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token does not match.
    pub fn authenticate(&self, token: &str) -> Result<(), AppError> {
        Self::mac(&self.key, token)
            .verify_slice(&self.expected)
            .map_err(|_| {
                AppError::unauthorized("Unauthorized", json!({"reason": "Invalid token"}))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_success() {
        let service = AuthService::new("admin-secret");
        assert!(service.authenticate("admin-secret").is_ok());
    }

    #[test]
    fn test_authenticate_invalid_token() {
        let service = AuthService::new("admin-secret");

        let result = service.authenticate("admin-secreT");

        assert!(matches!(result.unwrap_err(), AppError::Unauthorized { .. }));
    }

    #[test]
    fn test_empty_token_rejected() {
        let service = AuthService::new("admin-secret");
        assert!(service.authenticate("").is_err());
    }

    #[test]
    fn test_keys_differ_per_instance() {
        let a = AuthService::new("same");
        let b = AuthService::new("same");

        assert_ne!(a.key, b.key);
        assert_ne!(a.expected, b.expected);
        assert!(a.authenticate("same").is_ok());
        assert!(b.authenticate("same").is_ok());
    }
}
