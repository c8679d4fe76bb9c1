use crate::error::{AppError, Result};
use crate::models::principal::Principal;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the principal's username.
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies signed, time-bounded session tokens.
///
/// Tokens are self-contained: validity is a pure function of the token
/// bytes, the server secret, and wall-clock time, so verification is safe
/// under unlimited concurrency with no locking. There is no revocation; an
/// issued token stays valid for its full TTL even after a password change.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Creates a new `TokenService`.
    ///
    /// # Arguments
    ///
    /// * `secret` - The HMAC secret the server signs tokens with.
    /// * `ttl_hours` - Token lifetime in hours.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Expiry is signature + exp only, checked exactly at verification
        // time. No leeway: an expired token is expired.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issues a token for the given principal.
    ///
    /// # Arguments
    ///
    /// * `principal` - The principal the token names as subject.
    ///
    /// # Returns
    ///
    /// A `Result` containing the signed token.
    pub fn issue(&self, principal: &Principal) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Verifies a token and resolves its subject.
    ///
    /// Returns `None` (never an error) for malformed input, a bad signature,
    /// or an expired token; the caller decides the externally visible
    /// consequence.
    ///
    /// # Arguments
    ///
    /// * `token` - The raw token string.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .ok()
            .map(|data| Principal {
                username: data.claims.sub,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal() -> Principal {
        Principal {
            username: "admin".to_string(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips_subject() {
        let service = TokenService::new("test-secret", 24);
        let token = service.issue(&principal()).unwrap();

        let resolved = service.verify(&token).unwrap();
        assert_eq!(resolved.username, "admin");
    }

    #[test]
    fn tampered_signature_verifies_to_none() {
        let service = TokenService::new("test-secret", 24);
        let other = TokenService::new("different-secret", 24);

        let token = other.issue(&principal()).unwrap();
        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn expired_token_verifies_to_none() {
        let service = TokenService::new("test-secret", -1);
        let token = service.issue(&principal()).unwrap();
        assert!(service.verify(&token).is_none());
    }

    #[test]
    fn malformed_token_verifies_to_none() {
        let service = TokenService::new("test-secret", 24);
        assert!(service.verify("not-a-token").is_none());
        assert!(service.verify("").is_none());
    }

    #[test]
    fn token_survives_credential_rotation() {
        // Validity is signature + expiry only: tokens are not tied to the
        // credential store, so a password change does not revoke them.
        let service = TokenService::new("test-secret", 24);
        let token = service.issue(&principal()).unwrap();

        let store = crate::services::auth::CredentialStore::new();
        store.set_principal("admin", "rotated-password").unwrap();

        assert!(service.verify(&token).is_some());
    }
}
