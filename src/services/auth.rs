use crate::error::{AppError, Result};
use crate::models::principal::{Credential, Principal};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use std::sync::RwLock;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the hashed password.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a hash.
///
/// Goes through Argon2's own verification primitive, which compares in
/// constant time. Recomputed hashes are never compared with generic
/// equality.
///
/// # Arguments
///
/// * `password` - The password to verify.
/// * `hash` - The hash to verify against.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    tracing::debug!("Password verification completed");
    Ok(result)
}

/// Holds the single active principal's credential.
///
/// Constructed once at bootstrap and handed to whoever needs it by
/// reference; there is no ambient global. The system recognizes exactly one
/// principal at a time: replacing it discards the prior one entirely.
pub struct CredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl CredentialStore {
    /// Creates an empty `CredentialStore`.
    pub fn new() -> Self {
        Self {
            credential: RwLock::new(None),
        }
    }

    /// Replaces the stored credential unconditionally. No merge, no history.
    ///
    /// # Arguments
    ///
    /// * `username` - The principal's username.
    /// * `password` - The plaintext password, hashed before storage.
    ///
    /// # Returns
    ///
    /// A `Result<()>`.
    pub fn set_principal(&self, username: &str, password: &str) -> Result<()> {
        tracing::debug!("🔐 Setting active principal: {}", username);
        let password_hash = hash_password(password)?;

        let mut guard = self
            .credential
            .write()
            .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))?;
        *guard = Some(Credential {
            username: username.to_string(),
            password_hash,
        });

        tracing::info!("✅ Active principal set: {}", username);
        Ok(())
    }

    /// Validates a username/password pair against the stored credential.
    ///
    /// # Arguments
    ///
    /// * `username` - The supplied username.
    /// * `password` - The supplied password.
    ///
    /// # Returns
    ///
    /// A `Result` containing the authenticated `Principal`.
    pub fn validate_credentials(&self, username: &str, password: &str) -> Result<Principal> {
        tracing::debug!("🔐 Authenticating: {}", username);

        let stored = {
            let guard = self
                .credential
                .read()
                .map_err(|_| AppError::Internal("credential store lock poisoned".to_string()))?;
            guard.clone()
        };

        let credential = stored
            .filter(|c| c.username == username)
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(password, &credential.password_hash)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        tracing::info!("✅ Principal authenticated: {}", username);

        Ok(Principal {
            username: credential.username,
        })
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_registered_credentials() {
        let store = CredentialStore::new();
        store.set_principal("admin", "correct horse battery").unwrap();

        let principal = store
            .validate_credentials("admin", "correct horse battery")
            .unwrap();
        assert_eq!(principal.username, "admin");
    }

    #[test]
    fn reject_wrong_password() {
        let store = CredentialStore::new();
        store.set_principal("admin", "correct horse battery").unwrap();

        let result = store.validate_credentials("admin", "wrong password");
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn reject_unknown_username() {
        let store = CredentialStore::new();
        store.set_principal("admin", "correct horse battery").unwrap();

        let result = store.validate_credentials("someone-else", "correct horse battery");
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn reject_when_empty() {
        let store = CredentialStore::new();
        let result = store.validate_credentials("admin", "anything");
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn replacing_principal_discards_previous() {
        let store = CredentialStore::new();
        store.set_principal("first", "password-one").unwrap();
        store.set_principal("second", "password-two").unwrap();

        assert!(store.validate_credentials("first", "password-one").is_err());
        assert!(store.validate_credentials("second", "password-two").is_ok());
    }
}
